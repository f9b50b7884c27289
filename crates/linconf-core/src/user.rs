//! # Users and Home Directories
//!
//! Lookups against the passwd database through the reentrant
//! `getpwnam_r()` / `getpwuid_r()` calls.
//!
//! Under `sudo` the environment still names the invoking user (`sudo -H`
//! only changes `$HOME`), so [`home_dir_current_user`] returns that user's
//! home rather than `/root`.

use std::ffi::{CStr, CString, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::ptr;

use libc::c_char;

use crate::error::{LinconfError, LinconfResult};

/// Environment variables consulted for the user name, in order.
pub const USERNAME_VARIABLES: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

const MAX_PASSWD_BUFFER: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PasswdEntry
{
    name: String,
    home: PathBuf,
}

/// Name of the user running this process.
///
/// Uses the first non-empty of `LOGNAME`, `USER`, `LNAME` and `USERNAME`,
/// then falls back to the passwd entry of the real user id.
///
/// ## Errors
///
/// `UserNotFound` if neither source yields a name.
pub fn current_username() -> LinconfResult<String>
{
    current_username_with(|key| std::env::var(key).ok())
}

/// [`current_username`] with an explicit environment lookup.
///
/// ## Errors
///
/// `UserNotFound` if neither source yields a name.
pub fn current_username_with<F>(lookup: F) -> LinconfResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = USERNAME_VARIABLES
        .iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
    {
        return Ok(name);
    }

    // SAFETY: getuid() cannot fail
    let uid = unsafe { libc::getuid() };
    passwd_by_uid(uid)?
        .map(|entry| entry.name)
        .ok_or_else(|| LinconfError::UserNotFound(format!("uid {uid}")))
}

/// Home directory of `username` from the passwd database.
///
/// ```rust,no_run
/// use linconf_core::user::home_dir_of;
///
/// let home = home_dir_of("root")?;
/// // macOS keeps root's home in /var/root
/// assert!(home.as_os_str() == "/root" || home.as_os_str() == "/var/root");
/// # Ok::<(), linconf_core::error::LinconfError>(())
/// ```
///
/// ## Errors
///
/// - `UserNotFound`: no such user
/// - `InvalidArgument`: the name contains a NUL byte
/// - `Io`: the passwd lookup itself failed
pub fn home_dir_of(username: &str) -> LinconfResult<PathBuf>
{
    passwd_by_name(username)?
        .map(|entry| entry.home)
        .ok_or_else(|| LinconfError::UserNotFound(username.to_string()))
}

/// Home directory of [`current_username`].
///
/// ## Errors
///
/// Same as [`current_username`] and [`home_dir_of`].
pub fn home_dir_current_user() -> LinconfResult<PathBuf>
{
    let username = current_username()?;
    home_dir_of(&username)
}

/// Whether the process runs with an effective uid of 0.
#[must_use]
pub fn is_root() -> bool
{
    // SAFETY: geteuid() cannot fail
    unsafe { libc::geteuid() == 0 }
}

fn passwd_by_name(username: &str) -> LinconfResult<Option<PasswdEntry>>
{
    let name = CString::new(username)
        .map_err(|_| LinconfError::InvalidArgument(format!("user name contains NUL: {username:?}")))?;

    Ok(read_passwd(|pwd, buf, len, result| {
        // SAFETY: every pointer is valid for the duration of the call and
        // `len` is the length of `buf`
        unsafe { libc::getpwnam_r(name.as_ptr(), pwd, buf, len, result) }
    })?)
}

fn passwd_by_uid(uid: libc::uid_t) -> LinconfResult<Option<PasswdEntry>>
{
    Ok(read_passwd(|pwd, buf, len, result| {
        // SAFETY: see passwd_by_name
        unsafe { libc::getpwuid_r(uid, pwd, buf, len, result) }
    })?)
}

/// Drive one of the `getpw*_r` calls, growing the buffer on `ERANGE`.
fn read_passwd<F>(call: F) -> io::Result<Option<PasswdEntry>>
where
    F: Fn(*mut libc::passwd, *mut c_char, usize, *mut *mut libc::passwd) -> libc::c_int,
{
    let mut buf_len = 1024;
    loop {
        let mut buf: Vec<c_char> = vec![0; buf_len];
        // SAFETY: passwd is plain old data, an all-zero value is valid
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = ptr::null_mut();

        let rc = call(ptr::addr_of_mut!(pwd), buf.as_mut_ptr(), buf.len(), ptr::addr_of_mut!(result));
        match rc {
            0 => {}
            libc::ERANGE if buf_len < MAX_PASSWD_BUFFER => {
                buf_len *= 2;
                continue;
            }
            // "not found" is reported through these on some libcs
            libc::ENOENT | libc::ESRCH | libc::EBADF | libc::EPERM => return Ok(None),
            _ => return Err(io::Error::from_raw_os_error(rc)),
        }

        if result.is_null() {
            return Ok(None);
        }

        // SAFETY: on success pw_name and pw_dir point to NUL terminated
        // strings inside `buf`, which is still alive here
        let (name, home) = unsafe { (CStr::from_ptr(pwd.pw_name), CStr::from_ptr(pwd.pw_dir)) };
        return Ok(Some(PasswdEntry {
            name: name.to_string_lossy().into_owned(),
            home: PathBuf::from(OsStr::from_bytes(home.to_bytes())),
        }));
    }
}
