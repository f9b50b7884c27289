//! # Restarting the Current Program
//!
//! Replace the running process image with a fresh copy of the same
//! executable, optionally through `sudo`.
//!
//! Before `exec`, every descriptor above stderr is marked `FD_CLOEXEC` so
//! the new image starts without handles leaked from the old one (files,
//! sockets, pipes inherited from a parent). Descriptors are enumerated from
//! `/proc/self/fd`, or `/dev/fd` where procfs is not mounted.

use std::convert::Infallible;
use std::ffi::OsString;
use std::fs;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::bash::get_bash_command;
use crate::error::{LinconfError, LinconfResult};

const FD_DIRECTORIES: [&str; 2] = ["/proc/self/fd", "/dev/fd"];

/// Program and arguments a restart will `exec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartCommand
{
    /// Program to execute
    pub program: PathBuf,
    /// Arguments, not including the program itself
    pub args: Vec<OsString>,
}

/// Work out what to `exec` for a restart.
///
/// Without `sudo` this is `exe args...`; with it, `sudo exe args...`.
#[must_use]
pub fn build_restart_command(exe: &Path, args: &[OsString], sudo: Option<&Path>) -> RestartCommand
{
    match sudo {
        Some(sudo) => {
            let mut sudo_args = Vec::with_capacity(args.len() + 1);
            sudo_args.push(exe.as_os_str().to_os_string());
            sudo_args.extend(args.iter().cloned());
            RestartCommand {
                program: sudo.to_path_buf(),
                args: sudo_args,
            }
        }
        None => RestartCommand {
            program: exe.to_path_buf(),
            args: args.to_vec(),
        },
    }
}

/// Restart the current program with its original arguments.
///
/// Only returns if something went wrong; on success the process image is
/// replaced.
///
/// ## Errors
///
/// - `CommandNotFound`: `as_root` is set and there is no `sudo`
/// - `Io`: the current executable cannot be determined
/// - `RestartFailed`: `exec` failed
pub fn restart_myself(as_root: bool) -> LinconfResult<Infallible>
{
    let exe = std::env::current_exe()?;
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    let sudo = if as_root {
        Some(PathBuf::from(get_bash_command("sudo")?.command_string))
    } else {
        None
    };

    let command = build_restart_command(&exe, &args, sudo.as_deref());

    let marked = close_on_exec_all();
    tracing::info!(
        program = %command.program.display(),
        as_root,
        descriptors = marked,
        "restarting"
    );

    let err = Command::new(&command.program).args(&command.args).exec();
    Err(LinconfError::RestartFailed(format!("{}: {err}", command.program.display())))
}

/// [`restart_myself`] through `sudo`.
///
/// ## Errors
///
/// See [`restart_myself`].
pub fn restart_as_root() -> LinconfResult<Infallible>
{
    restart_myself(true)
}

/// Mark every open descriptor above 2 as close-on-exec.
///
/// Failures are logged and skipped. Returns how many descriptors had the
/// flag newly set.
pub fn close_on_exec_all() -> usize
{
    let fds = match open_descriptors() {
        Some(fds) => fds,
        None => {
            tracing::warn!("could not enumerate open file descriptors");
            return 0;
        }
    };

    let mut marked = 0;
    for fd in fds.into_iter().filter(|fd| *fd > 2) {
        match set_close_on_exec(fd) {
            Ok(true) => marked += 1,
            Ok(false) => {}
            Err(e) => tracing::debug!(fd, error = %e, "could not set FD_CLOEXEC"),
        }
    }
    marked
}

fn open_descriptors() -> Option<Vec<i32>>
{
    FD_DIRECTORIES.iter().find_map(|dir| {
        let entries = fs::read_dir(dir).ok()?;
        Some(
            entries
                .flatten()
                .filter_map(|entry| entry.file_name().to_str().and_then(|name| name.parse().ok()))
                .collect(),
        )
    })
}

/// Returns `Ok(true)` if the flag was not set before.
fn set_close_on_exec(fd: i32) -> std::io::Result<bool>
{
    // SAFETY: F_GETFD/F_SETFD only touch descriptor flags; an fd that was
    // closed in the meantime yields EBADF
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFD);
        if flags == -1 {
            return Err(std::io::Error::last_os_error());
        }
        if flags & libc::FD_CLOEXEC != 0 {
            return Ok(false);
        }
        if libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) == -1 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests
{
    use std::os::fd::AsRawFd;

    use super::*;

    #[test]
    fn test_plain_restart_command()
    {
        let args = vec![OsString::from("install"), OsString::from("dialog")];
        let command = build_restart_command(Path::new("/usr/bin/linconf"), &args, None);
        assert_eq!(command.program, PathBuf::from("/usr/bin/linconf"));
        assert_eq!(command.args, args);
    }

    #[test]
    fn test_sudo_restart_command()
    {
        let args = vec![OsString::from("--quiet")];
        let command = build_restart_command(Path::new("/usr/bin/linconf"), &args, Some(Path::new("/usr/bin/sudo")));
        assert_eq!(command.program, PathBuf::from("/usr/bin/sudo"));
        assert_eq!(command.args, vec![OsString::from("/usr/bin/linconf"), OsString::from("--quiet")]);
    }

    #[test]
    fn test_close_on_exec_all_marks_inherited_descriptor()
    {
        let file = fs::File::open("/dev/null").unwrap();
        let fd = file.as_raw_fd();

        // std opens with FD_CLOEXEC, clear it to look like an inherited fd
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFD);
            assert_ne!(libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC), -1);
        }

        assert!(close_on_exec_all() >= 1);

        let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        assert_ne!(flags & libc::FD_CLOEXEC, 0);
    }

    #[test]
    fn test_set_close_on_exec_bad_descriptor()
    {
        assert!(set_close_on_exec(-1).is_err());
    }
}
