//! # Error Types
//!
//! General error handling for the host helpers.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use std::fmt;
use std::io;

use thiserror::Error;

/// Which package operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOperation
{
    /// `apt-get install`
    Install,
    /// `apt-get purge`
    Uninstall,
}

impl fmt::Display for PackageOperation
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Install => f.write_str("Install"),
            Self::Uninstall => f.write_str("Uninstall"),
        }
    }
}

/// Main error type for linconf operations
///
/// ## Error Categories
///
/// 1. **Lookup errors**: CommandNotFound, UserNotFound
/// 2. **Argument errors**: InvalidArgument, Ambiguous
/// 3. **Execution errors**: CommandFailed, PackageOperationFailed, RestartFailed
/// 4. **I/O errors**: Io
#[derive(Error, Debug)]
pub enum LinconfError
{
    /// Invalid argument passed to a helper
    ///
    /// Examples:
    /// - An empty command line
    /// - A bash command name with shell metacharacters
    /// - A retry count that is not a number
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A program or bash command does not exist
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// A command exited with a non-zero code while failures were fatal
    #[error("Command `{command}` failed with exit code {returncode}{}", format_stderr(stderr))]
    CommandFailed
    {
        /// Command line as it was logged
        command: String,
        /// Exit code (128 + signal for signalled processes)
        returncode: i32,
        /// Captured standard error
        stderr: String,
    },

    /// No passwd entry (or no usable environment) for the user
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A lookup matched more than one entry where exactly one was expected
    ///
    /// `dpkg --list` returns one row per installed architecture, so this
    /// happens for multi-arch packages queried without an architecture.
    #[error("Can not determine state of {0}: more than one match")]
    Ambiguous(String),

    /// `apt-get` kept failing after all retries
    #[error("{operation} Package \"{package}\" failed")]
    PackageOperationFailed
    {
        /// The operation that failed
        operation: PackageOperation,
        /// Package name
        package: String,
        /// Exit code of the last attempt
        returncode: i32,
    },

    /// Re-executing the current program failed
    #[error("Failed to restart: {0}")]
    RestartFailed(String),

    /// I/O error (spawning processes, reading files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn format_stderr(stderr: &str) -> String
{
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl LinconfError
{
    /// Process exit code for this error, following `errno` conventions.
    ///
    /// | Error                          | Exit code               |
    /// |--------------------------------|-------------------------|
    /// | `CommandNotFound`, `UserNotFound` | `ENOENT`             |
    /// | `InvalidArgument`, `Ambiguous` | `EINVAL`                |
    /// | `CommandFailed`, `PackageOperationFailed` | child's code or 1 |
    /// | `Io` not found / permission / exists | `ENOENT` / `EACCES` / `EEXIST` |
    /// | anything else                  | 1                       |
    #[must_use]
    pub fn exit_code(&self) -> i32
    {
        match self {
            Self::CommandNotFound(_) | Self::UserNotFound(_) => libc::ENOENT,
            Self::InvalidArgument(_) | Self::Ambiguous(_) => libc::EINVAL,
            Self::CommandFailed { returncode, .. } | Self::PackageOperationFailed { returncode, .. } => {
                if *returncode > 0 && *returncode < 256 {
                    *returncode
                } else {
                    1
                }
            }
            Self::Io(err) => match err.kind() {
                io::ErrorKind::NotFound => libc::ENOENT,
                io::ErrorKind::PermissionDenied => libc::EACCES,
                io::ErrorKind::AlreadyExists => libc::EEXIST,
                io::ErrorKind::InvalidInput => libc::EINVAL,
                _ => 1,
            },
            Self::RestartFailed(_) => 1,
        }
    }
}

/// Convenience type alias for `Result<T, LinconfError>`
///
/// ```rust
/// use linconf_core::error::LinconfResult;
/// fn foo() -> LinconfResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type LinconfResult<T> = std::result::Result<T, LinconfError>;
