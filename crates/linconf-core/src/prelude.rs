//! Common module for library exports

pub use crate::bash::{command_exists, get_bash_command, BashCommand, BashCommandType};
pub use crate::error::{LinconfError, LinconfResult, PackageOperation};
pub use crate::packages::{linux_release_name, InstallConfig, PackageManager, PackageOptions};
pub use crate::restart::{restart_as_root, restart_myself};
pub use crate::shell::{CommandLogSettings, CommandRunner, ShellCommand, ShellResponse, SystemRunner};
pub use crate::user::{current_username, home_dir_current_user, home_dir_of, is_root};
