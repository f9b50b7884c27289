//! Resolve what bash would run for a command name.

use std::fmt;
use std::str::FromStr;

use crate::error::{LinconfError, LinconfResult};
use crate::shell::{CommandLogSettings, CommandRunner, ShellCommand, SystemRunner};

/// What kind of thing a name resolves to in bash (`type -t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BashCommandType
{
    /// An alias
    Alias,
    /// A shell reserved word
    Keyword,
    /// A shell function
    Function,
    /// A shell builtin
    Builtin,
    /// A file on disk
    File,
}

impl FromStr for BashCommandType
{
    type Err = LinconfError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim() {
            "alias" => Ok(Self::Alias),
            "keyword" => Ok(Self::Keyword),
            "function" => Ok(Self::Function),
            "builtin" => Ok(Self::Builtin),
            "file" => Ok(Self::File),
            other => Err(LinconfError::InvalidArgument(format!("unknown bash command type `{other}`"))),
        }
    }
}

impl fmt::Display for BashCommandType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            Self::Alias => "alias",
            Self::Keyword => "keyword",
            Self::Function => "function",
            Self::Builtin => "builtin",
            Self::File => "file",
        };
        f.write_str(name)
    }
}

/// A resolved bash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BashCommand
{
    /// Kind of command
    pub command_type: BashCommandType,
    /// `command -v` output: the name for builtins/keywords, the absolute path for files
    pub command_string: String,
}

/// Resolve `name` with the system bash.
///
/// ## Errors
///
/// See [`get_bash_command_with`].
pub fn get_bash_command(name: &str) -> LinconfResult<BashCommand>
{
    get_bash_command_with(&SystemRunner, name)
}

/// Resolve `name` with `bash -c "type -t name"` and `bash -c "command -v name"`.
///
/// ```rust,no_run
/// use linconf_core::bash::{get_bash_command, BashCommandType};
///
/// let cmd = get_bash_command("type")?;
/// assert_eq!(cmd.command_type, BashCommandType::Builtin);
/// assert_eq!(cmd.command_string, "type");
/// # Ok::<(), linconf_core::error::LinconfError>(())
/// ```
///
/// ## Errors
///
/// - `InvalidArgument`: `name` is empty or contains characters that are not
///   valid in a command name, or `command -v` fails after `type -t` succeeded
/// - `CommandNotFound`: bash does not know `name` (or bash itself is missing)
pub fn get_bash_command_with<R>(runner: &R, name: &str) -> LinconfResult<BashCommand>
where
    R: CommandRunner + ?Sized,
{
    validate_name(name)?;

    let response = bash(&format!("type -t {name}")).run_with(runner)?;
    if !response.success() {
        return Err(LinconfError::CommandNotFound(name.to_string()));
    }
    let command_type = response.stdout.parse::<BashCommandType>()?;

    let response = bash(&format!("command -v {name}")).run_with(runner)?;
    if !response.success() {
        return Err(LinconfError::InvalidArgument(format!("bash command `{name}` does not resolve")));
    }

    Ok(BashCommand {
        command_type,
        command_string: response.stdout.trim().to_string(),
    })
}

/// Whether bash can resolve `name` at all.
#[must_use]
pub fn command_exists(name: &str) -> bool
{
    command_exists_with(&SystemRunner, name)
}

/// [`command_exists`] with an explicit runner.
pub fn command_exists_with<R>(runner: &R, name: &str) -> bool
where
    R: CommandRunner + ?Sized,
{
    get_bash_command_with(runner, name).is_ok()
}

fn bash(script: &str) -> ShellCommand
{
    ShellCommand::new(["bash", "-c", script])
        .fail_on_error(false)
        .log_settings(CommandLogSettings::quiet())
}

fn validate_name(name: &str) -> LinconfResult<()>
{
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-' | '/'));
    if valid {
        Ok(())
    } else {
        Err(LinconfError::InvalidArgument(format!("invalid command name `{name}`")))
    }
}
