//! # Shell Commands
//!
//! Run external programs from an argument list and capture their output.
//!
//! Commands are never passed through a shell: the first element of the
//! argument list is the program, the rest are its arguments. How much of a
//! run gets logged is controlled per command through [`CommandLogSettings`].
//!
//! ## Why a runner trait?
//!
//! Everything above this module (bash lookup, package management) talks to
//! a [`CommandRunner`] instead of spawning processes directly, so it can be
//! driven by a scripted runner in tests. [`SystemRunner`] is the real one.
//!
//! ## Example
//!
//! ```rust,no_run
//! use linconf_core::shell::ShellCommand;
//!
//! let response = ShellCommand::new(["uname", "-r"]).run()?;
//! println!("kernel {}", response.stdout.trim());
//! # Ok::<(), linconf_core::error::LinconfError>(())
//! ```

use std::io::{self, Write};
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus, Stdio};

use linconf_utils::{log_level, LogLevel};

use crate::error::{LinconfError, LinconfResult};

/// Which parts of a command run are logged, and at which level.
///
/// `None` silences that part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLogSettings
{
    /// The command line before it runs
    pub command: Option<LogLevel>,
    /// Captured standard output
    pub stdout: Option<LogLevel>,
    /// Captured standard error
    pub stderr: Option<LogLevel>,
    /// A non-zero exit code
    pub failure: Option<LogLevel>,
}

impl Default for CommandLogSettings
{
    fn default() -> Self
    {
        Self {
            command: Some(LogLevel::Info),
            stdout: Some(LogLevel::Info),
            stderr: Some(LogLevel::Warn),
            failure: Some(LogLevel::Error),
        }
    }
}

impl CommandLogSettings
{
    /// Log nothing at all.
    #[must_use]
    pub fn quiet() -> Self
    {
        Self::at_level(None)
    }

    /// Log every part at the same level.
    #[must_use]
    pub fn at_level(level: Option<LogLevel>) -> Self
    {
        Self {
            command: level,
            stdout: level,
            stderr: level,
            failure: level,
        }
    }
}

/// Result of a finished command.
///
/// The default value is a successful run with no output, which is what
/// callers report when nothing had to be executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellResponse
{
    /// Exit code; `128 + signal` if the process was killed by a signal
    pub returncode: i32,
    /// Captured standard output (lossy UTF-8)
    pub stdout: String,
    /// Captured standard error (lossy UTF-8)
    pub stderr: String,
}

impl ShellResponse
{
    /// Build a response from its parts.
    pub fn new(returncode: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self
    {
        Self {
            returncode,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool
    {
        self.returncode == 0
    }
}

/// Something that can execute a [`ShellCommand`].
///
/// Implementations only execute; logging and the `fail_on_error` policy are
/// applied by [`ShellCommand::run_with`].
pub trait CommandRunner
{
    /// Execute `command` and return its exit code and captured output.
    ///
    /// ## Errors
    ///
    /// - `CommandNotFound`: the program does not exist
    /// - `Io`: the program could not be spawned or waited on
    fn execute(&self, command: &ShellCommand) -> LinconfResult<ShellResponse>;
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner
{
    fn execute(&self, command: &ShellCommand) -> LinconfResult<ShellResponse>
    {
        let (program, args) = command
            .args
            .split_first()
            .ok_or_else(|| LinconfError::InvalidArgument("empty command line".to_string()))?;

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => LinconfError::CommandNotFound(program.clone()),
                _ => LinconfError::Io(e),
            })?;

        let response = ShellResponse {
            returncode: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if command.pass_through {
            io::stdout().write_all(output.stdout.as_slice())?;
            io::stderr().write_all(output.stderr.as_slice())?;
        }

        Ok(response)
    }
}

fn exit_code(status: ExitStatus) -> i32
{
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

/// An external command and how to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand
{
    args: Vec<String>,
    fail_on_error: bool,
    pass_through: bool,
    log_settings: CommandLogSettings,
}

impl ShellCommand
{
    /// A command from its argument list, program first.
    ///
    /// Defaults: a non-zero exit code is an error, output is captured but
    /// not echoed, default log settings.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            fail_on_error: true,
            pass_through: false,
            log_settings: CommandLogSettings::default(),
        }
    }

    /// Whether a non-zero exit code becomes [`LinconfError::CommandFailed`].
    #[must_use]
    pub fn fail_on_error(mut self, fail: bool) -> Self
    {
        self.fail_on_error = fail;
        self
    }

    /// Echo the captured output to this process's stdout/stderr.
    #[must_use]
    pub fn pass_through(mut self, pass: bool) -> Self
    {
        self.pass_through = pass;
        self
    }

    /// Logging for this run.
    #[must_use]
    pub fn log_settings(mut self, settings: CommandLogSettings) -> Self
    {
        self.log_settings = settings;
        self
    }

    /// The full argument list, program first.
    #[must_use]
    pub fn args(&self) -> &[String]
    {
        &self.args
    }

    /// The program, if the argument list is not empty.
    #[must_use]
    pub fn program(&self) -> Option<&str>
    {
        self.args.first().map(String::as_str)
    }

    /// The log settings of this run.
    #[must_use]
    pub fn logging(&self) -> CommandLogSettings
    {
        self.log_settings
    }

    /// Whether output is echoed.
    #[must_use]
    pub fn is_pass_through(&self) -> bool
    {
        self.pass_through
    }

    /// The command line, quoted for display.
    #[must_use]
    pub fn command_line(&self) -> String
    {
        quote_command(&self.args)
    }

    /// Run with the [`SystemRunner`].
    ///
    /// ## Errors
    ///
    /// See [`ShellCommand::run_with`].
    pub fn run(&self) -> LinconfResult<ShellResponse>
    {
        self.run_with(&SystemRunner)
    }

    /// Run with `runner`, logging according to the log settings.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: the argument list is empty
    /// - `CommandNotFound`: the program does not exist
    /// - `CommandFailed`: non-zero exit code and `fail_on_error` is set
    /// - `Io`: spawning or waiting failed
    pub fn run_with<R>(&self, runner: &R) -> LinconfResult<ShellResponse>
    where
        R: CommandRunner + ?Sized,
    {
        if self.args.is_empty() {
            return Err(LinconfError::InvalidArgument("empty command line".to_string()));
        }

        let command_line = self.command_line();
        log_level(self.log_settings.command, &format!("run shell command: {command_line}"));

        let response = runner.execute(self)?;

        let stdout = response.stdout.trim_end();
        if !stdout.is_empty() {
            log_level(self.log_settings.stdout, stdout);
        }
        let stderr = response.stderr.trim_end();
        if !stderr.is_empty() {
            log_level(self.log_settings.stderr, stderr);
        }

        if !response.success() {
            log_level(
                self.log_settings.failure,
                &format!("shell command `{command_line}` returned {}", response.returncode),
            );
            if self.fail_on_error {
                return Err(LinconfError::CommandFailed {
                    command: command_line,
                    returncode: response.returncode,
                    stderr: response.stderr,
                });
            }
        }

        Ok(response)
    }
}

/// Render an argument list as a shell-like command line for logs.
///
/// Arguments containing whitespace or shell metacharacters are single quoted.
///
/// ```rust
/// use linconf_core::shell::quote_command;
///
/// let args = ["bash".to_string(), "-c".to_string(), "type -t ls".to_string()];
/// assert_eq!(quote_command(&args), "bash -c 'type -t ls'");
/// ```
#[must_use]
pub fn quote_command(args: &[String]) -> String
{
    shell_words::join(args)
}
