//! # Debian Packages
//!
//! Install, reinstall and purge packages with `apt-get`, and query their
//! state with `dpkg`.
//!
//! ## Behaviour
//!
//! - Install only runs when the package is missing (or `reinstall` is set);
//!   uninstall only runs when the package is installed. Otherwise the call
//!   returns 0 without running anything.
//! - Each `apt-get` call is attempted up to
//!   [`InstallConfig::number_of_retries`] times until it exits with 0.
//! - With `use_sudo`, the command is prefixed with the sudo command, but
//!   only if that command exists. Whether it exists is checked once per
//!   [`PackageManager`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use linconf_core::packages::{PackageManager, PackageOptions};
//!
//! let manager = PackageManager::from_env()?;
//! if !manager.is_package_installed("dialog")? {
//!     manager.install_package("dialog", PackageOptions::new().quiet(true))?;
//! }
//! # Ok::<(), linconf_core::error::LinconfError>(())
//! ```

mod config;
pub mod dpkg;
mod release;

use once_cell::sync::OnceCell;

pub use config::{InstallConfig, PackageOptions, ENV_APT_COMMAND, ENV_RETRIES, ENV_SUDO_COMMAND};
pub use release::{linux_release_name, linux_release_name_with, parse_os_release_codename, OS_RELEASE_PATH};

use crate::bash::command_exists_with;
use crate::error::{LinconfError, LinconfResult, PackageOperation};
use crate::shell::{CommandLogSettings, CommandRunner, ShellCommand, ShellResponse, SystemRunner};

/// Package operations against one [`CommandRunner`].
#[derive(Debug)]
pub struct PackageManager<R = SystemRunner>
{
    runner: R,
    config: InstallConfig,
    sudo_exists: OnceCell<bool>,
}

impl PackageManager<SystemRunner>
{
    /// Default configuration, real processes.
    #[must_use]
    pub fn new() -> Self
    {
        Self::with_runner(SystemRunner, InstallConfig::default())
    }

    /// Configuration from the environment, real processes.
    ///
    /// ## Errors
    ///
    /// See [`InstallConfig::from_env`].
    pub fn from_env() -> LinconfResult<Self>
    {
        Ok(Self::with_runner(SystemRunner, InstallConfig::from_env()?))
    }
}

impl Default for PackageManager<SystemRunner>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<R> PackageManager<R>
where
    R: CommandRunner,
{
    /// A manager that runs every command through `runner`.
    pub fn with_runner(runner: R, config: InstallConfig) -> Self
    {
        Self {
            runner,
            config,
            sudo_exists: OnceCell::new(),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &InstallConfig
    {
        &self.config
    }

    /// The runner in use.
    pub fn runner(&self) -> &R
    {
        &self.runner
    }

    /// Whether the configured sudo command exists (checked once).
    pub fn sudo_command_exists(&self) -> bool
    {
        *self.sudo_exists.get_or_init(|| {
            let exists = command_exists_with(&self.runner, &self.config.sudo_command);
            tracing::debug!(sudo = %self.config.sudo_command, exists, "checked for sudo");
            exists
        })
    }

    /// Prefix `command` with the sudo command if it exists.
    pub fn prepend_sudo(&self, mut command: Vec<String>) -> Vec<String>
    {
        if self.sudo_command_exists() {
            command.insert(0, self.config.sudo_command.clone());
        }
        command
    }

    /// Whether `package` is installed according to `dpkg --list`.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: the package name is empty or looks like an option
    /// - `Ambiguous`: more than one row matches (multi-arch packages)
    /// - `CommandNotFound`: `dpkg` does not exist
    pub fn is_package_installed(&self, package: &str) -> LinconfResult<bool>
    {
        validate_package(package)?;

        let response = ShellCommand::new(["dpkg", "--list", package])
            .fail_on_error(false)
            .log_settings(CommandLogSettings::quiet())
            .run_with(&self.runner)?;

        let installed = dpkg::parse_installed(&response.stdout, package)?;
        tracing::debug!(package, installed, "package state");
        Ok(installed)
    }

    /// Install `package` unless it is already installed.
    ///
    /// Returns the exit code of the last `apt-get` attempt, or 0 when
    /// nothing had to be done.
    ///
    /// ## Errors
    ///
    /// - `PackageOperationFailed`: every attempt failed and `fail_on_error` is set
    /// - any error of [`PackageManager::is_package_installed`]
    pub fn install_package(&self, package: &str, opts: PackageOptions) -> LinconfResult<i32>
    {
        if self.is_package_installed(package)? && !opts.reinstall {
            tracing::debug!(package, "already installed");
            return Ok(0);
        }

        let mut command = vec![self.config.apt_command.clone(), "install".to_string()];
        if opts.reinstall {
            command.push("--reinstall".to_string());
        }
        command.push(package.to_string());
        command.push("-y".to_string());

        self.run_with_retries(PackageOperation::Install, package, command, opts)
    }

    /// Purge `package` if it is installed.
    ///
    /// Returns the exit code of the last `apt-get` attempt, or 0 when
    /// nothing had to be done. `opts.reinstall` is ignored.
    ///
    /// ## Errors
    ///
    /// - `PackageOperationFailed`: every attempt failed and `fail_on_error` is set
    /// - any error of [`PackageManager::is_package_installed`]
    pub fn uninstall_package(&self, package: &str, opts: PackageOptions) -> LinconfResult<i32>
    {
        if !self.is_package_installed(package)? {
            tracing::debug!(package, "not installed");
            return Ok(0);
        }

        let command = vec![
            self.config.apt_command.clone(),
            "purge".to_string(),
            package.to_string(),
            "-y".to_string(),
        ];

        self.run_with_retries(PackageOperation::Uninstall, package, command, opts)
    }

    /// [`PackageManager::install_package`] for each package, in order.
    ///
    /// Returns the last non-zero exit code, or 0.
    ///
    /// ## Errors
    ///
    /// The first error stops the loop.
    pub fn install_packages<I, S>(&self, packages: I, opts: PackageOptions) -> LinconfResult<i32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exit_code = 0;
        for package in packages {
            let code = self.install_package(package.as_ref(), opts)?;
            if code != 0 {
                exit_code = code;
            }
        }
        Ok(exit_code)
    }

    /// [`PackageManager::uninstall_package`] for each package, in order.
    ///
    /// Returns the last non-zero exit code, or 0.
    ///
    /// ## Errors
    ///
    /// The first error stops the loop.
    pub fn uninstall_packages<I, S>(&self, packages: I, opts: PackageOptions) -> LinconfResult<i32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exit_code = 0;
        for package in packages {
            let code = self.uninstall_package(package.as_ref(), opts)?;
            if code != 0 {
                exit_code = code;
            }
        }
        Ok(exit_code)
    }

    fn run_with_retries(
        &self,
        operation: PackageOperation,
        package: &str,
        command: Vec<String>,
        opts: PackageOptions,
    ) -> LinconfResult<i32>
    {
        let command = if opts.use_sudo { self.prepend_sudo(command) } else { command };
        let log_settings = if opts.quiet {
            CommandLogSettings::quiet()
        } else {
            CommandLogSettings::default()
        };
        let shell_command = ShellCommand::new(command)
            .fail_on_error(false)
            .pass_through(!opts.quiet)
            .log_settings(log_settings);

        let attempts = self.config.number_of_retries.max(1);
        let mut response = ShellResponse::default();
        for attempt in 1..=attempts {
            response = shell_command.run_with(&self.runner)?;
            if response.success() {
                break;
            }
            if opts.quiet {
                tracing::debug!(
                    %operation,
                    package,
                    attempt,
                    attempts,
                    returncode = response.returncode,
                    "package operation failed"
                );
            } else {
                tracing::warn!(
                    %operation,
                    package,
                    attempt,
                    attempts,
                    returncode = response.returncode,
                    "package operation failed"
                );
            }
        }

        if !response.success() && opts.fail_on_error {
            return Err(LinconfError::PackageOperationFailed {
                operation,
                package: package.to_string(),
                returncode: response.returncode,
            });
        }

        Ok(response.returncode)
    }
}

fn validate_package(package: &str) -> LinconfResult<()>
{
    if package.trim().is_empty() || package.starts_with('-') || package.chars().any(char::is_whitespace) {
        return Err(LinconfError::InvalidArgument(format!("invalid package name `{package}`")));
    }
    Ok(())
}
