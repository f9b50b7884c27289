//! Install configuration and per-call options.

use crate::error::{LinconfError, LinconfResult};

/// Overrides the package manager program.
pub const ENV_APT_COMMAND: &str = "LINCONF_APT_COMMAND";
/// Overrides the privilege escalation program.
pub const ENV_SUDO_COMMAND: &str = "LINCONF_SUDO_COMMAND";
/// Overrides the number of attempts per package operation.
pub const ENV_RETRIES: &str = "LINCONF_RETRIES";

/// Programs used for package management and how often to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig
{
    /// Package manager, `apt-get` by default
    pub apt_command: String,
    /// Privilege escalation, `sudo` by default
    pub sudo_command: String,
    /// Attempts per operation (at least 1), 3 by default
    pub number_of_retries: u32,
}

impl Default for InstallConfig
{
    fn default() -> Self
    {
        Self {
            apt_command: "apt-get".to_string(),
            sudo_command: "sudo".to_string(),
            number_of_retries: 3,
        }
    }
}

impl InstallConfig
{
    /// Defaults overridden by `LINCONF_APT_COMMAND`, `LINCONF_SUDO_COMMAND`
    /// and `LINCONF_RETRIES`.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if `LINCONF_RETRIES` is not a number.
    pub fn from_env() -> LinconfResult<Self>
    {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`InstallConfig::from_env`] with an explicit lookup.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if the retry count is not a number.
    pub fn from_lookup<F>(lookup: F) -> LinconfResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(apt) = non_empty(ENV_APT_COMMAND) {
            config.apt_command = apt;
        }
        if let Some(sudo) = non_empty(ENV_SUDO_COMMAND) {
            config.sudo_command = sudo;
        }
        if let Some(retries) = non_empty(ENV_RETRIES) {
            let retries: u32 = retries
                .parse()
                .map_err(|e| LinconfError::InvalidArgument(format!("{ENV_RETRIES}={retries}: {e}")))?;
            config = config.retries(retries);
        }

        Ok(config)
    }

    /// Set the attempt count; 0 is treated as 1.
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self
    {
        self.number_of_retries = retries.max(1);
        self
    }
}

/// How a single install/uninstall call behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageOptions
{
    /// No command logging and no output pass-through
    pub quiet: bool,
    /// Install again even if already installed (install only)
    pub reinstall: bool,
    /// Prefix the command with sudo when sudo exists
    pub use_sudo: bool,
    /// Turn a final non-zero exit code into an error
    pub fail_on_error: bool,
}

impl Default for PackageOptions
{
    fn default() -> Self
    {
        Self {
            quiet: false,
            reinstall: false,
            use_sudo: true,
            fail_on_error: true,
        }
    }
}

impl PackageOptions
{
    /// Default options.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Set `quiet`.
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self
    {
        self.quiet = quiet;
        self
    }

    /// Set `reinstall`.
    #[must_use]
    pub fn reinstall(mut self, reinstall: bool) -> Self
    {
        self.reinstall = reinstall;
        self
    }

    /// Set `use_sudo`.
    #[must_use]
    pub fn use_sudo(mut self, use_sudo: bool) -> Self
    {
        self.use_sudo = use_sudo;
        self
    }

    /// Set `fail_on_error`.
    #[must_use]
    pub fn fail_on_error(mut self, fail_on_error: bool) -> Self
    {
        self.fail_on_error = fail_on_error;
        self
    }
}
