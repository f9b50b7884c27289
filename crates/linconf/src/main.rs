use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use linconf_core::bash::get_bash_command;
use linconf_core::packages::{linux_release_name, PackageManager, PackageOptions};
use linconf_core::shell::CommandRunner;
use linconf_core::user::{current_username, home_dir_current_user, home_dir_of};
use linconf_core::LinconfResult;
use linconf_utils::{debug, format_error_chain, log_error_chain, LogFormat, LogGuard, LogLevel, LogSettings, LoggingError};

/// Convenience commands for configuring Linux hosts.
#[derive(Parser, Debug)]
#[command(name = "linconf")]
#[command(version)]
#[command(about = "Convenience commands for configuring Linux hosts", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Log format (pretty or json); overrides LINCONF_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
    /// Disable colored log output
    #[arg(long, global = true, default_value_t = false)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Print the codename of the running distribution
    ReleaseName,
    /// Install packages with apt-get (skips installed ones)
    Install
    {
        /// Packages to install
        #[arg(required = true)]
        packages: Vec<String>,
        /// Reinstall packages that are already installed
        #[arg(long, default_value_t = false)]
        reinstall: bool,
        #[command(flatten)]
        flags: PackageFlags,
    },
    /// Purge packages with apt-get (skips missing ones)
    Uninstall
    {
        /// Packages to purge
        #[arg(required = true)]
        packages: Vec<String>,
        #[command(flatten)]
        flags: PackageFlags,
    },
    /// Print whether a package is installed (exit code 0 if it is)
    IsInstalled
    {
        /// Package name
        package: String,
    },
    /// Show how bash resolves a command name
    BashCommand
    {
        /// Command name
        name: String,
    },
    /// Print the home directory of a user (default: the current user)
    Home
    {
        /// User name
        user: Option<String>,
    },
    /// Print the name of the current user
    Whoami,
}

#[derive(Args, Debug, Clone, Copy)]
struct PackageFlags
{
    /// Do not log commands or show apt-get output
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
    /// Never prefix apt-get with sudo
    #[arg(long, default_value_t = false)]
    no_sudo: bool,
    /// Continue with the next package when one fails
    #[arg(long, default_value_t = false)]
    keep_going: bool,
}

impl PackageFlags
{
    fn options(self) -> PackageOptions
    {
        PackageOptions::new()
            .quiet(self.quiet)
            .use_sudo(!self.no_sudo)
            .fail_on_error(!self.keep_going)
    }
}

fn main() -> ExitCode
{
    let cli = Cli::parse();

    // CLI flags take precedence over the environment
    let _guard = match init_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", format_error_chain(&e));
            return ExitCode::FAILURE;
        }
    };

    debug!(command = ?cli.command, "dispatching");
    let code = match run_command(cli.command, PackageManager::from_env, &mut io::stdout().lock()) {
        Ok(code) => code,
        Err(e) => {
            log_error_chain("linconf", &e);
            e.exit_code()
        }
    };

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn init_logging(cli: &Cli) -> Result<LogGuard, LoggingError>
{
    let mut settings = LogSettings::from_env();
    if let Some(level) = cli.log_level {
        settings = settings.level(level);
    }
    if let Some(format) = cli.log_format {
        settings = settings.format(format);
    }
    if cli.no_color {
        settings = settings.color(false);
    }
    settings.init()
}

/// Run one subcommand, printing its result to `out`.
///
/// `packages` is only called by the package subcommands, so a bad
/// `LINCONF_*` variable does not break `whoami` or `home`.
fn run_command<R, F, W>(command: Commands, packages: F, out: &mut W) -> LinconfResult<i32>
where
    R: CommandRunner,
    F: FnOnce() -> LinconfResult<PackageManager<R>>,
    W: Write,
{
    match command {
        Commands::ReleaseName => {
            writeln!(out, "{}", linux_release_name()?)?;
            Ok(0)
        }
        Commands::Install { packages: names, reinstall, flags } => {
            packages()?.install_packages(&names, flags.options().reinstall(reinstall))
        }
        Commands::Uninstall { packages: names, flags } => packages()?.uninstall_packages(&names, flags.options()),
        Commands::IsInstalled { package } => {
            let installed = packages()?.is_package_installed(&package)?;
            writeln!(out, "{installed}")?;
            Ok(i32::from(!installed))
        }
        Commands::BashCommand { name } => {
            let command = get_bash_command(&name)?;
            writeln!(out, "type: {}", command.command_type)?;
            writeln!(out, "command: {}", command.command_string)?;
            Ok(0)
        }
        Commands::Home { user } => {
            let home = match user {
                Some(user) => home_dir_of(&user)?,
                None => home_dir_current_user()?,
            };
            writeln!(out, "{}", home.display())?;
            Ok(0)
        }
        Commands::Whoami => {
            writeln!(out, "{}", current_username()?)?;
            Ok(0)
        }
    }
}
