//! # Logging Utilities
//!
//! Logging infrastructure for linconf using `tracing`.
//!
//! This module configures the global `tracing` subscriber. It does not
//! implement any formatting of its own, it only decides which
//! `tracing-subscriber` layers are installed:
//! - Pretty (human-readable) or JSON output
//! - Colored or plain console output
//! - Log level filtering through `RUST_LOG` style directives
//! - Optional daily rolling log file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use linconf_utils::init_logging;
//!
//! // Keep the guard alive for as long as the program logs
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=linconf_core=debug`)
//! - `LINCONF_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `LINCONF_LOG_FILE`: Optional path to a log file (rolled daily)
//! - `LINCONF_LOG_COLOR`: Set to `0`, `false`, `no` or `off` to disable ANSI colors
//!
//! ## Examples
//!
//! ```rust,no_run
//! use linconf_utils::{LogFormat, LogLevel, LogSettings};
//!
//! let _guard = LogSettings::from_env()
//!     .level(LogLevel::Debug)
//!     .format(LogFormat::Json)
//!     .color(false)
//!     .init()
//!     .expect("Failed to initialize logging");
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const ENV_LOG_FORMAT: &str = "LINCONF_LOG_FORMAT";
/// Environment variable naming an optional log file.
pub const ENV_LOG_FILE: &str = "LINCONF_LOG_FILE";
/// Environment variable toggling ANSI colors on the console.
pub const ENV_LOG_COLOR: &str = "LINCONF_LOG_COLOR";
/// Standard `tracing` filter variable.
pub const ENV_RUST_LOG: &str = "RUST_LOG";

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    #[default]
    Pretty,
    /// JSON format, one object per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s}. Use 'pretty' or 'json'"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl From<LogLevel> for LevelFilter
{
    fn from(level: LogLevel) -> Self
    {
        LevelFilter::from_level(level.into())
    }
}

impl std::fmt::Display for LogLevel
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        let name = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            ))),
        }
    }
}

/// Settings for the global subscriber.
///
/// Level precedence when building the filter:
/// 1. An explicit [`LogSettings::level`] (e.g. from a `--log-level` flag)
/// 2. The `RUST_LOG` directive, which may contain module-specific filters
/// 3. `info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings
{
    level: Option<LogLevel>,
    directive: Option<String>,
    format: LogFormat,
    color: bool,
    console: bool,
    file: Option<PathBuf>,
}

impl Default for LogSettings
{
    fn default() -> Self
    {
        Self {
            level: None,
            directive: None,
            format: LogFormat::Pretty,
            color: true,
            console: true,
            file: None,
        }
    }
}

impl LogSettings
{
    /// Settings with defaults and nothing read from the environment.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Settings seeded from the process environment.
    ///
    /// Unparseable values fall back to the defaults, the same way an unset
    /// variable does.
    #[must_use]
    pub fn from_env() -> Self
    {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Settings seeded from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(format) = lookup(ENV_LOG_FORMAT).and_then(|s| s.parse().ok()) {
            settings.format = format;
        }
        settings.directive = lookup(ENV_RUST_LOG).filter(|s| !s.trim().is_empty());
        settings.file = lookup(ENV_LOG_FILE).filter(|s| !s.trim().is_empty()).map(PathBuf::from);
        if let Some(color) = lookup(ENV_LOG_COLOR) {
            settings.color = !matches!(color.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off");
        }

        settings
    }

    /// Force a single level, overriding any `RUST_LOG` directive.
    #[must_use]
    pub fn level(mut self, level: LogLevel) -> Self
    {
        self.level = Some(level);
        self
    }

    /// Use a `RUST_LOG` style directive such as `linconf_core=debug,info`.
    #[must_use]
    pub fn directive(mut self, directive: impl Into<String>) -> Self
    {
        self.directive = Some(directive.into());
        self
    }

    /// Output format for every layer.
    #[must_use]
    pub fn format(mut self, format: LogFormat) -> Self
    {
        self.format = format;
        self
    }

    /// ANSI colors on the console layer. Files never get colors.
    #[must_use]
    pub fn color(mut self, color: bool) -> Self
    {
        self.color = color;
        self
    }

    /// Enable or disable the console (stderr) layer.
    #[must_use]
    pub fn console(mut self, console: bool) -> Self
    {
        self.console = console;
        self
    }

    /// Also write to a daily rolling file at `path`.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self
    {
        self.file = Some(path.into());
        self
    }

    /// Configured format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat
    {
        self.format
    }

    /// Whether the console layer is colored.
    #[must_use]
    pub fn is_colored(&self) -> bool
    {
        self.color
    }

    /// Configured log file, if any.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path>
    {
        self.file.as_deref()
    }

    /// Build the filter these settings describe.
    ///
    /// ## Errors
    ///
    /// Returns [`LoggingError::InvalidLevel`] if the directive does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError>
    {
        if let Some(level) = self.level {
            return Ok(EnvFilter::default().add_directive(LevelFilter::from(level).into()));
        }

        match &self.directive {
            Some(directive) => EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse(directive)
                .map_err(|e| LoggingError::InvalidLevel(format!("{directive}: {e}"))),
            None => Ok(EnvFilter::default().add_directive(LevelFilter::INFO.into())),
        }
    }

    /// Install the global subscriber.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - A global subscriber is already installed
    /// - Neither console nor file output is enabled
    /// - The filter directive is invalid
    /// - The log file directory cannot be created
    pub fn init(self) -> Result<LogGuard, LoggingError>
    {
        let env_filter = self.env_filter()?;
        let mut layers: Vec<BoxedLayer> = Vec::new();

        if self.console {
            layers.push(console_layer(self.format, self.color));
        }

        let mut guard = None;
        let mut file = None;
        if let Some(path) = &self.file {
            let (layer, worker_guard) = file_layer(path, self.format)?;
            layers.push(layer);
            guard = Some(worker_guard);
            file = Some(path.clone());
        }

        if layers.is_empty() {
            return Err(LoggingError::InitializationFailed(
                "no output enabled, enable the console or a log file".to_string(),
            ));
        }

        Registry::default()
            .with(env_filter)
            .with(layers)
            .try_init()
            .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;

        Ok(LogGuard { guard, file })
    }
}

/// Handle returned by a successful initialization.
///
/// Holds the background writer of the file layer. Dropping it flushes and
/// stops file logging, so keep it alive until the program exits.
#[derive(Debug)]
pub struct LogGuard
{
    guard: Option<WorkerGuard>,
    file: Option<PathBuf>,
}

impl LogGuard
{
    /// Whether a file layer was installed.
    #[must_use]
    pub fn has_file(&self) -> bool
    {
        self.guard.is_some()
    }

    /// The configured log file path (the appender adds a date suffix).
    #[must_use]
    pub fn file(&self) -> Option<&Path>
    {
        self.file.as_deref()
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `linconf_core=debug`)
/// - `LINCONF_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `LINCONF_LOG_FILE`: Optional path to log file
/// - `LINCONF_LOG_COLOR`: Disable colors with `0`/`false`/`no`/`off`
///
/// ## Errors
///
/// Returns an error if logging is already initialized, `RUST_LOG` is not a
/// valid filter, or file logging fails.
pub fn init_logging() -> Result<LogGuard, LoggingError>
{
    LogSettings::from_env().init()
}

/// Initialize logging with explicit level and format
///
/// The log file and color settings are still read from the environment.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LogGuard, LoggingError>
{
    LogSettings::from_env().level(level).format(format).init()
}

fn console_layer(format: LogFormat, color: bool) -> BoxedLayer
{
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(io::stderr);

    match format {
        LogFormat::Pretty => layer.with_ansi(color).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_ansi(false)
            .boxed(),
    }
}

fn file_layer(path: &Path, format: LogFormat) -> Result<(BoxedLayer, WorkerGuard), LoggingError>
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidFile(path.display().to_string()))?
        .to_string_lossy()
        .into_owned();

    std::fs::create_dir_all(&directory)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .build(&directory)
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false); // No ANSI in files

    let layer = match format {
        LogFormat::Pretty => layer.boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    };

    Ok((layer, guard))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level or filter directive
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Log file path has no file name
    #[error("Invalid log file path: {0}")]
    InvalidFile(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
