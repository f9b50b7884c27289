//! # Logging Helpers
//!
//! Small conveniences on top of the `tracing` macros for call sites that
//! only know the level at runtime, want to log a whole error chain, or want
//! a message to stand out in the log as a banner.
//!
//! ```rust
//! use linconf_utils::{banner, log_level, LogLevel};
//!
//! log_level(Some(LogLevel::Warn), "disk almost full");
//! log_level(None, "this is never emitted");
//!
//! let text = banner("done", 20);
//! assert!(text.starts_with("****"));
//! ```

use std::error::Error;

use crate::logging::LogLevel;

/// Smallest inner width a banner is drawn with.
pub const MIN_BANNER_WIDTH: usize = 10;

/// Default inner width for [`log_banner`].
pub const DEFAULT_BANNER_WIDTH: usize = 76;

/// Emit `message` at a level chosen at runtime.
///
/// `None` means "do not log", which lets a caller silence a code path
/// without branching around every log statement.
pub fn log_level(level: Option<LogLevel>, message: &str)
{
    match level {
        Some(LogLevel::Error) => tracing::error!("{message}"),
        Some(LogLevel::Warn) => tracing::warn!("{message}"),
        Some(LogLevel::Info) => tracing::info!("{message}"),
        Some(LogLevel::Debug) => tracing::debug!("{message}"),
        Some(LogLevel::Trace) => tracing::trace!("{message}"),
        None => {}
    }
}

/// Render an error and all of its sources, outermost first.
///
/// ```rust
/// use linconf_utils::format_error_chain;
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
/// assert_eq!(format_error_chain(&err), "boom");
/// ```
#[must_use]
pub fn format_error_chain(error: &(dyn Error + 'static)) -> String
{
    error_chain(error).join(": caused by: ")
}

/// Log `error` and every error in its `source()` chain at ERROR level.
///
/// Returns the number of entries that were logged.
pub fn log_error_chain(context: &str, error: &(dyn Error + 'static)) -> usize
{
    let chain = error_chain(error);
    tracing::error!(context, "{}", chain[0]);
    for (depth, cause) in chain.iter().enumerate().skip(1) {
        tracing::error!(context, depth, "caused by: {cause}");
    }
    chain.len()
}

fn error_chain(error: &(dyn Error + 'static)) -> Vec<String>
{
    let mut chain = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

/// Draw `message` inside a box of `*`.
///
/// Words are wrapped to `width` columns (never less than
/// [`MIN_BANNER_WIDTH`]); explicit line breaks in the message are kept, and
/// words longer than the width are split.
#[must_use]
pub fn banner(message: &str, width: usize) -> String
{
    let width = width.max(MIN_BANNER_WIDTH);
    let border = "*".repeat(width + 4);

    let mut out = String::with_capacity((width + 5) * 4);
    out.push_str(&border);
    out.push('\n');
    for line in wrap(message, width) {
        out.push_str(&format!("* {line:<width$} *\n"));
    }
    out.push_str(&border);
    out
}

/// Log each line of a [`banner`] at `level`.
pub fn log_banner(level: Option<LogLevel>, message: &str)
{
    if level.is_none() {
        return;
    }
    for line in banner(message, DEFAULT_BANNER_WIDTH).lines() {
        log_level(level, line);
    }
}

fn wrap(message: &str, width: usize) -> Vec<String>
{
    let mut lines = Vec::new();

    for paragraph in message.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                lines.push(word.drain(..width).collect());
            }
            let word: String = word.into_iter().collect();
            let needed = if current.is_empty() { word.chars().count() } else { current.chars().count() + 1 + word.chars().count() };
            if needed > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
