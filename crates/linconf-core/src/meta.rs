//! Package name and version, fixed at compile time.

/// Package name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Package version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The package version.
///
/// ```rust
/// assert_eq!(linconf_core::meta::version(), env!("CARGO_PKG_VERSION"));
/// ```
#[must_use]
pub fn version() -> &'static str
{
    VERSION
}
