//! Parsing of `dpkg --list` output.
//!
//! ```text
//! Desired=Unknown/Install/Remove/Purge/Hold
//! | Status=Not/Inst/Conf-files/Unpacked/halF-conf/Half-inst/trig-aWait/Trig-pend
//! |/ Err?=(none)/Reinst-required (Status,Err: uppercase=bad)
//! ||/ Name           Version      Architecture Description
//! +++-==============-============-============-=================================
//! ii  apt            2.4.11       amd64        commandline package manager
//! ```

use crate::error::{LinconfError, LinconfResult};

/// One package row of `dpkg --list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpkgRow
{
    /// Desired/status/error flags, e.g. `ii`, `rc`, `un`
    pub status: String,
    /// Package name, possibly with an `:arch` suffix
    pub name: String,
}

impl DpkgRow
{
    /// Desired state "install" and status "installed".
    #[must_use]
    pub fn is_installed(&self) -> bool
    {
        self.status.starts_with("ii")
    }
}

/// Rows of `output` that describe `package`.
///
/// Header lines are skipped. A row matches when its name is `package`
/// itself or `package:<arch>`.
#[must_use]
pub fn matching_rows(output: &str, package: &str) -> Vec<DpkgRow>
{
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let status = fields.next()?;
            let name = fields.next()?;
            let is_row = status.len() >= 2 && status.chars().all(|c| c.is_ascii_alphabetic());
            let matches = name == package || name.strip_prefix(package).is_some_and(|rest| rest.starts_with(':'));
            (is_row && matches).then(|| DpkgRow {
                status: status.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

/// Decide from `dpkg --list` output whether `package` is installed.
///
/// ## Errors
///
/// `Ambiguous` if more than one row matches.
pub fn parse_installed(output: &str, package: &str) -> LinconfResult<bool>
{
    let rows = matching_rows(output, package);
    match rows.as_slice() {
        [] => Ok(false),
        [row] => Ok(row.is_installed()),
        _ => Err(LinconfError::Ambiguous(package.to_string())),
    }
}
