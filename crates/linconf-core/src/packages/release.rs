//! Codename of the running distribution (`focal`, `bookworm`, ...).

use std::fs;
use std::io;

use crate::error::{LinconfError, LinconfResult};
use crate::shell::{CommandLogSettings, CommandRunner, ShellCommand, SystemRunner};

/// Where systemd-era distributions describe themselves.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Codename of the running distribution.
///
/// ## Errors
///
/// See [`linux_release_name_with`].
pub fn linux_release_name() -> LinconfResult<String>
{
    linux_release_name_with(&SystemRunner, OS_RELEASE_PATH)
}

/// Codename from `os_release`, falling back to `lsb_release -c -s`.
///
/// ## Errors
///
/// - `CommandNotFound`: no codename in the file and no `lsb_release`
/// - `CommandFailed`: `lsb_release` failed
/// - `InvalidArgument`: `lsb_release` printed nothing
pub fn linux_release_name_with<R>(runner: &R, os_release: &str) -> LinconfResult<String>
where
    R: CommandRunner + ?Sized,
{
    match fs::read_to_string(os_release) {
        Ok(text) => {
            if let Some(codename) = parse_os_release_codename(&text) {
                return Ok(codename);
            }
            tracing::debug!(path = os_release, "no codename in os-release");
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = os_release, "os-release not found");
        }
        Err(e) => return Err(e.into()),
    }

    let response = ShellCommand::new(["lsb_release", "-c", "-s"])
        .log_settings(CommandLogSettings::quiet())
        .run_with(runner)?;
    let codename = response.stdout.trim();
    if codename.is_empty() {
        return Err(LinconfError::InvalidArgument("lsb_release returned no codename".to_string()));
    }
    Ok(codename.to_string())
}

/// Extract `VERSION_CODENAME`, or `UBUNTU_CODENAME`, from os-release text.
///
/// Values may be quoted with single or double quotes; empty values count
/// as missing.
#[must_use]
pub fn parse_os_release_codename(text: &str) -> Option<String>
{
    let value_of = |key: &str| {
        text.lines().find_map(|line| {
            let (k, v) = line.trim().split_once('=')?;
            if k.trim() != key {
                return None;
            }
            let v = v.trim().trim_matches(|c| c == '"' || c == '\'').trim();
            (!v.is_empty()).then(|| v.to_string())
        })
    };

    value_of("VERSION_CODENAME").or_else(|| value_of("UBUNTU_CODENAME"))
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::shell::ShellResponse;

    struct Lsb(&'static str);

    impl CommandRunner for Lsb
    {
        fn execute(&self, command: &ShellCommand) -> LinconfResult<ShellResponse>
        {
            assert_eq!(command.program(), Some("lsb_release"));
            Ok(ShellResponse::new(0, self.0, ""))
        }
    }

    #[test]
    fn test_parse_version_codename()
    {
        let text = "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nVERSION_CODENAME=jammy\nUBUNTU_CODENAME=jammy\n";
        assert_eq!(parse_os_release_codename(text).as_deref(), Some("jammy"));
    }

    #[test]
    fn test_parse_falls_back_to_ubuntu_codename()
    {
        let text = "NAME=Ubuntu\nVERSION_CODENAME=\"\"\nUBUNTU_CODENAME='focal'\n";
        assert_eq!(parse_os_release_codename(text).as_deref(), Some("focal"));
    }

    #[test]
    fn test_parse_missing()
    {
        assert_eq!(parse_os_release_codename("NAME=Arch Linux\nID=arch\n"), None);
    }

    #[test]
    fn test_missing_file_uses_lsb_release()
    {
        let name = linux_release_name_with(&Lsb("bookworm\n"), "/nonexistent/os-release").unwrap();
        assert_eq!(name, "bookworm");
    }

    #[test]
    fn test_empty_lsb_release()
    {
        let err = linux_release_name_with(&Lsb(""), "/nonexistent/os-release").unwrap_err();
        assert!(matches!(err, LinconfError::InvalidArgument(_)));
    }
}
