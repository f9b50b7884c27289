//! Package management driven by a scripted runner instead of apt/dpkg.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use linconf_core::error::{LinconfError, LinconfResult, PackageOperation};
use linconf_core::packages::{InstallConfig, PackageManager, PackageOptions};
use linconf_core::shell::{CommandLogSettings, CommandRunner, ShellCommand, ShellResponse};
use tracing_subscriber::fmt::MakeWriter;

/// A tiny fake of bash, dpkg and apt-get.
#[derive(Default)]
struct FakeHost
{
    sudo: bool,
    installed: RefCell<HashSet<String>>,
    /// Packages apt-get fails on this many more times
    flaky: RefCell<HashMap<String, u32>>,
    /// Packages apt-get never finds
    unknown: HashSet<String>,
    calls: RefCell<Vec<Vec<String>>>,
    /// Pass-through flag and log settings of every apt-get call
    apt_modes: RefCell<Vec<(bool, CommandLogSettings)>>,
}

impl FakeHost
{
    fn with_installed(packages: &[&str]) -> Self
    {
        let host = Self::default();
        host.installed.borrow_mut().extend(packages.iter().map(ToString::to_string));
        host
    }

    fn apt_calls(&self) -> Vec<Vec<String>>
    {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.iter().any(|a| a == "apt-get"))
            .cloned()
            .collect()
    }

    fn apt(&self, args: &[String]) -> ShellResponse
    {
        let package = &args[args.len() - 2];
        if self.unknown.contains(package) {
            return ShellResponse::new(100, "", format!("E: Unable to locate package {package}\n"));
        }
        if let Some(remaining) = self.flaky.borrow_mut().get_mut(package) {
            if *remaining > 0 {
                *remaining -= 1;
                return ShellResponse::new(100, "", "E: Could not get lock /var/lib/dpkg/lock-frontend\n");
            }
        }
        match args[1].as_str() {
            "install" => {
                self.installed.borrow_mut().insert(package.clone());
            }
            "purge" => {
                self.installed.borrow_mut().remove(package);
            }
            other => panic!("unexpected apt-get action {other}"),
        }
        ShellResponse::new(0, "", "")
    }
}

impl CommandRunner for FakeHost
{
    fn execute(&self, command: &ShellCommand) -> LinconfResult<ShellResponse>
    {
        let args = command.args().to_vec();
        self.calls.borrow_mut().push(args.clone());

        let args: Vec<String> = if is_sudo(&args[0]) { args[1..].to_vec() } else { args };
        let response = match args[0].as_str() {
            "bash" if self.sudo && matches!(args[2].as_str(), "type -t sudo" | "type -t /usr/bin/sudo") => {
                ShellResponse::new(0, "file\n", "")
            }
            "bash" if self.sudo && matches!(args[2].as_str(), "command -v sudo" | "command -v /usr/bin/sudo") => {
                ShellResponse::new(0, "/usr/bin/sudo\n", "")
            }
            "bash" => ShellResponse::new(1, "", ""),
            "dpkg" => {
                let package = &args[2];
                if self.installed.borrow().contains(package) {
                    ShellResponse::new(0, format!("ii  {package}  1.0  amd64  fake package\n"), "")
                } else {
                    ShellResponse::new(1, "", format!("dpkg-query: no packages found matching {package}\n"))
                }
            }
            "apt-get" => {
                self.apt_modes.borrow_mut().push((command.is_pass_through(), command.logging()));
                self.apt(&args)
            }
            other => return Err(LinconfError::CommandNotFound(other.to_string())),
        };
        Ok(response)
    }
}

fn is_sudo(program: &str) -> bool
{
    matches!(program, "sudo" | "/usr/bin/sudo")
}

/// Collects formatted log lines written while a subscriber is the default.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer
{
    fn contents(&self) -> String
    {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn capture<T>(&self, f: impl FnOnce() -> T) -> T
    {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }
}

impl Write for LogBuffer
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>
    {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()>
    {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer
{
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer
    {
        self.clone()
    }
}

fn quiet() -> PackageOptions
{
    PackageOptions::new().quiet(true)
}

#[test]
fn test_is_package_installed()
{
    let manager = PackageManager::with_runner(FakeHost::with_installed(&["apt"]), InstallConfig::default());
    assert!(manager.is_package_installed("apt").unwrap());
    assert!(!manager.is_package_installed("unknown").unwrap());
}

#[test]
fn test_invalid_package_names()
{
    let manager = PackageManager::with_runner(FakeHost::default(), InstallConfig::default());
    for name in ["", "  ", "--purge", "two words"] {
        assert!(matches!(manager.is_package_installed(name), Err(LinconfError::InvalidArgument(_))));
    }
    assert!(manager.runner().calls.borrow().is_empty());
}

#[test]
fn test_install_missing_package()
{
    let manager = PackageManager::with_runner(FakeHost::default(), InstallConfig::default());
    assert_eq!(manager.install_package("dialog", quiet()).unwrap(), 0);
    assert!(manager.is_package_installed("dialog").unwrap());
    assert_eq!(
        manager.runner().apt_calls(),
        vec![vec!["apt-get", "install", "dialog", "-y"]]
    );
}

#[test]
fn test_install_skips_installed_package()
{
    let manager = PackageManager::with_runner(FakeHost::with_installed(&["dialog"]), InstallConfig::default());
    assert_eq!(manager.install_package("dialog", quiet()).unwrap(), 0);
    assert!(manager.runner().apt_calls().is_empty());
}

#[test]
fn test_reinstall_runs_even_if_installed()
{
    let manager = PackageManager::with_runner(FakeHost::with_installed(&["dialog"]), InstallConfig::default());
    assert_eq!(manager.install_package("dialog", quiet().reinstall(true)).unwrap(), 0);
    assert_eq!(
        manager.runner().apt_calls(),
        vec![vec!["apt-get", "install", "--reinstall", "dialog", "-y"]]
    );
}

#[test]
fn test_sudo_is_prepended_when_available()
{
    let host = FakeHost {
        sudo: true,
        ..FakeHost::default()
    };
    let manager = PackageManager::with_runner(host, InstallConfig::default());
    manager.install_package("dialog", quiet()).unwrap();
    manager.uninstall_package("dialog", quiet()).unwrap();

    assert_eq!(
        manager.runner().apt_calls(),
        vec![
            vec!["sudo", "apt-get", "install", "dialog", "-y"],
            vec!["sudo", "apt-get", "purge", "dialog", "-y"],
        ]
    );

    // sudo lookup happens once per manager
    let lookups = manager.runner().calls.borrow().iter().filter(|c| c[0] == "bash").count();
    assert_eq!(lookups, 2);
}

#[test]
fn test_sudo_skipped_when_missing_or_disabled()
{
    let manager = PackageManager::with_runner(FakeHost::default(), InstallConfig::default());
    assert_eq!(manager.prepend_sudo(vec!["apt-get".to_string()]), vec!["apt-get"]);

    let host = FakeHost {
        sudo: true,
        ..FakeHost::default()
    };
    let manager = PackageManager::with_runner(host, InstallConfig::default());
    manager.install_package("dialog", quiet().use_sudo(false)).unwrap();
    assert_eq!(manager.runner().apt_calls(), vec![vec!["apt-get", "install", "dialog", "-y"]]);
}

#[test]
fn test_sudo_given_as_absolute_path()
{
    let host = FakeHost {
        sudo: true,
        ..FakeHost::default()
    };
    let manager = PackageManager::with_runner(
        host,
        InstallConfig {
            sudo_command: "/usr/bin/sudo".to_string(),
            ..InstallConfig::default()
        },
    );
    assert!(manager.sudo_command_exists());
    assert_eq!(manager.prepend_sudo(vec!["apt-get".to_string()]), vec!["/usr/bin/sudo", "apt-get"]);

    manager.install_package("dialog", quiet()).unwrap();
    assert_eq!(
        manager.runner().apt_calls(),
        vec![vec!["/usr/bin/sudo", "apt-get", "install", "dialog", "-y"]]
    );
}

#[test]
fn test_quiet_disables_logging_and_pass_through()
{
    let manager = PackageManager::with_runner(FakeHost::default(), InstallConfig::default());
    manager.install_package("dialog", quiet()).unwrap();
    manager.uninstall_package("dialog", PackageOptions::new()).unwrap();

    assert_eq!(
        *manager.runner().apt_modes.borrow(),
        vec![(false, CommandLogSettings::quiet()), (true, CommandLogSettings::default())]
    );
}

#[test]
fn test_quiet_failures_are_not_logged_as_warnings()
{
    let host = FakeHost {
        unknown: HashSet::from(["nope".to_string()]),
        ..FakeHost::default()
    };
    let manager = PackageManager::with_runner(host, InstallConfig::default().retries(2));

    let logs = LogBuffer::default();
    let code = logs.capture(|| manager.install_package("nope", quiet().fail_on_error(false)).unwrap());
    assert_eq!(code, 100);
    assert_eq!(logs.contents(), "");

    let logs = LogBuffer::default();
    logs.capture(|| manager.install_package("nope", PackageOptions::new().fail_on_error(false)).unwrap());
    let output = logs.contents();
    assert!(output.contains("WARN"));
    assert!(output.contains("package operation failed"));
}

#[test]
fn test_retries_until_success()
{
    let host = FakeHost::default();
    host.flaky.borrow_mut().insert("dialog".to_string(), 2);
    let manager = PackageManager::with_runner(host, InstallConfig::default());

    assert_eq!(manager.install_package("dialog", quiet()).unwrap(), 0);
    assert_eq!(manager.runner().apt_calls().len(), 3);
}

#[test]
fn test_unknown_package_fails_after_retries()
{
    let host = FakeHost {
        unknown: HashSet::from(["unknown".to_string()]),
        ..FakeHost::default()
    };
    let manager = PackageManager::with_runner(host, InstallConfig::default().retries(2));

    let err = manager.install_package("unknown", quiet()).unwrap_err();
    assert_eq!(err.to_string(), "Install Package \"unknown\" failed");
    assert!(matches!(
        err,
        LinconfError::PackageOperationFailed { operation: PackageOperation::Install, returncode: 100, .. }
    ));
    assert_eq!(err.exit_code(), 100);
    assert_eq!(manager.runner().apt_calls().len(), 2);

    let code = manager.install_package("unknown", quiet().fail_on_error(false)).unwrap();
    assert_eq!(code, 100);
}

#[test]
fn test_uninstall()
{
    let manager = PackageManager::with_runner(FakeHost::with_installed(&["dialog"]), InstallConfig::default());
    assert_eq!(manager.uninstall_package("dialog", quiet()).unwrap(), 0);
    assert!(!manager.is_package_installed("dialog").unwrap());

    // nothing to do the second time
    assert_eq!(manager.uninstall_package("dialog", quiet()).unwrap(), 0);
    assert_eq!(manager.runner().apt_calls().len(), 1);
}

#[test]
fn test_uninstall_failure()
{
    let host = FakeHost::with_installed(&["dialog"]);
    host.flaky.borrow_mut().insert("dialog".to_string(), 10);
    let manager = PackageManager::with_runner(host, InstallConfig::default());

    let err = manager.uninstall_package("dialog", quiet()).unwrap_err();
    assert_eq!(err.to_string(), "Uninstall Package \"dialog\" failed");
    assert_eq!(manager.runner().apt_calls().len(), 3);
}

#[test]
fn test_bulk_operations_return_last_failure()
{
    let host = FakeHost {
        unknown: HashSet::from(["nope".to_string(), "nada".to_string()]),
        ..FakeHost::default()
    };
    let manager = PackageManager::with_runner(host, InstallConfig::default().retries(1));
    let opts = quiet().fail_on_error(false);

    let code = manager.install_packages(["dialog", "nope", "curl", "nada"], opts).unwrap();
    assert_eq!(code, 100);
    assert!(manager.is_package_installed("dialog").unwrap());
    assert!(manager.is_package_installed("curl").unwrap());

    assert_eq!(manager.uninstall_packages(["dialog", "curl"], opts).unwrap(), 0);
    assert!(!manager.is_package_installed("curl").unwrap());
}

#[test]
fn test_bulk_install_stops_on_first_error()
{
    let host = FakeHost {
        unknown: HashSet::from(["nope".to_string()]),
        ..FakeHost::default()
    };
    let manager = PackageManager::with_runner(host, InstallConfig::default().retries(1));

    assert!(manager.install_packages(["nope", "dialog"], quiet()).is_err());
    assert!(!manager.is_package_installed("dialog").unwrap());
}

#[test]
fn test_custom_apt_command_is_used()
{
    let manager = PackageManager::with_runner(
        FakeHost::default(),
        InstallConfig {
            apt_command: "apt".to_string(),
            ..InstallConfig::default()
        },
    );
    let err = manager.install_package("dialog", quiet()).unwrap_err();
    assert!(matches!(err, LinconfError::CommandNotFound(ref p) if p == "apt"));
}
