//! Configuration read from the process environment.

use std::env;
use std::path::PathBuf;

use linconf_core::error::LinconfError;
use linconf_core::packages::{InstallConfig, ENV_APT_COMMAND, ENV_RETRIES, ENV_SUDO_COMMAND};
use linconf_core::user::{current_username, home_dir_current_user};
use serial_test::serial;

fn clear()
{
    for key in [ENV_APT_COMMAND, ENV_SUDO_COMMAND, ENV_RETRIES] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_install_config_from_env()
{
    clear();
    env::set_var(ENV_APT_COMMAND, "apt");
    env::set_var(ENV_RETRIES, "5");

    let config = InstallConfig::from_env().unwrap();
    assert_eq!(config.apt_command, "apt");
    assert_eq!(config.sudo_command, "sudo");
    assert_eq!(config.number_of_retries, 5);

    clear();
}

#[test]
#[serial]
fn test_install_config_rejects_bad_retries()
{
    clear();
    env::set_var(ENV_RETRIES, "-1");

    assert!(matches!(InstallConfig::from_env(), Err(LinconfError::InvalidArgument(_))));

    clear();
}

#[test]
#[serial]
fn test_current_username_prefers_logname()
{
    let saved = env::var("LOGNAME").ok();
    env::set_var("LOGNAME", "linconf-test-user");

    assert_eq!(current_username().unwrap(), "linconf-test-user");

    match saved {
        Some(value) => env::set_var("LOGNAME", value),
        None => env::remove_var("LOGNAME"),
    }
}

#[test]
#[serial]
fn test_home_dir_current_user_follows_logname()
{
    let saved = env::var("LOGNAME").ok();
    env::set_var("LOGNAME", "root");

    let home = home_dir_current_user().unwrap();
    assert!(home == PathBuf::from("/root") || home == PathBuf::from("/var/root"));

    match saved {
        Some(value) => env::set_var("LOGNAME", value),
        None => env::remove_var("LOGNAME"),
    }
}
