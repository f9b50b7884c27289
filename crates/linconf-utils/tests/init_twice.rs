//! A second global subscriber must be refused, not panic.

use linconf_utils::{LogFormat, LogLevel, LogSettings, LoggingError};

#[test]
fn test_second_init_is_rejected()
{
    let _guard = LogSettings::new()
        .level(LogLevel::Info)
        .format(LogFormat::Pretty)
        .color(false)
        .init()
        .expect("first init should succeed");

    let err = LogSettings::new().level(LogLevel::Debug).init().expect_err("second init should fail");
    assert!(matches!(err, LoggingError::InitializationFailed(_)));
}
