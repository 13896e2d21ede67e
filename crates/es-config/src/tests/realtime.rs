use crate::Config;
use crate::tests::{EnvGuard, setup_config_dir};

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok};
use serial_test::serial;

#[test]
#[serial]
fn given_channel_buffer_zero_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _buffer = EnvGuard::set("ESPRIT_REALTIME_CHANNEL_BUFFER", "0");

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_heartbeat_below_min_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _heartbeat = EnvGuard::set("ESPRIT_REALTIME_HEARTBEAT_INTERVAL_SECS", "1");

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_reconnect_attempts_zero_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _attempts = EnvGuard::set("ESPRIT_RECONNECT_MAX_ATTEMPTS", "0");

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_backoff_multiplier_below_min_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _multiplier = EnvGuard::set("ESPRIT_RECONNECT_BACKOFF_MULTIPLIER", "0.5");

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_jitter_disabled_by_env_when_load_then_false() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _jitter = EnvGuard::set("ESPRIT_RECONNECT_JITTER", "false");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.realtime.reconnect.jitter, eq(false));
    assert_that!(config.validate(), ok(anything()));
}
