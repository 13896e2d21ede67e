use crate::tests::setup_config_dir;
use crate::{Config, PlanLimits};

use es_core::Plan;

use googletest::assert_that;
use googletest::prelude::{anything, eq, err};
use serial_test::serial;

#[test]
fn test_default_plan_limits() {
    let plans = Config::default().plans;

    assert_eq!(plans.limits(Plan::Free), PlanLimits { scans: 5, tokens: 100_000 });
    assert_eq!(plans.limits(Plan::Pro), PlanLimits { scans: 50, tokens: 1_000_000 });
    assert_eq!(
        plans.limits(Plan::Team),
        PlanLimits { scans: 999_999, tokens: 10_000_000 }
    );
}

#[test]
#[serial]
fn given_plan_override_in_toml_when_load_then_used() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(
        temp.path().join("config.toml"),
        r#"
            [plans.free]
            scans = 10
            tokens = 200000
        "#,
    )
    .unwrap();

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.plans.free.scans, eq(10));
    assert_that!(config.plans.pro.scans, eq(50));
}

#[test]
#[serial]
fn given_zero_plan_limit_when_validate_then_error() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(
        temp.path().join("config.toml"),
        r#"
            [plans.pro]
            scans = 0
            tokens = 10
        "#,
    )
    .unwrap();

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}
