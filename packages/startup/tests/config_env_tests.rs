//! `StartupConfig::from_env` against the real process environment.

use std::env;

use serial_test::serial;
use startup::{StartupConfig, StartupError};

const VARS: [&str; 8] = [
    "DJANGO_SETTINGS_MODULE",
    "DATABASE_URL",
    "SKIP_DB_WAIT",
    "SKIP_MIGRATIONS",
    "SKIP_COLLECTSTATIC",
    "SKIP_CSS_BUILD",
    "DB_WAIT_FATAL",
    "DB_WAIT_ATTEMPTS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn from_env_reads_flags_and_defaults() {
    clear_env();
    env::set_var("DATABASE_URL", "postgresql://prism:secret@db:5432/prism");
    env::set_var("SKIP_MIGRATIONS", "true");
    env::set_var("SKIP_COLLECTSTATIC", "1");

    let config = StartupConfig::from_env().unwrap();

    assert_eq!(config.settings_module, "src.settings");
    assert!(config.skip_migrations);
    assert!(config.skip_static);
    assert!(!config.skip_db_wait);
    assert!(config.wait_fatal);
    assert_eq!(config.wait.max_attempts, 30);

    clear_env();
}

#[test]
#[serial]
fn from_env_rejects_unknown_flag_value() {
    clear_env();
    env::set_var("SKIP_DB_WAIT", "sometimes");

    let err = StartupConfig::from_env().unwrap_err();
    assert!(matches!(err, StartupError::Config { .. }));
    assert!(err.to_string().contains("SKIP_DB_WAIT"));

    clear_env();
}

#[test]
#[serial]
fn from_env_honours_settings_module() {
    clear_env();
    env::set_var("SKIP_DB_WAIT", "TRUE");
    env::set_var("DJANGO_SETTINGS_MODULE", "src.settings_staging");

    let config = StartupConfig::from_env().unwrap();
    assert_eq!(config.settings_module, "src.settings_staging");
    assert_eq!(config.database_url, None);

    clear_env();
}
