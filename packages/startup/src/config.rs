//! Startup configuration loaded once from environment variables.
//!
//! Every knob the entrypoint honours lives in [`StartupConfig`]. Values are read
//! a single time at process start and never re-read.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use db_infra::db::{database_url, redact_db_url};
use db_infra::WaitPolicy;
use tracing::info;

use crate::error::StartupError;

pub const SETTINGS_MODULE_VAR: &str = "DJANGO_SETTINGS_MODULE";
pub const DEFAULT_SETTINGS_MODULE: &str = "src.settings";
pub const DEFAULT_STATIC_BUILD_DIR: &str = "theme/static/css/dist";

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    // Application settings profile, exported to every child process
    pub settings_module: String,

    // Skip flags
    pub skip_db_wait: bool,
    pub skip_migrations: bool,
    pub skip_static: bool,
    pub skip_css_build: bool,

    // Database readiness
    pub database_url: Option<String>,
    pub wait: WaitPolicy,
    pub connect_timeout: Duration,
    pub wait_fatal: bool,

    // Tooling
    pub python: String,
    pub manage_py: String,
    pub app_dir: PathBuf,
    pub static_build_dir: PathBuf,
}

impl StartupConfig {
    /// Load and validate configuration from the process environment
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load and validate configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StartupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings_module = lookup(SETTINGS_MODULE_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SETTINGS_MODULE.to_string());

        let skip_db_wait = flag(&lookup, "SKIP_DB_WAIT", false)?;
        let skip_migrations = flag(&lookup, "SKIP_MIGRATIONS", false)?;
        let skip_static = flag(&lookup, "SKIP_COLLECTSTATIC", false)?;
        let skip_css_build = flag(&lookup, "SKIP_CSS_BUILD", false)?;
        let wait_fatal = flag(&lookup, "DB_WAIT_FATAL", true)?;

        // Only required when we actually probe it
        let database_url = if skip_db_wait {
            None
        } else {
            Some(database_url(&lookup)?)
        };

        let max_attempts = number(
            &lookup,
            "DB_WAIT_ATTEMPTS",
            u64::from(WaitPolicy::default().max_attempts),
        )?;
        let max_attempts = u32::try_from(max_attempts)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                StartupError::config(format!(
                    "DB_WAIT_ATTEMPTS must be between 1 and {}, got {max_attempts}",
                    u32::MAX
                ))
            })?;
        let interval_ms = number(
            &lookup,
            "DB_WAIT_INTERVAL_MS",
            WaitPolicy::default().interval.as_millis() as u64,
        )?;
        let connect_timeout_ms =
            number(&lookup, "DB_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS)?;

        let python = string(&lookup, "PYTHON_BIN", "python");
        let manage_py = string(&lookup, "MANAGE_PY", "manage.py");
        let app_dir = PathBuf::from(string(&lookup, "APP_DIR", "."));
        let static_build_dir = PathBuf::from(string(
            &lookup,
            "STATIC_BUILD_DIR",
            DEFAULT_STATIC_BUILD_DIR,
        ));

        Ok(StartupConfig {
            settings_module,
            skip_db_wait,
            skip_migrations,
            skip_static,
            skip_css_build,
            database_url,
            wait: WaitPolicy {
                max_attempts,
                interval: Duration::from_millis(interval_ms),
            },
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            wait_fatal,
            python,
            manage_py,
            app_dir,
            static_build_dir,
        })
    }

    /// Variables exported to every tool and to the handed-off server
    pub fn exported_env(&self) -> Vec<(String, String)> {
        vec![(SETTINGS_MODULE_VAR.to_string(), self.settings_module.clone())]
    }

    /// Asset build directory; relative paths resolve against `app_dir`
    pub fn static_build_path(&self) -> PathBuf {
        if self.static_build_dir.is_absolute() {
            self.static_build_dir.clone()
        } else {
            self.app_dir.join(&self.static_build_dir)
        }
    }

    pub fn log_summary(&self) {
        info!(
            settings_module = %self.settings_module,
            database_url = %self
                .database_url
                .as_deref()
                .map(redact_db_url)
                .unwrap_or_else(|| "-".to_string()),
            skip_db_wait = self.skip_db_wait,
            skip_migrations = self.skip_migrations,
            skip_static = self.skip_static,
            skip_css_build = self.skip_css_build,
            db_wait_attempts = self.wait.max_attempts,
            db_wait_interval_ms = self.wait.interval.as_millis() as u64,
            db_connect_timeout_ms = self.connect_timeout.as_millis() as u64,
            db_wait_fatal = self.wait_fatal,
            app_dir = %self.app_dir.display(),
            static_build_dir = %self.static_build_path().display(),
            "startup configuration"
        );
    }
}

/// Parse a boolean flag.
///
/// `1` and `true` (any case) are true; unset, empty, `0` and `false` are false.
/// Anything else is rejected so a typo never silently flips a step.
pub fn parse_flag(name: &str, value: Option<&str>) -> Result<Option<bool>, StartupError> {
    let Some(raw) = value else {
        return Ok(None);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" => Ok(Some(true)),
        "0" | "false" => Ok(Some(false)),
        _ => Err(StartupError::config(format!(
            "{name} must be one of 1, true, 0, false (case-insensitive), got '{raw}'"
        ))),
    }
}

fn flag<F>(lookup: &F, name: &str, default: bool) -> Result<bool, StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_flag(name, lookup(name).as_deref())?.unwrap_or(default))
}

fn number<F>(lookup: &F, name: &str, default: u64) -> Result<u64, StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
            StartupError::config(format!(
                "{name} must be a non-negative integer, got '{raw}'"
            ))
        }),
    }
}

fn string<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{parse_flag, StartupConfig, DEFAULT_SETTINGS_MODULE};
    use crate::error::StartupError;

    fn config_from(vars: &[(&str, &str)]) -> Result<StartupConfig, StartupError> {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        StartupConfig::from_lookup(|name| map.get(name).map(|v| v.to_string()))
    }

    const DB: (&str, &str) = ("DATABASE_URL", "postgres://prism:secret@db:5432/prism");

    #[test]
    fn defaults_apply_when_only_database_is_set() {
        let config = config_from(&[DB]).unwrap();

        assert_eq!(config.settings_module, DEFAULT_SETTINGS_MODULE);
        assert!(!config.skip_db_wait);
        assert!(!config.skip_migrations);
        assert!(!config.skip_static);
        assert!(!config.skip_css_build);
        assert!(config.wait_fatal);
        assert_eq!(config.wait.max_attempts, 30);
        assert_eq!(config.wait.interval, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.python, "python");
        assert_eq!(config.manage_py, "manage.py");
        assert_eq!(
            config.static_build_path(),
            PathBuf::from("./theme/static/css/dist")
        );
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://prism:secret@db:5432/prism")
        );
    }

    #[test]
    fn settings_module_override_is_exported() {
        let config = config_from(&[DB, ("DJANGO_SETTINGS_MODULE", "src.settings_prod")]).unwrap();

        assert_eq!(config.settings_module, "src.settings_prod");
        assert_eq!(
            config.exported_env(),
            vec![(
                "DJANGO_SETTINGS_MODULE".to_string(),
                "src.settings_prod".to_string()
            )]
        );
    }

    #[test]
    fn database_settings_required_unless_wait_skipped() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, StartupError::Database(_)));
        assert_eq!(err.exit_code(), 2);

        let config = config_from(&[("SKIP_DB_WAIT", "1")]).unwrap();
        assert!(config.skip_db_wait);
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn wait_policy_overrides() {
        let config = config_from(&[
            DB,
            ("DB_WAIT_ATTEMPTS", "5"),
            ("DB_WAIT_INTERVAL_MS", "250"),
            ("DB_CONNECT_TIMEOUT_MS", "750"),
            ("DB_WAIT_FATAL", "false"),
        ])
        .unwrap();

        assert_eq!(config.wait.max_attempts, 5);
        assert_eq!(config.wait.interval, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_millis(750));
        assert!(!config.wait_fatal);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config_from(&[DB, ("DB_WAIT_ATTEMPTS", "0")]).unwrap_err();
        assert!(err.to_string().contains("DB_WAIT_ATTEMPTS"));

        let err = config_from(&[DB, ("DB_WAIT_INTERVAL_MS", "-1")]).unwrap_err();
        assert!(err.to_string().contains("DB_WAIT_INTERVAL_MS"));
    }

    #[test]
    fn absolute_static_dir_ignores_app_dir() {
        let config = config_from(&[
            DB,
            ("APP_DIR", "/app"),
            ("STATIC_BUILD_DIR", "/srv/static/build"),
        ])
        .unwrap();
        assert_eq!(config.static_build_path(), PathBuf::from("/srv/static/build"));

        let config = config_from(&[DB, ("APP_DIR", "/app")]).unwrap();
        assert_eq!(
            config.static_build_path(),
            PathBuf::from("/app/theme/static/css/dist")
        );
    }

    #[test]
    fn flag_truthy_values() {
        for raw in ["1", "true", "TRUE", "True", " true "] {
            assert_eq!(parse_flag("SKIP_MIGRATIONS", Some(raw)).unwrap(), Some(true), "{raw:?}");
        }
    }

    #[test]
    fn flag_falsy_values() {
        assert_eq!(parse_flag("SKIP_MIGRATIONS", None).unwrap(), None);
        assert_eq!(parse_flag("SKIP_MIGRATIONS", Some("")).unwrap(), None);
        for raw in ["0", "false", "FALSE"] {
            assert_eq!(parse_flag("SKIP_MIGRATIONS", Some(raw)).unwrap(), Some(false), "{raw:?}");
        }
    }

    #[test]
    fn flag_unknown_value_names_the_variable() {
        let err = parse_flag("SKIP_COLLECTSTATIC", Some("yes")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SKIP_COLLECTSTATIC"));
        assert!(message.contains("'yes'"));

        let err = config_from(&[DB, ("SKIP_MIGRATIONS", "on")]).unwrap_err();
        assert!(err.to_string().contains("SKIP_MIGRATIONS"));
    }
}
