use std::fmt;
use std::io;
use std::path::PathBuf;

use db_infra::DbInfraError;
use thiserror::Error;

/// External tool invocations made during startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Migrate,
    CssBuild,
    CollectStatic,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Migrate => "migrate",
            Step::CssBuild => "css-build",
            Step::CollectStatic => "collectstatic",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Database(#[from] DbInfraError),

    #[error("database still unreachable after {attempts} attempt(s): {last_error}")]
    DatabaseUnreachable { attempts: u32, last_error: String },

    #[error("{step} exited with code {code}")]
    StepFailed { step: Step, code: i32 },

    #[error("failed to launch {step} ({program}): {source}")]
    Spawn {
        step: Step,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create asset directory {}: {source}", path.display())]
    AssetDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to exec {program}: {source}")]
    Handoff {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl StartupError {
    pub fn config(message: impl Into<String>) -> Self {
        StartupError::Config {
            message: message.into(),
        }
    }

    /// Process exit code for this failure.
    ///
    /// Tool failures keep the tool's own code; launch failures follow the shell
    /// convention (127 not found, 126 not executable); configuration errors use 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::Config { .. } => 2,
            StartupError::Database(DbInfraError::Config { .. }) => 2,
            StartupError::Database(DbInfraError::Probe { .. }) => 1,
            StartupError::DatabaseUnreachable { .. } => 1,
            StartupError::StepFailed { code, .. } => *code,
            StartupError::Spawn { source, .. } | StartupError::Handoff { source, .. } => {
                launch_exit_code(source)
            }
            StartupError::AssetDir { .. } => 1,
        }
    }
}

fn launch_exit_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::NotFound => 127,
        _ => 126,
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use db_infra::DbInfraError;

    use super::{Step, StartupError};

    #[test]
    fn step_failures_keep_tool_exit_code() {
        let err = StartupError::StepFailed {
            step: Step::Migrate,
            code: 3,
        };
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "migrate exited with code 3");
    }

    #[test]
    fn launch_failures_follow_shell_convention() {
        let not_found = StartupError::Spawn {
            step: Step::CollectStatic,
            program: "python".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(not_found.exit_code(), 127);

        let denied = StartupError::Handoff {
            program: "gunicorn".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(denied.exit_code(), 126);
    }

    #[test]
    fn config_and_database_codes() {
        assert_eq!(StartupError::config("bad flag").exit_code(), 2);
        assert_eq!(
            StartupError::from(DbInfraError::Config {
                message: "POSTGRES_DB".into()
            })
            .exit_code(),
            2
        );
        assert_eq!(
            StartupError::from(DbInfraError::Probe {
                message: "denied".into()
            })
            .exit_code(),
            1
        );
        assert_eq!(
            StartupError::DatabaseUnreachable {
                attempts: 30,
                last_error: "refused".into()
            }
            .exit_code(),
            1
        );
    }
}
