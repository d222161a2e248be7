//! Invocations of the application's `manage.py` management commands.

pub mod assets;
pub mod migrator;

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Instant;

use tokio::process::Command;
use tracing::{error, info};

use crate::config::StartupConfig;
use crate::error::{Step, StartupError};

pub use assets::{AssetPipeline, ManagePyAssets};
pub use migrator::{ManagePyMigrator, SchemaMigrator};

/// How to run `python manage.py <args>` for the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagePy {
    python: String,
    manage_py: String,
    app_dir: PathBuf,
    envs: Vec<(String, String)>,
}

impl ManagePy {
    pub fn new(
        python: impl Into<String>,
        manage_py: impl Into<String>,
        app_dir: impl Into<PathBuf>,
        envs: Vec<(String, String)>,
    ) -> Self {
        Self {
            python: python.into(),
            manage_py: manage_py.into(),
            app_dir: app_dir.into(),
            envs,
        }
    }

    pub fn from_config(config: &StartupConfig) -> Self {
        Self::new(
            config.python.clone(),
            config.manage_py.clone(),
            config.app_dir.clone(),
            config.exported_env(),
        )
    }

    /// Build the command; stdio is inherited so tool output lands in the container log.
    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg(&self.manage_py)
            .args(args)
            .current_dir(&self.app_dir)
            .envs(self.envs.iter().map(|(k, v)| (k, v)));
        cmd
    }

    /// Run a management command to completion; any non-zero exit is a failure of `step`.
    pub async fn run(&self, step: Step, args: &[&str]) -> Result<(), StartupError> {
        let start = Instant::now();
        info!(
            "tool=start step={} program={} manage_py={} args={:?}",
            step, self.python, self.manage_py, args
        );

        let status = self
            .command(args)
            .status()
            .await
            .map_err(|source| StartupError::Spawn {
                step,
                program: self.python.clone(),
                source,
            })?;

        if status.success() {
            info!(
                step = %step,
                elapsed_ms = start.elapsed().as_millis(),
                "tool=done"
            );
            Ok(())
        } else {
            let code = exit_code_of(status);
            error!(
                step = %step,
                code = code,
                elapsed_ms = start.elapsed().as_millis(),
                "tool=failed"
            );
            Err(StartupError::StepFailed { step, code })
        }
    }
}

/// Exit code to propagate for a finished child; signals map to 128 + signo.
pub(crate) fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
