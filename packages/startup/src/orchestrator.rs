//! The startup sequence itself.
//!
//! Steps run strictly in order: database wait, migration, asset preparation,
//! then the [`Handoff`] is returned for the caller to exec. Each step can be
//! switched off with its skip flag; the first failing step ends startup.

use std::ffi::OsString;
use std::time::Instant;

use db_infra::db::redact_db_url;
use db_infra::{readiness_counters, wait_for_database, DatabaseProbe, SeaOrmProbe, WaitOutcome};
use tracing::{info, warn};

use crate::config::StartupConfig;
use crate::error::StartupError;
use crate::handoff::Handoff;
use crate::tools::{AssetPipeline, ManagePy, ManagePyAssets, ManagePyMigrator, SchemaMigrator};

/// Create a builder for the startup sequence
pub fn startup(config: StartupConfig) -> StartupBuilder {
    StartupBuilder {
        config,
        probe: None,
        migrator: None,
        assets: None,
    }
}

pub struct StartupBuilder {
    config: StartupConfig,
    probe: Option<Box<dyn DatabaseProbe>>,
    migrator: Option<Box<dyn SchemaMigrator>>,
    assets: Option<Box<dyn AssetPipeline>>,
}

impl StartupBuilder {
    pub fn with_probe<P: DatabaseProbe + 'static>(mut self, probe: P) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    pub fn with_migrator<M: SchemaMigrator + 'static>(mut self, migrator: M) -> Self {
        self.migrator = Some(Box::new(migrator));
        self
    }

    pub fn with_assets<A: AssetPipeline + 'static>(mut self, assets: A) -> Self {
        self.assets = Some(Box::new(assets));
        self
    }

    /// Fill every collaborator not set explicitly with the production implementation
    pub fn with_defaults(mut self) -> Self {
        if self.probe.is_none() {
            if let Some(url) = &self.config.database_url {
                self.probe = Some(Box::new(SeaOrmProbe::new(
                    url.clone(),
                    self.config.connect_timeout,
                )));
            }
        }

        let manage = ManagePy::from_config(&self.config);
        if self.migrator.is_none() {
            self.migrator = Some(Box::new(ManagePyMigrator::new(manage.clone())));
        }
        if self.assets.is_none() {
            self.assets = Some(Box::new(ManagePyAssets::new(manage)));
        }
        self
    }

    /// Check that every enabled step has a collaborator
    pub fn build(self) -> Result<Startup, StartupError> {
        if !self.config.skip_db_wait && self.probe.is_none() {
            return Err(StartupError::config(
                "database wait is enabled but no database probe is configured",
            ));
        }
        if !self.config.skip_migrations && self.migrator.is_none() {
            return Err(StartupError::config(
                "migrations are enabled but no schema migrator is configured",
            ));
        }
        if !self.config.skip_static && self.assets.is_none() {
            return Err(StartupError::config(
                "static assets are enabled but no asset pipeline is configured",
            ));
        }

        Ok(Startup {
            config: self.config,
            probe: self.probe,
            migrator: self.migrator,
            assets: self.assets,
        })
    }
}

pub struct Startup {
    config: StartupConfig,
    probe: Option<Box<dyn DatabaseProbe>>,
    migrator: Option<Box<dyn SchemaMigrator>>,
    assets: Option<Box<dyn AssetPipeline>>,
}

impl Startup {
    pub fn config(&self) -> &StartupConfig {
        &self.config
    }

    /// Run every enabled step, then return the handoff for `command`.
    ///
    /// The command is validated before any step runs.
    pub async fn run(mut self, command: Vec<OsString>) -> Result<Handoff, StartupError> {
        let handoff = Handoff::new(command, self.config.exported_env())?;
        let start = Instant::now();

        info!(
            "startup=begin settings_module={} program={}",
            self.config.settings_module,
            handoff.program().to_string_lossy()
        );

        self.await_database().await?;
        self.migrate().await?;
        self.prepare_assets().await?;

        info!(
            elapsed_ms = start.elapsed().as_millis(),
            "startup=ready"
        );
        Ok(handoff)
    }

    async fn await_database(&mut self) -> Result<(), StartupError> {
        if self.config.skip_db_wait {
            info!("startup=skip step=db-wait flag=SKIP_DB_WAIT");
            return Ok(());
        }
        let probe = self
            .probe
            .as_mut()
            .ok_or_else(|| StartupError::config("no database probe configured"))?;

        info!(
            "startup=step step=db-wait url={} max_attempts={} interval_ms={}",
            self.config
                .database_url
                .as_deref()
                .map(redact_db_url)
                .unwrap_or_default(),
            self.config.wait.max_attempts,
            self.config.wait.interval.as_millis()
        );

        let outcome = wait_for_database(&mut **probe, self.config.wait).await;
        readiness_counters::log_snapshot("startup_db_wait");

        match outcome? {
            WaitOutcome::Ready { attempts } => {
                info!(attempts = attempts, "database ready");
                Ok(())
            }
            WaitOutcome::Exhausted {
                attempts,
                last_error,
            } if self.config.wait_fatal => Err(StartupError::DatabaseUnreachable {
                attempts,
                last_error,
            }),
            WaitOutcome::Exhausted { attempts, .. } => {
                warn!(
                    attempts = attempts,
                    "startup=continue db_ready=false reason=DB_WAIT_FATAL=false"
                );
                Ok(())
            }
        }
    }

    async fn migrate(&mut self) -> Result<(), StartupError> {
        if self.config.skip_migrations {
            info!("startup=skip step=migrate flag=SKIP_MIGRATIONS");
            return Ok(());
        }
        let migrator = self
            .migrator
            .as_mut()
            .ok_or_else(|| StartupError::config("no schema migrator configured"))?;

        info!("startup=step step=migrate");
        migrator.migrate().await
    }

    async fn prepare_assets(&mut self) -> Result<(), StartupError> {
        if self.config.skip_static {
            info!("startup=skip step=assets flag=SKIP_COLLECTSTATIC");
            return Ok(());
        }
        let assets = self
            .assets
            .as_mut()
            .ok_or_else(|| StartupError::config("no asset pipeline configured"))?;

        let dir = self.config.static_build_path();
        info!("startup=step step=assets dir={}", dir.display());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StartupError::AssetDir {
                path: dir.clone(),
                source,
            })?;

        if self.config.skip_css_build {
            info!("startup=skip step=css-build flag=SKIP_CSS_BUILD");
        } else {
            assets.build().await?;
        }
        assets.collect().await
    }
}
