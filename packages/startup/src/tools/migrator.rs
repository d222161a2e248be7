use async_trait::async_trait;

use crate::error::{Step, StartupError};
use crate::tools::ManagePy;

/// Capability that brings the database schema up to date.
///
/// Implementations must be idempotent: the migrator runs on every container start.
#[async_trait]
pub trait SchemaMigrator: Send {
    async fn migrate(&mut self) -> Result<(), StartupError>;
}

/// `python manage.py migrate --noinput`
pub struct ManagePyMigrator {
    manage: ManagePy,
}

impl ManagePyMigrator {
    pub fn new(manage: ManagePy) -> Self {
        Self { manage }
    }
}

#[async_trait]
impl SchemaMigrator for ManagePyMigrator {
    async fn migrate(&mut self) -> Result<(), StartupError> {
        self.manage.run(Step::Migrate, &["migrate", "--noinput"]).await
    }
}
