use async_trait::async_trait;

use crate::error::{Step, StartupError};
use crate::tools::ManagePy;

/// Capability that produces and publishes static assets.
///
/// Both operations are re-run on every container start and must be idempotent.
#[async_trait]
pub trait AssetPipeline: Send {
    /// Compile stylesheets into the build directory.
    async fn build(&mut self) -> Result<(), StartupError>;

    /// Gather static files into the serving location.
    async fn collect(&mut self) -> Result<(), StartupError>;
}

/// Tailwind build plus `collectstatic`, both via `manage.py`.
pub struct ManagePyAssets {
    manage: ManagePy,
}

impl ManagePyAssets {
    pub fn new(manage: ManagePy) -> Self {
        Self { manage }
    }
}

#[async_trait]
impl AssetPipeline for ManagePyAssets {
    async fn build(&mut self) -> Result<(), StartupError> {
        self.manage.run(Step::CssBuild, &["tailwind", "build"]).await
    }

    async fn collect(&mut self) -> Result<(), StartupError> {
        self.manage
            .run(Step::CollectStatic, &["collectstatic", "--noinput"])
            .await
    }
}
