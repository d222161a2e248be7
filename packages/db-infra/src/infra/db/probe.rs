use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DbErr};
use tracing::trace;

/// Outcome of a single failed probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The database could not be reached yet. Retryable.
    Unreachable(String),
    /// Any other failure. Never retried.
    Fatal(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Unreachable(message) => write!(f, "database unreachable: {message}"),
            ProbeError::Fatal(message) => write!(f, "database probe error: {message}"),
        }
    }
}

/// Capability to check whether the primary data store accepts connections.
#[async_trait]
pub trait DatabaseProbe: Send {
    /// Open a connection, verify it, and release it again.
    async fn probe(&mut self) -> Result<(), ProbeError>;
}

/// Probe backed by a short-lived single-connection sea-orm pool.
pub struct SeaOrmProbe {
    url: String,
    connect_timeout: Duration,
}

impl SeaOrmProbe {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            connect_timeout,
        }
    }
}

#[async_trait]
impl DatabaseProbe for SeaOrmProbe {
    async fn probe(&mut self) -> Result<(), ProbeError> {
        let mut opt = ConnectOptions::new(self.url.clone());
        opt.min_connections(1)
            .max_connections(1)
            .connect_timeout(self.connect_timeout)
            .acquire_timeout(self.connect_timeout)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await.map_err(classify)?;
        let pinged = conn.ping().await.map_err(classify);

        if let Err(e) = conn.close().await {
            trace!(error = %e, "probe connection close failed");
        }

        pinged
    }
}

/// Connection and pool-acquire failures mean "not up yet"; everything else is fatal.
pub(crate) fn classify(err: DbErr) -> ProbeError {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => ProbeError::Unreachable(err.to_string()),
        other => ProbeError::Fatal(other.to_string()),
    }
}
