//! Health probe port - a lightweight availability check of the synthesis
//! provider. Only success or failure matters; payloads are ignored.

use async_trait::async_trait;
use thiserror::Error;

/// Why a probe failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("Health check unreachable: {0}")]
    Unreachable(String),

    #[error("Health check returned status {0}")]
    Status(u16),
}

/// Single-shot availability check.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> Result<(), ProbeError>;
}
