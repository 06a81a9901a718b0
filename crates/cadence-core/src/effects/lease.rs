//! Lease arbitration effect interface.
//!
//! The arbiter owns the lease lifecycle. Cadence only asks whether a token is
//! currently valid and listens for revocations while a session is live.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{LeaseToken, LeaseUseResult};
use crate::CadenceError;

/// Errors talking to the lease arbiter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum LeaseError {
    #[error("lease arbiter unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<LeaseError> for CadenceError {
    fn from(err: LeaseError) -> Self {
        CadenceError::lease(err.to_string())
    }
}

/// Notice that a lease stopped being valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRevocation {
    /// Revoked lease
    pub lease: LeaseToken,
    /// Arbiter-supplied reason
    pub reason: String,
}

/// Exclusive-ownership arbiter.
#[async_trait]
pub trait LeaseEffects: Send + Sync {
    /// Check whether `token` currently grants ownership
    async fn validate(&self, token: &LeaseToken) -> Result<LeaseUseResult, LeaseError>;

    /// Stream of asynchronous revocation notices, when the arbiter pushes them
    fn subscribe_revocations(&self) -> Option<broadcast::Receiver<LeaseRevocation>> {
        None
    }
}

/// Blanket implementation for Arc<T> where T: LeaseEffects
#[async_trait]
impl<T: LeaseEffects + ?Sized> LeaseEffects for std::sync::Arc<T> {
    async fn validate(&self, token: &LeaseToken) -> Result<LeaseUseResult, LeaseError> {
        (**self).validate(token).await
    }

    fn subscribe_revocations(&self) -> Option<broadcast::Receiver<LeaseRevocation>> {
        (**self).subscribe_revocations()
    }
}
