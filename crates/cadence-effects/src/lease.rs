//! Static lease arbiter
//!
//! Holds a single current lease per resource. Presenting that exact lease
//! succeeds; anything else is classified against it. Revoking pushes a notice
//! to every subscriber.

use async_trait::async_trait;
use cadence_core::effects::{LeaseEffects, LeaseError, LeaseRevocation};
use cadence_core::{LeaseToken, LeaseUseResult, LeaseUseStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const REVOCATION_CHANNEL_CAPACITY: usize = 16;

/// Arbiter with one operator-configured lease per resource
#[derive(Debug)]
pub struct StaticLeaseArbiter {
    current: RwLock<HashMap<String, LeaseToken>>,
    revocations: broadcast::Sender<LeaseRevocation>,
}

impl StaticLeaseArbiter {
    /// Create an arbiter with no managed resources
    pub fn new() -> Self {
        let (revocations, _) = broadcast::channel(REVOCATION_CHANNEL_CAPACITY);
        Self {
            current: RwLock::new(HashMap::new()),
            revocations,
        }
    }

    /// Create an arbiter that manages the resource of `lease`
    pub fn with_lease(lease: LeaseToken) -> Self {
        let arbiter = Self::new();
        arbiter.grant(lease);
        arbiter
    }

    /// Make `lease` the current lease of its resource
    pub fn grant(&self, lease: LeaseToken) {
        debug!(lease = %lease, "granting lease");
        self.current.write().insert(lease.resource.clone(), lease);
    }

    /// Revoke the current lease of `resource` and notify subscribers
    pub fn revoke(&self, resource: &str, reason: impl Into<String>) -> Option<LeaseToken> {
        let revoked = self.current.write().remove(resource)?;
        let reason = reason.into();
        warn!(lease = %revoked, reason = %reason, "lease revoked");
        // No subscribers is fine; nothing is live.
        let _ = self.revocations.send(LeaseRevocation {
            lease: revoked.clone(),
            reason,
        });
        Some(revoked)
    }

    fn classify(&self, token: &LeaseToken) -> LeaseUseResult {
        let current = self.current.read();
        let Some(held) = current.get(&token.resource) else {
            return LeaseUseResult::denied(token.clone(), LeaseUseStatus::Unmanaged);
        };
        if held == token {
            return LeaseUseResult::ok(token.clone());
        }
        let status = if held.epoch != token.epoch {
            LeaseUseStatus::WrongEpoch
        } else if token.sequence < held.sequence {
            LeaseUseStatus::Older
        } else {
            LeaseUseStatus::Invalid
        };
        LeaseUseResult::denied(token.clone(), status).with_latest_known(held.clone())
    }
}

impl Default for StaticLeaseArbiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeaseEffects for StaticLeaseArbiter {
    async fn validate(&self, token: &LeaseToken) -> Result<LeaseUseResult, LeaseError> {
        Ok(self.classify(token))
    }

    fn subscribe_revocations(&self) -> Option<broadcast::Receiver<LeaseRevocation>> {
        Some(self.revocations.subscribe())
    }
}
