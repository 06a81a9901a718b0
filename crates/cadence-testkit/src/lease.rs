//! Scriptable lease arbiter

use async_trait::async_trait;
use cadence_core::{
    LeaseEffects, LeaseError, LeaseRevocation, LeaseToken, LeaseUseResult, LeaseUseStatus,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug)]
struct ArbiterState {
    granted: Mutex<HashSet<LeaseToken>>,
    revoked: Mutex<HashSet<LeaseToken>>,
    unavailable: AtomicBool,
    validations: AtomicUsize,
    revocations: broadcast::Sender<LeaseRevocation>,
}

/// Lease arbiter for tests.
///
/// Only explicitly granted tokens validate. Revoking a token publishes a
/// revocation notice and makes later validations report `Revoked`.
#[derive(Debug, Clone)]
pub struct MockLeaseArbiter {
    state: Arc<ArbiterState>,
}

impl Default for MockLeaseArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLeaseArbiter {
    pub fn new() -> Self {
        let (revocations, _) = broadcast::channel(16);
        Self {
            state: Arc::new(ArbiterState {
                granted: Mutex::new(HashSet::new()),
                revoked: Mutex::new(HashSet::new()),
                unavailable: AtomicBool::new(false),
                validations: AtomicUsize::new(0),
                revocations,
            }),
        }
    }

    /// Arbiter that has granted `token`
    pub fn granting(token: LeaseToken) -> Self {
        let arbiter = Self::new();
        arbiter.grant(token);
        arbiter
    }

    pub fn grant(&self, token: LeaseToken) {
        self.state.revoked.lock().remove(&token);
        self.state.granted.lock().insert(token);
    }

    /// Withdraw `token` and notify subscribers
    pub fn revoke(&self, token: &LeaseToken, reason: &str) {
        self.state.granted.lock().remove(token);
        self.state.revoked.lock().insert(token.clone());
        self.publish_revocation(token, reason);
    }

    /// Notify subscribers without withdrawing `token`, as an arbiter whose
    /// validation lags behind its notices would
    pub fn publish_revocation(&self, token: &LeaseToken, reason: &str) {
        // No subscribers is fine; validation still reports the revocation.
        let _ = self.state.revocations.send(LeaseRevocation {
            lease: token.clone(),
            reason: reason.to_string(),
        });
    }

    /// Withdraw `token` silently, without a notice
    pub fn expire(&self, token: &LeaseToken) {
        self.state.granted.lock().remove(token);
        self.state.revoked.lock().insert(token.clone());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `validate` calls so far
    pub fn validations(&self) -> usize {
        self.state.validations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeaseEffects for MockLeaseArbiter {
    async fn validate(&self, token: &LeaseToken) -> Result<LeaseUseResult, LeaseError> {
        self.state.validations.fetch_add(1, Ordering::SeqCst);
        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(LeaseError::Unavailable {
                reason: "mock arbiter unavailable".into(),
            });
        }
        if self.state.granted.lock().contains(token) {
            return Ok(LeaseUseResult::ok(token.clone()));
        }
        let status = if self.state.revoked.lock().contains(token) {
            LeaseUseStatus::Revoked
        } else {
            LeaseUseStatus::Invalid
        };
        Ok(LeaseUseResult::denied(token.clone(), status))
    }

    fn subscribe_revocations(&self) -> Option<broadcast::Receiver<LeaseRevocation>> {
        Some(self.state.revocations.subscribe())
    }
}
