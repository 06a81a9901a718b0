//! Lease gate
//!
//! Every execute and abort passes through the gate before it may touch the
//! scheduler. The gate forwards the caller's token to the lease arbiter and
//! turns the verdict into either an admission or a `LeaseDenied` carrying the
//! arbiter's lease-use result. The scheduler reuses the gate on every dispatch
//! tick so a lease revoked after admission stops dispatch before the next move.

use std::sync::Arc;

use cadence_core::{LeaseEffects, LeaseRevocation, LeaseToken, LeaseUseResult, LeaseUseStatus};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Lease check failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("lease {} denied ({}): {reason}", .result.attempted_lease, .result.status)]
pub struct LeaseDenied {
    /// Arbiter verdict (or a synthesized one when the arbiter was unreachable)
    pub result: LeaseUseResult,
    pub reason: String,
}

impl From<LeaseDenied> for cadence_core::CadenceError {
    fn from(denied: LeaseDenied) -> Self {
        cadence_core::CadenceError::lease(denied.to_string())
    }
}

/// Exclusive-ownership check in front of the scheduler
#[derive(Clone)]
pub struct LeaseGate {
    arbiter: Arc<dyn LeaseEffects>,
}

impl std::fmt::Debug for LeaseGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaseGate").finish_non_exhaustive()
    }
}

impl LeaseGate {
    pub fn new(arbiter: Arc<dyn LeaseEffects>) -> Self {
        Self { arbiter }
    }

    /// Check `token` with the arbiter.
    ///
    /// An unreachable arbiter counts as a denial with status `Invalid`.
    pub async fn admit(&self, token: &LeaseToken) -> Result<LeaseUseResult, LeaseDenied> {
        match self.arbiter.validate(token).await {
            Ok(result) if result.is_ok() => {
                debug!(lease = %token, "lease admitted");
                Ok(result)
            }
            Ok(result) => {
                warn!(lease = %token, status = %result.status, "lease denied");
                let reason = match &result.latest_known_lease {
                    Some(latest) => format!("arbiter reports {} (latest {latest})", result.status),
                    None => format!("arbiter reports {}", result.status),
                };
                Err(LeaseDenied { result, reason })
            }
            Err(err) => {
                warn!(lease = %token, error = %err, "lease arbiter unreachable");
                Err(LeaseDenied {
                    result: LeaseUseResult::denied(token.clone(), LeaseUseStatus::Invalid),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Revocation notices, when the arbiter pushes them
    pub fn revocations(&self) -> Option<broadcast::Receiver<LeaseRevocation>> {
        self.arbiter.subscribe_revocations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_testkit::MockLeaseArbiter;

    #[tokio::test]
    async fn valid_token_is_admitted() {
        let token = LeaseToken::new("body", "e1", vec![1]);
        let gate = LeaseGate::new(Arc::new(MockLeaseArbiter::granting(token.clone())));
        let result = gate.admit(&token).await.unwrap();
        assert_eq!(result.status, LeaseUseStatus::Ok);
    }

    #[tokio::test]
    async fn unknown_token_is_denied_with_result() {
        let granted = LeaseToken::new("body", "e1", vec![2]);
        let presented = LeaseToken::new("body", "e1", vec![1]);
        let gate = LeaseGate::new(Arc::new(MockLeaseArbiter::granting(granted)));

        let denied = gate.admit(&presented).await.unwrap_err();
        assert!(!denied.result.is_ok());
        assert_eq!(denied.result.attempted_lease, presented);
    }

    #[tokio::test]
    async fn unreachable_arbiter_is_a_denial() {
        let arbiter = MockLeaseArbiter::new();
        arbiter.set_unavailable(true);
        let token = LeaseToken::new("body", "e1", vec![1]);
        let gate = LeaseGate::new(Arc::new(arbiter));

        let denied = gate.admit(&token).await.unwrap_err();
        assert_eq!(denied.result.status, LeaseUseStatus::Invalid);
        assert!(denied.reason.contains("unavailable"));
    }
}
