//! Lease tokens and lease-use results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Proof of exclusive ownership of a robot resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LeaseToken {
    /// Resource the lease covers (e.g. "body")
    pub resource: String,
    /// Arbiter epoch the lease was issued in
    pub epoch: String,
    /// Sub-lease sequence, outermost first
    #[serde(default)]
    pub sequence: Vec<u32>,
}

impl LeaseToken {
    /// Build a token
    pub fn new(resource: impl Into<String>, epoch: impl Into<String>, sequence: Vec<u32>) -> Self {
        Self {
            resource: resource.into(),
            epoch: epoch.into(),
            sequence,
        }
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seq: Vec<String> = self.sequence.iter().map(u32::to_string).collect();
        write!(f, "{}@{}[{}]", self.resource, self.epoch, seq.join("."))
    }
}

/// Arbiter verdict on a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseUseStatus {
    /// Lease is current
    Ok,
    /// Lease is malformed or unknown to the arbiter
    Invalid,
    /// Lease was revoked
    Revoked,
    /// A newer lease supersedes this one
    Older,
    /// Resource is not managed by the arbiter
    Unmanaged,
    /// Lease comes from another epoch
    WrongEpoch,
}

impl LeaseUseStatus {
    /// Whether the lease may be used
    pub fn is_ok(&self) -> bool {
        matches!(self, LeaseUseStatus::Ok)
    }
}

impl fmt::Display for LeaseUseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LeaseUseStatus::Ok => "ok",
            LeaseUseStatus::Invalid => "invalid",
            LeaseUseStatus::Revoked => "revoked",
            LeaseUseStatus::Older => "older",
            LeaseUseStatus::Unmanaged => "unmanaged",
            LeaseUseStatus::WrongEpoch => "wrong epoch",
        })
    }
}

/// Result of presenting a lease, returned alongside execute/abort responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseUseResult {
    /// Verdict
    pub status: LeaseUseStatus,
    /// Lease that was presented
    pub attempted_lease: LeaseToken,
    /// Newest lease the arbiter knows for the resource, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_known_lease: Option<LeaseToken>,
}

impl LeaseUseResult {
    /// Successful use of `lease`
    pub fn ok(lease: LeaseToken) -> Self {
        Self {
            status: LeaseUseStatus::Ok,
            attempted_lease: lease,
            latest_known_lease: None,
        }
    }

    /// Failed use of `lease`
    pub fn denied(lease: LeaseToken, status: LeaseUseStatus) -> Self {
        Self {
            status,
            attempted_lease: lease,
            latest_known_lease: None,
        }
    }

    /// Attach the arbiter's newest lease
    pub fn with_latest_known(mut self, latest: LeaseToken) -> Self {
        self.latest_known_lease = Some(latest);
        self
    }

    /// Whether the lease may be used
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_display_is_compact() {
        let token = LeaseToken::new("body", "epoch-1", vec![3, 1]);
        assert_eq!(token.to_string(), "body@epoch-1[3.1]");
    }

    #[test]
    fn denied_result_is_not_ok() {
        let result = LeaseUseResult::denied(LeaseToken::default(), LeaseUseStatus::Revoked);
        assert!(!result.is_ok());
    }
}
