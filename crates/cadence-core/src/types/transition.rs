//! Robot posture at move boundaries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CadenceError;

/// Posture the robot is in when a move begins or ends.
///
/// Consecutive moves on a shared subsystem must agree: the earlier move's exit
/// state has to be one of the later move's entrance states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    /// Posture not known (e.g. before the first move)
    #[default]
    Unknown,
    /// Standing on four legs
    Stand,
    /// Kneeling on the hind legs
    Kneel,
    /// Sitting
    Sit,
    /// Lying sprawled
    Sprawl,
}

impl TransitionState {
    /// All states in declaration order
    pub const ALL: [TransitionState; 5] = [
        TransitionState::Unknown,
        TransitionState::Stand,
        TransitionState::Kneel,
        TransitionState::Sit,
        TransitionState::Sprawl,
    ];

    /// Lowercase name used in configuration files and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionState::Unknown => "unknown",
            TransitionState::Stand => "stand",
            TransitionState::Kneel => "kneel",
            TransitionState::Sit => "sit",
            TransitionState::Sprawl => "sprawl",
        }
    }

    /// Whether the posture is known
    pub fn is_known(&self) -> bool {
        !matches!(self, TransitionState::Unknown)
    }
}

impl fmt::Display for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionState {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransitionState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CadenceError::invalid(format!("unknown transition state '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Kneel".parse::<TransitionState>().unwrap(), TransitionState::Kneel);
        assert!("crouch".parse::<TransitionState>().is_err());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&TransitionState::Sprawl).unwrap();
        assert_eq!(json, "\"sprawl\"");
    }
}
