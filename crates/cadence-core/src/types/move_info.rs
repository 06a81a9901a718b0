//! Catalog entry describing a move type and its physical constraints

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::params::MoveParamsKind;
use super::subsystem::Subsystems;
use super::transition::TransitionState;
use crate::time::Tempo;

/// Declared constraints of one move type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveInfo {
    /// Unique move type name
    pub name: String,
    /// Natural length of the move in slices
    pub move_length_slices: u32,
    /// Whether the move may be stretched to a different slice count
    #[serde(default)]
    pub is_extendable: bool,
    /// Postures the move may start from
    pub entrance_states: BTreeSet<TransitionState>,
    /// Posture the move leaves the robot in
    pub exit_state: TransitionState,
    /// Shortest allowed duration in seconds
    pub min_time: f64,
    /// Longest allowed duration in seconds
    pub max_time: f64,
    /// Subsystems the move drives
    #[serde(flatten)]
    pub controls: Subsystems,
    /// Parameter payload kind the move accepts
    pub params: MoveParamsKind,
}

impl MoveInfo {
    /// Whether a move ending in `state` can be followed by this move
    pub fn admits(&self, state: TransitionState) -> bool {
        self.entrance_states.contains(&state)
    }

    /// Whether a duration in seconds lies within the declared bounds
    pub fn duration_in_bounds(&self, seconds: f64) -> bool {
        seconds >= self.min_time && seconds <= self.max_time
    }

    /// Admissible slice counts at `tempo`, or `None` when no whole slice count
    /// fits between `min_time` and `max_time`.
    pub fn slice_bounds(&self, tempo: Tempo) -> Option<(u32, u32)> {
        let min = tempo.min_slices_covering(self.min_time);
        let max = tempo.max_slices_within(self.max_time);
        (min <= max).then_some((min, max))
    }

    /// Entrance states as a comma separated list for diagnostics
    pub fn entrance_list(&self) -> String {
        self.entrance_states
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kneel_circle() -> MoveInfo {
        MoveInfo {
            name: "kneel_circle".into(),
            move_length_slices: 8,
            is_extendable: false,
            entrance_states: [TransitionState::Stand].into_iter().collect(),
            exit_state: TransitionState::Kneel,
            min_time: 1.0,
            max_time: 10.0,
            controls: Subsystems::LEGS_BODY,
            params: MoveParamsKind::KneelCircle,
        }
    }

    #[test]
    fn admits_only_declared_entrance_states() {
        let info = kneel_circle();
        assert!(info.admits(TransitionState::Stand));
        assert!(!info.admits(TransitionState::Kneel));
        assert_eq!(info.entrance_list(), "stand");
    }

    #[test]
    fn slice_bounds_follow_tempo() {
        let info = kneel_circle();
        let tempo = Tempo::from_slices_per_minute(120.0).unwrap();
        // 1s..10s at 2 slices per second
        assert_eq!(info.slice_bounds(tempo), Some((2, 20)));
    }

    #[test]
    fn subsystem_flags_are_flattened_on_the_wire() {
        let json = serde_json::to_value(kneel_circle()).unwrap();
        assert_eq!(json["legs"], serde_json::Value::Bool(true));
        assert_eq!(json["arm"], serde_json::Value::Bool(false));
    }
}
