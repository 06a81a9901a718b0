//! Shared fixtures
//!
//! A small catalog built around the reference scenario: `step` (fixed 4
//! slices, stand → stand) and `kneel_circle` (fixed 8 slices, stand → kneel),
//! plus a few moves covering the other constraint shapes.

use cadence_core::{
    ChoreographySequence, LeaseToken, MoveInfo, MoveParams, MoveParamsKind, MoveParamsPayload,
    Subsystems, Tempo, Timestamp, TransitionState,
};

/// Fixed wall-clock origin for tests
pub const T0: Timestamp = Timestamp::from_unix_secs(1_700_000_000);

/// Tempo of the reference scenario
pub const SCENARIO_TEMPO: f64 = 120.0;

#[allow(clippy::too_many_arguments)]
fn info(
    name: &str,
    length: u32,
    extendable: bool,
    entrance: &[TransitionState],
    exit: TransitionState,
    min_time: f64,
    max_time: f64,
    controls: Subsystems,
    params: MoveParamsKind,
) -> MoveInfo {
    MoveInfo {
        name: name.to_string(),
        move_length_slices: length,
        is_extendable: extendable,
        entrance_states: entrance.iter().copied().collect(),
        exit_state: exit,
        min_time,
        max_time,
        controls,
        params,
    }
}

/// Catalog entries used across the engine tests
///
/// | move           | slices | ext | entrance  | exit    | subsystems |
/// |----------------|--------|-----|-----------|---------|------------|
/// | step           | 4      | no  | stand     | stand   | legs+body  |
/// | kneel_circle   | 8      | no  | stand     | kneel   | legs+body  |
/// | sit_down       | 4      | no  | stand     | sit     | legs+body  |
/// | body_sway      | 4      | yes | stand     | stand   | body       |
/// | arm_wave       | 4      | yes | any       | unknown | arm        |
pub fn scenario_moves() -> Vec<MoveInfo> {
    use TransitionState::{Kneel, Sit, Stand};
    vec![
        info("step", 4, false, &[Stand], Stand, 0.5, 4.0, Subsystems::LEGS_BODY, MoveParamsKind::Step),
        info("kneel_circle", 8, false, &[Stand], Kneel, 1.0, 10.0, Subsystems::LEGS_BODY, MoveParamsKind::KneelCircle),
        info("sit_down", 4, false, &[Stand], Sit, 0.5, 10.0, Subsystems::LEGS_BODY, MoveParamsKind::FrontUp),
        info("body_sway", 4, true, &[Stand], Stand, 0.5, 8.0, Subsystems::BODY, MoveParamsKind::Sway),
        info("arm_wave", 4, true, &TransitionState::ALL, TransitionState::Unknown, 0.1, 30.0, Subsystems::ARM, MoveParamsKind::ArmMove),
    ]
}

pub fn tempo(slices_per_minute: f64) -> Tempo {
    Tempo::from_slices_per_minute(slices_per_minute).expect("positive tempo")
}

/// Instance of a fixture move with its default payload
pub fn move_at(name: &str, start_slice: u32, slices: u32) -> MoveParams {
    let kind = scenario_moves()
        .into_iter()
        .find(|m| m.name == name)
        .map_or(MoveParamsKind::Step, |m| m.params);
    MoveParams::new(name, start_slice, slices, MoveParamsPayload::default_for(kind))
}

pub fn sequence(name: &str, slices_per_minute: f64, moves: Vec<MoveParams>) -> ChoreographySequence {
    ChoreographySequence::new(name, tempo(slices_per_minute), moves)
}

/// step@0, kneel_circle@4 at 120 slices/min
pub fn scenario_sequence() -> ChoreographySequence {
    sequence(
        "scenario",
        SCENARIO_TEMPO,
        vec![move_at("step", 0, 4), move_at("kneel_circle", 4, 8)],
    )
}

/// kneel_circle@0, step@4 at 120 slices/min
pub fn reversed_scenario_sequence() -> ChoreographySequence {
    sequence(
        "reversed",
        SCENARIO_TEMPO,
        vec![move_at("kneel_circle", 0, 8), move_at("step", 4, 4)],
    )
}

/// Lease token most tests grant and present
pub fn lease() -> LeaseToken {
    LeaseToken::new("body", "epoch-1", vec![1])
}
