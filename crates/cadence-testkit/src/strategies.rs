//! Proptest strategies over the fixture catalog

use cadence_core::{ChoreographySequence, MoveParams, Tempo};
use proptest::prelude::*;

use crate::fixtures::{move_at, sequence};

/// Tempos on the 0.001 slices/min grid
pub fn tempo() -> impl Strategy<Value = Tempo> {
    (1_u64..=2_000_000_000).prop_map(|milli| crate::fixtures::tempo(milli as f64 / 1_000.0))
}

/// Chains of touching `step` moves at tempos where a 4-slice step is legal.
///
/// Every generated sequence is valid in strict mode.
pub fn step_chain() -> impl Strategy<Value = ChoreographySequence> {
    (60_u32..=480, 1_usize..8).prop_map(|(spm, count)| {
        let moves = (0..count)
            .map(|i| move_at("step", i as u32 * 4, 4))
            .collect();
        sequence("step-chain", f64::from(spm), moves)
    })
}

fn fixture_move() -> impl Strategy<Value = MoveParams> {
    (
        prop::sample::select(vec!["step", "kneel_circle", "sit_down", "body_sway", "arm_wave"]),
        0_u32..32,
        1_u32..24,
    )
        .prop_map(|(name, start, slices)| move_at(name, start, slices))
}

/// Arbitrary mixes of fixture moves; most are invalid in some way
pub fn mixed_sequence() -> impl Strategy<Value = ChoreographySequence> {
    (
        prop::sample::select(vec![60.0, 90.0, 120.0, 150.5, 240.0]),
        prop::collection::vec(fixture_move(), 1..6),
    )
        .prop_map(|(spm, moves)| sequence("mixed", spm, moves))
}
