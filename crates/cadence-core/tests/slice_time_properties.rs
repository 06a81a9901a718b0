//! Property tests for slice/time conversion
//!
//! - Round trip: a whole slice count converted to seconds (or a duration) and
//!   back is unchanged, for every representable tempo and every `u32` slice.
//! - Monotonicity: later instants never map to earlier slices.

use cadence_core::{seconds_to_slice, slice_to_seconds, Tempo};
use proptest::prelude::*;
use std::time::Duration;

/// Tempos on the 0.001 slices/min grid, from very slow to very fast
fn tempo_strategy() -> impl Strategy<Value = Tempo> {
    (1_u64..=2_000_000_000).prop_map(|milli| {
        Tempo::from_slices_per_minute(milli as f64 / 1_000.0).unwrap()
    })
}

proptest! {
    #[test]
    fn seconds_round_trip_is_exact(tempo in tempo_strategy(), slice in any::<u32>()) {
        let seconds = slice_to_seconds(slice, tempo);
        prop_assert_eq!(seconds_to_slice(seconds, tempo), slice);
    }

    #[test]
    fn duration_round_trip_is_exact(tempo in tempo_strategy(), slice in 0_u64..=10_000_000) {
        let duration = tempo.slice_to_duration(slice);
        prop_assert_eq!(tempo.duration_to_slice(duration), slice);
    }

    #[test]
    fn slice_boundaries_are_never_early(tempo in tempo_strategy(), slice in 1_u64..=1_000_000) {
        let boundary = tempo.slice_to_duration(slice);
        if boundary > Duration::ZERO {
            let just_before = boundary - Duration::from_nanos(1);
            prop_assert!(tempo.duration_to_slice(just_before) < slice);
        }
    }

    #[test]
    fn duration_to_slice_is_monotonic(tempo in tempo_strategy(), a in 0_u64..=10_000_000_000, b in 0_u64..=10_000_000_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            tempo.duration_to_slice(Duration::from_nanos(lo))
                <= tempo.duration_to_slice(Duration::from_nanos(hi))
        );
    }
}

#[test]
fn whole_tempos_match_fractional_constructor() {
    let whole = Tempo::from_whole(std::num::NonZeroU64::new(120).unwrap());
    assert_eq!(whole, Tempo::from_slices_per_minute(120.0).unwrap());
}
