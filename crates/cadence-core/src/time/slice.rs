//! Slice/time conversion
//!
//! A slice is the smallest schedulable unit of a sequence; the tempo fixes how
//! many slices fit in a minute. Conversions are pure and exact for every
//! representable tempo:
//!
//! - `slice → Duration` rounds *up* to the next nanosecond, so the instant of a
//!   slice boundary is never reported early.
//! - `Duration → slice` truncates (rounds toward zero).
//!
//! Together these make `duration_to_slice(slice_to_duration(s)) == s` hold for
//! every slice count, which the scheduler relies on when it sleeps until a
//! boundary and then recomputes the current slice.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;

use crate::CadenceError;

/// Tempo resolution: slices-per-minute are stored in thousandths.
const MILLI: u128 = 1_000;
const NANOS_PER_MINUTE: u128 = 60_000_000_000;
/// Relative distance to an integer under which a float slice count is treated
/// as sitting exactly on the boundary.
const BOUNDARY_EPSILON: f64 = 1e-12;

/// Sequence tempo in slices per minute, stored with 0.001 resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tempo {
    millislices_per_minute: NonZeroU64,
}

impl Tempo {
    /// Build a tempo from a slices-per-minute value.
    ///
    /// The value is rounded to the nearest thousandth; zero, negative and
    /// non-finite tempos are rejected.
    pub fn from_slices_per_minute(slices_per_minute: f64) -> Result<Self, CadenceError> {
        if !slices_per_minute.is_finite() || slices_per_minute <= 0.0 {
            return Err(CadenceError::invalid(format!(
                "tempo must be a positive number of slices per minute, got {slices_per_minute}"
            )));
        }
        let scaled = (slices_per_minute * MILLI as f64).round();
        if scaled > u64::MAX as f64 {
            return Err(CadenceError::invalid(format!(
                "tempo {slices_per_minute} exceeds the supported range"
            )));
        }
        NonZeroU64::new(scaled as u64)
            .map(|millislices_per_minute| Self {
                millislices_per_minute,
            })
            .ok_or_else(|| {
                CadenceError::invalid(format!(
                    "tempo {slices_per_minute} is below the 0.001 slices/min resolution"
                ))
            })
    }

    /// Build a tempo from whole slices per minute
    pub fn from_whole(slices_per_minute: NonZeroU64) -> Self {
        Self {
            millislices_per_minute: NonZeroU64::new(
                slices_per_minute.get().saturating_mul(MILLI as u64),
            )
            .unwrap_or(NonZeroU64::MAX),
        }
    }

    /// Slices per minute
    pub fn slices_per_minute(&self) -> f64 {
        self.millislices_per_minute.get() as f64 / MILLI as f64
    }

    /// Tempo in thousandths of a slice per minute
    pub fn millislices_per_minute(&self) -> u64 {
        self.millislices_per_minute.get()
    }

    /// Wall-clock length of `slices` slices, rounded up to the nanosecond.
    pub fn slice_to_duration(&self, slices: u64) -> Duration {
        let numerator = u128::from(slices) * NANOS_PER_MINUTE * MILLI;
        let denominator = u128::from(self.millislices_per_minute.get());
        let nanos = numerator.div_ceil(denominator);
        duration_from_nanos(nanos)
    }

    /// Whole slices elapsed in `elapsed`, rounded toward zero.
    pub fn duration_to_slice(&self, elapsed: Duration) -> u64 {
        let numerator = elapsed.as_nanos() * u128::from(self.millislices_per_minute.get());
        let slices = numerator / (NANOS_PER_MINUTE * MILLI);
        u64::try_from(slices).unwrap_or(u64::MAX)
    }

    /// Fractional slice count for a duration in seconds
    fn slices_in(&self, seconds: f64) -> f64 {
        seconds * self.slices_per_minute() / 60.0
    }

    /// Smallest whole slice count lasting at least `seconds`
    pub fn min_slices_covering(&self, seconds: f64) -> u32 {
        let exact = self.slices_in(seconds);
        let slices = snap_to_boundary(exact).unwrap_or_else(|| exact.ceil());
        clamp_to_u32(slices)
    }

    /// Largest whole slice count lasting at most `seconds`
    pub fn max_slices_within(&self, seconds: f64) -> u32 {
        let exact = self.slices_in(seconds);
        let slices = snap_to_boundary(exact).unwrap_or_else(|| exact.floor());
        clamp_to_u32(slices)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} slices/min", self.slices_per_minute())
    }
}

impl Serialize for Tempo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.slices_per_minute())
    }
}

impl<'de> Deserialize<'de> for Tempo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Tempo::from_slices_per_minute(value).map_err(serde::de::Error::custom)
    }
}

/// Seconds spanned by `slice` slices: `slice * 60 / slices_per_minute`.
///
/// Slice counts are `u32` like every slice in a sequence, so the product is
/// exact in an `f64` and [`seconds_to_slice`] recovers it unchanged.
pub fn slice_to_seconds(slice: u32, tempo: Tempo) -> f64 {
    f64::from(slice) * 60.0 / tempo.slices_per_minute()
}

/// Inverse of [`slice_to_seconds`], rounding toward zero.
///
/// Values within floating-point noise of a slice boundary resolve to that
/// boundary so round-tripping a whole slice count is exact. Negative spans
/// clamp to zero and spans past `u32::MAX` slices clamp to `u32::MAX`.
pub fn seconds_to_slice(seconds: f64, tempo: Tempo) -> u32 {
    let exact = tempo.slices_in(seconds);
    clamp_to_u32(snap_to_boundary(exact).unwrap_or_else(|| exact.trunc()))
}

fn snap_to_boundary(exact: f64) -> Option<f64> {
    let nearest = exact.round();
    let tolerance = BOUNDARY_EPSILON * nearest.abs().max(1.0);
    ((exact - nearest).abs() <= tolerance).then_some(nearest)
}

fn clamp_to_u32(slices: f64) -> u32 {
    if slices <= 0.0 {
        0
    } else if slices >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        slices as u32
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = nanos / 1_000_000_000;
    let subsec = (nanos % 1_000_000_000) as u32;
    match u64::try_from(secs) {
        Ok(secs) => Duration::new(secs, subsec),
        Err(_) => Duration::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempo(spm: f64) -> Tempo {
        Tempo::from_slices_per_minute(spm).unwrap()
    }

    #[test]
    fn rejects_non_positive_tempo() {
        assert!(Tempo::from_slices_per_minute(0.0).is_err());
        assert!(Tempo::from_slices_per_minute(-4.0).is_err());
        assert!(Tempo::from_slices_per_minute(f64::NAN).is_err());
        assert!(Tempo::from_slices_per_minute(0.0001).is_err());
    }

    #[test]
    fn four_slices_at_120_is_two_seconds() {
        let t = tempo(120.0);
        assert_eq!(slice_to_seconds(4, t), 2.0);
        assert_eq!(t.slice_to_duration(4), Duration::from_secs(2));
        assert_eq!(seconds_to_slice(2.0, t), 4);
    }

    #[test]
    fn partial_slices_round_toward_zero() {
        let t = tempo(120.0);
        assert_eq!(seconds_to_slice(1.99, t), 3);
        assert_eq!(seconds_to_slice(-1.99, t), 0);
        assert_eq!(t.duration_to_slice(Duration::from_millis(499)), 0);
        assert_eq!(t.duration_to_slice(Duration::from_millis(500)), 1);
    }

    #[test]
    fn largest_slice_count_round_trips_through_seconds() {
        for spm in [0.001, 7.0, 120.0, 2_000_000.0] {
            let t = tempo(spm);
            assert_eq!(seconds_to_slice(slice_to_seconds(u32::MAX, t), t), u32::MAX);
        }
        assert_eq!(seconds_to_slice(f64::MAX, tempo(120.0)), u32::MAX);
    }

    #[test]
    fn awkward_tempo_round_trips_through_duration() {
        let t = tempo(7.0);
        for s in [1_u64, 2, 3, 7, 1000, 123_457] {
            assert_eq!(t.duration_to_slice(t.slice_to_duration(s)), s);
        }
    }

    #[test]
    fn slice_window_snaps_exact_boundaries() {
        let t = tempo(120.0);
        assert_eq!(t.min_slices_covering(2.0), 4);
        assert_eq!(t.min_slices_covering(2.1), 5);
        assert_eq!(t.max_slices_within(2.1), 4);
        assert_eq!(t.max_slices_within(-1.0), 0);
    }

    #[test]
    fn tempo_serializes_as_plain_number() {
        let json = serde_json::to_string(&tempo(96.5)).unwrap();
        assert_eq!(json, "96.5");
        let parsed: Tempo = serde_json::from_str("120").unwrap();
        assert_eq!(parsed, tempo(120.0));
        assert!(serde_json::from_str::<Tempo>("0").is_err());
    }
}
