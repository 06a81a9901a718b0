//! Playback plan: a validated sequence resolved against the catalog and laid
//! out on the slice timeline.

use cadence_core::{ChoreographySequence, MoveInfo, MoveParams, Tempo, Timestamp};

use super::SchedulerError;
use crate::catalog::MoveCatalog;

/// One move in dispatch order
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMove {
    /// Index of the move in the uploaded sequence
    pub index: usize,
    /// Validated instance parameters
    pub params: MoveParams,
    /// Catalog entry for the move type
    pub info: MoveInfo,
}

impl PlannedMove {
    /// First slice of the move on the sequence timeline
    pub fn start_slice(&self) -> u64 {
        u64::from(self.params.start_slice)
    }

    /// Slice just past the move
    pub fn end_slice(&self) -> u64 {
        self.params.end_slice()
    }
}

/// Moves sorted by start slice (ties in upload order) plus the timing anchor
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackPlan {
    pub sequence: String,
    pub tempo: Tempo,
    pub entries: Vec<PlannedMove>,
    pub total_slices: u64,
}

impl PlaybackPlan {
    /// Resolve every move of `sequence` in `catalog`.
    ///
    /// Fails when a move type has disappeared from the catalog since upload.
    pub fn build(
        sequence: &ChoreographySequence,
        catalog: &MoveCatalog,
    ) -> Result<Self, SchedulerError> {
        let mut entries = Vec::with_capacity(sequence.moves.len());
        for index in sequence.timeline_order() {
            let params = sequence.moves[index].clone();
            let info = catalog
                .lookup(&params.type_name)
                .map_err(|_| SchedulerError::UnknownMove {
                    sequence: sequence.name.clone(),
                    move_type: params.type_name.clone(),
                })?
                .clone();
            entries.push(PlannedMove {
                index,
                params,
                info,
            });
        }

        Ok(Self {
            sequence: sequence.name.clone(),
            tempo: sequence.slices_per_minute,
            entries,
            total_slices: sequence.total_slices(),
        })
    }

    /// Slice current at `now` for a session anchored at (`start_time`, `start_slice`).
    ///
    /// Before the start time this is `start_slice`.
    pub fn slice_at(&self, start_time: Timestamp, start_slice: u64, now: Timestamp) -> u64 {
        let elapsed = now.saturating_duration_since(start_time);
        start_slice.saturating_add(self.tempo.duration_to_slice(elapsed))
    }

    /// Instant at which `slice` begins; slices before the anchor map to `start_time`.
    pub fn instant_of(&self, start_time: Timestamp, start_slice: u64, slice: u64) -> Timestamp {
        start_time + self.tempo.slice_to_duration(slice.saturating_sub(start_slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_testkit::fixtures;
    use std::time::Duration;

    fn plan(sequence: &ChoreographySequence) -> PlaybackPlan {
        let catalog = MoveCatalog::new(fixtures::scenario_moves()).unwrap();
        PlaybackPlan::build(sequence, &catalog).unwrap()
    }

    #[test]
    fn entries_follow_start_slice_not_upload_order() {
        let mut sequence = fixtures::scenario_sequence();
        sequence.moves.reverse();
        let plan = plan(&sequence);
        let starts: Vec<u64> = plan.entries.iter().map(PlannedMove::start_slice).collect();
        assert_eq!(starts, vec![0, 4]);
        assert_eq!(plan.entries[0].index, 1);
        assert_eq!(plan.total_slices, 12);
    }

    #[test]
    fn anchor_math_matches_tempo() {
        let plan = plan(&fixtures::scenario_sequence());
        let t0 = Timestamp::from_unix_secs(100);
        assert_eq!(plan.instant_of(t0, 0, 4), t0 + Duration::from_secs(2));
        assert_eq!(plan.slice_at(t0, 0, t0 + Duration::from_millis(1_999)), 3);
        assert_eq!(plan.slice_at(t0, 0, t0 + Duration::from_secs(2)), 4);
        // Offset start: slice 4 is the anchor.
        assert_eq!(plan.instant_of(t0, 4, 8), t0 + Duration::from_secs(2));
        assert_eq!(plan.slice_at(t0, 4, t0), 4);
    }

    #[test]
    fn missing_catalog_entry_is_reported() {
        let mut sequence = fixtures::scenario_sequence();
        sequence.moves[0].type_name = "retired".into();
        let catalog = MoveCatalog::new(fixtures::scenario_moves()).unwrap();
        assert!(matches!(
            PlaybackPlan::build(&sequence, &catalog),
            Err(SchedulerError::UnknownMove { .. })
        ));
    }
}
