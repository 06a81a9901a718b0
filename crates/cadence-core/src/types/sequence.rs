//! Choreography sequences and their move instances
//!
//! Two shapes exist: the typed form used everywhere inside the engine, and the
//! loosely typed upload record mirroring the external message layout. Records
//! are converted (and structurally checked) by the sequence validator.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::params::{MoveParamsPayload, MoveParamsSlots};
use crate::time::Tempo;

/// One timed instance of a move inside a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveParams {
    /// Move type; resolves against the catalog
    #[serde(rename = "type")]
    pub type_name: String,
    /// First slice the move occupies
    pub start_slice: u32,
    /// Number of slices the move occupies
    pub requested_slices: u32,
    /// Move-specific parameters
    pub payload: MoveParamsPayload,
}

impl MoveParams {
    /// Build a move instance
    pub fn new(
        type_name: impl Into<String>,
        start_slice: u32,
        requested_slices: u32,
        payload: MoveParamsPayload,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            start_slice,
            requested_slices,
            payload,
        }
    }

    /// Slice just past the move's last slice
    pub fn end_slice(&self) -> u64 {
        u64::from(self.start_slice) + u64::from(self.requested_slices)
    }

    /// Half-open slice range the move occupies
    pub fn slice_range(&self) -> Range<u64> {
        u64::from(self.start_slice)..self.end_slice()
    }
}

/// Named, tempo-bound collection of move instances.
///
/// The order of `moves` carries no timing meaning; playback order is derived
/// from each move's `start_slice`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoreographySequence {
    /// Unique sequence name used as the store key
    pub name: String,
    /// Slices per minute
    pub slices_per_minute: Tempo,
    /// Move instances in upload order
    pub moves: Vec<MoveParams>,
}

impl ChoreographySequence {
    /// Build a sequence
    pub fn new(name: impl Into<String>, slices_per_minute: Tempo, moves: Vec<MoveParams>) -> Self {
        Self {
            name: name.into(),
            slices_per_minute,
            moves,
        }
    }

    /// Declared length: the end slice of the latest-ending move
    pub fn total_slices(&self) -> u64 {
        self.moves.iter().map(MoveParams::end_slice).max().unwrap_or(0)
    }

    /// Upload indices ordered by start slice, ties kept in upload order
    pub fn timeline_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.moves.len()).collect();
        order.sort_by_key(|&index| self.moves[index].start_slice);
        order
    }
}

/// Upload form of a move instance, one optional slot per parameter kind
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveParamsRecord {
    /// Move type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// First slice; negative values are rejected during validation
    #[serde(default)]
    pub start_slice: i64,
    /// Requested slice count; non-positive values are rejected during validation
    #[serde(default)]
    pub requested_slices: i64,
    /// Parameter one-of
    #[serde(flatten)]
    pub params: MoveParamsSlots,
}

/// Upload form of a sequence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChoreographySequenceRecord {
    /// Sequence name
    pub name: String,
    /// Slices per minute as sent by the client
    pub slices_per_minute: f64,
    /// Move instances
    #[serde(default)]
    pub moves: Vec<MoveParamsRecord>,
}

impl From<MoveParams> for MoveParamsRecord {
    fn from(params: MoveParams) -> Self {
        Self {
            type_name: params.type_name,
            start_slice: i64::from(params.start_slice),
            requested_slices: i64::from(params.requested_slices),
            params: params.payload.into(),
        }
    }
}

impl From<ChoreographySequence> for ChoreographySequenceRecord {
    fn from(sequence: ChoreographySequence) -> Self {
        Self {
            name: sequence.name,
            slices_per_minute: sequence.slices_per_minute.slices_per_minute(),
            moves: sequence.moves.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::params::{MoveParamsKind, StepParams};

    fn step_at(start: u32) -> MoveParams {
        MoveParams::new(
            "step",
            start,
            4,
            MoveParamsPayload::Step(StepParams::default()),
        )
    }

    #[test]
    fn timeline_order_ignores_upload_order() {
        let tempo = Tempo::from_slices_per_minute(120.0).unwrap();
        let sequence = ChoreographySequence::new("s", tempo, vec![step_at(8), step_at(0), step_at(4)]);
        assert_eq!(sequence.timeline_order(), vec![1, 2, 0]);
        assert_eq!(sequence.total_slices(), 12);
    }

    #[test]
    fn record_parses_protocol_style_json() {
        let json = r#"{
            "name": "intro",
            "slices_per_minute": 120,
            "moves": [
                {"type": "step", "start_slice": 0, "requested_slices": 4, "step_params": {"swing_height": 0.1}}
            ]
        }"#;
        let record: ChoreographySequenceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.moves.len(), 1);
        assert_eq!(record.moves[0].params.filled(), vec![MoveParamsKind::Step]);
    }

    #[test]
    fn typed_sequence_converts_to_record() {
        let tempo = Tempo::from_slices_per_minute(100.0).unwrap();
        let record = ChoreographySequenceRecord::from(ChoreographySequence::new(
            "s",
            tempo,
            vec![step_at(2)],
        ));
        assert_eq!(record.slices_per_minute, 100.0);
        assert_eq!(record.moves[0].start_slice, 2);
        assert!(record.moves[0].params.step_params.is_some());
    }
}
