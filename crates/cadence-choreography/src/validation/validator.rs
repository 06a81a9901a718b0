//! Sequence validator
//!
//! Checks an uploaded sequence against the move catalog and either accepts it
//! (possibly with bounds corrections applied) or rejects it with the complete
//! list of violated constraints.
//!
//! Checks run in four passes over every move, none of which stops early:
//!
//! 1. **Structural**: move type resolves, payload kind matches the catalog
//!    entry, slice count is positive.
//! 2. **Bounds**: fixed-length moves keep their length; the duration at the
//!    sequence tempo lies within `[min_time, max_time]`. Clamped and warned in
//!    non-strict mode, rejected in strict mode.
//! 3. **Overlap**: moves sharing a subsystem never overlap in slice range.
//! 4. **Posture continuity**: along each subsystem's timeline, a move starting
//!    where (or before) its predecessor ends must admit the predecessor's exit
//!    state.
//!
//! Passes 3 and 4 operate on the corrected slice counts, so a correction that
//! would introduce an overlap is reported rather than silently accepted.

use std::collections::BTreeMap;
use std::sync::Arc;

use cadence_core::{
    ChoreographySequence, ChoreographySequenceRecord, MoveInfo, MoveParams, Subsystem, Tempo,
};
use tracing::{debug, info, warn};

use super::diagnostics::{AcceptedSequence, Diagnostic, Rejection, ValidationOutcome, ViolationCategory};
use crate::catalog::MoveCatalog;

/// Validation knobs that do not depend on the request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Also check posture continuity between shared-subsystem moves separated
    /// by a gap. Touching moves are always checked.
    pub continuity_across_gaps: bool,
}

/// Validates sequences against a move catalog
#[derive(Debug, Clone)]
pub struct SequenceValidator {
    catalog: Arc<MoveCatalog>,
    options: ValidationOptions,
}

/// A move that survived structural conversion, with its upload index
struct Entry<'a> {
    index: usize,
    params: MoveParams,
    info: Option<&'a MoveInfo>,
}

impl SequenceValidator {
    /// Validator over `catalog` with default options
    pub fn new(catalog: Arc<MoveCatalog>) -> Self {
        Self {
            catalog,
            options: ValidationOptions::default(),
        }
    }

    /// Replace the validation options
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Catalog moves are resolved against
    pub fn catalog(&self) -> &Arc<MoveCatalog> {
        &self.catalog
    }

    /// Validate an upload record.
    ///
    /// Record-level problems (bad tempo, negative slices, missing or multiple
    /// payloads) are reported as structural diagnostics alongside everything
    /// the typed checks find in the remaining moves.
    pub fn validate_record(
        &self,
        record: ChoreographySequenceRecord,
        non_strict: bool,
    ) -> ValidationOutcome {
        let mut diagnostics = Vec::new();

        let tempo = match Tempo::from_slices_per_minute(record.slices_per_minute) {
            Ok(tempo) => Some(tempo),
            Err(err) => {
                diagnostics.push(Diagnostic::sequence(
                    ViolationCategory::Structural,
                    err.to_string(),
                ));
                None
            }
        };

        let mut entries = Vec::with_capacity(record.moves.len());
        for (index, raw) in record.moves.into_iter().enumerate() {
            let type_name = raw.type_name;
            let start_slice = u32::try_from(raw.start_slice);
            let requested_slices = u32::try_from(raw.requested_slices);
            if start_slice.is_err() {
                diagnostics.push(Diagnostic::at_move(
                    ViolationCategory::Structural,
                    index,
                    &type_name,
                    format!("start_slice must be a non-negative slice index (got {})", raw.start_slice),
                ));
            }
            if requested_slices.is_err() {
                diagnostics.push(Diagnostic::at_move(
                    ViolationCategory::Structural,
                    index,
                    &type_name,
                    format!("requested_slices must be positive (got {})", raw.requested_slices),
                ));
            }
            let payload = match raw.params.into_payload() {
                Ok(payload) => Some(payload),
                Err(err) => {
                    diagnostics.push(Diagnostic::at_move(
                        ViolationCategory::Structural,
                        index,
                        &type_name,
                        err.to_string(),
                    ));
                    None
                }
            };
            if let (Ok(start), Ok(requested), Some(payload)) = (start_slice, requested_slices, payload)
            {
                entries.push((index, MoveParams::new(type_name, start, requested, payload)));
            }
        }

        self.check(record.name, tempo, entries, non_strict, diagnostics)
    }

    /// Validate an already typed sequence
    pub fn validate(&self, sequence: &ChoreographySequence, non_strict: bool) -> ValidationOutcome {
        let entries = sequence.moves.iter().cloned().enumerate().collect();
        self.check(
            sequence.name.clone(),
            Some(sequence.slices_per_minute),
            entries,
            non_strict,
            Vec::new(),
        )
    }

    fn check(
        &self,
        name: String,
        tempo: Option<Tempo>,
        moves: Vec<(usize, MoveParams)>,
        non_strict: bool,
        mut diagnostics: Vec<Diagnostic>,
    ) -> ValidationOutcome {
        debug!(sequence = %name, moves = moves.len(), non_strict, "validating sequence");

        if name.trim().is_empty() {
            diagnostics.push(Diagnostic::sequence(
                ViolationCategory::Structural,
                "sequence name must not be empty",
            ));
        }

        let mut warnings = Vec::new();
        let mut entries: Vec<Entry<'_>> = moves
            .into_iter()
            .map(|(index, params)| {
                let info = self.check_structure(index, &params, &mut diagnostics);
                Entry {
                    index,
                    params,
                    info,
                }
            })
            .collect();

        for entry in &mut entries {
            if let Some(info) = entry.info {
                check_bounds(entry, info, tempo, non_strict, &mut warnings, &mut diagnostics);
            }
        }

        let timeline = timeline(&entries);
        check_overlaps(&entries, &timeline, &mut diagnostics);
        self.check_continuity(&entries, &timeline, &mut diagnostics);

        if !diagnostics.is_empty() {
            warn!(
                sequence = %name,
                violations = diagnostics.len(),
                "sequence rejected"
            );
            return Err(Rejection { diagnostics });
        }

        // No diagnostics means every move resolved and the tempo parsed.
        let Some(tempo) = tempo else {
            return Err(Rejection {
                diagnostics: vec![Diagnostic::sequence(
                    ViolationCategory::Structural,
                    "sequence tempo is missing",
                )],
            });
        };

        info!(sequence = %name, warnings = warnings.len(), "sequence accepted");
        Ok(AcceptedSequence {
            sequence: ChoreographySequence::new(
                name,
                tempo,
                entries.into_iter().map(|entry| entry.params).collect(),
            ),
            warnings,
        })
    }

    fn check_structure(
        &self,
        index: usize,
        params: &MoveParams,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<&MoveInfo> {
        let Ok(info) = self.catalog.lookup(&params.type_name) else {
            diagnostics.push(Diagnostic::at_move(
                ViolationCategory::Structural,
                index,
                &params.type_name,
                format!("unknown move type '{}'", params.type_name),
            ));
            return None;
        };

        if params.payload.kind() != info.params {
            diagnostics.push(Diagnostic::at_move(
                ViolationCategory::Structural,
                index,
                &params.type_name,
                format!(
                    "payload {} does not match the move's parameter kind {}",
                    params.payload.kind().slot_name(),
                    info.params.slot_name()
                ),
            ));
        }
        if params.requested_slices == 0 {
            diagnostics.push(Diagnostic::at_move(
                ViolationCategory::Structural,
                index,
                &params.type_name,
                "requested_slices must be positive (got 0)",
            ));
        }

        // Malformed moves still take part in overlap and continuity checks so
        // the caller sees every problem in one round trip.
        Some(info)
    }

    fn check_continuity(
        &self,
        entries: &[Entry<'_>],
        timeline: &[usize],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let mut mismatches: BTreeMap<(usize, usize), Vec<Subsystem>> = BTreeMap::new();

        for subsystem in Subsystem::ALL {
            let lane: Vec<&Entry<'_>> = timeline
                .iter()
                .map(|&slot| &entries[slot])
                .filter(|entry| entry.info.is_some_and(|info| info.controls.contains(subsystem)))
                .collect();

            for pair in lane.windows(2) {
                let (earlier, later) = (pair[0], pair[1]);
                let (Some(before), Some(after)) = (earlier.info, later.info) else {
                    continue;
                };
                let adjacent = u64::from(later.params.start_slice) <= earlier.params.end_slice();
                if !adjacent && !self.options.continuity_across_gaps {
                    continue;
                }
                if !after.admits(before.exit_state) {
                    mismatches
                        .entry((earlier.index, later.index))
                        .or_default()
                        .push(subsystem);
                }
            }
        }

        for ((earlier, later), subsystems) in mismatches {
            let (Some(before), Some(after)) = (
                entries.iter().find(|e| e.index == earlier).and_then(|e| e.info),
                entries.iter().find(|e| e.index == later).and_then(|e| e.info),
            ) else {
                continue;
            };
            let lanes = subsystems
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("+");
            diagnostics.push(Diagnostic::at_move(
                ViolationCategory::Continuity,
                later,
                &after.name,
                format!(
                    "entrance states {{{}}} exclude exit state '{}' of move {earlier} ({}) on {lanes}",
                    after.entrance_list(),
                    before.exit_state,
                    before.name
                ),
            ));
        }
    }
}

fn check_bounds(
    entry: &mut Entry<'_>,
    info: &MoveInfo,
    tempo: Option<Tempo>,
    non_strict: bool,
    warnings: &mut Vec<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let index = entry.index;
    let requested = entry.params.requested_slices;
    if requested == 0 {
        return;
    }
    let mut slices = requested;

    if !info.is_extendable && slices != info.move_length_slices {
        let message = format!(
            "requested_slices {slices} differs from fixed length {}",
            info.move_length_slices
        );
        if non_strict {
            warnings.push(format!(
                "move {index} ({}): {message}; clamped to {}",
                info.name, info.move_length_slices
            ));
            slices = info.move_length_slices;
        } else {
            diagnostics.push(Diagnostic::at_move(ViolationCategory::Bounds, index, &info.name, message));
        }
    }

    if let Some(tempo) = tempo {
        match info.slice_bounds(tempo) {
            None => diagnostics.push(Diagnostic::at_move(
                ViolationCategory::Bounds,
                index,
                &info.name,
                format!(
                    "no whole slice count at {tempo} slices/min lasts between {}s and {}s",
                    info.min_time, info.max_time
                ),
            )),
            Some((lo, hi)) if slices < lo || slices > hi => {
                let seconds = cadence_core::slice_to_seconds(slices, tempo);
                let message = format!(
                    "{slices} slices last {seconds:.3}s at {tempo} slices/min, outside [{}s, {}s]",
                    info.min_time, info.max_time
                );
                if non_strict && info.is_extendable {
                    let clamped = slices.clamp(lo, hi);
                    warnings.push(format!(
                        "move {index} ({}): {message}; clamped to {clamped} slices",
                        info.name
                    ));
                    slices = clamped;
                } else {
                    diagnostics.push(Diagnostic::at_move(
                        ViolationCategory::Bounds,
                        index,
                        &info.name,
                        message,
                    ));
                }
            }
            Some(_) => {}
        }
    }

    entry.params.requested_slices = slices;
}

/// Positions into `entries` ordered by start slice, ties in upload order
fn timeline(entries: &[Entry<'_>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&slot| (entries[slot].params.start_slice, entries[slot].index));
    order
}

fn check_overlaps(entries: &[Entry<'_>], timeline: &[usize], diagnostics: &mut Vec<Diagnostic>) {
    for (position, &slot) in timeline.iter().enumerate() {
        let earlier = &entries[slot];
        let Some(first) = earlier.info else { continue };
        if earlier.params.requested_slices == 0 {
            continue;
        }
        for &other in &timeline[position + 1..] {
            let later = &entries[other];
            if u64::from(later.params.start_slice) >= earlier.params.end_slice() {
                break;
            }
            let Some(second) = later.info else { continue };
            let shared = first.controls.shared_with(&second.controls);
            if shared.is_empty() {
                continue;
            }
            let lanes = shared
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("+");
            diagnostics.push(Diagnostic::at_move(
                ViolationCategory::Continuity,
                later.index,
                &second.name,
                format!(
                    "slices {:?} overlap move {} ({}) at {:?} on {lanes}",
                    later.params.slice_range(),
                    earlier.index,
                    first.name,
                    earlier.params.slice_range()
                ),
            ));
        }
    }
}
