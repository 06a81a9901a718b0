//! Validation diagnostics and outcomes

use cadence_core::{CadenceError, ChoreographySequence};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of a violated constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    /// Unknown move type, malformed payload, zero-length move, bad tempo.
    /// Never correctable.
    Structural,
    /// Slice length or duration outside the declared range.
    /// Correctable in non-strict mode.
    Bounds,
    /// Posture mismatch or subsystem overlap. Never correctable.
    Continuity,
}

impl ViolationCategory {
    /// Whether non-strict validation may repair this class of violation
    pub fn is_correctable(&self) -> bool {
        matches!(self, ViolationCategory::Bounds)
    }
}

impl fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationCategory::Structural => "structural",
            ViolationCategory::Bounds => "bounds",
            ViolationCategory::Continuity => "continuity",
        };
        f.write_str(name)
    }
}

/// One violated constraint, located by upload index when it concerns a move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: ViolationCategory,
    pub move_index: Option<usize>,
    pub move_type: Option<String>,
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic about the sequence as a whole
    pub fn sequence(category: ViolationCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            move_index: None,
            move_type: None,
            message: message.into(),
        }
    }

    /// Diagnostic about one move instance
    pub fn at_move(
        category: ViolationCategory,
        move_index: usize,
        move_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            move_index: Some(move_index),
            move_type: Some(move_type.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.move_index, &self.move_type) {
            (Some(index), Some(move_type)) => write!(
                f,
                "[{}] move {index} ({move_type}): {}",
                self.category, self.message
            ),
            (Some(index), None) => write!(f, "[{}] move {index}: {}", self.category, self.message),
            _ => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

/// A sequence the validator refused, with every violated constraint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sequence rejected with {} violation(s): {}", .diagnostics.len(), render(.diagnostics))]
pub struct Rejection {
    pub diagnostics: Vec<Diagnostic>,
}

impl Rejection {
    /// Whether any diagnostic falls in `category`
    pub fn has(&self, category: ViolationCategory) -> bool {
        self.diagnostics.iter().any(|d| d.category == category)
    }

    /// Diagnostics rendered for display
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Rejection> for CadenceError {
    fn from(rejection: Rejection) -> Self {
        CadenceError::invalid(rejection.to_string())
    }
}

/// A sequence that passed validation, possibly after corrections
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedSequence {
    pub sequence: ChoreographySequence,
    /// One entry per correction applied, in upload order
    pub warnings: Vec<String>,
}

/// Validation outcome
pub type ValidationOutcome = Result<AcceptedSequence, Rejection>;
