//! Sequence validation against the move catalog

pub mod diagnostics;
pub mod validator;

pub use diagnostics::{AcceptedSequence, Diagnostic, Rejection, ValidationOutcome, ViolationCategory};
pub use validator::{SequenceValidator, ValidationOptions};
