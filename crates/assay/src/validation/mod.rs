//! Rule orchestration and per-record classification.

mod classification;
mod diagnostic;
mod orchestrator;

pub use classification::{
    Classification, COMPLIANCE_COLUMN, NOT_APPLICABLE, OUTCOME_PREFIX, PENDING_REVIEW,
    REVIEW_COLUMN,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use orchestrator::{RuleReport, ValidationOrchestrator, ValidationOutcome};
