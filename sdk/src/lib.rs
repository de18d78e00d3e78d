//! STEM Tutor SDK
//!
//! Shared library providing the data model and error types exchanged between
//! the tutor engine and the hosts that display its output.

/// Error types and handling
pub mod errors;

/// Tutoring data model
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, TutorErrorExt};
pub use types::{
    Classification, FallbackReason, HistoryEntry, ParseEnumError, QuestionAnalysis, Subject, Tier,
};
