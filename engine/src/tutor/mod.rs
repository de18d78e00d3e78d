//! Tutoring core
//!
//! Classifier, solution composer, practice generator and level tracker,
//! sequenced by [`TutorEngine`] over an explicit [`TutorSession`].

pub mod classifier;
pub mod composer;
pub mod engine;
pub mod level;
pub mod practice;
pub mod session;

pub use classifier::Classifier;
pub use composer::SolutionComposer;
pub use engine::{TutorEngine, TutorResponse};
pub use level::{LevelChange, LevelTracker, Transition};
pub use practice::PracticeGenerator;
pub use session::{HistorySummary, TutorSession};

use thiserror::Error;
use tutor_sdk::TutorErrorExt;

use crate::llm::LLMError;

/// Errors surfaced by tutoring operations
#[derive(Debug, Error)]
pub enum TutorError {
    #[error("Please enter a question.")]
    EmptyQuestion,

    #[error("No question has been answered in this session yet")]
    NoActiveQuestion,

    #[error("Generation failed: {0}")]
    Generation(#[source] LLMError),
}

impl TutorErrorExt for TutorError {
    fn user_hint(&self) -> &str {
        match self {
            Self::EmptyQuestion => "Please enter a question.",
            Self::NoActiveQuestion => "Ask a question first",
            Self::Generation(LLMError::AuthenticationFailed(_)) => {
                "The model provider rejected the API key. Run 'tutor secret set'"
            }
            Self::Generation(LLMError::RateLimitExceeded) => {
                "The model provider is rate limiting requests. Wait a moment and try again"
            }
            Self::Generation(LLMError::Timeout) => "The model took too long to answer. Try again",
            Self::Generation(_) => "The tutor could not generate an answer. Try again",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::EmptyQuestion | Self::NoActiveQuestion => false,
            Self::Generation(LLMError::AuthenticationFailed(_))
            | Self::Generation(LLMError::InvalidRequest(_)) => false,
            Self::Generation(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_question_message() {
        assert_eq!(TutorError::EmptyQuestion.to_string(), "Please enter a question.");
        assert_eq!(TutorError::EmptyQuestion.user_hint(), "Please enter a question.");
    }

    #[test]
    fn test_generation_recoverability() {
        assert!(TutorError::Generation(LLMError::Timeout).is_recoverable());
        assert!(TutorError::Generation(LLMError::RateLimitExceeded).is_recoverable());
        assert!(!TutorError::Generation(LLMError::AuthenticationFailed("401".into())).is_recoverable());
        assert!(!TutorError::NoActiveQuestion.is_recoverable());
    }
}
