//! Tutoring data model shared between the engine and its hosts
//!
//! Everything a display host needs to render an answered question or an
//! analytics panel lives here: the subject and tier enums, the structured
//! question analysis, the classifier outcome and the history log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subject domain a question belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Mathematics,
    Physics,
    Chemistry,
}

impl Subject {
    /// All configured subjects, in display order
    pub const ALL: [Subject; 3] = [Subject::Mathematics, Subject::Physics, Subject::Chemistry];

    /// Lowercase key used in prompts, collections and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Mathematics => "mathematics",
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
        }
    }

    /// Capitalized name for headings
    pub fn title(&self) -> &'static str {
        match self {
            Subject::Mathematics => "Mathematics",
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = ParseEnumError;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                kind: "subject",
                value: s.to_string(),
            })
    }
}

/// Ordered difficulty tier
///
/// The derived ordering follows declaration order, so
/// `Beginner < Intermediate < Advanced`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Tier {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Tier {
    /// All tiers from lowest to highest
    pub const ALL: [Tier; 3] = [Tier::Beginner, Tier::Intermediate, Tier::Advanced];

    /// Position of the tier in the ordering (0, 1 or 2)
    pub fn index(&self) -> usize {
        match self {
            Tier::Beginner => 0,
            Tier::Intermediate => 1,
            Tier::Advanced => 2,
        }
    }

    /// Tier at the given position, if any
    pub fn from_index(index: usize) -> Option<Self> {
        Tier::ALL.get(index).copied()
    }

    /// Next tier up, or `None` at Advanced
    pub fn next(&self) -> Option<Self> {
        Tier::from_index(self.index() + 1)
    }

    /// Next tier down, or `None` at Beginner
    pub fn previous(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Tier::from_index)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Beginner => "Beginner",
            Tier::Intermediate => "Intermediate",
            Tier::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseEnumError;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim();
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| ParseEnumError {
                kind: "difficulty",
                value: s.to_string(),
            })
    }
}

/// Error returned when a subject or tier string is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Structured label for a single question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub subject: Subject,
    pub difficulty: Tier,
    pub concepts: Vec<String>,
    pub formulas: Vec<String>,
}

impl Default for QuestionAnalysis {
    /// The analysis substituted whenever classification fails
    fn default() -> Self {
        Self {
            subject: Subject::Mathematics,
            difficulty: Tier::Beginner,
            concepts: Vec::new(),
            formulas: Vec::new(),
        }
    }
}

/// Why the classifier substituted the default analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// The model backend call failed
    Backend(String),

    /// The reply did not contain the expected JSON structure
    Malformed(String),

    /// The reply named a subject outside the configured domains
    UnknownSubject(String),

    /// The reply named a difficulty outside the three tiers
    UnknownDifficulty(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Backend(e) => write!(f, "backend failure: {}", e),
            FallbackReason::Malformed(e) => write!(f, "malformed reply: {}", e),
            FallbackReason::UnknownSubject(s) => write!(f, "unknown subject '{}'", s),
            FallbackReason::UnknownDifficulty(d) => write!(f, "unknown difficulty '{}'", d),
        }
    }
}

/// Outcome of classifying a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Classification {
    /// The model answered with a valid analysis
    Classified { analysis: QuestionAnalysis },

    /// The default analysis was substituted
    Fallback {
        analysis: QuestionAnalysis,
        reason: FallbackReason,
    },
}

impl Classification {
    /// Build a fallback carrying the default analysis
    pub fn fallback(reason: FallbackReason) -> Self {
        Classification::Fallback {
            analysis: QuestionAnalysis::default(),
            reason,
        }
    }

    /// The analysis to use, whichever way it was obtained
    pub fn analysis(&self) -> &QuestionAnalysis {
        match self {
            Classification::Classified { analysis } => analysis,
            Classification::Fallback { analysis, .. } => analysis,
        }
    }

    pub fn into_analysis(self) -> QuestionAnalysis {
        match self {
            Classification::Classified { analysis } => analysis,
            Classification::Fallback { analysis, .. } => analysis,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classification::Fallback { .. })
    }

    /// Fallback reason, if the default analysis was substituted
    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match self {
            Classification::Classified { .. } => None,
            Classification::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// One answered question in the session log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub subject: Subject,
    pub difficulty: Tier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_parsing_is_case_insensitive() {
        assert_eq!("physics".parse::<Subject>().unwrap(), Subject::Physics);
        assert_eq!(" Chemistry ".parse::<Subject>().unwrap(), Subject::Chemistry);
        assert_eq!(
            "MATHEMATICS".parse::<Subject>().unwrap(),
            Subject::Mathematics
        );
    }

    #[test]
    fn test_unknown_subject_rejected() {
        let err = "biology".parse::<Subject>().unwrap_err();
        assert_eq!(err.kind, "subject");
        assert_eq!(err.value, "biology");

        // Abbreviations are not accepted
        assert!("math".parse::<Subject>().is_err());
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("Beginner".parse::<Tier>().unwrap(), Tier::Beginner);
        assert_eq!("intermediate".parse::<Tier>().unwrap(), Tier::Intermediate);
        assert_eq!("ADVANCED ".parse::<Tier>().unwrap(), Tier::Advanced);
        assert!("Expert".parse::<Tier>().is_err());
        assert!("".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_ordering_and_steps() {
        assert!(Tier::Beginner < Tier::Intermediate);
        assert!(Tier::Intermediate < Tier::Advanced);

        assert_eq!(Tier::Beginner.next(), Some(Tier::Intermediate));
        assert_eq!(Tier::Advanced.next(), None);
        assert_eq!(Tier::Intermediate.previous(), Some(Tier::Beginner));
        assert_eq!(Tier::Beginner.previous(), None);
        assert_eq!(Tier::from_index(3), None);
        assert_eq!(Tier::default(), Tier::Beginner);
    }

    #[test]
    fn test_default_analysis() {
        let analysis = QuestionAnalysis::default();
        assert_eq!(analysis.subject, Subject::Mathematics);
        assert_eq!(analysis.difficulty, Tier::Beginner);
        assert!(analysis.concepts.is_empty());
        assert!(analysis.formulas.is_empty());
    }

    #[test]
    fn test_classification_accessors() {
        let fallback = Classification::fallback(FallbackReason::Malformed("eof".to_string()));
        assert!(fallback.is_fallback());
        assert_eq!(fallback.analysis(), &QuestionAnalysis::default());
        assert!(matches!(
            fallback.fallback_reason(),
            Some(FallbackReason::Malformed(_))
        ));

        let analysis = QuestionAnalysis {
            subject: Subject::Physics,
            difficulty: Tier::Advanced,
            concepts: vec!["Lorentz force".to_string()],
            formulas: vec!["F = BIL".to_string()],
        };
        let classified = Classification::Classified {
            analysis: analysis.clone(),
        };
        assert!(!classified.is_fallback());
        assert!(classified.fallback_reason().is_none());
        assert_eq!(classified.into_analysis(), analysis);
    }

    #[test]
    fn test_serialization_shapes() {
        let json = serde_json::to_value(QuestionAnalysis::default()).unwrap();
        assert_eq!(json["subject"], "mathematics");
        assert_eq!(json["difficulty"], "Beginner");

        let fallback = Classification::fallback(FallbackReason::UnknownSubject("biology".into()));
        let json = serde_json::to_value(&fallback).unwrap();
        assert_eq!(json["status"], "fallback");
        assert_eq!(json["reason"]["kind"], "unknown_subject");
        assert_eq!(json["reason"]["detail"], "biology");
    }
}
