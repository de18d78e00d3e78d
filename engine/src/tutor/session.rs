//! Per-learner session state
//!
//! A `TutorSession` is owned by exactly one host conversation and passed to
//! the engine by `&mut` for each request. It serializes, so hosts can keep it
//! wherever they keep their own session data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tutor_sdk::{HistoryEntry, QuestionAnalysis, Subject, Tier};
use uuid::Uuid;

use super::level::{LevelChange, LevelTracker};
use super::TutorError;
use crate::config::LevelConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    tracker: LevelTracker,
    history: Vec<HistoryEntry>,
    last_analysis: Option<QuestionAnalysis>,
}

/// Learning analytics over a session's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_questions: usize,
    /// Questions asked per subject; subjects never asked are omitted
    pub subject_counts: BTreeMap<Subject, usize>,
    /// Classified difficulty of each question, in the order asked
    pub difficulty_progression: Vec<Tier>,
    pub current_level: Tier,
    /// Recent success rate for every subject with feedback
    pub recent_rates: BTreeMap<Subject, f64>,
}

impl Default for TutorSession {
    fn default() -> Self {
        Self::new(LevelConfig::default())
    }
}

impl TutorSession {
    pub fn new(policy: LevelConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            tracker: LevelTracker::new(policy),
            history: Vec::new(),
            last_analysis: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn current_level(&self) -> Tier {
        self.tracker.current_level()
    }

    pub fn tracker(&self) -> &LevelTracker {
        &self.tracker
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Analysis of the most recent question, if any
    pub fn last_analysis(&self) -> Option<&QuestionAnalysis> {
        self.last_analysis.as_ref()
    }

    /// Append a history entry and remember the analysis for feedback routing
    pub(crate) fn record_question(&mut self, question: &str, analysis: &QuestionAnalysis) {
        self.history.push(HistoryEntry {
            timestamp: Utc::now(),
            question: question.to_string(),
            subject: analysis.subject,
            difficulty: analysis.difficulty,
        });
        self.last_analysis = Some(analysis.clone());
    }

    /// Route a success signal to the subject of the most recent question
    pub(crate) fn record_feedback(&mut self, success: bool) -> Result<LevelChange, TutorError> {
        let subject = self
            .last_analysis
            .as_ref()
            .map(|analysis| analysis.subject)
            .ok_or(TutorError::NoActiveQuestion)?;
        Ok(self.tracker.record_outcome(subject, success))
    }

    pub fn summary(&self) -> HistorySummary {
        let mut subject_counts = BTreeMap::new();
        for entry in &self.history {
            *subject_counts.entry(entry.subject).or_insert(0) += 1;
        }

        let recent_rates = Subject::ALL
            .iter()
            .filter_map(|&subject| {
                self.tracker
                    .recent_rate(subject)
                    .map(|rate| (subject, rate))
            })
            .collect();

        HistorySummary {
            total_questions: self.history.len(),
            subject_counts,
            difficulty_progression: self.history.iter().map(|e| e.difficulty).collect(),
            current_level: self.current_level(),
            recent_rates,
        }
    }
}
