//! Session Orchestrator
//!
//! Sequences classifier, retriever and composer for each question, and
//! relays feedback into the session's level tracker. The engine itself holds
//! no per-learner state and can be shared across sessions.

use serde::Serialize;
use std::sync::Arc;
use tutor_sdk::{Classification, Tier};

use super::classifier::Classifier;
use super::composer::SolutionComposer;
use super::level::LevelChange;
use super::practice::PracticeGenerator;
use super::session::TutorSession;
use super::TutorError;
use crate::config::{LevelConfig, TutorConfig};
use crate::llm::LLMProvider;
use crate::retrieval::{Retriever, VectorStore};

/// Everything a host needs to display for one answered question
#[derive(Debug, Clone, Serialize)]
pub struct TutorResponse {
    pub classification: Classification,
    pub references: Vec<String>,
    pub solution: String,
    /// Tier the solution was pitched at
    pub level: Tier,
}

pub struct TutorEngine {
    classifier: Classifier,
    retriever: Retriever,
    composer: SolutionComposer,
    practice: PracticeGenerator,
    reference_count: usize,
    level_policy: LevelConfig,
}

impl TutorEngine {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        store: Arc<dyn VectorStore>,
        config: &TutorConfig,
        collection_prefix: &str,
    ) -> Self {
        Self {
            classifier: Classifier::new(Arc::clone(&llm), config.classifier.into()),
            retriever: Retriever::new(store, collection_prefix),
            composer: SolutionComposer::new(Arc::clone(&llm), config.solution.into()),
            practice: PracticeGenerator::new(llm, config.practice.into()),
            reference_count: config.reference_count,
            level_policy: config.level,
        }
    }

    /// Start a session using this engine's level policy
    pub fn new_session(&self) -> TutorSession {
        TutorSession::new(self.level_policy)
    }

    /// Answer one question
    ///
    /// The history entry is written before the solution is generated, so a
    /// failed generation still counts as an asked question.
    pub async fn handle_question(
        &self,
        session: &mut TutorSession,
        question: &str,
    ) -> Result<TutorResponse, TutorError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TutorError::EmptyQuestion);
        }

        tracing::info!(
            "Session {}: handling question ({} chars)",
            session.id(),
            question.len()
        );

        let classification = self.classifier.analyze(question).await;
        let analysis = classification.analysis();
        session.record_question(question, analysis);

        let references = self
            .retriever
            .retrieve(analysis.subject, question, self.reference_count)
            .await;

        let level = session.current_level();
        let solution = self
            .composer
            .compose_solution(question, &references, level)
            .await
            .map_err(TutorError::Generation)?;

        Ok(TutorResponse {
            classification,
            references,
            solution,
            level,
        })
    }

    /// Record whether the last explanation helped
    pub fn handle_feedback(
        &self,
        session: &mut TutorSession,
        success: bool,
    ) -> Result<LevelChange, TutorError> {
        session.record_feedback(success)
    }

    pub async fn handle_practice_request(
        &self,
        concepts: &[String],
        level: Tier,
    ) -> Result<String, TutorError> {
        self.practice
            .generate_practice(concepts, level)
            .await
            .map_err(TutorError::Generation)
    }

    /// Practice on the concepts of the last question at the current tier
    pub async fn practice_for_last_question(
        &self,
        session: &TutorSession,
    ) -> Result<String, TutorError> {
        let analysis = session
            .last_analysis()
            .ok_or(TutorError::NoActiveQuestion)?;
        self.handle_practice_request(&analysis.concepts, session.current_level())
            .await
    }
}
