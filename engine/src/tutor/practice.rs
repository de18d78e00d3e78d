//! Practice Generator

use std::sync::Arc;
use tutor_sdk::Tier;

use crate::llm::{GenerationParams, LLMProvider, Result};

/// Produces follow-up exercises for a set of concepts
pub struct PracticeGenerator {
    llm: Arc<dyn LLMProvider>,
    params: GenerationParams,
}

impl PracticeGenerator {
    pub fn new(llm: Arc<dyn LLMProvider>, params: GenerationParams) -> Self {
        Self { llm, params }
    }

    pub async fn generate_practice(&self, concepts: &[String], level: Tier) -> Result<String> {
        let prompt = build_prompt(concepts, level);
        tracing::debug!(
            "Generating {} practice problem for {} concept(s)",
            level,
            concepts.len()
        );
        self.llm.complete(&prompt, self.params).await
    }
}

/// Prompt asking for one new problem with its worked solution
///
/// An empty concept list is sent as-is; the model picks the topic.
pub fn build_prompt(concepts: &[String], level: Tier) -> String {
    format!(
        "Create a new STEM practice problem that:\n\
         1. Covers these concepts: {concepts}\n\
         2. Is appropriate for the {level} level\n\
         3. Has a clear solution\n\n\
         Provide the problem followed by its solution.",
        level = level,
        concepts = concepts.join(", "),
    )
}
