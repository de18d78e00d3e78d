//! Solution Composer
//!
//! Builds the retrieval-augmented explanation prompt and returns the model's
//! prose untouched. Failures propagate: a solution cannot be made up.

use std::sync::Arc;
use tutor_sdk::Tier;

use crate::llm::{GenerationParams, LLMProvider, Result};

pub struct SolutionComposer {
    llm: Arc<dyn LLMProvider>,
    params: GenerationParams,
}

impl SolutionComposer {
    pub fn new(llm: Arc<dyn LLMProvider>, params: GenerationParams) -> Self {
        Self { llm, params }
    }

    pub async fn compose_solution(
        &self,
        question: &str,
        references: &[String],
        level: Tier,
    ) -> Result<String> {
        let prompt = build_prompt(question, references, level);
        tracing::debug!(
            "Composing {} solution with {} reference(s)",
            level,
            references.len()
        );
        self.llm.complete(&prompt, self.params).await
    }
}

/// Explanation prompt pitched at `level`
///
/// With no references the reference block is left empty.
pub fn build_prompt(question: &str, references: &[String], level: Tier) -> String {
    format!(
        "You are a STEM tutor. Give a detailed solution to the problem below for a student \
         at the {level} level.\n\n\
         Question: {question}\n\n\
         Similar problems and solutions for reference:\n\
         {references}\n\n\
         Structure your answer as:\n\
         1. Initial approach\n\
         2. Step-by-step solution\n\
         3. Key concepts used\n\
         4. Common mistakes to avoid\n\
         5. Practice suggestions\n\n\
         Keep the explanation clear and appropriate for a {level} student.",
        level = level,
        question = question,
        references = format_references(references),
    )
}

fn format_references(references: &[String]) -> String {
    references
        .iter()
        .enumerate()
        .map(|(i, reference)| format!("[{}] {}", i + 1, reference.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
