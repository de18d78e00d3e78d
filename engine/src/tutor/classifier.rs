//! Question Classifier
//!
//! Asks the model to label a question with its subject, difficulty, key
//! concepts and relevant formulas. A bad label is a minor degradation, so
//! every failure here ends in the default analysis rather than an error.

use serde::Deserialize;
use std::sync::Arc;
use tutor_sdk::{Classification, FallbackReason, QuestionAnalysis, Subject, Tier};

use crate::llm::{extract_json_object, GenerationParams, LLMProvider};

pub struct Classifier {
    llm: Arc<dyn LLMProvider>,
    params: GenerationParams,
}

/// Intermediate deserialization type for the model's JSON reply
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    subject: String,
    difficulty: String,
    #[serde(default)]
    concepts: Vec<String>,
    #[serde(default)]
    formulas: Vec<String>,
}

impl Classifier {
    pub fn new(llm: Arc<dyn LLMProvider>, params: GenerationParams) -> Self {
        Self { llm, params }
    }

    /// Classify a question. Never fails; see [`Classification::Fallback`].
    pub async fn analyze(&self, question: &str) -> Classification {
        let prompt = build_prompt(question);

        let reply = match self.llm.complete(&prompt, self.params).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Classifier call failed, using default analysis: {}", e);
                return Classification::fallback(FallbackReason::Backend(e.to_string()));
            }
        };

        match parse_analysis(&reply) {
            Ok(analysis) => {
                tracing::debug!(
                    "Classified question as {} / {} ({} concepts, {} formulas)",
                    analysis.subject,
                    analysis.difficulty,
                    analysis.concepts.len(),
                    analysis.formulas.len()
                );
                Classification::Classified { analysis }
            }
            Err(reason) => {
                tracing::warn!("Unusable classifier reply, using default analysis: {}", reason);
                Classification::fallback(reason)
            }
        }
    }
}

/// Instruction prompt for the classification call
pub fn build_prompt(question: &str) -> String {
    format!(
        "Analyze the following STEM question and identify:\n\
         1. The subject: one of mathematics, physics, or chemistry\n\
         2. The difficulty level: one of Beginner, Intermediate, or Advanced\n\
         3. The key concepts involved\n\
         4. Any formulas that might be relevant\n\n\
         Question: {}\n\n\
         Respond with a JSON object with the keys \"subject\", \"difficulty\", \
         \"concepts\" (array of strings) and \"formulas\" (array of strings).",
        question
    )
}

/// Parse the model's reply into a validated analysis
pub fn parse_analysis(reply: &str) -> Result<QuestionAnalysis, FallbackReason> {
    let json = extract_json_object(reply)
        .ok_or_else(|| FallbackReason::Malformed("no JSON object in reply".to_string()))?;

    let raw: RawAnalysis =
        serde_json::from_str(json).map_err(|e| FallbackReason::Malformed(e.to_string()))?;

    let subject: Subject = raw
        .subject
        .parse()
        .map_err(|_| FallbackReason::UnknownSubject(raw.subject.clone()))?;
    let difficulty: Tier = raw
        .difficulty
        .parse()
        .map_err(|_| FallbackReason::UnknownDifficulty(raw.difficulty.clone()))?;

    Ok(QuestionAnalysis {
        subject,
        difficulty,
        concepts: clean(raw.concepts),
        formulas: clean(raw.formulas),
    })
}

/// Trim entries and drop blanks
fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
