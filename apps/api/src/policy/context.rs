//! Context assembly, citations and retrieval confidence.

use serde::{Deserialize, Serialize};

use crate::llm_client::prompts::fill_template;
use crate::policy::prompts::{NO_HISTORY, POLICY_QA_PROMPT};
use crate::policy::retriever::RetrievedChunk;
use crate::policy::session::QaTurn;

const EXCERPT_CHARS: usize = 200;

/// Label derived from how many chunks retrieval yielded. `Error` marks a failed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
    Error,
}

/// 0 → none, ≥4 → high, ≥2 → medium, otherwise low.
pub fn estimate_confidence(retrieved: usize) -> Confidence {
    match retrieved {
        0 => Confidence::None,
        n if n >= 4 => Confidence::High,
        n if n >= 2 => Confidence::Medium,
        _ => Confidence::Low,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub content: String,
    pub policy_name: String,
    pub category: String,
    pub version: String,
}

pub fn excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_CHARS {
        let head: String = text.chars().take(EXCERPT_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

pub fn citations(retrieved: &[RetrievedChunk]) -> Vec<Citation> {
    retrieved
        .iter()
        .map(|chunk| Citation {
            content: excerpt(&chunk.text),
            policy_name: chunk.metadata.policy_name.clone(),
            category: chunk.metadata.category.clone(),
            version: chunk.metadata.version.clone(),
        })
        .collect()
}

/// Builds the grounded prompt: retrieved chunks in rank order, prior turns oldest first,
/// then the current question.
pub fn assemble(question: &str, retrieved: &[RetrievedChunk], history: &[QaTurn]) -> String {
    let context = retrieved
        .iter()
        .map(|chunk| format!("[Policy: {}]\n{}", chunk.metadata.policy_name, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let history = if history.is_empty() {
        NO_HISTORY.to_string()
    } else {
        history
            .iter()
            .map(|turn| format!("Q: {}\nA: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    };

    fill_template(
        POLICY_QA_PROMPT,
        &[
            ("context", context.as_str()),
            ("history", history.as_str()),
            ("question", question),
        ],
    )
}
