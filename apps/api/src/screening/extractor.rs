//! Resume extraction: raw upload → text → structured `ResumeData` (+ quality rating).
//!
//! Every model-facing step goes through the tolerant JSON seam and degrades to a typed
//! fallback; nothing here fails because the model said something unexpected.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::{fill_template, JSON_ONLY_SYSTEM};
use crate::llm_client::{complete_json, GenerationParams, TextGenerator};
use crate::models::candidate::{ExtractionMethod, QualityAnalysis, ResumeData};
use crate::screening::prompts::{RESUME_EXTRACT_PROMPT, RESUME_QUALITY_PROMPT};

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Below this many characters the text is not worth sending to the model.
const MIN_TEXT_CHARS: usize = 50;
const PROMPT_TEXT_CHARS: usize = 3000;
const QUALITY_PROMPT_SKILLS: usize = 15;

const EXTRACTION_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.0,
    max_tokens: 2048,
};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid file type '{0}'. Allowed: .pdf, .txt")]
    UnsupportedFileType(String),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("Text file is not valid UTF-8")]
    Encoding,
}

/// Document Text Extractor: `extract(file) → text | failure`.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let extension = extension_of(filename);

    match extension.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map(|text| text.trim().to_string())
            .map_err(|e| ExtractError::Pdf(e.to_string())),
        "txt" => std::str::from_utf8(bytes)
            .map(|text| text.trim().to_string())
            .map_err(|_| ExtractError::Encoding),
        _ => Err(ExtractError::UnsupportedFileType(extension)),
    }
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Error marker for an upload that yielded too little text, named after its file type.
fn unreadable_marker(filename: &str) -> String {
    match extension_of(filename).as_str() {
        "pdf" => "Unable to extract text from PDF".to_string(),
        "txt" => "Unable to extract text from text file".to_string(),
        "" => "Unable to extract text from file".to_string(),
        other => format!("Unable to extract text from .{other} file"),
    }
}

/// Rejects uploads whose extension is not on the allow-list before any work is done.
pub fn validate_filename(filename: &str) -> Result<(), ExtractError> {
    let extension = extension_of(filename);
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ExtractError::UnsupportedFileType(extension))
    }
}

#[derive(Clone)]
pub struct ResumeExtractor {
    llm: Arc<dyn TextGenerator>,
}

impl ResumeExtractor {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Full pipeline: text extraction, structured extraction, quality rating.
    /// Returns a record carrying the error marker when the text is unusable.
    pub async fn parse_resume(&self, filename: &str, bytes: Vec<u8>) -> ResumeData {
        let name = filename.to_string();
        let text = match tokio::task::spawn_blocking(move || extract_text(&name, &bytes)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("Text extraction failed for {filename}: {e}");
                String::new()
            }
            Err(e) => {
                warn!("Text extraction task aborted for {filename}: {e}");
                String::new()
            }
        };

        if text.chars().count() < MIN_TEXT_CHARS {
            return ResumeData::failed(unreadable_marker(filename));
        }

        let mut data = self.extract_structured(&text).await;
        data.quality_analysis = Some(self.analyze_quality(&data).await);
        data
    }

    pub async fn extract_structured(&self, resume_text: &str) -> ResumeData {
        let excerpt: String = resume_text.chars().take(PROMPT_TEXT_CHARS).collect();
        let prompt = fill_template(RESUME_EXTRACT_PROMPT, &[("resume_text", excerpt.as_str())]);

        match complete_json::<ResumeData>(self.llm.as_ref(), &prompt, JSON_ONLY_SYSTEM, EXTRACTION_PARAMS)
            .await
        {
            Ok(mut data) => {
                info!("Structured extraction succeeded: {} skills", data.skills.len());
                data.error = None;
                data.extraction_method = Some(ExtractionMethod::Llm);
                data
            }
            Err(e) => {
                warn!("AI extraction failed, using fallback: {e}");
                fallback_extraction(resume_text)
            }
        }
    }

    pub async fn analyze_quality(&self, data: &ResumeData) -> QualityAnalysis {
        let skills = data
            .skills
            .iter()
            .take(QUALITY_PROMPT_SKILLS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let years = data.years_of_experience.to_string();
        let prompt = fill_template(
            RESUME_QUALITY_PROMPT,
            &[
                ("name", data.name.as_deref().unwrap_or("N/A")),
                ("skills", skills.as_str()),
                ("years", years.as_str()),
            ],
        );

        complete_json::<QualityAnalysis>(self.llm.as_ref(), &prompt, JSON_ONLY_SYSTEM, EXTRACTION_PARAMS)
            .await
            .unwrap_or_else(|e| {
                warn!("Quality analysis failed, using fallback: {e}");
                QualityAnalysis::fallback()
            })
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
    })
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        Regex::new(r"(\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").expect("valid phone regex")
    })
}

/// Regex-only extraction used when the model output is unusable.
pub fn fallback_extraction(text: &str) -> ResumeData {
    ResumeData {
        email: email_pattern().find(text).map(|m| m.as_str().to_string()),
        phone: phone_pattern().find(text).map(|m| m.as_str().trim().to_string()),
        extraction_method: Some(ExtractionMethod::Fallback),
        ..ResumeData::default()
    }
}
