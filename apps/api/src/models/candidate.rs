use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Structured resume fields produced by the extraction step.
///
/// `error` is the upstream marker: when present the scorer returns the zero result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub certifications: Vec<String>,
    pub years_of_experience: f64,
    pub languages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_analysis: Option<QualityAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<ExtractionMethod>,
}

impl ResumeData {
    /// The "no usable data" record handed to the scorer when extraction failed.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub company: Option<String>,
    pub title: Option<String>,
    pub duration: Option<String>,
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: Option<String>,
    pub year: Option<Value>,
}

/// Model-rated resume quality. Only `overall_quality_score` feeds the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAnalysis {
    #[serde(default)]
    pub overall_quality_score: Option<f64>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub keyword_optimization: Vec<String>,
    #[serde(default)]
    pub presentation_score: Option<f64>,
}

impl QualityAnalysis {
    /// Value used when the model's rating cannot be obtained or parsed.
    pub fn fallback() -> Self {
        Self {
            overall_quality_score: Some(50.0),
            strengths: vec!["Resume submitted".to_string()],
            areas_for_improvement: vec!["Unable to analyze".to_string()],
            keyword_optimization: vec![],
            presentation_score: Some(50.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Llm,
    Fallback,
}

/// Persisted candidate row: contact fields plus the scoring verdict.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub original_filename: Option<String>,
    pub resume_s3_key: Option<String>,
    pub overall_score: f64,
    pub is_qualified: bool,
    pub resume: Value,
    pub scoring: Value,
    pub required_skills: Vec<String>,
    pub min_experience_required: i32,
    pub created_at: DateTime<Utc>,
}
