//! Axum route handlers for the Screening API.

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{CandidateRow, ResumeData};
use crate::screening::extractor::validate_filename;
use crate::screening::scorer::{ResumeScorer, ScoringRequirements, ScoringResult};
use crate::screening::skills::parse_skill_list;
use crate::state::AppState;
use crate::store::NewCandidate;

const DEFAULT_TOP_LIMIT: i64 = 10;
const MAX_TOP_LIMIT: i64 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub resume: ResumeData,
    #[serde(default)]
    pub requirements: ScoringRequirements,
}

#[derive(Debug, Serialize)]
pub struct UploadResumeResponse {
    pub candidate_id: Uuid,
    pub name: Option<String>,
    pub overall_score: f64,
    pub is_qualified: bool,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopCandidatesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TopCandidatesResponse {
    pub count: usize,
    pub candidates: Vec<CandidateRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /resume/score
///
/// Scores an already-extracted resume. No I/O.
pub async fn handle_score(Json(request): Json<ScoreRequest>) -> Json<ScoringResult> {
    let scorer = ResumeScorer::new(&request.requirements);
    Json(scorer.score(&request.resume))
}

/// POST /resume/upload
///
/// Multipart fields: `file` (.pdf or .txt), `required_skills` (comma list), `min_experience`.
/// Extracts, scores, archives the original and saves the candidate.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResumeResponse>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut required_skills = String::new();
    let mut min_experience = 0u32;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("file field has no filename".to_string()))?;
                validate_filename(&filename)?;
                upload = Some((filename, field.bytes().await?));
            }
            "required_skills" => required_skills = field.text().await?,
            "min_experience" => {
                let raw = field.text().await?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    min_experience = raw.parse().map_err(|_| {
                        AppError::Validation(format!("min_experience must be a whole number, got '{raw}'"))
                    })?;
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::Validation("file field is required".to_string()))?;

    let resume = state.extractor.parse_resume(&filename, bytes.to_vec()).await;
    if let Some(reason) = &resume.error {
        return Err(AppError::Validation(reason.clone()));
    }

    let requirements = ScoringRequirements {
        required_skills: parse_skill_list(&required_skills),
        min_experience,
    };
    let scoring = ResumeScorer::new(&requirements).score(&resume);

    let candidate_id = Uuid::new_v4();
    let key = format!("resumes/{candidate_id}/{}", safe_filename(&filename));
    let resume_s3_key = state
        .store
        .archive_upload(&key, bytes, content_type(&filename))
        .await?;

    let response = UploadResumeResponse {
        candidate_id,
        name: resume.name.clone(),
        overall_score: scoring.overall_score,
        is_qualified: scoring.is_qualified,
        matched_skills: scoring.matched_skills.clone(),
        missing_skills: scoring.missing_skills.clone(),
    };

    state
        .store
        .save_candidate(NewCandidate {
            id: candidate_id,
            original_filename: Some(filename),
            resume_s3_key: Some(resume_s3_key),
            resume,
            scoring,
            requirements,
        })
        .await?;

    info!(
        "Processed resume for candidate {} (score {:.2})",
        candidate_id, response.overall_score
    );
    Ok(Json(response))
}

/// GET /candidates/top?limit=
pub async fn handle_top_candidates(
    State(state): State<AppState>,
    Query(query): Query<TopCandidatesQuery>,
) -> Result<Json<TopCandidatesResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    if !(1..=MAX_TOP_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "Limit must be between 1 and {MAX_TOP_LIMIT}"
        )));
    }

    let candidates = state.store.top_candidates(limit).await?;
    Ok(Json(TopCandidatesResponse {
        count: candidates.len(),
        candidates,
    }))
}

/// Keeps alphanumerics and `._- `; anything else is dropped.
fn safe_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
        .collect()
}

fn content_type(filename: &str) -> &'static str {
    if filename.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "text/plain"
    }
}
