//! Axum route handlers for the Policy QA API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::policy::PolicyDocument;
use crate::policy::assistant::{indexable, AnswerRecord, LoadOutcome, RagError};
use crate::policy::session::SessionHistory;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    #[default]
    Replace,
    Upsert,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub mode: UploadMode,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub count: usize,
    pub chunks: usize,
    pub mode: UploadMode,
}

/// POST /policy/ask
pub async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AnswerRecord>, AppError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let record = state.policy.ask(question, request.session_id).await;
    Ok(Json(record))
}

const NOTHING_TO_INDEX: &str = "No policy documents indexed: every document has empty content";

/// POST /policy/upload?mode=replace|upsert
///
/// Records the indexable documents in the record store, then indexes them. A store
/// failure leaves the live index untouched. An index failure after the records were
/// written leaves rows that the next upload of the same (name, version) overwrites.
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    Json(documents): Json<Vec<PolicyDocument>>,
) -> Result<Json<UploadResponse>, AppError> {
    if documents.is_empty() {
        return Err(AppError::Validation("No documents provided".to_string()));
    }
    if !state.policy.is_initialized() {
        return Err(RagError::NotInitialized.into());
    }

    let documents: Vec<PolicyDocument> = indexable(&documents).into_iter().cloned().collect();
    for document in &documents {
        state.store.save_policy(document).await?;
    }

    let outcome = match query.mode {
        UploadMode::Replace => state.policy.load(&documents).await?,
        UploadMode::Upsert => state.policy.upsert(&documents).await?,
    };

    let response = match outcome {
        LoadOutcome::Indexed { documents, chunks } => {
            info!("Policy upload ({:?}): {} documents, {} chunks", query.mode, documents, chunks);
            UploadResponse {
                message: format!("Successfully uploaded {documents} policy documents"),
                count: documents,
                chunks,
                mode: query.mode,
            }
        }
        LoadOutcome::NothingToIndex => {
            info!("Policy upload ({:?}): nothing to index", query.mode);
            UploadResponse {
                message: NOTHING_TO_INDEX.to_string(),
                count: 0,
                chunks: 0,
                mode: query.mode,
            }
        }
    };
    Ok(Json(response))
}

/// GET /policy/sessions/:id
pub async fn handle_session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionHistory>, AppError> {
    state
        .policy
        .session_history(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
}
