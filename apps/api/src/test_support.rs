//! In-memory stand-ins for the external services, shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::llm_client::{GenerationParams, LlmError, TextGenerator};
use crate::models::candidate::CandidateRow;
use crate::models::onboarding::OnboardingPlan;
use crate::models::policy::PolicyDocument;
use crate::policy::embedding::{EmbedError, Embedder, HashingEmbedder};
use crate::store::{NewCandidate, RecordStore, StoreError};

/// Replays canned replies in order and records every prompt it receives.
/// Once the script runs out every call fails.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(
        &self,
        prompt: &str,
        _system: &str,
        _params: GenerationParams,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            }))
    }
}

pub struct FailingEmbedder {
    dim: usize,
}

impl FailingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Err(EmbedError::Api {
            status: 503,
            message: "embedding backend down".to_string(),
        })
    }
}

/// Hashing embedder that counts how many texts it was asked to embed.
pub struct CountingEmbedder {
    inner: HashingEmbedder,
    embedded: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            inner: HashingEmbedder::new(dim),
            embedded: AtomicUsize::new(0),
        }
    }

    pub fn embedded(&self) -> usize {
        self.embedded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed(texts).await
    }
}

#[derive(Default)]
pub struct MemoryStore {
    candidates: Mutex<Vec<CandidateRow>>,
    policies: Mutex<Vec<PolicyDocument>>,
    objects: Mutex<Vec<(String, usize)>>,
    onboarding_plans: Mutex<Vec<OnboardingPlan>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Every subsequent write fails with a database error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn onboarding_plans(&self) -> Vec<OnboardingPlan> {
        self.onboarding_plans.lock().unwrap().clone()
    }

    pub fn policies(&self) -> Vec<PolicyDocument> {
        self.policies.lock().unwrap().clone()
    }

    pub fn objects(&self) -> Vec<(String, usize)> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save_candidate(&self, candidate: NewCandidate) -> Result<Uuid, StoreError> {
        self.check_writable()?;
        let row = CandidateRow {
            id: candidate.id,
            name: candidate.resume.name.clone(),
            email: candidate.resume.email.clone(),
            original_filename: candidate.original_filename,
            resume_s3_key: candidate.resume_s3_key,
            overall_score: candidate.scoring.overall_score,
            is_qualified: candidate.scoring.is_qualified,
            resume: serde_json::to_value(&candidate.resume)?,
            scoring: serde_json::to_value(&candidate.scoring)?,
            required_skills: candidate.requirements.required_skills,
            min_experience_required: candidate.requirements.min_experience as i32,
            created_at: chrono::Utc::now(),
        };
        self.candidates.lock().unwrap().push(row);
        Ok(candidate.id)
    }

    async fn top_candidates(&self, limit: i64) -> Result<Vec<CandidateRow>, StoreError> {
        let mut rows = self.candidates.lock().unwrap().clone();
        rows.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn save_policy(&self, document: &PolicyDocument) -> Result<(), StoreError> {
        self.check_writable()?;
        self.policies.lock().unwrap().push(document.clone());
        Ok(())
    }

    async fn archive_upload(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, StoreError> {
        self.check_writable()?;
        self.objects.lock().unwrap().push((key.to_string(), bytes.len()));
        Ok(key.to_string())
    }

    async fn save_onboarding_plan(&self, plan: &OnboardingPlan) -> Result<Uuid, StoreError> {
        self.check_writable()?;
        self.onboarding_plans.lock().unwrap().push(plan.clone());
        Ok(plan.id)
    }
}

/// A fully populated `Config` pointing the index at `index_dir`. No env access.
pub fn test_config(index_dir: &std::path::Path) -> crate::config::Config {
    use crate::config::{Config, EmbeddingProvider, EmbeddingSettings, LlmSettings, RagSettings};

    Config {
        database_url: "postgres://localhost/hrdesk_test".to_string(),
        s3_bucket: "hrdesk-test".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        anthropic_api_key: "test".to_string(),
        port: 0,
        rust_log: "info".to_string(),
        llm: LlmSettings {
            timeout_secs: 5,
            max_retries: 1,
            temperature: 0.1,
        },
        embedding: EmbeddingSettings {
            provider: EmbeddingProvider::Hashing,
            api_url: String::new(),
            api_key: None,
            model: "hashing".to_string(),
            dimension: 256,
        },
        rag: RagSettings {
            index_dir: index_dir.to_path_buf(),
            ..RagSettings::default()
        },
        max_upload_mb: 1,
    }
}
