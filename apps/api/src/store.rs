//! Persistent Store: candidate, policy and onboarding records in PostgreSQL, original
//! uploads in S3.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::candidate::{CandidateRow, ResumeData};
use crate::models::onboarding::OnboardingPlan;
use crate::models::policy::PolicyDocument;
use crate::screening::scorer::{ScoringRequirements, ScoringResult};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A scored candidate ready to be written.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub id: Uuid,
    pub original_filename: Option<String>,
    pub resume_s3_key: Option<String>,
    pub resume: ResumeData,
    pub scoring: ScoringResult,
    pub requirements: ScoringRequirements,
}

/// Carried in `AppState` as `Arc<dyn RecordStore>`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save_candidate(&self, candidate: NewCandidate) -> Result<Uuid, StoreError>;

    /// Highest overall score first.
    async fn top_candidates(&self, limit: i64) -> Result<Vec<CandidateRow>, StoreError>;

    async fn save_policy(&self, document: &PolicyDocument) -> Result<(), StoreError>;

    /// Stores the raw upload and returns its object key.
    async fn archive_upload(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StoreError>;

    async fn save_onboarding_plan(&self, plan: &OnboardingPlan) -> Result<Uuid, StoreError>;
}

pub struct PgStore {
    pool: PgPool,
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl PgStore {
    pub fn new(pool: PgPool, s3: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { pool, s3, bucket }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn save_candidate(&self, candidate: NewCandidate) -> Result<Uuid, StoreError> {
        let resume = serde_json::to_value(&candidate.resume)?;
        let scoring = serde_json::to_value(&candidate.scoring)?;
        let min_experience = i32::try_from(candidate.requirements.min_experience).unwrap_or(i32::MAX);

        sqlx::query(
            r#"
            INSERT INTO candidates
                (id, name, email, original_filename, resume_s3_key, overall_score,
                 is_qualified, resume, scoring, required_skills, min_experience_required)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(candidate.id)
        .bind(&candidate.resume.name)
        .bind(&candidate.resume.email)
        .bind(&candidate.original_filename)
        .bind(&candidate.resume_s3_key)
        .bind(candidate.scoring.overall_score)
        .bind(candidate.scoring.is_qualified)
        .bind(resume)
        .bind(scoring)
        .bind(&candidate.requirements.required_skills)
        .bind(min_experience)
        .execute(&self.pool)
        .await?;

        info!(
            "Saved candidate {} (score {:.2}, qualified: {})",
            candidate.id, candidate.scoring.overall_score, candidate.scoring.is_qualified
        );
        Ok(candidate.id)
    }

    async fn top_candidates(&self, limit: i64) -> Result<Vec<CandidateRow>, StoreError> {
        Ok(sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, name, email, original_filename, resume_s3_key, overall_score,
                   is_qualified, resume, scoring, required_skills, min_experience_required,
                   created_at
            FROM candidates
            ORDER BY overall_score DESC, created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn save_policy(&self, document: &PolicyDocument) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO policies (name, version, category, source, content)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name, version)
            DO UPDATE SET category = EXCLUDED.category,
                          source = EXCLUDED.source,
                          content = EXCLUDED.content,
                          updated_at = NOW()
            "#,
        )
        .bind(&document.name)
        .bind(&document.version)
        .bind(&document.category)
        .bind(&document.source)
        .bind(&document.content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn archive_upload(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StoreError> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;

        info!("Archived upload to s3://{}/{}", self.bucket, key);
        Ok(key.to_string())
    }

    async fn save_onboarding_plan(&self, plan: &OnboardingPlan) -> Result<Uuid, StoreError> {
        let body = serde_json::to_value(plan)?;

        sqlx::query(
            r#"
            INSERT INTO onboarding_plans
                (id, employee_name, role, department, start_date, generation_method, plan, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(plan.id)
        .bind(&plan.employee_name)
        .bind(&plan.role)
        .bind(&plan.department)
        .bind(plan.start_date)
        .bind(plan.generation_method.as_str())
        .bind(body)
        .bind(plan.created_at)
        .execute(&self.pool)
        .await?;

        info!("Saved onboarding plan {} for {}", plan.id, plan.employee_name);
        Ok(plan.id)
    }
}
