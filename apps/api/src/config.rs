use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
    pub max_upload_mb: usize,
}

/// Timeout and retry policy shared by the generation and embedding clients.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    Http,
    Hashing,
}

impl FromStr for EmbeddingProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "hashing" => Ok(Self::Hashing),
            other => anyhow::bail!("EMBEDDING_PROVIDER must be 'http' or 'hashing', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
}

/// Retrieval engine tuning. Defaults mirror the production corpus settings.
#[derive(Debug, Clone)]
pub struct RagSettings {
    pub index_dir: PathBuf,
    pub collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub session_max_turns: usize,
    pub session_ttl_secs: u64,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./data/index"),
            collection: "company_policies".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            session_max_turns: 50,
            session_ttl_secs: 3600,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let rag_defaults = RagSettings::default();
        let provider: EmbeddingProvider = optional_env("EMBEDDING_PROVIDER", EmbeddingProvider::Http)?;

        let chunk_size = optional_env("CHUNK_SIZE", rag_defaults.chunk_size)?;
        let chunk_overlap = optional_env("CHUNK_OVERLAP", rag_defaults.chunk_overlap)?;
        if chunk_overlap >= chunk_size {
            anyhow::bail!("CHUNK_OVERLAP ({chunk_overlap}) must be smaller than CHUNK_SIZE ({chunk_size})");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm: LlmSettings {
                timeout_secs: optional_env("LLM_TIMEOUT_SECS", 60)?,
                max_retries: optional_env("LLM_MAX_RETRIES", 3)?,
                temperature: optional_env("GENERATION_TEMPERATURE", 0.1)?,
            },
            embedding: EmbeddingSettings {
                provider,
                api_url: std::env::var("EMBEDDING_API_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string()),
                api_key: std::env::var("EMBEDDING_API_KEY").ok(),
                model: std::env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                dimension: optional_env("EMBEDDING_DIMENSION", 1536)?,
            },
            rag: RagSettings {
                index_dir: std::env::var("INDEX_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(rag_defaults.index_dir),
                collection: std::env::var("INDEX_COLLECTION").unwrap_or(rag_defaults.collection),
                chunk_size,
                chunk_overlap,
                top_k: optional_env("RAG_TOP_K", rag_defaults.top_k)?,
                session_max_turns: optional_env("SESSION_MAX_TURNS", rag_defaults.session_max_turns)?,
                session_ttl_secs: optional_env("SESSION_TTL_SECS", rag_defaults.session_ttl_secs)?,
            },
            max_upload_mb: optional_env("MAX_UPLOAD_MB", 10)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Environment variable '{key}' is invalid: {e}")),
        Err(_) => Ok(default),
    }
}
