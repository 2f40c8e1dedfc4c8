//! Ask orchestration and the policy load path.
//!
//! `PolicyAssistant` owns the retrieval engine. The engine is built once by `init`; until
//! then every ask answers with the not-initialized sentinel and loads fail fast.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::RagSettings;
use crate::llm_client::{GenerationParams, TextGenerator};
use crate::models::policy::PolicyDocument;
use crate::policy::chunker::{Chunk, ChunkError, Chunker};
use crate::policy::context::{assemble, citations, estimate_confidence, Citation, Confidence};
use crate::policy::embedding::{EmbedError, Embedder};
use crate::policy::index::{IndexEntry, IndexError, VectorIndex};
use crate::policy::prompts::POLICY_QA_SYSTEM;
use crate::policy::retriever::Retriever;
use crate::policy::session::{QaTurn, SessionHistory, SessionStore};

const NOT_INITIALIZED: &str = "Policy engine not initialized.";
const EMPTY_CORPUS: &str = "Policy database is empty. Please upload policy documents first.";
const NO_MATCHES: &str = "No relevant policy information found for your question.";
const ANSWER_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Policy engine not initialized")]
    NotInitialized,

    #[error(transparent)]
    Chunk(#[from] ChunkError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    pub sources: Vec<Citation>,
    pub confidence: Confidence,
    pub num_sources: usize,
    pub session_id: String,
}

impl AnswerRecord {
    fn without_sources(question: &str, answer: String, confidence: Confidence, session_id: String) -> Self {
        Self {
            question: question.to_string(),
            answer,
            sources: Vec::new(),
            confidence,
            num_sources: 0,
            session_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Indexed { documents: usize, chunks: usize },
    /// Every input had empty content; the index was left untouched.
    NothingToIndex,
}

struct Engine {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    chunker: Chunker,
}

pub struct PolicyAssistant {
    engine: OnceCell<Engine>,
    llm: Arc<dyn TextGenerator>,
    sessions: Arc<SessionStore>,
    settings: RagSettings,
    params: GenerationParams,
}

impl PolicyAssistant {
    pub fn new(llm: Arc<dyn TextGenerator>, settings: RagSettings, temperature: f32) -> Self {
        let sessions = Arc::new(SessionStore::new(
            settings.session_max_turns,
            Duration::from_secs(settings.session_ttl_secs),
        ));
        Self {
            engine: OnceCell::new(),
            llm,
            sessions,
            settings,
            params: GenerationParams {
                temperature,
                max_tokens: ANSWER_MAX_TOKENS,
            },
        }
    }

    /// Opens the index and wires the retriever. Idempotent: later calls are no-ops.
    pub async fn init(&self, embedder: Arc<dyn Embedder>) -> Result<(), RagError> {
        self.engine
            .get_or_try_init(|| async {
                let chunker = Chunker::new(self.settings.chunk_size, self.settings.chunk_overlap)?;
                let index =
                    Arc::new(VectorIndex::open(&self.settings.index_dir, &self.settings.collection).await?);
                let snapshot = index.snapshot().await;
                if let Some(stored) = snapshot.dimension {
                    if stored != embedder.dimension() {
                        return Err(RagError::Index(IndexError::DimensionMismatch {
                            expected: stored,
                            got: embedder.dimension(),
                        }));
                    }
                }
                info!(
                    "Policy engine ready: {} chunks in '{}'",
                    snapshot.len(),
                    self.settings.collection
                );
                Ok::<_, RagError>(Engine {
                    retriever: Retriever::new(index.clone(), embedder.clone()),
                    index,
                    embedder,
                    chunker,
                })
            })
            .await?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.initialized()
    }

    fn engine(&self) -> Result<&Engine, RagError> {
        self.engine.get().ok_or(RagError::NotInitialized)
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        self.sessions.clone()
    }

    /// `(version, chunk count)` of the live index, if initialized.
    pub async fn index_stats(&self) -> Option<(u64, usize)> {
        let engine = self.engine.get()?;
        let snapshot = engine.index.snapshot().await;
        Some((snapshot.version, snapshot.len()))
    }

    /// Destructive rebuild of the collection from `documents`.
    pub async fn load(&self, documents: &[PolicyDocument]) -> Result<LoadOutcome, RagError> {
        let engine = self.engine()?;
        let documents = indexable(documents);
        if documents.is_empty() {
            return Ok(LoadOutcome::NothingToIndex);
        }

        let chunks: Vec<Chunk> = documents.iter().flat_map(|d| engine.chunker.chunk(d)).collect();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_all(engine.embedder.as_ref(), &texts).await?;
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        let total = entries.len();
        engine.index.replace(entries).await?;
        info!("Loaded {} policy documents ({} chunks)", documents.len(), total);
        Ok(LoadOutcome::Indexed {
            documents: documents.len(),
            chunks: total,
        })
    }

    /// Incremental upsert. Chunks whose id and text are unchanged keep their stored vector.
    pub async fn upsert(&self, documents: &[PolicyDocument]) -> Result<LoadOutcome, RagError> {
        let engine = self.engine()?;
        let documents = indexable(documents);
        if documents.is_empty() {
            return Ok(LoadOutcome::NothingToIndex);
        }

        let snapshot = engine.index.snapshot().await;
        let chunks: Vec<Chunk> = documents.iter().flat_map(|d| engine.chunker.chunk(d)).collect();

        let mut embeddings: Vec<Option<Vec<f32>>> = chunks
            .iter()
            .map(|c| snapshot.reusable_embedding(c.id, &c.text).map(<[f32]>::to_vec))
            .collect();
        let pending: Vec<usize> = (0..chunks.len()).filter(|&i| embeddings[i].is_none()).collect();
        let texts: Vec<String> = pending.iter().map(|&i| chunks[i].text.clone()).collect();
        let fresh = embed_all(engine.embedder.as_ref(), &texts).await?;
        for (i, vector) in pending.iter().zip(fresh) {
            embeddings[*i] = Some(vector);
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .filter_map(|(chunk, embedding)| embedding.map(|embedding| IndexEntry { chunk, embedding }))
            .collect();

        let total = entries.len();
        engine.index.upsert(entries).await?;
        info!(
            "Upserted {} policy documents ({} chunks, {} re-embedded)",
            documents.len(),
            total,
            texts.len()
        );
        Ok(LoadOutcome::Indexed {
            documents: documents.len(),
            chunks: total,
        })
    }

    /// Answers one question. Never fails: every outcome is an `AnswerRecord` whose
    /// confidence label says what happened.
    pub async fn ask(&self, question: &str, session_id: Option<String>) -> AnswerRecord {
        let session_id = SessionStore::resolve_id(session_id);

        let Some(engine) = self.engine.get() else {
            return AnswerRecord::without_sources(
                question,
                NOT_INITIALIZED.to_string(),
                Confidence::Error,
                session_id,
            );
        };

        // Held until the turn is appended so answers in one session stay in arrival order.
        let mut session = self.sessions.lock(&session_id).await;

        if engine.index.snapshot().await.is_empty() {
            let record =
                AnswerRecord::without_sources(question, EMPTY_CORPUS.to_string(), Confidence::None, session_id);
            session.append(turn_from(&record));
            return record;
        }

        let retrieved = match engine.retriever.retrieve(question, self.settings.top_k).await {
            Ok(retrieved) => retrieved,
            Err(e) => {
                warn!("Retrieval failed for session {}: {e}", session.id());
                return AnswerRecord::without_sources(
                    question,
                    format!("Error processing your question: {e}"),
                    Confidence::Error,
                    session_id,
                );
            }
        };

        if retrieved.is_empty() {
            let record =
                AnswerRecord::without_sources(question, NO_MATCHES.to_string(), Confidence::None, session_id);
            session.append(turn_from(&record));
            return record;
        }

        let prompt = assemble(question, &retrieved, &session.history());
        let answer = match self.llm.complete(&prompt, POLICY_QA_SYSTEM, self.params).await {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                warn!("Answer generation failed for session {}: {e}", session.id());
                return AnswerRecord::without_sources(
                    question,
                    format!("Error processing your question: {e}"),
                    Confidence::Error,
                    session_id,
                );
            }
        };

        let record = AnswerRecord {
            question: question.to_string(),
            answer,
            sources: citations(&retrieved),
            confidence: estimate_confidence(retrieved.len()),
            num_sources: retrieved.len(),
            session_id,
        };
        session.append(turn_from(&record));
        record
    }

    pub async fn session_history(&self, session_id: &str) -> Option<SessionHistory> {
        self.sessions.history(session_id).await
    }

    /// Flushes the index. Called once after the server stops accepting requests.
    pub async fn shutdown(&self) -> Result<(), RagError> {
        if let Some(engine) = self.engine.get() {
            engine.index.flush().await?;
            info!("Policy index flushed to {}", engine.index.path().display());
        }
        Ok(())
    }
}

/// Drops documents with blank content, keeping the last copy of any repeated name.
pub fn indexable(documents: &[PolicyDocument]) -> Vec<&PolicyDocument> {
    let mut seen = HashSet::new();
    let mut kept: Vec<&PolicyDocument> = documents
        .iter()
        .rev()
        .filter(|d| {
            if d.content.trim().is_empty() {
                warn!("Skipping policy '{}': empty content", d.name);
                return false;
            }
            seen.insert(d.name.as_str())
        })
        .collect();
    kept.reverse();
    kept
}

async fn embed_all(embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let vectors = embedder.embed(texts).await?;
    if vectors.len() != texts.len() {
        return Err(EmbedError::CountMismatch {
            expected: texts.len(),
            got: vectors.len(),
        });
    }
    Ok(vectors)
}

fn turn_from(record: &AnswerRecord) -> QaTurn {
    QaTurn {
        question: record.question.clone(),
        answer: record.answer.clone(),
        sources: record.sources.clone(),
        confidence: record.confidence,
        num_sources: record.num_sources,
        timestamp: Utc::now(),
    }
}
