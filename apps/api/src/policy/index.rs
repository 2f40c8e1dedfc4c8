//! Vector Index: chunk + embedding + metadata, persisted per collection as JSON.
//!
//! Readers take an `Arc` of the current snapshot and search it without holding any lock.
//! Writers are serialized by `writer`, build the next snapshot off to the side, persist it
//! with an atomic rename, then swap it in. A reader therefore sees the old version or the
//! new one, never a mix.

use std::collections::HashSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::policy::chunker::Chunk;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Embedding dimension {got} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Index persistence task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// One immutable version of a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub collection: String,
    pub version: u64,
    pub dimension: Option<usize>,
    pub updated_at: Option<DateTime<Utc>>,
    pub entries: Vec<IndexEntry>,
}

impl IndexSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored embedding for a chunk whose id and text are unchanged.
    pub fn reusable_embedding(&self, id: Uuid, text: &str) -> Option<&[f32]> {
        self.entries
            .iter()
            .find(|e| e.chunk.id == id && e.chunk.text == text)
            .map(|e| e.embedding.as_slice())
    }

    /// Cosine top-k, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, &IndexEntry)>, IndexError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.dimension {
            if query.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    got: query.len(),
                });
            }
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

pub struct VectorIndex {
    path: PathBuf,
    collection: String,
    current: RwLock<Arc<IndexSnapshot>>,
    writer: Mutex<()>,
}

impl VectorIndex {
    /// Opens (or creates) the collection under `dir`. A corrupt file is a hard error.
    pub async fn open(dir: &Path, collection: &str) -> Result<Self, IndexError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| IndexError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        let path = dir.join(format!("{collection}.json"));

        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<IndexSnapshot>(&bytes).map_err(|source| {
                IndexError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexSnapshot {
                collection: collection.to_string(),
                ..IndexSnapshot::default()
            },
            Err(source) => return Err(IndexError::Io { path, source }),
        };

        info!(
            "Opened index collection '{}' (version {}, {} entries)",
            collection,
            snapshot.version,
            snapshot.len()
        );

        Ok(Self {
            path,
            collection: collection.to_string(),
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current version. Cheap: clones an `Arc`.
    pub async fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.read().await.clone()
    }

    /// Destructive rebuild: the collection afterwards holds exactly `entries`.
    pub async fn replace(&self, entries: Vec<IndexEntry>) -> Result<Arc<IndexSnapshot>, IndexError> {
        let _guard = self.writer.lock().await;
        let previous = self.snapshot().await;
        let dimension = uniform_dimension(&entries, None)?;
        let next = IndexSnapshot {
            collection: self.collection.clone(),
            version: previous.version + 1,
            dimension,
            updated_at: Some(Utc::now()),
            entries,
        };
        self.commit(next).await
    }

    /// Incremental upsert: every document named in `entries` has its previous chunks
    /// removed, then the new chunks are inserted. Other documents are untouched.
    pub async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<Arc<IndexSnapshot>, IndexError> {
        let _guard = self.writer.lock().await;
        let previous = self.snapshot().await;
        let dimension = uniform_dimension(&entries, previous.dimension)?;

        let touched: HashSet<&str> = entries
            .iter()
            .map(|e| e.chunk.metadata.policy_name.as_str())
            .collect();
        let mut merged: Vec<IndexEntry> = previous
            .entries
            .iter()
            .filter(|e| !touched.contains(e.chunk.metadata.policy_name.as_str()))
            .cloned()
            .collect();
        merged.extend(entries);

        let next = IndexSnapshot {
            collection: self.collection.clone(),
            version: previous.version + 1,
            dimension: dimension.or(previous.dimension),
            updated_at: Some(Utc::now()),
            entries: merged,
        };
        self.commit(next).await
    }

    /// Re-persists the current snapshot. Used on shutdown.
    pub async fn flush(&self) -> Result<(), IndexError> {
        let _guard = self.writer.lock().await;
        let snapshot = self.snapshot().await;
        persist(&self.path, snapshot).await
    }

    async fn commit(&self, next: IndexSnapshot) -> Result<Arc<IndexSnapshot>, IndexError> {
        let next = Arc::new(next);
        persist(&self.path, next.clone()).await?;
        *self.current.write().await = next.clone();
        info!(
            "Index collection '{}' now at version {} ({} entries)",
            self.collection,
            next.version,
            next.len()
        );
        Ok(next)
    }
}

/// All vectors must share one dimension, which must also match `existing` if set.
fn uniform_dimension(
    entries: &[IndexEntry],
    existing: Option<usize>,
) -> Result<Option<usize>, IndexError> {
    let mut dimension = existing;
    for entry in entries {
        let got = entry.embedding.len();
        match dimension {
            Some(expected) if expected != got => {
                return Err(IndexError::DimensionMismatch { expected, got })
            }
            Some(_) => {}
            None => dimension = Some(got),
        }
    }
    Ok(if entries.is_empty() { existing } else { dimension })
}

/// Writes to a temp file in the same directory and renames it over the target.
async fn persist(path: &Path, snapshot: Arc<IndexSnapshot>) -> Result<(), IndexError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        let io_err = |source| IndexError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        let bytes = serde_json::to_vec(snapshot.as_ref()).map_err(|source| IndexError::Corrupt {
            path: path.clone(),
            source,
        })?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| IndexError::Task(e.to_string()))?
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
