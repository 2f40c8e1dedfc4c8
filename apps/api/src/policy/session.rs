//! Session Memory: per-session ordered question/answer history.
//!
//! Each session sits behind its own async mutex. The ask path holds that lock from
//! reading history to appending the new turn, so turns land in arrival order.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::policy::context::{Citation, Confidence};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaTurn {
    pub question: String,
    pub answer: String,
    pub sources: Vec<Citation>,
    pub confidence: Confidence,
    pub num_sources: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Session {
    id: String,
    turns: VecDeque<QaTurn>,
    max_turns: usize,
    last_active: Instant,
}

impl Session {
    fn new(id: String, max_turns: usize) -> Self {
        Self {
            id,
            turns: VecDeque::new(),
            max_turns: max_turns.max(1),
            last_active: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Oldest first.
    pub fn history(&self) -> Vec<QaTurn> {
        self.turns.iter().cloned().collect()
    }

    /// Appends a turn, dropping the oldest once the ring is full.
    pub fn append(&mut self, turn: QaTurn) {
        if self.turns.len() == self.max_turns {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
        self.last_active = Instant::now();
    }
}

/// Serializable view for the history endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionHistory {
    pub session_id: String,
    pub turns: Vec<QaTurn>,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
    max_turns: usize,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(max_turns: usize, ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_turns,
            ttl,
        }
    }

    /// Returns the caller's id, or mints a fresh one when absent or blank.
    pub fn resolve_id(session_id: Option<String>) -> String {
        session_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Locks the session (creating it if needed) for the duration of one ask.
    ///
    /// The returned guard always belongs to the session currently in the map. Once
    /// held, `prune` cannot evict it.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<Session> {
        loop {
            let session = {
                let mut sessions = self.sessions.lock().await;
                sessions
                    .entry(id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(Session::new(id.to_string(), self.max_turns))))
                    .clone()
            };
            let mut guard = session.clone().lock_owned().await;

            // Evicted between the map lookup and acquiring the session: start over.
            let current = self
                .sessions
                .lock()
                .await
                .get(id)
                .is_some_and(|s| Arc::ptr_eq(s, &session));
            if current {
                guard.last_active = Instant::now();
                return guard;
            }
            debug!("Session {id} was evicted while waiting, reattaching");
        }
    }

    pub async fn history(&self, id: &str) -> Option<SessionHistory> {
        let session = self.sessions.lock().await.get(id).cloned()?;
        let session = session.lock().await;
        Some(SessionHistory {
            session_id: session.id.clone(),
            turns: session.history(),
        })
    }

    #[cfg(test)]
    pub async fn append(&self, id: &str, turn: QaTurn) {
        self.lock(id).await.append(turn);
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Evicts sessions idle for longer than the TTL. Sessions currently locked by an
    /// in-flight ask are active by definition and are kept.
    pub async fn prune(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(s) => now.duration_since(s.last_active) <= self.ttl,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {evicted} idle sessions");
        }
        evicted
    }

    pub fn spawn_pruner(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        info!(
            "Session pruner running every {}s (ttl {}s)",
            every.as_secs(),
            self.ttl.as_secs()
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                self.prune().await;
            }
        })
    }
}
