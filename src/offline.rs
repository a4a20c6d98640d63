//! Offline support: a write queue replayed once the backend is reachable, and
//! a cache of the last good GET bodies.

use crate::api::{ApiClient, LogKind};
use crate::errors::{ApiError, AppError};
use crate::storage::{load_json, persist_json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Destination for replayed writes.
pub trait WriteSink {
    fn submit(
        &self,
        kind: LogKind,
        payload: &Value,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

impl WriteSink for ApiClient {
    fn submit(
        &self,
        kind: LogKind,
        payload: &Value,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send {
        self.log(kind, payload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedWrite {
    pub id: u64,
    pub kind: LogKind,
    pub payload: Value,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueueData {
    next_id: u64,
    queues: BTreeMap<LogKind, VecDeque<QueuedWrite>>,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub replayed: usize,
    pub dropped: usize,
    pub remaining: usize,
}

pub struct OfflineQueue {
    path: PathBuf,
    data: Mutex<QueueData>,
    replaying: Mutex<()>,
}

impl OfflineQueue {
    pub async fn load(path: PathBuf) -> Self {
        let data: QueueData = load_json(&path).await;
        let pending: usize = data.queues.values().map(VecDeque::len).sum();
        if pending > 0 {
            info!("loaded {pending} queued offline writes");
        }
        Self {
            path,
            data: Mutex::new(data),
            replaying: Mutex::new(()),
        }
    }

    pub async fn enqueue(&self, kind: LogKind, payload: Value) -> Result<QueuedWrite, AppError> {
        let mut data = self.data.lock().await;
        data.next_id = data.next_id.saturating_add(1);
        let write = QueuedWrite {
            id: data.next_id,
            kind,
            payload,
            queued_at: Utc::now(),
        };
        data.queues.entry(kind).or_default().push_back(write.clone());
        persist_json(&self.path, &*data).await?;
        info!("queued {kind:?} write #{} for later replay", write.id);
        Ok(write)
    }

    pub async fn pending(&self) -> Vec<QueuedWrite> {
        let data = self.data.lock().await;
        data.queues.values().flatten().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        let data = self.data.lock().await;
        data.queues.values().map(VecDeque::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Replays each queue front to back. A queue stops at its first network
    /// failure; writes the server rejects are dropped. The queue lock is only
    /// taken between submissions, so writes can be enqueued during a replay.
    pub async fn replay<S: WriteSink>(&self, sink: &S) -> Result<ReplayReport, AppError> {
        let _replaying = self.replaying.lock().await;
        let mut report = ReplayReport::default();
        let kinds: Vec<LogKind> = {
            let data = self.data.lock().await;
            data.queues
                .iter()
                .filter(|(_, queue)| !queue.is_empty())
                .map(|(kind, _)| *kind)
                .collect()
        };
        if kinds.is_empty() {
            return Ok(report);
        }

        for kind in kinds {
            loop {
                let front = {
                    let data = self.data.lock().await;
                    data.queues.get(&kind).and_then(|queue| queue.front().cloned())
                };
                let Some(write) = front else {
                    break;
                };

                match sink.submit(kind, &write.payload).await {
                    Ok(_) => report.replayed += 1,
                    Err(err) if err.is_network() => {
                        warn!("{kind:?} queue still offline: {err}");
                        break;
                    }
                    Err(err) => {
                        error!("dropping queued {kind:?} write #{}: {err}", write.id);
                        report.dropped += 1;
                    }
                }

                let mut data = self.data.lock().await;
                if let Some(queue) = data.queues.get_mut(&kind) {
                    queue.retain(|queued| queued.id != write.id);
                }
            }
        }

        let mut data = self.data.lock().await;
        data.queues.retain(|_, queue| !queue.is_empty());
        report.remaining = data.queues.values().map(VecDeque::len).sum();
        persist_json(&self.path, &*data).await?;

        if report.replayed + report.dropped > 0 {
            info!(
                "replayed {} offline writes ({} dropped, {} remaining)",
                report.replayed, report.dropped, report.remaining
            );
        }
        Ok(report)
    }
}

/// Bodies kept for offline fallback. Recipe searches and per-circle paths
/// make the key space open-ended, so the oldest key is evicted past the cap.
pub const MAX_CACHED_RESPONSES: usize = 64;

#[derive(Debug, Default)]
struct CacheEntries {
    values: HashMap<String, Value>,
    order: VecDeque<String>,
}

pub struct ResponseCache {
    capacity: usize,
    entries: Mutex<CacheEntries>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_capacity(MAX_CACHED_RESPONSES)
    }
}

impl ResponseCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(CacheEntries::default()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.values.get(key).cloned()
    }

    pub async fn put(&self, key: &str, value: Value) {
        let mut entries = self.entries.lock().await;
        if entries.values.insert(key.to_string(), value).is_some() {
            entries.order.retain(|existing| existing != key);
        }
        entries.order.push_back(key.to_string());
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.values.remove(&oldest);
            }
        }
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.values.len()
    }
}
