//! In-memory rate card history sink

use async_trait::async_trait;
use shipwise_core::{models::VersionHistoryEntry, traits::AuditSink, AppError, AppResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of [`AuditSink`]
///
/// `set_unavailable(true)` makes every append fail, to exercise the
/// "no history, no commit" path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditSink {
    entries: Arc<RwLock<Vec<VersionHistoryEntry>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every entry recorded so far
    pub async fn entries(&self) -> Vec<VersionHistoryEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, entry: &VersionHistoryEntry) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("audit sink unavailable".to_string()));
        }
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn history(&self, rate_card_id: Uuid) -> AppResult<Vec<VersionHistoryEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.rate_card_id == rate_card_id)
            .cloned()
            .collect())
    }
}
