use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::extraction::StructuredExtractor;
use crate::import::{ImportConfig, ImportOrchestrator};

/// Live import sessions by id. Sessions never share documents.
pub type SessionStore = Arc<RwLock<HashMap<Uuid, Arc<ImportOrchestrator>>>>;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Copied into every new session.
    pub import: ImportConfig,
    /// Selected by EXTRACTION_BACKEND at startup.
    pub extractor: Arc<dyn StructuredExtractor>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, extractor: Arc<dyn StructuredExtractor>) -> Self {
        Self {
            import: ImportConfig::from(&config),
            config,
            extractor,
            sessions: SessionStore::default(),
        }
    }
}

/// Drops every idle session whose last state change is older than `ttl`.
/// Returns how many were removed.
pub async fn evict_expired(sessions: &SessionStore, ttl: chrono::Duration) -> usize {
    let now = Utc::now();
    let mut sessions = sessions.write().await;
    let before = sessions.len();
    sessions.retain(|_, session| {
        if session.is_expired(now, ttl) {
            session.reset();
            false
        } else {
            true
        }
    });
    before - sessions.len()
}

/// Sweeps expired sessions every `period` for the life of the process.
pub fn spawn_session_sweeper(sessions: SessionStore, ttl: Duration, period: Duration) {
    // Out-of-range TTLs mean "never expire" in practice.
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = evict_expired(&sessions, ttl).await;
            if evicted > 0 {
                info!(evicted, "Expired import sessions removed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::extraction::{CandidateResume, ExtractionRequest, ServiceError};

    struct NoopExtractor;

    #[async_trait]
    impl StructuredExtractor for NoopExtractor {
        async fn extract(&self, _: &ExtractionRequest) -> Result<CandidateResume, ServiceError> {
            Ok(CandidateResume(json!({})))
        }

        fn backend(&self) -> &'static str {
            "noop"
        }
    }

    async fn store_with(count: usize) -> SessionStore {
        let store = SessionStore::default();
        for _ in 0..count {
            let session = Arc::new(ImportOrchestrator::new(
                ImportConfig::default(),
                Arc::new(NoopExtractor),
            ));
            store.write().await.insert(session.id(), session);
        }
        store
    }

    #[tokio::test]
    async fn test_fresh_sessions_survive_sweep() {
        let store = store_with(3).await;
        assert_eq!(evict_expired(&store, chrono::Duration::hours(1)).await, 0);
        assert_eq!(store.read().await.len(), 3);
    }

    #[tokio::test]
    async fn test_stale_sessions_are_evicted() {
        let store = store_with(3).await;
        assert_eq!(evict_expired(&store, chrono::Duration::zero()).await, 3);
        assert!(store.read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval() {
        let store = store_with(2).await;
        spawn_session_sweeper(store.clone(), Duration::ZERO, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(store.read().await.is_empty());
    }
}
