//! Upload session: owns the currently published snapshot and replaces it
//! wholesale on every completed upload.

use chrono::{DateTime, NaiveDate, Utc};
use models::{PortfolioSnapshot, PositionStats};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::error::{EngineError, Result};
use crate::stats::{calculate_stats, reference_time};

/// Snapshot plus the stats computed for it at publication time.
#[derive(Debug, Clone)]
pub struct PublishedPortfolio {
    pub snapshot: PortfolioSnapshot,
    pub stats: PositionStats,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct PortfolioSession {
    as_of: Option<NaiveDate>,
    // Uploads run one at a time; a second upload waits for the first to publish.
    upload_lock: Mutex<()>,
    current: RwLock<Option<Arc<PublishedPortfolio>>>,
}

impl PortfolioSession {
    pub fn new(as_of: Option<NaiveDate>) -> Self {
        Self {
            as_of,
            ..Default::default()
        }
    }

    /// Reads the file, then runs the whole pipeline before publishing.
    /// On a read failure the previously published state is left in place.
    pub async fn upload_file<P: AsRef<Path>>(&self, path: P) -> Result<Arc<PublishedPortfolio>> {
        let path = path.as_ref();
        let _guard = self.upload_lock.lock().await;

        let bytes = tokio::fs::read(path).await.map_err(|source| EngineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);

        Ok(self.publish(&text).await)
    }

    pub async fn upload_text(&self, raw: &str) -> Arc<PublishedPortfolio> {
        let _guard = self.upload_lock.lock().await;
        self.publish(raw).await
    }

    pub async fn current(&self) -> Option<Arc<PublishedPortfolio>> {
        self.current.read().await.clone()
    }

    /// Teardown: drops the published state.
    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    async fn publish(&self, raw: &str) -> Arc<PublishedPortfolio> {
        let snapshot = crate::build_snapshot(raw);
        let stats = calculate_stats(&snapshot, reference_time(self.as_of));
        let published = Arc::new(PublishedPortfolio {
            snapshot,
            stats,
            published_at: Utc::now(),
        });

        tracing::info!(
            digest = %&published.snapshot.source_digest[..12],
            positions = published.snapshot.positions.len(),
            options = published.stats.options,
            "snapshot published"
        );

        *self.current.write().await = Some(Arc::clone(&published));
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIRST: &str = "Symbol,Last,Pos Qty,%Change,Avg Price,Days\n\
        AAPL,150.00,+100,+1.2%,140.00,-\n\
        .AAPL250117C150,5.00,-2,+3.0%,4.00,30\n";
    const SECOND: &str = "Symbol,Last,Pos Qty,%Change,Avg Price,Days\n\
        912828XG8,99.50,10,+0.1%,98.00,-\n";

    #[tokio::test]
    async fn test_new_session_is_empty() {
        let session = PortfolioSession::new(None);
        assert!(session.current().await.is_none());
    }

    #[tokio::test]
    async fn test_upload_replaces_previous_snapshot() {
        let session = PortfolioSession::new(NaiveDate::from_ymd_opt(2025, 1, 10));
        let first = session.upload_text(FIRST).await;
        assert_eq!(first.stats.stocks, 1);
        assert_eq!(first.stats.options, 1);
        assert_eq!(first.stats.expirations.next_7_days, 1);

        session.upload_text(SECOND).await;
        let current = session.current().await.unwrap();
        assert_eq!(current.stats.stocks, 0);
        assert_eq!(current.stats.options, 0);
        assert_eq!(current.stats.bonds, 1);
        assert!(current.snapshot.groups.is_empty());
        // Earlier handle is still intact.
        assert_eq!(first.snapshot.groups.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIRST.as_bytes()).unwrap();

        let session = PortfolioSession::new(None);
        let published = session.upload_file(file.path()).await.unwrap();
        assert_eq!(published.snapshot.positions.len(), 2);
        assert!(session.current().await.is_some());
    }

    #[tokio::test]
    async fn test_read_failure_keeps_current_state() {
        let session = PortfolioSession::new(None);
        session.upload_text(FIRST).await;

        let err = session
            .upload_file("/definitely/not/here.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Read { .. }));

        let current = session.current().await.unwrap();
        assert_eq!(current.snapshot.positions.len(), 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let session = PortfolioSession::new(None);
        session.upload_text(SECOND).await;
        session.clear().await;
        assert!(session.current().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_uploads_serialize() {
        let session = Arc::new(PortfolioSession::new(None));
        let a = {
            let s = Arc::clone(&session);
            tokio::spawn(async move { s.upload_text(FIRST).await })
        };
        let b = {
            let s = Arc::clone(&session);
            tokio::spawn(async move { s.upload_text(SECOND).await })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        let current = session.current().await.unwrap();
        // One complete upload stays published, never a mix of both.
        assert!(current.snapshot == a.snapshot || current.snapshot == b.snapshot);
        assert_ne!(a.snapshot, b.snapshot);
    }
}
