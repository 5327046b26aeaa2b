//! Guarded sync logging.
//!
//! Every fetch-protocol state transition and reconciliation milestone is
//! mirrored to the log sink. The sink itself may fail (it is just another
//! store); a failed write is reported to process diagnostics via `tracing`
//! and swallowed, so logging can never break the pipeline.

use std::sync::Arc;

use stocklink_core::{LogLevel, ShopId, SyncLogEntry};

use crate::store::SyncLogStore;

/// Cheap-to-clone handle around a shared log sink.
#[derive(Clone)]
pub struct SyncLogger {
    sink: Arc<dyn SyncLogStore>,
}

impl SyncLogger {
    /// Wrap a log sink.
    #[must_use]
    pub fn new(sink: Arc<dyn SyncLogStore>) -> Self {
        Self { sink }
    }

    /// Append one entry. Sink failures are downgraded to a `tracing` warning
    /// and never propagate.
    pub async fn log(
        &self,
        shop_id: ShopId,
        adapter: &str,
        level: LogLevel,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) {
        let entry = SyncLogEntry::new(shop_id, adapter, level, message, metadata);
        if let Err(error) = self.sink.append(entry).await {
            tracing::warn!(%shop_id, adapter, %error, "sync log write failed");
        }
    }

    /// Access the underlying sink (for listing entries).
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn SyncLogStore> {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::store::StoreError;

    use super::*;

    struct FailingSink;

    #[async_trait]
    impl SyncLogStore for FailingSink {
        async fn append(&self, _entry: SyncLogEntry) -> Result<(), StoreError> {
            Err(StoreError::Io("disk full".to_string()))
        }

        async fn list(
            &self,
            _limit: usize,
            _offset: usize,
        ) -> Result<Vec<SyncLogEntry>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let logger = SyncLogger::new(Arc::new(FailingSink));
        // Must not panic or propagate the sink error.
        logger
            .log(
                ShopId::new(1),
                "cafe24",
                LogLevel::Error,
                "attempt failed",
                serde_json::json!({ "attempt": 1 }),
            )
            .await;
    }
}
