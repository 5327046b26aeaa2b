//! `stocklink logs` - list sync log entries newest-first.

use stocklink_sync::store::MemorySyncLogStore;
use stocklink_sync::{StoreError, SyncLogStore};

/// List recent sync log entries.
///
/// The log sink is process-local, so a standalone invocation shows the
/// entries appended by syncs run in this process (`sync --show-log` shares
/// this path to print the trail of the run it just performed).
///
/// # Errors
///
/// Returns `StoreError` if the sink cannot be read.
pub async fn run(limit: usize, offset: usize) -> Result<(), StoreError> {
    let sink = MemorySyncLogStore::new();
    print_page(&sink, limit, offset).await?;
    Ok(())
}

/// Print one page of entries newest-first; returns how many were printed.
pub(crate) async fn print_page(
    sink: &dyn SyncLogStore,
    limit: usize,
    offset: usize,
) -> Result<usize, StoreError> {
    let entries = sink.list(limit, offset).await?;
    if entries.is_empty() {
        tracing::info!("no sync log entries");
        return Ok(0);
    }
    for entry in &entries {
        tracing::info!(
            at = %entry.created_at,
            adapter = %entry.adapter,
            level = %entry.level,
            metadata = %entry.metadata,
            "{}",
            entry.message
        );
    }
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use stocklink_core::{LogLevel, ShopId, SyncLogEntry};

    use super::*;

    async fn seeded_sink(count: usize) -> MemorySyncLogStore {
        let sink = MemorySyncLogStore::new();
        for i in 0..count {
            sink.append(SyncLogEntry::new(
                ShopId::new(1),
                "cafe24",
                LogLevel::Info,
                format!("entry {i}"),
                serde_json::Value::Null,
            ))
            .await
            .unwrap();
        }
        sink
    }

    #[tokio::test]
    async fn test_page_honors_limit_and_offset() {
        let sink = seeded_sink(5).await;
        assert_eq!(print_page(&sink, 2, 1).await.unwrap(), 2);
        assert_eq!(print_page(&sink, 10, 4).await.unwrap(), 1);
        assert_eq!(print_page(&sink, 10, 5).await.unwrap(), 0);
    }
}
