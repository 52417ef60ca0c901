use super::AnalysisStore;
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Runs a store operation on the blocking thread pool, so SQLite I/O never
/// stalls the async runtime.
pub async fn with_store<T, F>(store: &Arc<dyn AnalysisStore>, operation: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn AnalysisStore) -> Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || operation(store.as_ref()))
        .await
        .map_err(|e| anyhow!("Store task panicked: {}", e))?
}
