use common::configuration::Configuration;
use common::errors::StoreError;
use common::store::DocumentStore;
use tokio::sync::Mutex;

use crate::handlers::errors::ApiError;

/// Shared application state, wrapped in a single `Arc` per server.
///
/// The data file is read and rewritten in full by every operation, so all
/// access to the store goes through one mutex.
pub struct AppState {
    pub store: Mutex<DocumentStore>,
    pub currency_symbol: String,
}

impl AppState {
    pub fn new(config: &Configuration) -> Self {
        Self {
            store: Mutex::new(DocumentStore::new(&config.data_file)),
            currency_symbol: config.currency_symbol.clone(),
        }
    }

    /// Run `op` against the store on the blocking pool. The lock is held
    /// until `op` returns, so operations never interleave on the data file.
    pub async fn with_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&DocumentStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.store.lock().await;
        let store = guard.clone();
        let result = tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| ApiError::InternalServerError(format!("store task failed: {e}")))?;
        drop(guard);
        Ok(result?)
    }
}
