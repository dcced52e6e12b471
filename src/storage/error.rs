use std::sync::Arc;

use thiserror::Error;

/// The storage engine could not perform a read or write.
///
/// Carries the name of the repository operation that failed and the
/// underlying driver error. Cloneable so a failed initialization can be
/// handed to every caller waiting on it.
#[derive(Error, Debug, Clone)]
#[error("Storage fault in {operation}: {source}")]
pub struct StorageFault {
    pub operation: &'static str,
    #[source]
    pub source: Arc<sqlx::Error>,
}

impl StorageFault {
    pub fn new(operation: &'static str, source: sqlx::Error) -> Self {
        Self {
            operation,
            source: Arc::new(source),
        }
    }
}

/// Attach the failing operation name to a driver result, in the spirit of
/// `anyhow::Context`.
pub(crate) trait FaultContext<T> {
    fn fault(self, operation: &'static str) -> Result<T, StorageFault>;
}

impl<T> FaultContext<T> for Result<T, sqlx::Error> {
    fn fault(self, operation: &'static str) -> Result<T, StorageFault> {
        self.map_err(|e| StorageFault::new(operation, e))
    }
}
