// Application layer - use cases and orchestration.
// Clients (CLI, importers, exporters) go through LedgerService rather than
// talking to the repository directly.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
