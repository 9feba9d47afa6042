pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod idempotency;
pub mod logging;
pub mod pipeline;
pub mod queries;
pub mod storage;
pub mod types;

pub use config::{Config, ImportConfig};
pub use error::{ImportError, Result};
pub use pipeline::Importer;
pub use storage::{InMemoryStorage, Storage};
