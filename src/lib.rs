pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use api::{router, AppState};
pub use config::AppConfig;
pub use db::{create_pool, run_migrations, run_seeds};
pub use error::{ConversionError, InvoiceError, StorageError, ToolError};
pub use service::{InvoiceService, MovementService};
