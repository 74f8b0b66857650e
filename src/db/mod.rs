pub mod converter;
pub mod memory;
pub mod pool;
pub mod queries;
pub mod records;
pub mod repository;
pub mod retry;
pub mod store;

pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations, run_seeds};
pub use queries::{PgInvoiceStore, PgMovementStore};
pub use repository::{InvoiceStoreRepository, MovementStoreRepository};
pub use retry::RetryPolicy;
pub use store::{InvoiceStore, MovementStore};
