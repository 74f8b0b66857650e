pub mod invoices;
pub mod movements;

pub use invoices::{InvoiceRepository, InvoiceService};
pub use movements::{MovementRepository, MovementService};
