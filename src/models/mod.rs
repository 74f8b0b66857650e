pub mod invoice;
pub mod movement;

pub use invoice::{Criteria, Invoice, InvoiceId, InvoiceLine, InvoiceStatus};
pub use movement::{Movement, MovementId, MovementStatus, OperationType, SearchCriteria};
