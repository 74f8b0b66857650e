use crate::db::converter::FilterMap;
use crate::db::records::{InvoiceLineRecord, InvoiceRecord, MovementRecord};
use crate::error::StorageError;
use async_trait::async_trait;
use uuid::Uuid;

/// 发票存储客户端
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn get_invoice_by_id(&self, id: Uuid) -> Result<InvoiceRecord, StorageError>;

    async fn get_invoices_by_account(
        &self,
        account_id: &str,
        filters: &FilterMap,
    ) -> Result<Vec<InvoiceRecord>, StorageError>;

    async fn get_lines_by_invoice_id(&self, invoice_id: Uuid) -> Result<Vec<InvoiceLineRecord>, StorageError>;
}

/// 流水存储客户端
#[async_trait]
pub trait MovementStore: Send + Sync {
    async fn insert_movement(&self, record: &MovementRecord) -> Result<(), StorageError>;

    async fn get_movement_by_id(&self, id: Uuid) -> Result<MovementRecord, StorageError>;

    async fn update_movement(&self, record: &MovementRecord) -> Result<(), StorageError>;

    /// 软删除
    async fn delete_movement(&self, id: Uuid) -> Result<(), StorageError>;

    async fn search_movements(&self, filters: &FilterMap) -> Result<Vec<MovementRecord>, StorageError>;
}
