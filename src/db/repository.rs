use crate::db::converter;
use crate::db::store::{InvoiceStore, MovementStore};
use crate::error::StorageError;
use crate::models::{Criteria, Invoice, InvoiceId, InvoiceLine, Movement, MovementId, SearchCriteria};
use crate::service::{InvoiceRepository, MovementRepository};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, instrument};

fn log_failure(operation: &'static str) -> impl Fn(StorageError) -> StorageError {
    move |e| {
        error!(operation, error = %e, "Repository operation failed");
        e
    }
}

/// 存储客户端 + 转换器 -> 发票仓储
pub struct InvoiceStoreRepository {
    store: Arc<dyn InvoiceStore>,
}

impl InvoiceStoreRepository {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InvoiceRepository for InvoiceStoreRepository {
    /// 存储中的合计金额原样保留, 不按明细重算
    #[instrument(skip_all, fields(invoice_id = %id))]
    async fn get_invoice_by_id(&self, id: InvoiceId) -> Result<Invoice, StorageError> {
        let record = self
            .store
            .get_invoice_by_id(id.0)
            .await
            .map_err(log_failure("get_invoice_by_id"))?;
        let mut invoice = converter::invoice_to_domain(record)
            .map_err(StorageError::from)
            .map_err(log_failure("get_invoice_by_id"))?;

        let lines = self
            .store
            .get_lines_by_invoice_id(id.0)
            .await
            .map_err(log_failure("get_lines_by_invoice_id"))?;
        invoice.lines = converter::lines_to_domain(lines)
            .map_err(StorageError::from)
            .map_err(log_failure("get_lines_by_invoice_id"))?;

        debug!(lines = invoice.lines.len(), "Invoice loaded");
        Ok(invoice)
    }

    #[instrument(skip_all, fields(%account_id))]
    async fn get_invoices_by_account(
        &self,
        account_id: &str,
        criteria: &Criteria,
    ) -> Result<Vec<Invoice>, StorageError> {
        let filters = converter::criteria_to_filter_map(criteria);
        let records = self
            .store
            .get_invoices_by_account(account_id, &filters)
            .await
            .map_err(log_failure("get_invoices_by_account"))?;

        converter::invoices_to_domain(records)
            .map_err(StorageError::from)
            .map_err(log_failure("get_invoices_by_account"))
    }

    #[instrument(skip_all, fields(invoice_id = %id))]
    async fn get_invoice_lines(&self, id: InvoiceId) -> Result<Vec<InvoiceLine>, StorageError> {
        let records = self
            .store
            .get_lines_by_invoice_id(id.0)
            .await
            .map_err(log_failure("get_lines_by_invoice_id"))?;

        converter::lines_to_domain(records)
            .map_err(StorageError::from)
            .map_err(log_failure("get_lines_by_invoice_id"))
    }
}

/// 存储客户端 + 转换器 -> 流水仓储
pub struct MovementStoreRepository {
    store: Arc<dyn MovementStore>,
}

impl MovementStoreRepository {
    pub fn new(store: Arc<dyn MovementStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MovementRepository for MovementStoreRepository {
    #[instrument(skip_all, fields(movement_id = %movement.id))]
    async fn create(&self, movement: &Movement) -> Result<(), StorageError> {
        let record = converter::movement_to_storage(movement);
        self.store
            .insert_movement(&record)
            .await
            .map_err(log_failure("insert_movement"))
    }

    #[instrument(skip_all, fields(movement_id = %id))]
    async fn get_by_id(&self, id: MovementId) -> Result<Movement, StorageError> {
        let record = self
            .store
            .get_movement_by_id(id.0)
            .await
            .map_err(log_failure("get_movement_by_id"))?;

        converter::movement_to_domain(record)
            .map_err(StorageError::from)
            .map_err(log_failure("get_movement_by_id"))
    }

    #[instrument(skip_all, fields(movement_id = %movement.id))]
    async fn update(&self, movement: &Movement) -> Result<(), StorageError> {
        let record = converter::movement_to_storage(movement);
        self.store
            .update_movement(&record)
            .await
            .map_err(log_failure("update_movement"))
    }

    #[instrument(skip_all, fields(movement_id = %id))]
    async fn delete(&self, id: MovementId) -> Result<(), StorageError> {
        self.store
            .delete_movement(id.0)
            .await
            .map_err(log_failure("delete_movement"))
    }

    #[instrument(skip_all, fields(?criteria))]
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Movement>, StorageError> {
        let filters = converter::search_criteria_to_filter_map(criteria);
        let records = self
            .store
            .search_movements(&filters)
            .await
            .map_err(log_failure("search_movements"))?;

        converter::movements_to_domain(records)
            .map_err(StorageError::from)
            .map_err(log_failure("search_movements"))
    }
}
