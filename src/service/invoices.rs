use crate::error::StorageError;
use crate::models::{Criteria, Invoice, InvoiceId, InvoiceLine};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// 发票仓储 (领域类型)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// 发票 + 明细
    async fn get_invoice_by_id(&self, id: InvoiceId) -> Result<Invoice, StorageError>;

    async fn get_invoices_by_account(
        &self,
        account_id: &str,
        criteria: &Criteria,
    ) -> Result<Vec<Invoice>, StorageError>;

    async fn get_invoice_lines(&self, id: InvoiceId) -> Result<Vec<InvoiceLine>, StorageError>;
}

/// 发票查询服务
pub struct InvoiceService {
    repository: Arc<dyn InvoiceRepository>,
}

impl InvoiceService {
    pub fn new(repository: Arc<dyn InvoiceRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip_all, fields(invoice_id = %id))]
    pub async fn get_invoice_by_id(&self, id: InvoiceId) -> Result<Invoice, StorageError> {
        info!("Fetching invoice");

        match self.repository.get_invoice_by_id(id).await {
            Ok(invoice) => {
                info!(status = %invoice.status, lines = invoice.lines.len(), "Invoice fetched");
                Ok(invoice)
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch invoice");
                Err(e)
            }
        }
    }

    #[instrument(skip_all, fields(%account_id))]
    pub async fn get_invoices_by_criteria(
        &self,
        account_id: &str,
        criteria: &Criteria,
    ) -> Result<Vec<Invoice>, StorageError> {
        info!(?criteria, "Fetching invoices by criteria");

        match self.repository.get_invoices_by_account(account_id, criteria).await {
            Ok(invoices) => {
                info!(count = invoices.len(), "Invoices fetched");
                Ok(invoices)
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch invoices");
                Err(e)
            }
        }
    }

    #[instrument(skip_all, fields(invoice_id = %id))]
    pub async fn get_invoice_lines(&self, id: InvoiceId) -> Result<Vec<InvoiceLine>, StorageError> {
        info!("Fetching invoice lines");

        match self.repository.get_invoice_lines(id).await {
            Ok(lines) => {
                info!(count = lines.len(), "Invoice lines fetched");
                Ok(lines)
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch invoice lines");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceStatus;
    use bigdecimal::BigDecimal;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn paid_invoice(id: InvoiceId) -> Invoice {
        Invoice {
            id,
            account_id: "acc-1".to_string(),
            invoice_number: "INV-0001".to_string(),
            issue_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            due_date: Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap(),
            lines: Vec::new(),
            tax_amount: BigDecimal::from(21),
            total_amount_without_tax: BigDecimal::from(100),
            total_amount_with_tax: BigDecimal::from(121),
            status: InvoiceStatus::Paid,
        }
    }

    #[tokio::test]
    async fn get_invoice_by_id_delegates_to_repository() {
        let id = InvoiceId(Uuid::new_v4());
        let invoice = paid_invoice(id);
        let expected = invoice.clone();

        let mut repository = MockInvoiceRepository::new();
        repository
            .expect_get_invoice_by_id()
            .times(1)
            .returning(move |requested| {
                assert_eq!(requested, id);
                Ok(invoice.clone())
            });

        let service = InvoiceService::new(Arc::new(repository));
        assert_eq!(service.get_invoice_by_id(id).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn get_invoice_by_id_surfaces_not_found() {
        let mut repository = MockInvoiceRepository::new();
        repository
            .expect_get_invoice_by_id()
            .returning(|id| Err(StorageError::not_found("invoice", id)));

        let service = InvoiceService::new(Arc::new(repository));
        let err = service
            .get_invoice_by_id(InvoiceId(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn get_invoices_by_criteria_passes_account_and_criteria() {
        let criteria = Criteria {
            status: Some(InvoiceStatus::Paid),
            ..Criteria::default()
        };

        let mut repository = MockInvoiceRepository::new();
        repository
            .expect_get_invoices_by_account()
            .times(1)
            .returning(|account_id, criteria| {
                assert_eq!(account_id, "acc-1");
                assert_eq!(criteria.status, Some(InvoiceStatus::Paid));
                Ok(vec![paid_invoice(InvoiceId(Uuid::new_v4()))])
            });

        let service = InvoiceService::new(Arc::new(repository));
        let invoices = service.get_invoices_by_criteria("acc-1", &criteria).await.unwrap();
        assert_eq!(invoices.len(), 1);
    }

    #[tokio::test]
    async fn get_invoice_lines_propagates_errors() {
        let mut repository = MockInvoiceRepository::new();
        repository
            .expect_get_invoice_lines()
            .returning(|_| Err(StorageError::Unavailable("connection refused".to_string())));

        let service = InvoiceService::new(Arc::new(repository));
        let err = service
            .get_invoice_lines(InvoiceId(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
