use crate::api::args;
use crate::api::dto::{InvoiceDto, InvoiceMovementDto};
use crate::error::ToolError;
use crate::models::InvoiceId;
use crate::service::InvoiceService;
use serde_json::Value;
use tracing::{info, instrument, Span};

/// GetInvoice
///
/// accountId 必填, 但不校验发票归属
#[instrument(skip_all, fields(account_id, invoice_id))]
pub async fn get_invoice(service: &InvoiceService, arguments: &Value) -> Result<String, ToolError> {
    let args = args::object(arguments)?;
    let account_id = args::required_str(args, "accountId")?;
    let raw_id = args::required_str(args, "invoiceId")?;
    Span::current()
        .record("account_id", account_id)
        .record("invoice_id", raw_id);

    let invoice_id = InvoiceId::parse(raw_id).map_err(args::invalid_format("invoiceId"))?;
    let invoice = service
        .get_invoice_by_id(invoice_id)
        .await
        .map_err(|e| ToolError::service("failed to retrieve invoice", e))?;

    info!("Invoice retrieved");
    Ok(serde_json::to_string(&InvoiceDto::try_from(&invoice)?)?)
}

/// GetInvoices
#[instrument(skip_all, fields(account_id))]
pub async fn get_invoices(service: &InvoiceService, arguments: &Value) -> Result<String, ToolError> {
    let args = args::object(arguments)?;
    let account_id = args::required_str(args, "accountId")?;
    Span::current().record("account_id", account_id);

    let criteria = args::criteria(args)?;
    let invoices = service
        .get_invoices_by_criteria(account_id, &criteria)
        .await
        .map_err(|e| ToolError::service("failed to retrieve invoices", e))?;

    let dtos = invoices
        .iter()
        .map(InvoiceDto::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = dtos.len(), "Invoices retrieved");
    Ok(serde_json::to_string(&dtos)?)
}

/// GetInvoiceMovements
#[instrument(skip_all, fields(account_id, invoice_id))]
pub async fn get_invoice_movements(
    service: &InvoiceService,
    arguments: &Value,
) -> Result<String, ToolError> {
    let args = args::object(arguments)?;
    let account_id = args::required_str(args, "accountId")?;
    let raw_id = args::required_str(args, "invoiceId")?;
    Span::current()
        .record("account_id", account_id)
        .record("invoice_id", raw_id);

    let invoice_id = InvoiceId::parse(raw_id).map_err(args::invalid_format("invoiceId"))?;
    let lines = service
        .get_invoice_lines(invoice_id)
        .await
        .map_err(|e| ToolError::service("failed to retrieve invoice lines", e))?;

    let dtos = lines
        .iter()
        .map(InvoiceMovementDto::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = dtos.len(), "Invoice movements retrieved");
    Ok(serde_json::to_string(&dtos)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::records::{InvoiceLineRecord, InvoiceRecord};
    use crate::db::{InvoiceStoreRepository, MemoryStore};
    use bigdecimal::BigDecimal;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    const INVOICE_ID: &str = "11111111-1111-1111-1111-111111111111";

    fn seeded_service() -> (InvoiceService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::parse_str(INVOICE_ID).unwrap();
        store.insert_invoice(InvoiceRecord {
            id,
            account_id: "acc-1".to_string(),
            invoice_number: "INV-0001".to_string(),
            issue_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            due_date: Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap(),
            tax_amount: BigDecimal::from(21),
            total_amount_without_tax: BigDecimal::from(100),
            total_amount_with_tax: BigDecimal::from(121),
            status: "PAID".to_string(),
        });
        store.insert_line(InvoiceLineRecord {
            movement_id: Uuid::new_v4(),
            invoice_id: id,
            description: "monthly plan".to_string(),
            amount_without_tax: BigDecimal::from(100),
            amount_with_tax: BigDecimal::from(121),
            tax_percentage: BigDecimal::from(21),
            operation_type: "CHARGE".to_string(),
            transaction_date: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            status: "INVOICED".to_string(),
        });

        let repository = Arc::new(InvoiceStoreRepository::new(store.clone()));
        (InvoiceService::new(repository), store)
    }

    #[tokio::test]
    async fn get_invoice_returns_dto_json() {
        let (service, _) = seeded_service();
        let text = get_invoice(&service, &json!({ "accountId": "acc-1", "invoiceId": INVOICE_ID }))
            .await
            .unwrap();

        let dto: InvoiceDto = serde_json::from_str(&text).unwrap();
        assert_eq!(
            dto,
            InvoiceDto {
                id: INVOICE_ID.to_string(),
                amount_without_tax: 100.0,
                amount_with_tax: 121.0,
                status: "PAID".to_string(),
                issue_date: "2025-01-01".to_string(),
                due_date: "2025-01-31".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn get_invoice_rejects_bad_arguments() {
        let (service, _) = seeded_service();

        let err = get_invoice(&service, &json!({ "invoiceId": INVOICE_ID })).await.unwrap_err();
        assert_eq!(err.category(), "invalid_arguments");

        let err = get_invoice(&service, &json!({ "accountId": "acc-1", "invoiceId": "nope" }))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "invalid_format");
    }

    #[tokio::test]
    async fn get_invoice_reports_transient_failures_as_internal() {
        let (service, store) = seeded_service();
        store.fail_next(3);

        let err = get_invoice(&service, &json!({ "accountId": "acc-1", "invoiceId": INVOICE_ID }))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "internal");
    }

    #[tokio::test]
    async fn get_invoices_filters_by_status() {
        let (service, _) = seeded_service();

        let paid = get_invoices(&service, &json!({ "accountId": "acc-1", "status": "PAID" }))
            .await
            .unwrap();
        assert_eq!(serde_json::from_str::<Vec<InvoiceDto>>(&paid).unwrap().len(), 1);

        let drafts = get_invoices(&service, &json!({ "accountId": "acc-1", "status": "DRAFT" }))
            .await
            .unwrap();
        assert_eq!(drafts, "[]");
    }

    #[tokio::test]
    async fn get_invoice_movements_maps_lines() {
        let (service, _) = seeded_service();
        let text = get_invoice_movements(
            &service,
            &json!({ "accountId": "acc-1", "invoiceId": INVOICE_ID }),
        )
        .await
        .unwrap();

        let dtos: Vec<InvoiceMovementDto> = serde_json::from_str(&text).unwrap();
        assert_eq!(dtos.len(), 1);
        assert_eq!(dtos[0].operation_type, "DEBIT");
        assert_eq!(dtos[0].amount, 121.0);
    }
}
