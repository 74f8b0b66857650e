use crate::db::records::{InvoiceLineRecord, InvoiceRecord, MovementRecord};
use crate::error::ConversionError;
use crate::models::{
    Criteria, Invoice, InvoiceId, InvoiceLine, Movement, MovementId, SearchCriteria,
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

pub const FILTER_STATUS: &str = "status";
pub const FILTER_ISSUE_DATE_FROM: &str = "issue_date_from";
pub const FILTER_ISSUE_DATE_TO: &str = "issue_date_to";
pub const FILTER_INVOICE_ID: &str = "invoice_id";

/// 过滤条件取值
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    Id(Uuid),
}

/// 稀疏过滤条件: 只包含有值的字段, 每个键对应一个 AND 条件
pub type FilterMap = IndexMap<&'static str, FilterValue>;

pub fn invoice_to_domain(record: InvoiceRecord) -> Result<Invoice, ConversionError> {
    let status = record.status.parse()?;

    Ok(Invoice {
        id: InvoiceId(record.id),
        account_id: record.account_id,
        invoice_number: record.invoice_number,
        issue_date: record.issue_date,
        due_date: record.due_date,
        lines: Vec::new(),
        tax_amount: record.tax_amount,
        total_amount_without_tax: record.total_amount_without_tax,
        total_amount_with_tax: record.total_amount_with_tax,
        status,
    })
}

/// 全部成功或整体失败
pub fn invoices_to_domain(records: Vec<InvoiceRecord>) -> Result<Vec<Invoice>, ConversionError> {
    records.into_iter().map(invoice_to_domain).collect()
}

pub fn invoice_to_storage(invoice: &Invoice) -> InvoiceRecord {
    InvoiceRecord {
        id: invoice.id.0,
        account_id: invoice.account_id.clone(),
        invoice_number: invoice.invoice_number.clone(),
        issue_date: invoice.issue_date,
        due_date: invoice.due_date,
        tax_amount: invoice.tax_amount.clone(),
        total_amount_without_tax: invoice.total_amount_without_tax.clone(),
        total_amount_with_tax: invoice.total_amount_with_tax.clone(),
        status: invoice.status.as_str().to_string(),
    }
}

pub fn line_to_domain(record: InvoiceLineRecord) -> Result<InvoiceLine, ConversionError> {
    Ok(InvoiceLine {
        movement_id: MovementId(record.movement_id),
        invoice_id: InvoiceId(record.invoice_id),
        operation_type: record.operation_type.parse()?,
        status: record.status.parse()?,
        description: record.description,
        amount_without_tax: record.amount_without_tax,
        amount_with_tax: record.amount_with_tax,
        tax_percentage: record.tax_percentage,
        transaction_date: record.transaction_date,
    })
}

pub fn lines_to_domain(records: Vec<InvoiceLineRecord>) -> Result<Vec<InvoiceLine>, ConversionError> {
    records.into_iter().map(line_to_domain).collect()
}

pub fn movement_to_domain(record: MovementRecord) -> Result<Movement, ConversionError> {
    Ok(Movement {
        id: MovementId(record.id),
        invoice_id: InvoiceId(record.invoice_id),
        movement_type: record.movement_type.parse()?,
        status: record.status.parse()?,
        amount: record.amount,
        description: record.description,
        transaction_date: record.transaction_date,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

pub fn movements_to_domain(records: Vec<MovementRecord>) -> Result<Vec<Movement>, ConversionError> {
    records.into_iter().map(movement_to_domain).collect()
}

pub fn movement_to_storage(movement: &Movement) -> MovementRecord {
    MovementRecord {
        id: movement.id.0,
        invoice_id: movement.invoice_id.0,
        amount: movement.amount.clone(),
        movement_type: movement.movement_type.as_str().to_string(),
        description: movement.description.clone(),
        transaction_date: movement.transaction_date,
        status: movement.status.as_str().to_string(),
        created_at: movement.created_at,
        updated_at: movement.updated_at,
    }
}

pub fn criteria_to_filter_map(criteria: &Criteria) -> FilterMap {
    let mut filters = FilterMap::new();

    if let Some(status) = criteria.status {
        filters.insert(FILTER_STATUS, FilterValue::Text(status.as_str().to_string()));
    }
    if let Some(from) = criteria.issue_date_from {
        filters.insert(FILTER_ISSUE_DATE_FROM, FilterValue::Timestamp(from));
    }
    if let Some(to) = criteria.issue_date_to {
        filters.insert(FILTER_ISSUE_DATE_TO, FilterValue::Timestamp(to));
    }

    filters
}

pub fn search_criteria_to_filter_map(criteria: &SearchCriteria) -> FilterMap {
    let mut filters = FilterMap::new();

    if let Some(invoice_id) = criteria.invoice_id {
        filters.insert(FILTER_INVOICE_ID, FilterValue::Id(invoice_id.0));
    }
    if let Some(status) = criteria.status {
        filters.insert(FILTER_STATUS, FilterValue::Text(status.as_str().to_string()));
    }

    filters
}
