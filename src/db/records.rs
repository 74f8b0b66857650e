use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 发票表 (invoices)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: Uuid,
    pub account_id: String,
    pub invoice_number: String,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub tax_amount: BigDecimal,
    pub total_amount_without_tax: BigDecimal,
    pub total_amount_with_tax: BigDecimal,
    pub status: String,
}

/// 发票明细 (movements 表的明细视角)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct InvoiceLineRecord {
    pub movement_id: Uuid,
    pub invoice_id: Uuid,
    pub description: String,
    pub amount_without_tax: BigDecimal,
    pub amount_with_tax: BigDecimal,
    pub tax_percentage: BigDecimal,
    pub operation_type: String,
    pub transaction_date: DateTime<Utc>,
    pub status: String,
}

/// 流水表 (movements 表的流水视角)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: BigDecimal,
    pub movement_type: String,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
