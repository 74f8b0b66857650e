use crate::error::ToolError;
use crate::models::{Invoice, InvoiceLine, Movement};
use bigdecimal::BigDecimal;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// 经十进制字符串转换, 得到最接近的 f64
fn to_f64(value: &BigDecimal) -> Result<f64, ToolError> {
    let text = value.to_string();
    match text.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(ToolError::InvalidAmount(text)),
    }
}

/// 发票 (对外格式)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDto {
    pub id: String,
    pub amount_without_tax: f64,
    pub amount_with_tax: f64,
    pub status: String,
    pub issue_date: String,
    pub due_date: String,
}

impl TryFrom<&Invoice> for InvoiceDto {
    type Error = ToolError;

    fn try_from(invoice: &Invoice) -> Result<Self, Self::Error> {
        Ok(Self {
            id: invoice.id.to_string(),
            amount_without_tax: to_f64(&invoice.total_amount_without_tax)?,
            amount_with_tax: to_f64(&invoice.total_amount_with_tax)?,
            status: invoice.status.as_str().to_string(),
            issue_date: invoice.issue_date.format(DATE_FORMAT).to_string(),
            due_date: invoice.due_date.format(DATE_FORMAT).to_string(),
        })
    }
}

/// 发票明细 (对外格式), amount 为含税金额
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceMovementDto {
    pub movement_id: String,
    pub description: String,
    pub amount: f64,
    pub amount_without_tax: f64,
    pub amount_with_tax: f64,
    pub tax_percentage: f64,
    pub operation_type: String,
}

impl TryFrom<&InvoiceLine> for InvoiceMovementDto {
    type Error = ToolError;

    fn try_from(line: &InvoiceLine) -> Result<Self, Self::Error> {
        let amount_with_tax = to_f64(&line.amount_with_tax)?;
        Ok(Self {
            movement_id: line.movement_id.to_string(),
            description: line.description.clone(),
            amount: amount_with_tax,
            amount_without_tax: to_f64(&line.amount_without_tax)?,
            amount_with_tax,
            tax_percentage: to_f64(&line.tax_percentage)?,
            operation_type: line.operation_type.as_str().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementDto {
    pub id: String,
    pub invoice_id: String,
    pub amount: f64,
    pub movement_type: String,
    pub description: String,
    pub transaction_date: String,
    pub status: String,
}

impl TryFrom<&Movement> for MovementDto {
    type Error = ToolError;

    fn try_from(movement: &Movement) -> Result<Self, Self::Error> {
        Ok(Self {
            id: movement.id.to_string(),
            invoice_id: movement.invoice_id.to_string(),
            amount: to_f64(&movement.amount)?,
            movement_type: movement.movement_type.as_str().to_string(),
            description: movement.description.clone(),
            transaction_date: movement
                .transaction_date
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            status: movement.status.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceId, InvoiceStatus, MovementId, MovementStatus, OperationType};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn invoice(without_tax: &str, with_tax: &str) -> Invoice {
        Invoice {
            id: InvoiceId(Uuid::new_v4()),
            account_id: "acc-1".to_string(),
            invoice_number: "INV-0001".to_string(),
            issue_date: Utc.with_ymd_and_hms(2025, 3, 5, 14, 0, 0).unwrap(),
            due_date: Utc.with_ymd_and_hms(2025, 4, 4, 0, 0, 0).unwrap(),
            lines: Vec::new(),
            tax_amount: "21.21".parse().unwrap(),
            total_amount_without_tax: without_tax.parse().unwrap(),
            total_amount_with_tax: with_tax.parse().unwrap(),
            status: InvoiceStatus::Overdue,
        }
    }

    #[test]
    fn invoice_dto_keeps_fractional_amounts() {
        let dto = InvoiceDto::try_from(&invoice("100.99", "122.20")).unwrap();
        assert_eq!(dto.amount_without_tax, 100.99);
        assert_eq!(dto.amount_with_tax, 122.2);
        assert_eq!(dto.status, "OVERDUE");
        assert_eq!(dto.issue_date, "2025-03-05");
        assert_eq!(dto.due_date, "2025-04-04");
    }

    #[test]
    fn numeric_scale_does_not_leak_float_noise() {
        let dto = InvoiceDto::try_from(&invoice("100.9900", "1234.5600")).unwrap();
        let text = serde_json::to_string(&dto).unwrap();
        assert!(text.contains(r#""amount_without_tax":100.99,"#), "{text}");
        assert!(text.contains(r#""amount_with_tax":1234.56,"#), "{text}");

        let line = InvoiceLine {
            movement_id: MovementId::new(),
            invoice_id: InvoiceId(Uuid::new_v4()),
            description: "plan".to_string(),
            amount_without_tax: "16.5200".parse().unwrap(),
            amount_with_tax: "19.9900".parse().unwrap(),
            tax_percentage: "21.00".parse().unwrap(),
            operation_type: OperationType::Debit,
            transaction_date: Utc::now(),
            status: MovementStatus::Invoiced,
        };
        let text = serde_json::to_string(&InvoiceMovementDto::try_from(&line).unwrap()).unwrap();
        assert!(text.contains(r#""amount":19.99,"#), "{text}");
        assert!(text.contains(r#""tax_percentage":21.0,"#), "{text}");
    }

    #[test]
    fn unrepresentable_amount_is_an_error() {
        let err = InvoiceDto::try_from(&invoice("1e400", "1")).unwrap_err();
        assert!(matches!(err, ToolError::InvalidAmount(_)));
        assert_eq!(err.category(), "internal");
    }

    #[test]
    fn invoice_movement_amount_is_amount_with_tax() {
        let line = InvoiceLine {
            movement_id: MovementId::new(),
            invoice_id: InvoiceId(Uuid::new_v4()),
            description: "discount".to_string(),
            amount_without_tax: BigDecimal::from(50),
            amount_with_tax: "60.5".parse().unwrap(),
            tax_percentage: BigDecimal::from(21),
            operation_type: OperationType::Credit,
            transaction_date: Utc::now(),
            status: MovementStatus::Invoiced,
        };

        let dto = InvoiceMovementDto::try_from(&line).unwrap();
        assert_eq!(dto.amount, 60.5);
        assert_eq!(dto.amount_without_tax, 50.0);
        assert_eq!(dto.tax_percentage, 21.0);
        assert_eq!(dto.operation_type, "CREDIT");
    }

    #[test]
    fn movement_timestamp_is_rfc3339_utc() {
        let at = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        let movement = Movement {
            id: MovementId::new(),
            invoice_id: InvoiceId(Uuid::new_v4()),
            amount: "12.34".parse().unwrap(),
            movement_type: OperationType::Debit,
            description: "usage".to_string(),
            transaction_date: at,
            status: MovementStatus::Pending,
            created_at: at,
            updated_at: at,
        };

        let dto = MovementDto::try_from(&movement).unwrap();
        assert_eq!(dto.transaction_date, "2025-01-15T10:30:00Z");
        assert_eq!(dto.amount, 12.34);
        assert_eq!(dto.movement_type, "DEBIT");
        assert_eq!(dto.status, "PENDING");
    }
}
