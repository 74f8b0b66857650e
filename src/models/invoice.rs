use crate::error::{ConversionError, InvoiceError};
use crate::models::{MovementId, MovementStatus, OperationType};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 发票ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub Uuid);

impl InvoiceId {
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 发票状态 (存储值为大写字符串)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Void,
    Unpaid,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 6] = [
        Self::Draft,
        Self::Sent,
        Self::Paid,
        Self::Overdue,
        Self::Void,
        Self::Unpaid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sent => "SENT",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
            Self::Void => "VOID",
            Self::Unpaid => "UNPAID",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ConversionError::UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 发票明细行 (与 Movement 共用 movements 表)
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub movement_id: MovementId,
    pub invoice_id: InvoiceId,
    pub description: String,
    pub amount_without_tax: BigDecimal,
    pub amount_with_tax: BigDecimal,
    pub tax_percentage: BigDecimal,
    pub operation_type: OperationType,
    pub transaction_date: DateTime<Utc>,
    pub status: MovementStatus,
}

/// 发票聚合根
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub account_id: String,
    pub invoice_number: String,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub lines: Vec<InvoiceLine>,
    pub tax_amount: BigDecimal,
    pub total_amount_without_tax: BigDecimal,
    pub total_amount_with_tax: BigDecimal,
    pub status: InvoiceStatus,
}

impl Invoice {
    /// 添加明细行, 仅草稿状态允许
    pub fn add_line(&mut self, line: InvoiceLine) -> Result<(), InvoiceError> {
        if self.status != InvoiceStatus::Draft {
            return Err(InvoiceError::NotDraft);
        }

        self.lines.push(line);
        self.recalculate_totals();
        Ok(())
    }

    /// 重新计算税额与合计: 贷项扣减, 借项累加
    pub fn recalculate_totals(&mut self) {
        let mut without_tax = BigDecimal::zero();
        let mut with_tax = BigDecimal::zero();

        for line in &self.lines {
            match line.operation_type {
                OperationType::Credit => {
                    without_tax -= &line.amount_without_tax;
                    with_tax -= &line.amount_with_tax;
                }
                OperationType::Debit => {
                    without_tax += &line.amount_without_tax;
                    with_tax += &line.amount_with_tax;
                }
            }
        }

        self.tax_amount = &with_tax - &without_tax;
        self.total_amount_without_tax = without_tax;
        self.total_amount_with_tax = with_tax;
    }

    pub fn mark_as_sent(&mut self) -> Result<(), InvoiceError> {
        if self.status != InvoiceStatus::Draft {
            return Err(InvoiceError::NotDraftForSend);
        }

        self.status = InvoiceStatus::Sent;
        Ok(())
    }

    pub fn mark_as_paid(&mut self) -> Result<(), InvoiceError> {
        if self.status == InvoiceStatus::Void {
            return Err(InvoiceError::VoidCannotBePaid);
        }

        self.status = InvoiceStatus::Paid;
        Ok(())
    }

    pub fn mark_as_void(&mut self) -> Result<(), InvoiceError> {
        if self.status == InvoiceStatus::Paid {
            return Err(InvoiceError::PaidCannotBeVoided);
        }

        self.status = InvoiceStatus::Void;
        Ok(())
    }
}

/// 发票查询条件, None 表示该维度不过滤
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub status: Option<InvoiceStatus>,
    pub issue_date_from: Option<DateTime<Utc>>,
    pub issue_date_to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn invoice(status: InvoiceStatus) -> Invoice {
        Invoice {
            id: InvoiceId(Uuid::new_v4()),
            account_id: "acc-1".to_string(),
            invoice_number: "INV-0001".to_string(),
            issue_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            due_date: Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap(),
            lines: Vec::new(),
            tax_amount: BigDecimal::zero(),
            total_amount_without_tax: BigDecimal::zero(),
            total_amount_with_tax: BigDecimal::zero(),
            status,
        }
    }

    fn line(invoice_id: InvoiceId, op: OperationType, without: &str, with: &str) -> InvoiceLine {
        InvoiceLine {
            movement_id: MovementId(Uuid::new_v4()),
            invoice_id,
            description: "line".to_string(),
            amount_without_tax: dec(without),
            amount_with_tax: dec(with),
            tax_percentage: dec("21"),
            operation_type: op,
            transaction_date: Utc::now(),
            status: MovementStatus::Invoiced,
        }
    }

    #[test]
    fn totals_are_signed_sum_of_lines() {
        let mut inv = invoice(InvoiceStatus::Draft);
        let id = inv.id;
        inv.add_line(line(id, OperationType::Debit, "100", "121")).unwrap();
        inv.add_line(line(id, OperationType::Debit, "50", "60.5")).unwrap();
        inv.add_line(line(id, OperationType::Credit, "20", "24.2")).unwrap();

        assert_eq!(inv.total_amount_without_tax, dec("130"));
        assert_eq!(inv.total_amount_with_tax, dec("157.3"));
        assert_eq!(inv.tax_amount, dec("27.3"));
    }

    #[test]
    fn credit_only_invoice_has_negative_totals() {
        let mut inv = invoice(InvoiceStatus::Draft);
        let id = inv.id;
        inv.add_line(line(id, OperationType::Credit, "10", "12.1")).unwrap();

        assert_eq!(inv.total_amount_without_tax, dec("-10"));
        assert_eq!(inv.total_amount_with_tax, dec("-12.1"));
        assert_eq!(inv.tax_amount, dec("-2.1"));
    }

    #[test]
    fn add_line_requires_draft() {
        for status in InvoiceStatus::ALL {
            let mut inv = invoice(status);
            let id = inv.id;
            let result = inv.add_line(line(id, OperationType::Debit, "1", "1.21"));
            if status == InvoiceStatus::Draft {
                assert!(result.is_ok());
                assert_eq!(inv.lines.len(), 1);
            } else {
                assert_eq!(result, Err(InvoiceError::NotDraft));
                assert!(inv.lines.is_empty());
            }
        }
    }

    #[test]
    fn mark_as_sent_only_from_draft() {
        for status in InvoiceStatus::ALL {
            let mut inv = invoice(status);
            let result = inv.mark_as_sent();
            if status == InvoiceStatus::Draft {
                assert_eq!(result, Ok(()));
                assert_eq!(inv.status, InvoiceStatus::Sent);
            } else {
                assert_eq!(result, Err(InvoiceError::NotDraftForSend));
                assert_eq!(inv.status, status);
            }
        }
    }

    #[test]
    fn mark_as_paid_fails_only_when_void() {
        for status in InvoiceStatus::ALL {
            let mut inv = invoice(status);
            let result = inv.mark_as_paid();
            if status == InvoiceStatus::Void {
                assert_eq!(result, Err(InvoiceError::VoidCannotBePaid));
                assert_eq!(inv.status, InvoiceStatus::Void);
            } else {
                assert_eq!(result, Ok(()));
                assert_eq!(inv.status, InvoiceStatus::Paid);
            }
        }
    }

    #[test]
    fn mark_as_void_fails_only_when_paid() {
        for status in InvoiceStatus::ALL {
            let mut inv = invoice(status);
            let result = inv.mark_as_void();
            if status == InvoiceStatus::Paid {
                assert_eq!(result, Err(InvoiceError::PaidCannotBeVoided));
                assert_eq!(inv.status, InvoiceStatus::Paid);
            } else {
                assert_eq!(result, Ok(()));
                assert_eq!(inv.status, InvoiceStatus::Void);
            }
        }
    }

    #[test]
    fn status_parsing_is_closed() {
        for status in InvoiceStatus::ALL {
            assert_eq!(status.as_str().parse::<InvoiceStatus>(), Ok(status));
        }
        assert_eq!(
            "Paid".parse::<InvoiceStatus>(),
            Err(ConversionError::UnknownStatus("Paid".to_string()))
        );
        assert!("".parse::<InvoiceStatus>().is_err());
    }
}
