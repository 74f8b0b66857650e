use crate::error::ConversionError;
use crate::models::InvoiceId;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 流水ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(pub Uuid);

impl MovementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for MovementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MovementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 借贷方向; 读取兼容 debit/CHARGE 与 credit/DISCOUNT, 写回统一为 DEBIT/CREDIT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Debit,
    Credit,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

impl FromStr for OperationType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBIT" | "debit" | "CHARGE" => Ok(Self::Debit),
            "CREDIT" | "credit" | "DISCOUNT" => Ok(Self::Credit),
            other => Err(ConversionError::UnknownOperationType(other.to_string())),
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 流水状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementStatus {
    Pending,
    Invoiced,
    Cancelled,
}

impl MovementStatus {
    pub const ALL: [MovementStatus; 3] = [Self::Pending, Self::Invoiced, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Invoiced => "INVOICED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for MovementStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ConversionError::UnknownMovementStatus(s.to_string()))
    }
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 发票流水
#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    pub id: MovementId,
    pub invoice_id: InvoiceId,
    pub amount: BigDecimal,
    pub movement_type: OperationType,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
    pub status: MovementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movement {
    /// 新建流水: 生成ID, 默认 Pending, 时间戳取当前时间
    pub fn new(
        invoice_id: InvoiceId,
        amount: BigDecimal,
        movement_type: OperationType,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MovementId::new(),
            invoice_id,
            amount,
            movement_type,
            description: description.into(),
            transaction_date: now,
            status: MovementStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 流水查询条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub invoice_id: Option<InvoiceId>,
    pub status: Option<MovementStatus>,
}
