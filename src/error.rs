use thiserror::Error;

/// 存储字符串 -> 领域枚举 转换失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("unknown movement status: {0}")]
    UnknownMovementStatus(String),

    #[error("unknown operation type: {0}")]
    UnknownOperationType(String),
}

/// 发票状态机错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvoiceError {
    #[error("invoice is not in draft state")]
    NotDraft,

    #[error("invoice can only be marked as sent from draft status")]
    NotDraftForSend,

    #[error("void invoice cannot be marked as paid")]
    VoidCannotBePaid,

    #[error("paid invoice cannot be voided")]
    PaidCannotBeVoided,
}

/// 存储层错误 (查询、重试、转换)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// 仅连接类故障值得重试
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Database(e) => !matches!(
                e,
                sqlx::Error::RowNotFound
                    | sqlx::Error::TypeNotFound { .. }
                    | sqlx::Error::ColumnIndexOutOfBounds { .. }
                    | sqlx::Error::ColumnNotFound(_)
                    | sqlx::Error::ColumnDecode { .. }
                    | sqlx::Error::Decode(_)
                    | sqlx::Error::Configuration(_)
            ),
            Self::NotFound { .. } | Self::Conversion(_) | Self::UnsupportedFilter(_) => false,
        }
    }
}

/// 工具调用错误, 统一转换为 tool-error 结果
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("arguments must be a JSON object")]
    InvalidArgumentsType,

    #[error("{0} is required")]
    MissingArgument(&'static str),

    #[error("invalid {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("invalid {name} format: {source}")]
    InvalidFormat {
        name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{context}: {source}")]
    Service {
        context: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("amount {0} cannot be represented as a number")]
    InvalidAmount(String),

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    pub fn service(context: &'static str, source: StorageError) -> Self {
        Self::Service { context, source }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgumentsType | Self::MissingArgument(_) | Self::InvalidArgument { .. } => {
                "invalid_arguments"
            }
            Self::InvalidFormat { .. } => "invalid_format",
            Self::UnknownTool(_) => "unknown_tool",
            Self::Service { source, .. } if source.is_not_found() => "not_found",
            Self::Service { .. } | Self::InvalidAmount(_) | Self::Serialization(_) => "internal",
        }
    }
}
