use crate::error::{ConversionError, ToolError};
use crate::models::{Criteria, InvoiceStatus};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub type Arguments = Map<String, Value>;

pub fn object(arguments: &Value) -> Result<&Arguments, ToolError> {
    arguments.as_object().ok_or(ToolError::InvalidArgumentsType)
}

/// 必填字符串参数, 空串视为缺失
pub fn required_str<'a>(args: &'a Arguments, name: &'static str) -> Result<&'a str, ToolError> {
    match optional_str(args, name)? {
        Some(value) => Ok(value),
        None => Err(ToolError::MissingArgument(name)),
    }
}

pub fn optional_str<'a>(args: &'a Arguments, name: &'static str) -> Result<Option<&'a str>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(ToolError::InvalidArgument {
            name,
            reason: "must be a string".to_string(),
        }),
    }
}

/// 标识/日期解析失败 -> invalid_format
pub fn invalid_format<E>(name: &'static str) -> impl FnOnce(E) -> ToolError
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| ToolError::InvalidFormat {
        name,
        source: Box::new(e),
    }
}

pub fn parse_timestamp(name: &'static str, raw: &str) -> Result<DateTime<Utc>, ToolError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(invalid_format(name))
}

/// GetInvoices 的可选过滤参数; status 不区分大小写
pub fn criteria(args: &Arguments) -> Result<Criteria, ToolError> {
    let status = optional_str(args, "status")?
        .map(|raw| {
            raw.to_ascii_uppercase()
                .parse::<InvoiceStatus>()
                .map_err(|e: ConversionError| ToolError::InvalidArgument {
                    name: "status",
                    reason: e.to_string(),
                })
        })
        .transpose()?;

    let issue_date_from = optional_str(args, "issueDateFrom")?
        .map(|raw| parse_timestamp("issueDateFrom", raw))
        .transpose()?;
    let issue_date_to = optional_str(args, "issueDateTo")?
        .map(|raw| parse_timestamp("issueDateTo", raw))
        .transpose()?;

    Ok(Criteria {
        status,
        issue_date_from,
        issue_date_to,
    })
}
