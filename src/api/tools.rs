use crate::api::{invoices, movements, AppState};
use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

pub const GET_INVOICE: &str = "GetInvoice";
pub const GET_INVOICES: &str = "GetInvoices";
pub const GET_INVOICE_MOVEMENTS: &str = "GetInvoiceMovements";
pub const GET_MOVEMENT: &str = "GetMovement";

/// 工具描述 (名称 + JSON Schema)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// 工具调用结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// 错误体: {"error": 类别, "message": 描述}
    pub fn error(err: &ToolError) -> Self {
        let body = json!({
            "error": err.category(),
            "message": err.to_string(),
        });
        Self {
            content: vec![ToolContent::Text {
                text: body.to_string(),
            }],
            is_error: true,
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|content| match content {
            ToolContent::Text { text } => Some(text.as_str()),
        })
    }
}

fn string_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GET_INVOICE,
            description: "Get an invoice by ID",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "accountId": string_property("The ID of the account to retrieve the invoice for"),
                    "invoiceId": string_property("The ID of the invoice to retrieve"),
                },
                "required": ["accountId", "invoiceId"],
            }),
        },
        ToolDefinition {
            name: GET_INVOICES,
            description: "Get all invoices for an account",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "accountId": string_property("The ID of the account to retrieve invoices for"),
                    "status": string_property("The status of the invoices to retrieve"),
                    "issueDateFrom": string_property("The start date of the invoices to retrieve in RFC3339 format"),
                    "issueDateTo": string_property("The end date of the invoices to retrieve in RFC3339 format"),
                },
                "required": ["accountId"],
            }),
        },
        ToolDefinition {
            name: GET_INVOICE_MOVEMENTS,
            description: "Get the movements (lines) of an invoice",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "accountId": string_property("The ID of the account the invoice belongs to"),
                    "invoiceId": string_property("The ID of the invoice whose movements to retrieve"),
                },
                "required": ["accountId", "invoiceId"],
            }),
        },
        ToolDefinition {
            name: GET_MOVEMENT,
            description: "Get a movement by ID",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "accountId": string_property("The ID of the account the movement belongs to"),
                    "movementId": string_property("The ID of the movement to retrieve"),
                },
                "required": ["accountId", "movementId"],
            }),
        },
    ]
}

/// 按名称分发工具调用, 所有失败都转换为 tool-error 结果
pub async fn call_tool(state: &AppState, name: &str, arguments: &Value) -> ToolResult {
    info!(tool = name, "Processing tool call");

    let outcome = match name {
        GET_INVOICE => invoices::get_invoice(&state.invoices, arguments).await,
        GET_INVOICES => invoices::get_invoices(&state.invoices, arguments).await,
        GET_INVOICE_MOVEMENTS => invoices::get_invoice_movements(&state.invoices, arguments).await,
        GET_MOVEMENT => movements::get_movement(&state.movements, arguments).await,
        other => Err(ToolError::UnknownTool(other.to_string())),
    };

    match outcome {
        Ok(text) => ToolResult::text(text),
        Err(e) => {
            warn!(tool = name, category = e.category(), error = %e, "Tool call failed");
            ToolResult::error(&e)
        }
    }
}
