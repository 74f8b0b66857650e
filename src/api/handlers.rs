use crate::api::tools::{self, ToolDefinition, ToolResult};
use crate::api::AppState;
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 请求体: 工具名 + 参数
#[derive(Debug, Deserialize)]
pub struct CallToolRequest {
    pub name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

fn empty_arguments() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ListToolsResponse {
    pub tools: Vec<ToolDefinition>,
}

/// 健康检查
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_tools() -> Json<ListToolsResponse> {
    Json(ListToolsResponse {
        tools: tools::definitions(),
    })
}

/// 工具调用, 失败也以 200 + isError 返回
pub async fn call_tool(
    State(state): State<AppState>,
    Json(req): Json<CallToolRequest>,
) -> Json<ToolResult> {
    Json(tools::call_tool(&state, &req.name, &req.arguments).await)
}
