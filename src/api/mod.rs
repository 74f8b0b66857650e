pub mod args;
pub mod dto;
pub mod handlers;
pub mod invoices;
pub mod movements;
pub mod tools;

use crate::service::{InvoiceService, MovementService};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub use handlers::{call_tool, health_check, list_tools};
pub use tools::{ToolContent, ToolResult};

/// 共享状态: 两个领域服务
#[derive(Clone)]
pub struct AppState {
    pub invoices: Arc<InvoiceService>,
    pub movements: Arc<MovementService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/tools/call", post(call_tool))
        .with_state(state)
}
