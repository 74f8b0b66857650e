use crate::api::args;
use crate::api::dto::MovementDto;
use crate::error::ToolError;
use crate::models::MovementId;
use crate::service::MovementService;
use serde_json::Value;
use tracing::{info, instrument, Span};

/// GetMovement
#[instrument(skip_all, fields(account_id, movement_id))]
pub async fn get_movement(service: &MovementService, arguments: &Value) -> Result<String, ToolError> {
    let args = args::object(arguments)?;
    let account_id = args::required_str(args, "accountId")?;
    let raw_id = args::required_str(args, "movementId")?;
    Span::current()
        .record("account_id", account_id)
        .record("movement_id", raw_id);

    let movement_id = MovementId::parse(raw_id).map_err(args::invalid_format("movementId"))?;
    let movement = service
        .get_movement(movement_id)
        .await
        .map_err(|e| ToolError::service("failed to retrieve movement", e))?;

    info!("Movement retrieved");
    Ok(serde_json::to_string(&MovementDto::try_from(&movement)?)?)
}
