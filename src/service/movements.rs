use crate::error::StorageError;
use crate::models::{InvoiceId, Movement, MovementId, MovementStatus, OperationType, SearchCriteria};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// 流水仓储 (领域类型)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovementRepository: Send + Sync {
    async fn create(&self, movement: &Movement) -> Result<(), StorageError>;

    async fn get_by_id(&self, id: MovementId) -> Result<Movement, StorageError>;

    async fn update(&self, movement: &Movement) -> Result<(), StorageError>;

    async fn delete(&self, id: MovementId) -> Result<(), StorageError>;

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Movement>, StorageError>;
}

/// 流水服务
pub struct MovementService {
    repository: Arc<dyn MovementRepository>,
}

impl MovementService {
    pub fn new(repository: Arc<dyn MovementRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip_all, fields(%invoice_id, %movement_type))]
    pub async fn create_movement(
        &self,
        invoice_id: InvoiceId,
        amount: BigDecimal,
        movement_type: OperationType,
        description: &str,
    ) -> Result<Movement, StorageError> {
        let movement = Movement::new(invoice_id, amount, movement_type, description);
        info!(movement_id = %movement.id, amount = %movement.amount, "Creating movement");

        if let Err(e) = self.repository.create(&movement).await {
            error!(movement_id = %movement.id, error = %e, "Failed to create movement");
            return Err(e);
        }

        info!(movement_id = %movement.id, "Movement created");
        Ok(movement)
    }

    #[instrument(skip_all, fields(movement_id = %id))]
    pub async fn get_movement(&self, id: MovementId) -> Result<Movement, StorageError> {
        self.repository.get_by_id(id).await.map_err(|e| {
            error!(error = %e, "Failed to fetch movement");
            e
        })
    }

    /// 不校验状态迁移, 只刷新 updated_at
    #[instrument(skip_all, fields(movement_id = %id, %status))]
    pub async fn update_movement_status(
        &self,
        id: MovementId,
        status: MovementStatus,
    ) -> Result<Movement, StorageError> {
        let mut movement = self.repository.get_by_id(id).await.map_err(|e| {
            error!(error = %e, "Failed to load movement for status update");
            e
        })?;

        let previous = movement.status;
        movement.status = status;
        movement.updated_at = Utc::now();

        self.repository.update(&movement).await.map_err(|e| {
            error!(error = %e, "Failed to update movement status");
            e
        })?;

        info!(%previous, "Movement status updated");
        Ok(movement)
    }

    #[instrument(skip_all, fields(?criteria))]
    pub async fn search_movements(&self, criteria: &SearchCriteria) -> Result<Vec<Movement>, StorageError> {
        match self.repository.search(criteria).await {
            Ok(movements) => {
                info!(count = movements.len(), "Movements found");
                Ok(movements)
            }
            Err(e) => {
                error!(error = %e, "Failed to search movements");
                Err(e)
            }
        }
    }

    #[instrument(skip_all, fields(movement_id = %id))]
    pub async fn delete_movement(&self, id: MovementId) -> Result<(), StorageError> {
        self.repository.delete(id).await.map_err(|e| {
            error!(error = %e, "Failed to delete movement");
            e
        })?;

        info!("Movement deleted");
        Ok(())
    }
}
