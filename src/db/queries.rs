use crate::db::converter::{
    FilterMap, FilterValue, FILTER_INVOICE_ID, FILTER_ISSUE_DATE_FROM, FILTER_ISSUE_DATE_TO,
    FILTER_STATUS,
};
use crate::db::records::{InvoiceLineRecord, InvoiceRecord, MovementRecord};
use crate::db::retry::RetryPolicy;
use crate::db::store::{InvoiceStore, MovementStore};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use uuid::Uuid;

const INVOICE_COLUMNS: &str = "id, account_id, invoice_number, issue_date, due_date, \
     tax_amount, total_amount_without_tax, total_amount_with_tax, status";

const MOVEMENT_COLUMNS: &str = "id, invoice_id, amount, movement_type, description, \
     transaction_date, status, created_at, updated_at";

/// 过滤键 -> SQL 条件
const INVOICE_FILTER_PREDICATES: &[(&str, &str)] = &[
    (FILTER_STATUS, " AND status = "),
    (FILTER_ISSUE_DATE_FROM, " AND issue_date >= "),
    (FILTER_ISSUE_DATE_TO, " AND issue_date <= "),
];

const MOVEMENT_FILTER_PREDICATES: &[(&str, &str)] = &[
    (FILTER_INVOICE_ID, " AND invoice_id = "),
    (FILTER_STATUS, " AND status = "),
];

const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// 追加过滤条件, 未知键报错而不是忽略
fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    filters: &FilterMap,
    predicates: &[(&str, &str)],
) -> Result<(), StorageError> {
    for (key, value) in filters {
        let predicate = predicates
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, predicate)| *predicate)
            .ok_or_else(|| StorageError::UnsupportedFilter(key.to_string()))?;

        builder.push(predicate);
        match value {
            FilterValue::Text(v) => builder.push_bind(v.clone()),
            FilterValue::Timestamp(v) => builder.push_bind(*v),
            FilterValue::Id(v) => builder.push_bind(*v),
        };
    }
    Ok(())
}

fn invoices_by_account_query(
    account_id: &str,
    filters: &FilterMap,
) -> Result<QueryBuilder<'static, Postgres>, StorageError> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM invoices WHERE deleted_at IS NULL AND account_id = ",
        INVOICE_COLUMNS
    ));
    builder.push_bind(account_id.to_string());
    push_filters(&mut builder, filters, INVOICE_FILTER_PREDICATES)?;
    builder.push(" ORDER BY issue_date DESC");
    Ok(builder)
}

fn search_movements_query(filters: &FilterMap) -> Result<QueryBuilder<'static, Postgres>, StorageError> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM movements WHERE deleted_at IS NULL",
        MOVEMENT_COLUMNS
    ));
    push_filters(&mut builder, filters, MOVEMENT_FILTER_PREDICATES)?;
    builder.push(" ORDER BY transaction_date DESC");
    Ok(builder)
}

/// PostgreSQL 发票存储
#[derive(Clone)]
pub struct PgInvoiceStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    async fn get_invoice_by_id(&self, id: Uuid) -> Result<InvoiceRecord, StorageError> {
        tracing::debug!(%id, "Fetching invoice by ID");
        let pool = &self.pool;
        let sql = format!(
            "SELECT {} FROM invoices WHERE id = $1 AND deleted_at IS NULL",
            INVOICE_COLUMNS
        );
        let sql = sql.as_str();

        self.retry
            .run("get_invoice_by_id", || async move {
                sqlx::query_as::<_, InvoiceRecord>(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await?
                    .ok_or_else(|| StorageError::not_found("invoice", id))
            })
            .await
    }

    async fn get_invoices_by_account(
        &self,
        account_id: &str,
        filters: &FilterMap,
    ) -> Result<Vec<InvoiceRecord>, StorageError> {
        tracing::debug!(account_id, ?filters, "Fetching invoices by criteria");
        let pool = &self.pool;

        let records = self
            .retry
            .run("get_invoices_by_account", || async move {
                let mut builder = invoices_by_account_query(account_id, filters)?;

                let rows = builder
                    .build_query_as::<InvoiceRecord>()
                    .fetch_all(pool)
                    .await?;
                Ok::<_, StorageError>(rows)
            })
            .await?;

        tracing::debug!(account_id, count = records.len(), "Fetched invoices by criteria");
        Ok(records)
    }

    async fn get_lines_by_invoice_id(&self, invoice_id: Uuid) -> Result<Vec<InvoiceLineRecord>, StorageError> {
        tracing::debug!(%invoice_id, "Fetching invoice lines by invoice ID");
        let pool = &self.pool;

        self.retry
            .run("get_lines_by_invoice_id", || async move {
                let rows = sqlx::query_as::<_, InvoiceLineRecord>(
                    r#"
                    SELECT id AS movement_id,
                           invoice_id,
                           description,
                           amount_without_tax,
                           amount_with_tax,
                           tax_percentage,
                           movement_type AS operation_type,
                           transaction_date,
                           status
                    FROM movements
                    WHERE invoice_id = $1
                      AND deleted_at IS NULL
                    ORDER BY transaction_date ASC, id ASC
                    "#,
                )
                .bind(invoice_id)
                .fetch_all(pool)
                .await?;
                Ok::<_, StorageError>(rows)
            })
            .await
    }
}

/// PostgreSQL 流水存储
#[derive(Clone)]
pub struct PgMovementStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgMovementStore {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl MovementStore for PgMovementStore {
    /// 插入不走重试; 流水不带税额, 明细金额均取 amount
    async fn insert_movement(&self, record: &MovementRecord) -> Result<(), StorageError> {
        let start_time = std::time::Instant::now();

        let query = sqlx::query(
            r#"
            INSERT INTO movements (
                id, invoice_id, amount, amount_without_tax, amount_with_tax,
                movement_type, description, transaction_date, status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $3, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.invoice_id)
        .bind(&record.amount)
        .bind(&record.movement_type)
        .bind(&record.description)
        .bind(record.transaction_date)
        .bind(&record.status)
        .bind(record.created_at)
        .bind(record.updated_at);

        match tokio::time::timeout(WRITE_TIMEOUT, query.execute(&self.pool)).await {
            Ok(Ok(result)) => {
                tracing::info!(
                    movement_id = %record.id,
                    rows = result.rows_affected(),
                    elapsed = ?start_time.elapsed(),
                    "✓ INSERT movement succeeded"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(movement_id = %record.id, error = ?e, "✗ INSERT movement failed");
                Err(e.into())
            }
            Err(_) => {
                tracing::error!(movement_id = %record.id, "✗ INSERT movement timed out (>30s)");
                Err(StorageError::Unavailable("insert timed out".to_string()))
            }
        }
    }

    async fn get_movement_by_id(&self, id: Uuid) -> Result<MovementRecord, StorageError> {
        tracing::debug!(%id, "Fetching movement by ID");
        let pool = &self.pool;
        let sql = format!(
            "SELECT {} FROM movements WHERE id = $1 AND deleted_at IS NULL",
            MOVEMENT_COLUMNS
        );
        let sql = sql.as_str();

        self.retry
            .run("get_movement_by_id", || async move {
                sqlx::query_as::<_, MovementRecord>(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await?
                    .ok_or_else(|| StorageError::not_found("movement", id))
            })
            .await
    }

    async fn update_movement(&self, record: &MovementRecord) -> Result<(), StorageError> {
        tracing::debug!(movement_id = %record.id, "Updating movement");
        let pool = &self.pool;

        self.retry
            .run("update_movement", || async move {
                let result = sqlx::query(
                    r#"
                    UPDATE movements
                    SET amount = $2,
                        movement_type = $3,
                        description = $4,
                        transaction_date = $5,
                        status = $6,
                        updated_at = $7
                    WHERE id = $1
                      AND deleted_at IS NULL
                    "#,
                )
                .bind(record.id)
                .bind(&record.amount)
                .bind(&record.movement_type)
                .bind(&record.description)
                .bind(record.transaction_date)
                .bind(&record.status)
                .bind(record.updated_at)
                .execute(pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(StorageError::not_found("movement", record.id));
                }
                Ok::<_, StorageError>(())
            })
            .await
    }

    async fn delete_movement(&self, id: Uuid) -> Result<(), StorageError> {
        tracing::debug!(%id, "Deleting movement");
        let pool = &self.pool;

        self.retry
            .run("delete_movement", || async move {
                let result = sqlx::query(
                    "UPDATE movements SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(id)
                .bind(Utc::now())
                .execute(pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(StorageError::not_found("movement", id));
                }
                Ok::<_, StorageError>(())
            })
            .await
    }

    async fn search_movements(&self, filters: &FilterMap) -> Result<Vec<MovementRecord>, StorageError> {
        tracing::debug!(?filters, "Searching movements");
        let pool = &self.pool;

        self.retry
            .run("search_movements", || async move {
                let mut builder = search_movements_query(filters)?;

                let rows = builder
                    .build_query_as::<MovementRecord>()
                    .fetch_all(pool)
                    .await?;
                Ok::<_, StorageError>(rows)
            })
            .await
    }
}
