use crate::db::converter::{
    FilterMap, FilterValue, FILTER_INVOICE_ID, FILTER_ISSUE_DATE_FROM, FILTER_ISSUE_DATE_TO,
    FILTER_STATUS,
};
use crate::db::records::{InvoiceLineRecord, InvoiceRecord, MovementRecord};
use crate::db::retry::RetryPolicy;
use crate::db::store::{InvoiceStore, MovementStore};
use crate::error::StorageError;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

/// movements 表的一行: 流水字段 + 明细金额字段
#[derive(Debug, Clone)]
struct MovementRow {
    movement: MovementRecord,
    amount_without_tax: BigDecimal,
    amount_with_tax: BigDecimal,
    tax_percentage: BigDecimal,
    deleted: bool,
}

impl MovementRow {
    fn to_line(&self) -> InvoiceLineRecord {
        InvoiceLineRecord {
            movement_id: self.movement.id,
            invoice_id: self.movement.invoice_id,
            description: self.movement.description.clone(),
            amount_without_tax: self.amount_without_tax.clone(),
            amount_with_tax: self.amount_with_tax.clone(),
            tax_percentage: self.tax_percentage.clone(),
            operation_type: self.movement.movement_type.clone(),
            transaction_date: self.movement.transaction_date,
            status: self.movement.status.clone(),
        }
    }
}

/// 内存存储, 与 PostgreSQL 实现相同的过滤/排序/软删除语义
///
/// 测试替身; `fail_next` 让后续若干次查询返回可重试错误
pub struct MemoryStore {
    invoices: DashMap<Uuid, InvoiceRecord>,
    movements: DashMap<Uuid, MovementRow>,
    pending_failures: AtomicU32,
    attempts: AtomicU32,
    retry: RetryPolicy,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_retry(RetryPolicy::immediate(3))
    }

    pub fn with_retry(retry: RetryPolicy) -> Self {
        Self {
            invoices: DashMap::new(),
            movements: DashMap::new(),
            pending_failures: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
            retry,
        }
    }

    pub fn insert_invoice(&self, record: InvoiceRecord) {
        self.invoices.insert(record.id, record);
    }

    /// 写入一条明细 (同时作为流水可见)
    pub fn insert_line(&self, line: InvoiceLineRecord) {
        let movement = MovementRecord {
            id: line.movement_id,
            invoice_id: line.invoice_id,
            amount: line.amount_with_tax.clone(),
            movement_type: line.operation_type,
            description: line.description,
            transaction_date: line.transaction_date,
            status: line.status,
            created_at: line.transaction_date,
            updated_at: line.transaction_date,
        };
        self.movements.insert(
            movement.id,
            MovementRow {
                movement,
                amount_without_tax: line.amount_without_tax,
                amount_with_tax: line.amount_with_tax,
                tax_percentage: line.tax_percentage,
                deleted: false,
            },
        );
    }

    pub fn fail_next(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// 累计查询次数 (含注入的失败)
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn begin_attempt(&self) -> Result<(), StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StorageError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }

    fn live_movement(&self, id: Uuid) -> Result<MovementRow, StorageError> {
        self.movements
            .get(&id)
            .filter(|row| !row.deleted)
            .map(|row| row.value().clone())
            .ok_or_else(|| StorageError::not_found("movement", id))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn invoice_matches(record: &InvoiceRecord, filters: &FilterMap) -> Result<bool, StorageError> {
    for (key, value) in filters {
        let matched = match (*key, value) {
            (FILTER_STATUS, FilterValue::Text(status)) => record.status == *status,
            (FILTER_ISSUE_DATE_FROM, FilterValue::Timestamp(from)) => record.issue_date >= *from,
            (FILTER_ISSUE_DATE_TO, FilterValue::Timestamp(to)) => record.issue_date <= *to,
            (other, _) => return Err(StorageError::UnsupportedFilter(other.to_string())),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn movement_matches(record: &MovementRecord, filters: &FilterMap) -> Result<bool, StorageError> {
    for (key, value) in filters {
        let matched = match (*key, value) {
            (FILTER_INVOICE_ID, FilterValue::Id(id)) => record.invoice_id == *id,
            (FILTER_STATUS, FilterValue::Text(status)) => record.status == *status,
            (other, _) => return Err(StorageError::UnsupportedFilter(other.to_string())),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn get_invoice_by_id(&self, id: Uuid) -> Result<InvoiceRecord, StorageError> {
        self.retry
            .run("get_invoice_by_id", || async move {
                self.begin_attempt()?;
                self.invoices
                    .get(&id)
                    .map(|r| r.value().clone())
                    .ok_or_else(|| StorageError::not_found("invoice", id))
            })
            .await
    }

    async fn get_invoices_by_account(
        &self,
        account_id: &str,
        filters: &FilterMap,
    ) -> Result<Vec<InvoiceRecord>, StorageError> {
        self.retry
            .run("get_invoices_by_account", || async move {
                self.begin_attempt()?;
                let mut records = Vec::new();
                for entry in self.invoices.iter() {
                    if entry.account_id == account_id && invoice_matches(entry.value(), filters)? {
                        records.push(entry.value().clone());
                    }
                }
                records.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
                Ok::<_, StorageError>(records)
            })
            .await
    }

    async fn get_lines_by_invoice_id(&self, invoice_id: Uuid) -> Result<Vec<InvoiceLineRecord>, StorageError> {
        self.retry
            .run("get_lines_by_invoice_id", || async move {
                self.begin_attempt()?;
                let mut lines: Vec<InvoiceLineRecord> = self
                    .movements
                    .iter()
                    .filter(|row| !row.deleted && row.movement.invoice_id == invoice_id)
                    .map(|row| row.to_line())
                    .collect();
                lines.sort_by(|a, b| {
                    a.transaction_date
                        .cmp(&b.transaction_date)
                        .then_with(|| a.movement_id.cmp(&b.movement_id))
                });
                Ok::<_, StorageError>(lines)
            })
            .await
    }
}

#[async_trait]
impl MovementStore for MemoryStore {
    async fn insert_movement(&self, record: &MovementRecord) -> Result<(), StorageError> {
        self.begin_attempt()?;
        if self.movements.contains_key(&record.id) {
            return Err(StorageError::Unavailable(format!(
                "duplicate movement id {}",
                record.id
            )));
        }
        self.movements.insert(
            record.id,
            MovementRow {
                movement: record.clone(),
                amount_without_tax: record.amount.clone(),
                amount_with_tax: record.amount.clone(),
                tax_percentage: BigDecimal::zero(),
                deleted: false,
            },
        );
        Ok(())
    }

    async fn get_movement_by_id(&self, id: Uuid) -> Result<MovementRecord, StorageError> {
        self.retry
            .run("get_movement_by_id", || async move {
                self.begin_attempt()?;
                self.live_movement(id).map(|row| row.movement)
            })
            .await
    }

    async fn update_movement(&self, record: &MovementRecord) -> Result<(), StorageError> {
        self.retry
            .run("update_movement", || async move {
                self.begin_attempt()?;
                match self.movements.get_mut(&record.id) {
                    Some(mut row) if !row.deleted => {
                        row.movement = MovementRecord {
                            created_at: row.movement.created_at,
                            ..record.clone()
                        };
                        Ok(())
                    }
                    _ => Err(StorageError::not_found("movement", record.id)),
                }
            })
            .await
    }

    async fn delete_movement(&self, id: Uuid) -> Result<(), StorageError> {
        self.retry
            .run("delete_movement", || async move {
                self.begin_attempt()?;
                match self.movements.get_mut(&id) {
                    Some(mut row) if !row.deleted => {
                        row.deleted = true;
                        Ok(())
                    }
                    _ => Err(StorageError::not_found("movement", id)),
                }
            })
            .await
    }

    async fn search_movements(&self, filters: &FilterMap) -> Result<Vec<MovementRecord>, StorageError> {
        self.retry
            .run("search_movements", || async move {
                self.begin_attempt()?;
                let mut records = Vec::new();
                for row in self.movements.iter() {
                    if !row.deleted && movement_matches(&row.movement, filters)? {
                        records.push(row.movement.clone());
                    }
                }
                records.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
                Ok::<_, StorageError>(records)
            })
            .await
    }
}
