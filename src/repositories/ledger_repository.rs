use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::common_dto::Pagination;
use crate::dto::ledger_dto::LedgerFilter;
use crate::models::ledger::LedgerEntry;
use crate::repositories::memory_table::{MemoryTable, Record};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn create(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LedgerEntry>>;
    async fn update(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn list(&self, filter: &LedgerFilter, pagination: Pagination) -> AppResult<(Vec<LedgerEntry>, i64)>;
    /// Todas las entradas que cumplen el filtro, sin paginar (para el resumen)
    async fn find_all(&self, filter: &LedgerFilter) -> AppResult<Vec<LedgerEntry>>;
}

pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &LedgerFilter) {
    qb.push(" WHERE TRUE");
    if let Some(entry_type) = filter.entry_type {
        qb.push(" AND entry_type = ").push_bind(entry_type);
    }
    if let Some(category) = filter.category.clone() {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(paid) = filter.is_paid {
        qb.push(" AND is_paid = ").push_bind(paid);
    }
    if let Some(start) = filter.range.start {
        qb.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = filter.range.end {
        qb.push(" AND date <= ").push_bind(end);
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn create(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry> {
        let result = sqlx::query_as::<_, LedgerEntry>(
            r#"
            INSERT INTO ledger_entries (id, entry_type, amount, description, category, date, work_order_id,
                                        is_paid, payment_method, created_by_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(entry.id)
        .bind(entry.entry_type)
        .bind(entry.amount)
        .bind(&entry.description)
        .bind(&entry.category)
        .bind(entry.date)
        .bind(entry.work_order_id)
        .bind(entry.is_paid)
        .bind(entry.payment_method)
        .bind(entry.created_by_id)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LedgerEntry>> {
        let entry = sqlx::query_as::<_, LedgerEntry>("SELECT * FROM ledger_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn update(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry> {
        let result = sqlx::query_as::<_, LedgerEntry>(
            r#"
            UPDATE ledger_entries
            SET entry_type = $2, amount = $3, description = $4, category = $5, date = $6,
                work_order_id = $7, is_paid = $8, payment_method = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(entry.id)
        .bind(entry.entry_type)
        .bind(entry.amount)
        .bind(&entry.description)
        .bind(&entry.category)
        .bind(entry.date)
        .bind(entry.work_order_id)
        .bind(entry.is_paid)
        .bind(entry.payment_method)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM ledger_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &LedgerFilter, pagination: Pagination) -> AppResult<(Vec<LedgerEntry>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM ledger_entries");
        push_filters(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM ledger_entries");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY date DESC, created_at DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let entries = query.build_query_as::<LedgerEntry>().fetch_all(&self.pool).await?;

        Ok((entries, total))
    }

    async fn find_all(&self, filter: &LedgerFilter) -> AppResult<Vec<LedgerEntry>> {
        let mut query = QueryBuilder::new("SELECT * FROM ledger_entries");
        push_filters(&mut query, filter);
        query.push(" ORDER BY date ASC");
        let entries = query.build_query_as::<LedgerEntry>().fetch_all(&self.pool).await?;

        Ok(entries)
    }
}

impl Record for LedgerEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

pub struct InMemoryLedgerRepository {
    table: MemoryTable<LedgerEntry>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("LedgerEntry"),
        }
    }
}

impl Default for InMemoryLedgerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn create(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry> {
        self.table.insert(entry.clone()).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LedgerEntry>> {
        Ok(self.table.get(id).await)
    }

    async fn update(&self, entry: &LedgerEntry) -> AppResult<LedgerEntry> {
        self.table.replace(entry.clone()).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.table.remove(id).await)
    }

    async fn list(&self, filter: &LedgerFilter, pagination: Pagination) -> AppResult<(Vec<LedgerEntry>, i64)> {
        Ok(self
            .table
            .page(
                |e| filter.matches(e),
                |a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)),
                pagination,
            )
            .await)
    }

    async fn find_all(&self, filter: &LedgerFilter) -> AppResult<Vec<LedgerEntry>> {
        let mut entries = self.table.filter(|e| filter.matches(e)).await;
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(entries)
    }
}
