use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::common_dto::{like_pattern, search_term, Pagination};
use crate::dto::part_dto::PartFilter;
use crate::models::part::{Part, StockMovement};
use crate::repositories::memory_table::{MemoryTable, Record};
use crate::utils::errors::{not_found_error, AppResult};

#[async_trait]
pub trait PartRepository: Send + Sync {
    async fn create(&self, part: &Part) -> AppResult<Part>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Part>>;
    async fn code_exists(&self, code: &str) -> AppResult<bool>;
    /// Guarda todo menos el stock, que solo cambia vía movimientos, e
    /// is_active, que solo cambia vía set_active
    async fn update(&self, part: &Part) -> AppResult<Part>;
    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Part>;
    async fn list(&self, filter: &PartFilter, pagination: Pagination) -> AppResult<(Vec<Part>, i64)>;
    /// Aplica el movimiento y lo registra en una sola operación atómica
    async fn apply_stock_movement(&self, movement: &StockMovement) -> AppResult<Part>;
    async fn movements(&self, part_id: Uuid) -> AppResult<Vec<StockMovement>>;
    async fn low_stock(&self, limit: i64) -> AppResult<Vec<Part>>;
}

pub struct PgPartRepository {
    pool: PgPool,
}

impl PgPartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &PartFilter) {
    qb.push(" WHERE TRUE");
    if let Some(search) = search_term(&filter.search) {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category.clone() {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
    if filter.low_stock {
        qb.push(" AND stock <= min_stock");
    }
}

#[async_trait]
impl PartRepository for PgPartRepository {
    async fn create(&self, part: &Part) -> AppResult<Part> {
        let result = sqlx::query_as::<_, Part>(
            r#"
            INSERT INTO parts (id, code, name, description, brand, category, price, cost, stock,
                               min_stock, max_stock, location, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(part.id)
        .bind(&part.code)
        .bind(&part.name)
        .bind(&part.description)
        .bind(&part.brand)
        .bind(&part.category)
        .bind(part.price)
        .bind(part.cost)
        .bind(part.stock)
        .bind(part.min_stock)
        .bind(part.max_stock)
        .bind(&part.location)
        .bind(part.is_active)
        .bind(part.created_at)
        .bind(part.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Part>> {
        let part = sqlx::query_as::<_, Part>("SELECT * FROM parts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(part)
    }

    async fn code_exists(&self, code: &str) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM parts WHERE code = $1)")
            .bind(code)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn update(&self, part: &Part) -> AppResult<Part> {
        let result = sqlx::query_as::<_, Part>(
            r#"
            UPDATE parts
            SET code = $2, name = $3, description = $4, brand = $5, category = $6, price = $7,
                cost = $8, min_stock = $9, max_stock = $10, location = $11, updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(part.id)
        .bind(&part.code)
        .bind(&part.name)
        .bind(&part.description)
        .bind(&part.brand)
        .bind(&part.category)
        .bind(part.price)
        .bind(part.cost)
        .bind(part.min_stock)
        .bind(part.max_stock)
        .bind(&part.location)
        .bind(part.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Part> {
        sqlx::query_as::<_, Part>(
            "UPDATE parts SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Part", &id.to_string()))
    }

    async fn list(&self, filter: &PartFilter, pagination: Pagination) -> AppResult<(Vec<Part>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM parts");
        push_filters(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM parts");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let parts = query.build_query_as::<Part>().fetch_all(&self.pool).await?;

        Ok((parts, total))
    }

    async fn apply_stock_movement(&self, movement: &StockMovement) -> AppResult<Part> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(i32,)> = sqlx::query_as("SELECT stock FROM parts WHERE id = $1 FOR UPDATE")
            .bind(movement.part_id)
            .fetch_optional(&mut *tx)
            .await?;
        let (current,) = current.ok_or_else(|| not_found_error("Part", &movement.part_id.to_string()))?;
        let next = movement.movement_type.apply(current, movement.quantity)?;

        let part = sqlx::query_as::<_, Part>(
            "UPDATE parts SET stock = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(movement.part_id)
        .bind(next)
        .bind(movement.created_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO stock_movements (id, part_id, movement_type, quantity, unit_price, total_price, reason, reference, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(movement.id)
        .bind(movement.part_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(movement.unit_price)
        .bind(movement.total_price)
        .bind(&movement.reason)
        .bind(&movement.reference)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(part)
    }

    async fn movements(&self, part_id: Uuid) -> AppResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE part_id = $1 ORDER BY created_at DESC",
        )
        .bind(part_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    async fn low_stock(&self, limit: i64) -> AppResult<Vec<Part>> {
        let parts = sqlx::query_as::<_, Part>(
            r#"
            SELECT * FROM parts
            WHERE is_active = TRUE AND stock <= min_stock
            ORDER BY (min_stock - stock) DESC, name ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(parts)
    }
}

impl Record for Part {
    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("code", self.code.clone())]
    }
}

pub struct InMemoryPartRepository {
    table: MemoryTable<Part>,
    movements: RwLock<Vec<StockMovement>>,
}

impl InMemoryPartRepository {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("Part"),
            movements: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryPartRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PartRepository for InMemoryPartRepository {
    async fn create(&self, part: &Part) -> AppResult<Part> {
        self.table.insert(part.clone()).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Part>> {
        Ok(self.table.get(id).await)
    }

    async fn code_exists(&self, code: &str) -> AppResult<bool> {
        Ok(self.table.any(|p| p.code == code).await)
    }

    async fn update(&self, part: &Part) -> AppResult<Part> {
        // Lectura y escritura bajo el mismo lock: un movimiento concurrente no se pierde
        self.table
            .update_with(part.id, |stored| {
                let (stock, is_active) = (stored.stock, stored.is_active);
                *stored = part.clone();
                stored.stock = stock;
                stored.is_active = is_active;
                Ok(stored.clone())
            })
            .await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Part> {
        self.table
            .update_with(id, |stored| {
                stored.is_active = active;
                stored.updated_at = Utc::now();
                Ok(stored.clone())
            })
            .await
    }

    async fn list(&self, filter: &PartFilter, pagination: Pagination) -> AppResult<(Vec<Part>, i64)> {
        Ok(self
            .table
            .page(|p| filter.matches(p), |a, b| a.name.cmp(&b.name), pagination)
            .await)
    }

    async fn apply_stock_movement(&self, movement: &StockMovement) -> AppResult<Part> {
        // El log de movimientos se bloquea primero para que ambos cambios se vean juntos
        let mut movements = self.movements.write().await;
        let part = self
            .table
            .update_with(movement.part_id, |part| {
                part.stock = movement.movement_type.apply(part.stock, movement.quantity)?;
                part.updated_at = Utc::now();
                Ok(part.clone())
            })
            .await?;
        movements.push(movement.clone());
        Ok(part)
    }

    async fn movements(&self, part_id: Uuid) -> AppResult<Vec<StockMovement>> {
        let mut found: Vec<StockMovement> = self
            .movements
            .read()
            .await
            .iter()
            .filter(|m| m.part_id == part_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn low_stock(&self, limit: i64) -> AppResult<Vec<Part>> {
        let mut parts = self.table.filter(|p| p.is_active && p.is_low_stock()).await;
        parts.sort_by(|a, b| {
            b.stock_deficit()
                .cmp(&a.stock_deficit())
                .then_with(|| a.name.cmp(&b.name))
        });
        parts.truncate(limit.max(0) as usize);
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::part::StockMovementType;
    use crate::utils::errors::AppError;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn new_part(code: &str, stock: i32) -> Part {
        let now = Utc::now();
        Part {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: "Filtro de óleo".to_string(),
            description: None,
            brand: None,
            category: None,
            price: dec!(35),
            cost: None,
            stock,
            min_stock: 0,
            max_stock: None,
            location: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_update_keeps_concurrent_stock_movements() {
        let repo = Arc::new(InMemoryPartRepository::new());
        let part = repo.create(&new_part("FLT-01", 0)).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..500 {
            let repo = repo.clone();
            let mut renamed = part.clone();
            tasks.push(tokio::spawn(async move {
                let movement = StockMovement::new(renamed.id, StockMovementType::In, 1, None, None, None);
                repo.apply_stock_movement(&movement).await.unwrap();
                renamed.name = format!("Filtro {}", i);
                repo.update(&renamed).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stored = repo.find_by_id(part.id).await.unwrap().unwrap();
        let logged = repo.movements(part.id).await.unwrap().len() as i32;
        assert_eq!(logged, 500);
        assert_eq!(stored.stock, logged);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_code() {
        let repo = InMemoryPartRepository::new();
        repo.create(&new_part("FLT-01", 0)).await.unwrap();
        let mut other = repo.create(&new_part("FLT-02", 0)).await.unwrap();

        other.code = "FLT-01".to_string();
        let result = repo.update(&other).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(repo.find_by_id(other.id).await.unwrap().unwrap().code, "FLT-02");
    }

    #[tokio::test]
    async fn test_update_does_not_touch_stock_or_active_flag() {
        let repo = InMemoryPartRepository::new();
        let part = repo.create(&new_part("FLT-01", 7)).await.unwrap();
        repo.set_active(part.id, false).await.unwrap();

        let mut stale = part.clone();
        stale.stock = 0;
        stale.name = "Filtro de ar".to_string();
        let updated = repo.update(&stale).await.unwrap();

        assert_eq!(updated.name, "Filtro de ar");
        assert_eq!(updated.stock, 7);
        assert!(!updated.is_active);
    }
}
