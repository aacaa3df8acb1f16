//! Repositorio de órdenes de servicio
//!
//! Toda mutación de ítems recalcula `total` y `final_total` dentro de la
//! misma transacción (Postgres, con la fila de la orden bloqueada vía
//! `FOR UPDATE`) o bajo el mismo lock de escritura (memoria). Ningún lector
//! ve un total desactualizado después de que la operación retorna.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::dto::common_dto::Pagination;
use crate::dto::work_order_dto::{UpdateWorkOrderItemRequest, UpdateWorkOrderRequest, WorkOrderFilter};
use crate::models::work_order::{StatusHistoryEntry, WorkOrder, WorkOrderItem, WorkOrderStatus};
use crate::repositories::memory_table::{MemoryTable, Record};
use crate::utils::errors::{not_found_error, AppResult};

#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    /// Orden, ítems y filas de historial en una sola transacción
    async fn create(&self, order: &WorkOrder) -> AppResult<WorkOrder>;
    /// Con ítems (por posición) e historial (más antiguo primero)
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WorkOrder>>;
    async fn exists(&self, id: Uuid) -> AppResult<bool>;
    async fn list(&self, filter: &WorkOrderFilter, pagination: Pagination) -> AppResult<(Vec<WorkOrder>, i64)>;
    async fn update_details(&self, id: Uuid, patch: &UpdateWorkOrderRequest) -> AppResult<WorkOrder>;
    async fn transition_status(
        &self,
        id: Uuid,
        new_status: WorkOrderStatus,
        changed_by: Uuid,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> AppResult<WorkOrder>;
    /// La posición del ítem la asigna el repositorio
    async fn add_item(&self, id: Uuid, item: WorkOrderItem) -> AppResult<WorkOrder>;
    async fn update_item(&self, id: Uuid, item_id: Uuid, patch: &UpdateWorkOrderItemRequest) -> AppResult<WorkOrder>;
    async fn remove_item(&self, id: Uuid, item_id: Uuid) -> AppResult<WorkOrder>;
    async fn recalculate_total(&self, id: Uuid) -> AppResult<WorkOrder>;
    /// Borrado físico; ítems e historial caen en cascada
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count_by_status(&self) -> AppResult<Vec<(WorkOrderStatus, i64)>>;
}

fn item_not_found(item_id: Uuid) -> crate::utils::errors::AppError {
    not_found_error("WorkOrderItem", &item_id.to_string())
}

pub struct PgWorkOrderRepository {
    pool: PgPool,
}

impl PgWorkOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Abre la transacción y bloquea la orden con sus ítems cargados
    async fn begin_locked(&self, id: Uuid) -> AppResult<(Transaction<'static, Postgres>, WorkOrder)> {
        let mut tx = self.pool.begin().await?;

        let mut order = sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found_error("WorkOrder", &id.to_string()))?;
        order.items = fetch_items(&mut *tx, id).await?;

        Ok((tx, order))
    }

    /// Recalcula, guarda totales, confirma y devuelve la orden con su historial
    async fn commit_totals(
        &self,
        mut tx: Transaction<'static, Postgres>,
        mut order: WorkOrder,
    ) -> AppResult<WorkOrder> {
        order.recalculate_totals();
        sqlx::query("UPDATE work_orders SET total = $2, final_total = $3 WHERE id = $1")
            .bind(order.id)
            .bind(order.total)
            .bind(order.final_total)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        order.status_history = self.fetch_history(order.id).await?;
        Ok(order)
    }

    async fn fetch_history(&self, id: Uuid) -> AppResult<Vec<StatusHistoryEntry>> {
        let history = sqlx::query_as::<_, StatusHistoryEntry>(
            "SELECT * FROM work_order_status_history WHERE work_order_id = $1 ORDER BY changed_at ASC, id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }

    /// Carga los ítems de varias órdenes con una sola consulta
    async fn attach_items(&self, orders: &mut [WorkOrder]) -> AppResult<()> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, WorkOrderItem>(
            "SELECT * FROM work_order_items WHERE work_order_id = ANY($1) ORDER BY position ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<WorkOrderItem>> = HashMap::new();
        for item in items {
            grouped.entry(item.work_order_id).or_default().push(item);
        }
        for order in orders.iter_mut() {
            order.items = grouped.remove(&order.id).unwrap_or_default();
        }
        Ok(())
    }
}

async fn fetch_items(conn: &mut PgConnection, id: Uuid) -> AppResult<Vec<WorkOrderItem>> {
    let items = sqlx::query_as::<_, WorkOrderItem>(
        "SELECT * FROM work_order_items WHERE work_order_id = $1 ORDER BY position ASC",
    )
    .bind(id)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

async fn insert_item(conn: &mut PgConnection, item: &WorkOrderItem) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO work_order_items (id, work_order_id, kind, description, quantity, unit_price, subtotal, service_id, part_id, position)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(item.id)
    .bind(item.work_order_id)
    .bind(item.kind)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.subtotal)
    .bind(item.service_id)
    .bind(item.part_id)
    .bind(item.position)
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_history(conn: &mut PgConnection, entry: &StatusHistoryEntry) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO work_order_status_history (id, work_order_id, old_status, new_status, changed_by, changed_at, reason)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.id)
    .bind(entry.work_order_id)
    .bind(entry.old_status)
    .bind(entry.new_status)
    .bind(entry.changed_by)
    .bind(entry.changed_at)
    .bind(&entry.reason)
    .execute(conn)
    .await?;

    Ok(())
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &WorkOrderFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(client_id) = filter.client_id {
        qb.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(assigned_to_id) = filter.assigned_to_id {
        qb.push(" AND assigned_to_id = ").push_bind(assigned_to_id);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
}

#[async_trait]
impl WorkOrderRepository for PgWorkOrderRepository {
    async fn create(&self, order: &WorkOrder) -> AppResult<WorkOrder> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO work_orders (id, client_id, vehicle_id, vehicle_description, assigned_to_id, created_by_id,
                                     status, priority, public_notes, internal_notes, total, discount_percent,
                                     discount_value, final_total, created_at, approved_at, started_at,
                                     finished_at, delivered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(order.id)
        .bind(order.client_id)
        .bind(order.vehicle_id)
        .bind(&order.vehicle_description)
        .bind(order.assigned_to_id)
        .bind(order.created_by_id)
        .bind(order.status)
        .bind(order.priority)
        .bind(&order.public_notes)
        .bind(&order.internal_notes)
        .bind(order.total)
        .bind(order.discount_percent)
        .bind(order.discount_value)
        .bind(order.final_total)
        .bind(order.created_at)
        .bind(order.approved_at)
        .bind(order.started_at)
        .bind(order.finished_at)
        .bind(order.delivered_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            insert_item(&mut *tx, item).await?;
        }
        for entry in &order.status_history {
            insert_history(&mut *tx, entry).await?;
        }

        tx.commit().await?;
        Ok(order.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WorkOrder>> {
        let order = sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(mut order) = order else {
            return Ok(None);
        };
        self.attach_items(std::slice::from_mut(&mut order)).await?;
        order.status_history = self.fetch_history(id).await?;
        Ok(Some(order))
    }

    async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM work_orders WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn list(&self, filter: &WorkOrderFilter, pagination: Pagination) -> AppResult<(Vec<WorkOrder>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM work_orders");
        push_filters(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM work_orders");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let mut orders = query.build_query_as::<WorkOrder>().fetch_all(&self.pool).await?;
        self.attach_items(&mut orders).await?;

        Ok((orders, total))
    }

    async fn update_details(&self, id: Uuid, patch: &UpdateWorkOrderRequest) -> AppResult<WorkOrder> {
        let (mut tx, mut order) = self.begin_locked(id).await?;
        patch.apply_to(&mut order);

        sqlx::query(
            r#"
            UPDATE work_orders
            SET vehicle_id = $2, vehicle_description = $3, assigned_to_id = $4, priority = $5,
                public_notes = $6, internal_notes = $7, discount_percent = $8, discount_value = $9
            WHERE id = $1
            "#,
        )
        .bind(order.id)
        .bind(order.vehicle_id)
        .bind(&order.vehicle_description)
        .bind(order.assigned_to_id)
        .bind(order.priority)
        .bind(&order.public_notes)
        .bind(&order.internal_notes)
        .bind(order.discount_percent)
        .bind(order.discount_value)
        .execute(&mut *tx)
        .await?;

        self.commit_totals(tx, order).await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        new_status: WorkOrderStatus,
        changed_by: Uuid,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> AppResult<WorkOrder> {
        let (mut tx, mut order) = self.begin_locked(id).await?;
        let entry = order.transition(new_status, changed_by, reason, at);

        // El hito solo se sella si la columna sigue en NULL
        let mut query = QueryBuilder::new("UPDATE work_orders SET status = ");
        query.push_bind(new_status);
        if let Some(column) = new_status.milestone_column() {
            query
                .push(format!(", {column} = COALESCE({column}, "))
                .push_bind(at)
                .push(")");
        }
        query.push(" WHERE id = ").push_bind(id);
        query.build().execute(&mut *tx).await?;
        insert_history(&mut *tx, &entry).await?;

        tx.commit().await?;
        order.status_history = self.fetch_history(id).await?;
        Ok(order)
    }

    async fn add_item(&self, id: Uuid, mut item: WorkOrderItem) -> AppResult<WorkOrder> {
        let (mut tx, mut order) = self.begin_locked(id).await?;
        item.work_order_id = id;
        item.position = order.next_item_position();
        item.refresh_subtotal();

        insert_item(&mut *tx, &item).await?;
        order.items.push(item);

        self.commit_totals(tx, order).await
    }

    async fn update_item(&self, id: Uuid, item_id: Uuid, patch: &UpdateWorkOrderItemRequest) -> AppResult<WorkOrder> {
        let (mut tx, mut order) = self.begin_locked(id).await?;
        let item = order
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| item_not_found(item_id))?;
        patch.apply_to(item);

        sqlx::query(
            "UPDATE work_order_items SET description = $2, quantity = $3, unit_price = $4, subtotal = $5 WHERE id = $1",
        )
        .bind(item.id)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.subtotal)
        .execute(&mut *tx)
        .await?;

        self.commit_totals(tx, order).await
    }

    async fn remove_item(&self, id: Uuid, item_id: Uuid) -> AppResult<WorkOrder> {
        let (mut tx, mut order) = self.begin_locked(id).await?;
        if order.find_item(item_id).is_none() {
            return Err(item_not_found(item_id));
        }

        sqlx::query("DELETE FROM work_order_items WHERE id = $1 AND work_order_id = $2")
            .bind(item_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        order.items.retain(|i| i.id != item_id);

        self.commit_totals(tx, order).await
    }

    async fn recalculate_total(&self, id: Uuid) -> AppResult<WorkOrder> {
        let (tx, order) = self.begin_locked(id).await?;
        self.commit_totals(tx, order).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM work_orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self) -> AppResult<Vec<(WorkOrderStatus, i64)>> {
        let rows = sqlx::query_as::<_, (WorkOrderStatus, i64)>(
            "SELECT status, COUNT(*) FROM work_orders GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

impl Record for WorkOrder {
    fn id(&self) -> Uuid {
        self.id
    }
}

pub struct InMemoryWorkOrderRepository {
    table: MemoryTable<WorkOrder>,
}

impl InMemoryWorkOrderRepository {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("WorkOrder"),
        }
    }
}

impl Default for InMemoryWorkOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkOrderRepository for InMemoryWorkOrderRepository {
    async fn create(&self, order: &WorkOrder) -> AppResult<WorkOrder> {
        self.table.insert(order.clone()).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WorkOrder>> {
        Ok(self.table.get(id).await)
    }

    async fn exists(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.table.any(|o| o.id == id).await)
    }

    async fn list(&self, filter: &WorkOrderFilter, pagination: Pagination) -> AppResult<(Vec<WorkOrder>, i64)> {
        let (mut orders, total) = self
            .table
            .page(|o| filter.matches(o), |a, b| b.created_at.cmp(&a.created_at), pagination)
            .await;
        // El historial solo viaja en el detalle
        for order in orders.iter_mut() {
            order.status_history.clear();
        }
        Ok((orders, total))
    }

    async fn update_details(&self, id: Uuid, patch: &UpdateWorkOrderRequest) -> AppResult<WorkOrder> {
        self.table
            .update_with(id, |order| {
                patch.apply_to(order);
                Ok(order.clone())
            })
            .await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        new_status: WorkOrderStatus,
        changed_by: Uuid,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> AppResult<WorkOrder> {
        self.table
            .update_with(id, |order| {
                order.transition(new_status, changed_by, reason, at);
                Ok(order.clone())
            })
            .await
    }

    async fn add_item(&self, id: Uuid, mut item: WorkOrderItem) -> AppResult<WorkOrder> {
        self.table
            .update_with(id, |order| {
                item.work_order_id = id;
                item.position = order.next_item_position();
                item.refresh_subtotal();
                order.items.push(item);
                order.recalculate_totals();
                Ok(order.clone())
            })
            .await
    }

    async fn update_item(&self, id: Uuid, item_id: Uuid, patch: &UpdateWorkOrderItemRequest) -> AppResult<WorkOrder> {
        self.table
            .update_with(id, |order| {
                let item = order
                    .items
                    .iter_mut()
                    .find(|i| i.id == item_id)
                    .ok_or_else(|| item_not_found(item_id))?;
                patch.apply_to(item);
                order.recalculate_totals();
                Ok(order.clone())
            })
            .await
    }

    async fn remove_item(&self, id: Uuid, item_id: Uuid) -> AppResult<WorkOrder> {
        self.table
            .update_with(id, |order| {
                if order.find_item(item_id).is_none() {
                    return Err(item_not_found(item_id));
                }
                order.items.retain(|i| i.id != item_id);
                order.recalculate_totals();
                Ok(order.clone())
            })
            .await
    }

    async fn recalculate_total(&self, id: Uuid) -> AppResult<WorkOrder> {
        self.table
            .update_with(id, |order| {
                order.recalculate_totals();
                Ok(order.clone())
            })
            .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.table.remove(id).await)
    }

    async fn count_by_status(&self) -> AppResult<Vec<(WorkOrderStatus, i64)>> {
        let orders = self.table.filter(|_| true).await;
        let mut counts: HashMap<WorkOrderStatus, i64> = HashMap::new();
        for order in &orders {
            *counts.entry(order.status).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::work_order::{ItemKind, WorkOrderPriority};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn new_order() -> WorkOrder {
        WorkOrder::new(
            Uuid::new_v4(),
            None,
            "VW Gol 2015".to_string(),
            None,
            Uuid::new_v4(),
            WorkOrderStatus::Estimate,
            WorkOrderPriority::Normal,
            None,
            None,
            Utc::now(),
        )
    }

    fn item(kind: ItemKind, qty: rust_decimal::Decimal, price: rust_decimal::Decimal) -> WorkOrderItem {
        WorkOrderItem::new(Uuid::nil(), kind, "item".to_string(), qty, price, None, None, 0)
    }

    #[tokio::test]
    async fn test_item_mutations_keep_total_fresh() {
        let repo = InMemoryWorkOrderRepository::new();
        let order = repo.create(&new_order()).await.unwrap();

        let with_service = repo.add_item(order.id, item(ItemKind::Service, dec!(1), dec!(100))).await.unwrap();
        let with_part = repo.add_item(order.id, item(ItemKind::Part, dec!(2), dec!(50))).await.unwrap();
        assert_eq!(with_service.total, dec!(100));
        assert_eq!(with_part.total, dec!(200));
        assert_eq!(with_part.items[1].position, 1);

        let part_id = with_part.items[1].id;
        let after = repo.remove_item(order.id, part_id).await.unwrap();
        assert_eq!(after.total, dec!(100));

        let stored = repo.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.total, dec!(100));
        assert_eq!(stored.items.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_foreign_item_is_not_found() {
        let repo = InMemoryWorkOrderRepository::new();
        let a = repo.create(&new_order()).await.unwrap();
        let b = repo.create(&new_order()).await.unwrap();
        let b = repo.add_item(b.id, item(ItemKind::Part, dec!(1), dec!(10))).await.unwrap();

        let result = repo.remove_item(a.id, b.items[0].id).await;
        assert!(matches!(result, Err(crate::utils::errors::AppError::NotFound(_))));

        let b = repo.find_by_id(b.id).await.unwrap().unwrap();
        assert_eq!(b.items.len(), 1);
        assert_eq!(b.total, dec!(10));
    }

    #[tokio::test]
    async fn test_transition_appends_history_and_preserves_milestone() {
        let repo = InMemoryWorkOrderRepository::new();
        let order = repo.create(&new_order()).await.unwrap();
        let by = Uuid::new_v4();
        let t1 = Utc::now();

        repo.transition_status(order.id, WorkOrderStatus::Approved, by, None, t1).await.unwrap();
        repo.transition_status(order.id, WorkOrderStatus::Estimate, by, Some("revisão".into()), t1 + Duration::seconds(1))
            .await
            .unwrap();
        let last = repo
            .transition_status(order.id, WorkOrderStatus::Approved, by, None, t1 + Duration::seconds(2))
            .await
            .unwrap();

        assert_eq!(last.approved_at, Some(t1));
        assert_eq!(last.status_history.len(), 4);
        assert_eq!(last.status_history[2].reason.as_deref(), Some("revisão"));
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let repo = InMemoryWorkOrderRepository::new();
        let a = repo.create(&new_order()).await.unwrap();
        repo.create(&new_order()).await.unwrap();
        repo.transition_status(a.id, WorkOrderStatus::Cancelled, Uuid::new_v4(), None, Utc::now())
            .await
            .unwrap();

        let mut counts = repo.count_by_status().await.unwrap();
        counts.sort();
        assert_eq!(
            counts,
            vec![(WorkOrderStatus::Estimate, 1), (WorkOrderStatus::Cancelled, 1)]
        );
    }
}
