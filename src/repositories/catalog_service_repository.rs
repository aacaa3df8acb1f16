use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::catalog_service_dto::CatalogServiceFilter;
use crate::dto::common_dto::{like_pattern, search_term, Pagination};
use crate::models::catalog_service::CatalogService;
use crate::repositories::memory_table::{MemoryTable, Record};
use crate::utils::errors::{not_found_error, AppResult};

#[async_trait]
pub trait CatalogServiceRepository: Send + Sync {
    async fn create(&self, service: &CatalogService) -> AppResult<CatalogService>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CatalogService>>;
    /// Guarda la fila salvo is_active, que solo cambia vía set_active
    async fn update(&self, service: &CatalogService) -> AppResult<CatalogService>;
    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<CatalogService>;
    async fn list(
        &self,
        filter: &CatalogServiceFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<CatalogService>, i64)>;
}

pub struct PgCatalogServiceRepository {
    pool: PgPool,
}

impl PgCatalogServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CatalogServiceFilter) {
    qb.push(" WHERE TRUE");
    if let Some(search) = search_term(&filter.search) {
        qb.push(" AND name ILIKE ").push_bind(like_pattern(search));
    }
    if let Some(category) = filter.category.clone() {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
}

#[async_trait]
impl CatalogServiceRepository for PgCatalogServiceRepository {
    async fn create(&self, service: &CatalogService) -> AppResult<CatalogService> {
        let result = sqlx::query_as::<_, CatalogService>(
            r#"
            INSERT INTO catalog_services (id, name, description, category, price, estimated_minutes, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.category)
        .bind(service.price)
        .bind(service.estimated_minutes)
        .bind(service.is_active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CatalogService>> {
        let service = sqlx::query_as::<_, CatalogService>("SELECT * FROM catalog_services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(service)
    }

    async fn update(&self, service: &CatalogService) -> AppResult<CatalogService> {
        let result = sqlx::query_as::<_, CatalogService>(
            r#"
            UPDATE catalog_services
            SET name = $2, description = $3, category = $4, price = $5,
                estimated_minutes = $6, updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.category)
        .bind(service.price)
        .bind(service.estimated_minutes)
        .bind(service.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<CatalogService> {
        sqlx::query_as::<_, CatalogService>(
            "UPDATE catalog_services SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Service", &id.to_string()))
    }

    async fn list(
        &self,
        filter: &CatalogServiceFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<CatalogService>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM catalog_services");
        push_filters(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM catalog_services");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let services = query
            .build_query_as::<CatalogService>()
            .fetch_all(&self.pool)
            .await?;

        Ok((services, total))
    }
}

impl Record for CatalogService {
    fn id(&self) -> Uuid {
        self.id
    }
}

pub struct InMemoryCatalogServiceRepository {
    table: MemoryTable<CatalogService>,
}

impl InMemoryCatalogServiceRepository {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("Service"),
        }
    }
}

impl Default for InMemoryCatalogServiceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogServiceRepository for InMemoryCatalogServiceRepository {
    async fn create(&self, service: &CatalogService) -> AppResult<CatalogService> {
        self.table.insert(service.clone()).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CatalogService>> {
        Ok(self.table.get(id).await)
    }

    async fn update(&self, service: &CatalogService) -> AppResult<CatalogService> {
        self.table
            .update_with(service.id, |stored| {
                let is_active = stored.is_active;
                *stored = service.clone();
                stored.is_active = is_active;
                Ok(stored.clone())
            })
            .await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<CatalogService> {
        self.table
            .update_with(id, |stored| {
                stored.is_active = active;
                stored.updated_at = Utc::now();
                Ok(stored.clone())
            })
            .await
    }

    async fn list(
        &self,
        filter: &CatalogServiceFilter,
        pagination: Pagination,
    ) -> AppResult<(Vec<CatalogService>, i64)> {
        Ok(self
            .table
            .page(|s| filter.matches(s), |a, b| a.name.cmp(&b.name), pagination)
            .await)
    }
}
