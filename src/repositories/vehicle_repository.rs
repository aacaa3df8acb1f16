use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::common_dto::{like_pattern, search_term, Pagination};
use crate::dto::vehicle_dto::VehicleFilter;
use crate::models::vehicle::Vehicle;
use crate::repositories::memory_table::{MemoryTable, Record};
use crate::utils::errors::{not_found_error, AppResult};

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    /// `plate` llega ya normalizada
    async fn plate_exists(&self, plate: &str) -> AppResult<bool>;
    /// Guarda la fila salvo is_active, que solo cambia vía set_active
    async fn update(&self, vehicle: &Vehicle) -> AppResult<Vehicle>;
    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Vehicle>;
    async fn list(&self, filter: &VehicleFilter, pagination: Pagination) -> AppResult<(Vec<Vehicle>, i64)>;
}

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &VehicleFilter) {
    qb.push(" WHERE TRUE");
    if let Some(search) = search_term(&filter.search) {
        let pattern = like_pattern(search);
        qb.push(" AND (brand ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR model ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR plate ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(client_id) = filter.client_id {
        qb.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let result = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (id, client_id, brand, model, year, plate, vin, color, mileage, notes, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(vehicle.client_id)
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.plate)
        .bind(&vehicle.vin)
        .bind(&vehicle.color)
        .bind(vehicle.mileage)
        .bind(&vehicle.notes)
        .bind(vehicle.is_active)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    async fn plate_exists(&self, plate: &str) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM vehicles WHERE plate = $1)")
            .bind(plate)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn update(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let result = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET brand = $2, model = $3, year = $4, plate = $5, vin = $6, color = $7,
                mileage = $8, notes = $9, updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.plate)
        .bind(&vehicle.vin)
        .bind(&vehicle.color)
        .bind(vehicle.mileage)
        .bind(&vehicle.notes)
        .bind(vehicle.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Vehicle> {
        sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    async fn list(&self, filter: &VehicleFilter, pagination: Pagination) -> AppResult<(Vec<Vehicle>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM vehicles");
        push_filters(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM vehicles");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let vehicles = query.build_query_as::<Vehicle>().fetch_all(&self.pool).await?;

        Ok((vehicles, total))
    }
}

impl Record for Vehicle {
    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        self.plate.iter().map(|p| ("plate", p.clone())).collect()
    }
}

pub struct InMemoryVehicleRepository {
    table: MemoryTable<Vehicle>,
}

impl InMemoryVehicleRepository {
    pub fn new() -> Self {
        Self {
            table: MemoryTable::new("Vehicle"),
        }
    }
}

impl Default for InMemoryVehicleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        self.table.insert(vehicle.clone()).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.table.get(id).await)
    }

    async fn plate_exists(&self, plate: &str) -> AppResult<bool> {
        Ok(self.table.any(|v| v.plate.as_deref() == Some(plate)).await)
    }

    async fn update(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        self.table
            .update_with(vehicle.id, |stored| {
                let is_active = stored.is_active;
                *stored = vehicle.clone();
                stored.is_active = is_active;
                Ok(stored.clone())
            })
            .await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<Vehicle> {
        self.table
            .update_with(id, |stored| {
                stored.is_active = active;
                stored.updated_at = Utc::now();
                Ok(stored.clone())
            })
            .await
    }

    async fn list(&self, filter: &VehicleFilter, pagination: Pagination) -> AppResult<(Vec<Vehicle>, i64)> {
        Ok(self
            .table
            .page(|v| filter.matches(v), |a, b| b.created_at.cmp(&a.created_at), pagination)
            .await)
    }
}
