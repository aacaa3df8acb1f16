//! Repositorios
//!
//! Cada entidad expone un trait de repositorio con dos implementaciones:
//! PostgreSQL (sqlx) y en memoria. El router solo ve `Arc<dyn ...>`.

pub mod catalog_service_repository;
pub mod client_repository;
pub mod ledger_repository;
pub mod memory_table;
pub mod part_repository;
pub mod vehicle_repository;
pub mod work_order_repository;

use sqlx::PgPool;
use std::sync::Arc;

use catalog_service_repository::{
    CatalogServiceRepository, InMemoryCatalogServiceRepository, PgCatalogServiceRepository,
};
use client_repository::{ClientRepository, InMemoryClientRepository, PgClientRepository};
use ledger_repository::{InMemoryLedgerRepository, LedgerRepository, PgLedgerRepository};
use part_repository::{InMemoryPartRepository, PartRepository, PgPartRepository};
use vehicle_repository::{InMemoryVehicleRepository, PgVehicleRepository, VehicleRepository};
use work_order_repository::{InMemoryWorkOrderRepository, PgWorkOrderRepository, WorkOrderRepository};

#[derive(Clone)]
pub struct Repositories {
    pub clients: Arc<dyn ClientRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub parts: Arc<dyn PartRepository>,
    pub services: Arc<dyn CatalogServiceRepository>,
    pub work_orders: Arc<dyn WorkOrderRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            clients: Arc::new(PgClientRepository::new(pool.clone())),
            vehicles: Arc::new(PgVehicleRepository::new(pool.clone())),
            parts: Arc::new(PgPartRepository::new(pool.clone())),
            services: Arc::new(PgCatalogServiceRepository::new(pool.clone())),
            work_orders: Arc::new(PgWorkOrderRepository::new(pool.clone())),
            ledger: Arc::new(PgLedgerRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            clients: Arc::new(InMemoryClientRepository::new()),
            vehicles: Arc::new(InMemoryVehicleRepository::new()),
            parts: Arc::new(InMemoryPartRepository::new()),
            services: Arc::new(InMemoryCatalogServiceRepository::new()),
            work_orders: Arc::new(InMemoryWorkOrderRepository::new()),
            ledger: Arc::new(InMemoryLedgerRepository::new()),
        }
    }
}
