use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::dto::vehicle_dto::{CreateVehicleRequest, ListVehiclesQuery, UpdateVehicleRequest};
use crate::models::vehicle::Vehicle;
use crate::repositories::client_repository::ClientRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::state::AppState;
use crate::utils::errors::{conflict_error, not_found_error, AppResult};
use crate::utils::validation::{normalize_optional, normalize_plate};

pub struct VehicleController {
    repository: Arc<dyn VehicleRepository>,
    clients: Arc<dyn ClientRepository>,
    default_page_size: i64,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repos.vehicles.clone(),
            clients: state.repos.clients.clone(),
            default_page_size: state.config.default_page_size,
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<Vehicle> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    async fn ensure_plate_available(&self, plate: &str) -> AppResult<()> {
        if self.repository.plate_exists(plate).await? {
            return Err(conflict_error("Vehicle", "plate", plate));
        }
        Ok(())
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<ApiResponse<Vehicle>> {
        request.validate()?;

        if self.clients.find_by_id(request.client_id).await?.is_none() {
            return Err(not_found_error("Client", &request.client_id.to_string()));
        }

        let plate = normalize_optional(request.plate).map(|p| normalize_plate(&p));
        if let Some(plate) = &plate {
            self.ensure_plate_available(plate).await?;
        }

        let now = Utc::now();
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            client_id: request.client_id,
            brand: request.brand.trim().to_string(),
            model: request.model.trim().to_string(),
            year: request.year,
            plate,
            vin: normalize_optional(request.vin),
            color: normalize_optional(request.color),
            mileage: request.mileage,
            notes: normalize_optional(request.notes),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let vehicle = self.repository.create(&vehicle).await?;

        info!("✅ Vehículo creado: {} {} ({})", vehicle.brand, vehicle.model, vehicle.id);
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Vehicle> {
        self.find(id).await
    }

    pub async fn list(&self, query: ListVehiclesQuery) -> AppResult<Paginated<Vehicle>> {
        let (filter, pagination) = query.into_parts(self.default_page_size);
        let (vehicles, total) = self.repository.list(&filter, pagination).await?;
        Ok(Paginated::new(vehicles, pagination, total))
    }

    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> AppResult<ApiResponse<Vehicle>> {
        request.validate()?;
        let mut vehicle = self.find(id).await?;

        let plate = normalize_optional(request.plate)
            .map(|p| normalize_plate(&p))
            .filter(|p| vehicle.plate.as_ref() != Some(p));
        if let Some(plate) = &plate {
            self.ensure_plate_available(plate).await?;
        }

        if let Some(brand) = request.brand {
            vehicle.brand = brand.trim().to_string();
        }
        if let Some(model) = request.model {
            vehicle.model = model.trim().to_string();
        }
        if request.year.is_some() {
            vehicle.year = request.year;
        }
        if plate.is_some() {
            vehicle.plate = plate;
        }
        if request.vin.is_some() {
            vehicle.vin = normalize_optional(request.vin);
        }
        if request.color.is_some() {
            vehicle.color = normalize_optional(request.color);
        }
        if request.mileage.is_some() {
            vehicle.mileage = request.mileage;
        }
        if request.notes.is_some() {
            vehicle.notes = normalize_optional(request.notes);
        }
        vehicle.updated_at = Utc::now();

        let mut vehicle = self.repository.update(&vehicle).await?;
        if let Some(active) = request.is_active.filter(|a| *a != vehicle.is_active) {
            vehicle = self.repository.set_active(id, active).await?;
        }
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo actualizado exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.repository.set_active(id, false).await?;

        info!("🗑️ Vehículo desactivado: {}", vehicle.id);
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo desactivado exitosamente".to_string(),
        ))
    }
}
