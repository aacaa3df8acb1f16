use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::{matches_search, search_term, Pagination};
use crate::models::vehicle::Vehicle;

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    pub client_id: Uuid,

    #[validate(length(min = 2, max = 100))]
    pub brand: String,

    #[validate(length(min = 2, max = 100))]
    pub model: String,

    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,

    #[validate(custom = "crate::utils::validation::validate_license_plate")]
    pub plate: Option<String>,

    pub vin: Option<String>,
    pub color: Option<String>,

    #[validate(range(min = 0))]
    pub mileage: Option<i32>,

    pub notes: Option<String>,
}

// Request para actualizar un vehículo
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 2, max = 100))]
    pub brand: Option<String>,

    #[validate(length(min = 2, max = 100))]
    pub model: Option<String>,

    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,

    #[validate(custom = "crate::utils::validation::validate_license_plate")]
    pub plate: Option<String>,

    pub vin: Option<String>,
    pub color: Option<String>,

    #[validate(range(min = 0))]
    pub mileage: Option<i32>,

    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

// Filtros para búsqueda de vehículos
#[derive(Debug, Default, Deserialize)]
pub struct ListVehiclesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub client_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl ListVehiclesQuery {
    pub fn into_parts(self, default_limit: i64) -> (VehicleFilter, Pagination) {
        (
            VehicleFilter {
                search: self.search,
                client_id: self.client_id,
                is_active: self.is_active,
            },
            Pagination::new(self.page, self.limit, default_limit),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub search: Option<String>,
    pub client_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl VehicleFilter {
    /// Búsqueda en brand, model, plate
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        let fields = [
            Some(vehicle.brand.as_str()),
            Some(vehicle.model.as_str()),
            vehicle.plate.as_deref(),
        ];
        matches_search(&fields, search_term(&self.search))
            && self.client_id.map_or(true, |id| vehicle.client_id == id)
            && self.is_active.map_or(true, |active| vehicle.is_active == active)
    }
}
