use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::catalog_service_dto::{
    CreateCatalogServiceRequest, ListCatalogServicesQuery, UpdateCatalogServiceRequest,
};
use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::models::catalog_service::CatalogService;
use crate::repositories::catalog_service_repository::CatalogServiceRepository;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};
use crate::utils::validation::normalize_optional;

pub struct CatalogServiceController {
    repository: Arc<dyn CatalogServiceRepository>,
    default_page_size: i64,
}

impl CatalogServiceController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repos.services.clone(),
            default_page_size: state.config.default_page_size,
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<CatalogService> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Service", &id.to_string()))
    }

    pub async fn create(&self, request: CreateCatalogServiceRequest) -> AppResult<ApiResponse<CatalogService>> {
        request.validate()?;

        let now = Utc::now();
        let service = CatalogService {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: normalize_optional(request.description),
            category: normalize_optional(request.category),
            price: request.price,
            estimated_minutes: request.estimated_minutes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let service = self.repository.create(&service).await?;

        info!("✅ Servicio creado: {} ({})", service.name, service.id);
        Ok(ApiResponse::success_with_message(
            service,
            "Servicio creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<CatalogService> {
        self.find(id).await
    }

    pub async fn list(&self, query: ListCatalogServicesQuery) -> AppResult<Paginated<CatalogService>> {
        let (filter, pagination) = query.into_parts(self.default_page_size);
        let (services, total) = self.repository.list(&filter, pagination).await?;
        Ok(Paginated::new(services, pagination, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCatalogServiceRequest,
    ) -> AppResult<ApiResponse<CatalogService>> {
        request.validate()?;
        let mut service = self.find(id).await?;

        if let Some(name) = request.name {
            service.name = name.trim().to_string();
        }
        if request.description.is_some() {
            service.description = normalize_optional(request.description);
        }
        if request.category.is_some() {
            service.category = normalize_optional(request.category);
        }
        if let Some(price) = request.price {
            service.price = price;
        }
        if request.estimated_minutes.is_some() {
            service.estimated_minutes = request.estimated_minutes;
        }
        service.updated_at = Utc::now();

        let mut service = self.repository.update(&service).await?;
        if let Some(active) = request.is_active.filter(|a| *a != service.is_active) {
            service = self.repository.set_active(id, active).await?;
        }
        Ok(ApiResponse::success_with_message(
            service,
            "Servicio actualizado exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<ApiResponse<CatalogService>> {
        let service = self.repository.set_active(id, false).await?;

        info!("🗑️ Servicio desactivado: {}", service.id);
        Ok(ApiResponse::success_with_message(
            service,
            "Servicio desactivado exitosamente".to_string(),
        ))
    }
}
