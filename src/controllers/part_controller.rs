use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::dto::part_dto::{AdjustStockRequest, CreatePartRequest, ListPartsQuery, UpdatePartRequest};
use crate::models::part::{Part, StockMovement};
use crate::repositories::part_repository::PartRepository;
use crate::state::AppState;
use crate::utils::errors::{conflict_error, not_found_error, AppResult};
use crate::utils::validation::normalize_optional;

/// Máximo de piezas devueltas por low_stock
pub const LOW_STOCK_LIMIT: i64 = 20;

pub struct PartController {
    repository: Arc<dyn PartRepository>,
    default_page_size: i64,
}

impl PartController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repos.parts.clone(),
            default_page_size: state.config.default_page_size,
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<Part> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Part", &id.to_string()))
    }

    pub async fn create(&self, request: CreatePartRequest) -> AppResult<ApiResponse<Part>> {
        request.validate()?;

        let code = request.code.trim().to_string();
        if self.repository.code_exists(&code).await? {
            return Err(conflict_error("Part", "code", &code));
        }

        let now = Utc::now();
        let part = Part {
            id: Uuid::new_v4(),
            code,
            name: request.name.trim().to_string(),
            description: normalize_optional(request.description),
            brand: normalize_optional(request.brand),
            category: normalize_optional(request.category),
            price: request.price,
            cost: request.cost,
            stock: request.stock.unwrap_or(0),
            min_stock: request.min_stock.unwrap_or(0),
            max_stock: request.max_stock,
            location: normalize_optional(request.location),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let part = self.repository.create(&part).await?;

        info!("✅ Pieza creada: {} ({})", part.code, part.id);
        Ok(ApiResponse::success_with_message(
            part,
            "Pieza creada exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Part> {
        self.find(id).await
    }

    pub async fn list(&self, query: ListPartsQuery) -> AppResult<Paginated<Part>> {
        let (filter, pagination) = query.into_parts(self.default_page_size);
        let (parts, total) = self.repository.list(&filter, pagination).await?;
        Ok(Paginated::new(parts, pagination, total))
    }

    pub async fn update(&self, id: Uuid, request: UpdatePartRequest) -> AppResult<ApiResponse<Part>> {
        request.validate()?;
        let mut part = self.find(id).await?;

        if let Some(code) = request.code.map(|c| c.trim().to_string()) {
            if code != part.code {
                if self.repository.code_exists(&code).await? {
                    return Err(conflict_error("Part", "code", &code));
                }
                part.code = code;
            }
        }
        if let Some(name) = request.name {
            part.name = name.trim().to_string();
        }
        if request.description.is_some() {
            part.description = normalize_optional(request.description);
        }
        if request.brand.is_some() {
            part.brand = normalize_optional(request.brand);
        }
        if request.category.is_some() {
            part.category = normalize_optional(request.category);
        }
        if let Some(price) = request.price {
            part.price = price;
        }
        if request.cost.is_some() {
            part.cost = request.cost;
        }
        if let Some(min_stock) = request.min_stock {
            part.min_stock = min_stock;
        }
        if request.max_stock.is_some() {
            part.max_stock = request.max_stock;
        }
        if request.location.is_some() {
            part.location = normalize_optional(request.location);
        }
        part.updated_at = Utc::now();

        let mut part = self.repository.update(&part).await?;
        if let Some(active) = request.is_active.filter(|a| *a != part.is_active) {
            part = self.repository.set_active(id, active).await?;
        }
        Ok(ApiResponse::success_with_message(
            part,
            "Pieza actualizada exitosamente".to_string(),
        ))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<ApiResponse<Part>> {
        let part = self.repository.set_active(id, false).await?;

        info!("🗑️ Pieza desactivada: {}", part.id);
        Ok(ApiResponse::success_with_message(
            part,
            "Pieza desactivada exitosamente".to_string(),
        ))
    }

    /// in suma, out resta (sin bajar de cero), adjustment fija el valor
    pub async fn adjust_stock(&self, id: Uuid, request: AdjustStockRequest) -> AppResult<ApiResponse<Part>> {
        request.validate()?;

        let movement = StockMovement::new(
            id,
            request.movement_type,
            request.quantity,
            request.unit_price,
            normalize_optional(request.reason),
            normalize_optional(request.reference),
        );
        let part = self.repository.apply_stock_movement(&movement).await?;

        info!(
            "📦 Stock de {} ajustado ({:?} {}): ahora {}",
            part.code, movement.movement_type, movement.quantity, part.stock
        );
        if part.is_active && part.is_low_stock() {
            warn!("⚠️ Pieza {} con stock bajo: {} (mínimo {})", part.code, part.stock, part.min_stock);
        }

        Ok(ApiResponse::success_with_message(
            part,
            "Stock actualizado exitosamente".to_string(),
        ))
    }

    pub async fn movements(&self, id: Uuid) -> AppResult<Vec<StockMovement>> {
        self.find(id).await?;
        self.repository.movements(id).await
    }

    /// Piezas activas con stock <= mínimo, mayor déficit primero
    pub async fn low_stock(&self) -> AppResult<Vec<Part>> {
        self.repository.low_stock(LOW_STOCK_LIMIT).await
    }
}
