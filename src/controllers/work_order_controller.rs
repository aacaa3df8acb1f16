//! Ciclo de vida de las órdenes de servicio
//!
//! Las transiciones de estado son permisivas: cualquier estado puede seguir a
//! cualquier otro. Lo que sí se garantiza es que los hitos (approved_at,
//! started_at, finished_at, delivered_at) se sellan una sola vez y que cada
//! cambio deja exactamente una fila en el historial.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::dto::work_order_dto::{
    CreateWorkOrderRequest, ListWorkOrdersQuery, UpdateStatusRequest, UpdateWorkOrderItemRequest,
    UpdateWorkOrderRequest, WorkOrderItemRequest, WorkOrderStatistics,
};
use crate::models::user::AuthenticatedUser;
use crate::models::work_order::{WorkOrder, WorkOrderItem, WorkOrderStatus};
use crate::repositories::catalog_service_repository::CatalogServiceRepository;
use crate::repositories::client_repository::ClientRepository;
use crate::repositories::part_repository::PartRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::repositories::work_order_repository::WorkOrderRepository;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};
use crate::utils::validation::normalize_optional;

pub struct WorkOrderController {
    repository: Arc<dyn WorkOrderRepository>,
    clients: Arc<dyn ClientRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    parts: Arc<dyn PartRepository>,
    services: Arc<dyn CatalogServiceRepository>,
    default_page_size: i64,
}

impl WorkOrderController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repos.work_orders.clone(),
            clients: state.repos.clients.clone(),
            vehicles: state.repos.vehicles.clone(),
            parts: state.repos.parts.clone(),
            services: state.repos.services.clone(),
            default_page_size: state.config.default_page_size,
        }
    }

    async fn ensure_vehicle(&self, vehicle_id: Option<Uuid>) -> AppResult<()> {
        if let Some(id) = vehicle_id {
            if self.vehicles.find_by_id(id).await?.is_none() {
                return Err(not_found_error("Vehicle", &id.to_string()));
            }
        }
        Ok(())
    }

    /// Valida el ítem y sus referencias al catálogo
    async fn build_item(&self, work_order_id: Uuid, request: WorkOrderItemRequest, position: i32) -> AppResult<WorkOrderItem> {
        request.validate()?;

        if let Some(service_id) = request.service_id {
            if self.services.find_by_id(service_id).await?.is_none() {
                return Err(not_found_error("Service", &service_id.to_string()));
            }
        }
        if let Some(part_id) = request.part_id {
            if self.parts.find_by_id(part_id).await?.is_none() {
                return Err(not_found_error("Part", &part_id.to_string()));
            }
        }

        Ok(WorkOrderItem::new(
            work_order_id,
            request.kind,
            request.description.trim().to_string(),
            request.quantity,
            request.unit_price,
            request.service_id,
            request.part_id,
            position,
        ))
    }

    pub async fn create(
        &self,
        request: CreateWorkOrderRequest,
        creator: &AuthenticatedUser,
    ) -> AppResult<ApiResponse<WorkOrder>> {
        request.validate()?;

        let (client, _) = futures::try_join!(
            self.clients.find_by_id(request.client_id),
            self.ensure_vehicle(request.vehicle_id)
        )?;
        if client.is_none() {
            return Err(not_found_error("Client", &request.client_id.to_string()));
        }

        let mut order = WorkOrder::new(
            request.client_id,
            request.vehicle_id,
            request.vehicle_description.trim().to_string(),
            request.assigned_to_id,
            creator.user_id,
            request.status.unwrap_or_default(),
            request.priority.unwrap_or_default(),
            normalize_optional(request.public_notes),
            normalize_optional(request.internal_notes),
            Utc::now(),
        );
        for (position, item) in request.items.into_iter().enumerate() {
            let item = self.build_item(order.id, item, position as i32).await?;
            order.items.push(item);
        }
        order.recalculate_totals();

        let order = self.repository.create(&order).await?;

        info!(
            "✅ Orden {} creada ({}, {} ítems, total {})",
            order.id,
            order.status.as_str(),
            order.items.len(),
            order.total
        );
        Ok(ApiResponse::success_with_message(
            order,
            "Orden de servicio creada exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<WorkOrder> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("WorkOrder", &id.to_string()))
    }

    pub async fn list(&self, query: ListWorkOrdersQuery) -> AppResult<Paginated<WorkOrder>> {
        let (filter, pagination) = query.into_parts(self.default_page_size);
        let (orders, total) = self.repository.list(&filter, pagination).await?;
        Ok(Paginated::new(orders, pagination, total))
    }

    /// Campos fuera del ciclo de estados; recalcula final_total
    pub async fn update(&self, id: Uuid, request: UpdateWorkOrderRequest) -> AppResult<ApiResponse<WorkOrder>> {
        request.validate()?;
        self.ensure_vehicle(request.vehicle_id).await?;

        let order = self.repository.update_details(id, &request).await?;
        Ok(ApiResponse::success_with_message(
            order,
            "Orden de servicio actualizada exitosamente".to_string(),
        ))
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        request: UpdateStatusRequest,
        changed_by: &AuthenticatedUser,
    ) -> AppResult<ApiResponse<WorkOrder>> {
        let order = self
            .repository
            .transition_status(
                id,
                request.status,
                changed_by.user_id,
                normalize_optional(request.reason),
                Utc::now(),
            )
            .await?;

        let previous = order
            .status_history
            .last()
            .and_then(|entry| entry.old_status);
        if let Some(previous) = previous.filter(|s| s.is_terminal() && *s != order.status) {
            warn!("⚠️ Orden {} reabierta desde {}", order.id, previous.as_str());
        }
        info!(
            "🔄 Orden {}: {} -> {}",
            order.id,
            previous.map(WorkOrderStatus::as_str).unwrap_or("-"),
            order.status.as_str()
        );

        Ok(ApiResponse::success_with_message(
            order,
            "Estado actualizado exitosamente".to_string(),
        ))
    }

    pub async fn add_item(&self, id: Uuid, request: WorkOrderItemRequest) -> AppResult<ApiResponse<WorkOrder>> {
        // La posición real la asigna el repositorio bajo el lock
        let item = self.build_item(id, request, 0).await?;
        let order = self.repository.add_item(id, item).await?;

        Ok(ApiResponse::success_with_message(
            order,
            "Ítem agregado exitosamente".to_string(),
        ))
    }

    pub async fn update_item(
        &self,
        id: Uuid,
        item_id: Uuid,
        request: UpdateWorkOrderItemRequest,
    ) -> AppResult<ApiResponse<WorkOrder>> {
        request.validate()?;
        let order = self.repository.update_item(id, item_id, &request).await?;

        Ok(ApiResponse::success_with_message(
            order,
            "Ítem actualizado exitosamente".to_string(),
        ))
    }

    pub async fn remove_item(&self, id: Uuid, item_id: Uuid) -> AppResult<ApiResponse<WorkOrder>> {
        let order = self.repository.remove_item(id, item_id).await?;

        Ok(ApiResponse::success_with_message(
            order,
            "Ítem eliminado exitosamente".to_string(),
        ))
    }

    pub async fn recalculate_total(&self, id: Uuid) -> AppResult<WorkOrder> {
        self.repository.recalculate_total(id).await
    }

    /// Borrado físico, solo admin o manager
    pub async fn delete(&self, id: Uuid, user: &AuthenticatedUser) -> AppResult<ApiResponse<()>> {
        user.require_admin()?;

        if !self.repository.delete(id).await? {
            return Err(not_found_error("WorkOrder", &id.to_string()));
        }

        info!("🗑️ Orden {} eliminada por {}", id, user.user_id);
        Ok(ApiResponse::message("Orden de servicio eliminada exitosamente".to_string()))
    }

    pub async fn statistics(&self) -> AppResult<WorkOrderStatistics> {
        let mut by_status: BTreeMap<WorkOrderStatus, i64> =
            WorkOrderStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for (status, count) in self.repository.count_by_status().await? {
            by_status.insert(status, count);
        }

        Ok(WorkOrderStatistics {
            total: by_status.values().sum(),
            by_status,
        })
    }
}
