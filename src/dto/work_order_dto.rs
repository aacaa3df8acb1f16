use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::Pagination;
use crate::models::work_order::{ItemKind, WorkOrder, WorkOrderItem, WorkOrderPriority, WorkOrderStatus};

// Ítem de la orden (servicio o pieza)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkOrderItemRequest {
    #[serde(alias = "type")]
    pub kind: ItemKind,

    #[validate(custom = "crate::utils::validation::validate_not_empty")]
    pub description: String,

    #[validate(custom = "crate::utils::validation::validate_quantity")]
    pub quantity: Decimal,

    #[validate(custom = "crate::utils::validation::validate_non_negative_decimal")]
    pub unit_price: Decimal,

    pub service_id: Option<Uuid>,
    pub part_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWorkOrderItemRequest {
    #[validate(custom = "crate::utils::validation::validate_not_empty")]
    pub description: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_quantity")]
    pub quantity: Option<Decimal>,

    #[validate(custom = "crate::utils::validation::validate_non_negative_decimal")]
    pub unit_price: Option<Decimal>,
}

impl UpdateWorkOrderItemRequest {
    pub fn apply_to(&self, item: &mut WorkOrderItem) {
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(unit_price) = self.unit_price {
            item.unit_price = unit_price;
        }
        item.refresh_subtotal();
    }
}

// Request para crear una orden de servicio
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkOrderRequest {
    pub client_id: Uuid,
    pub vehicle_id: Option<Uuid>,

    #[validate(
        custom = "crate::utils::validation::validate_not_empty",
        length(max = 255)
    )]
    pub vehicle_description: String,

    pub assigned_to_id: Option<Uuid>,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<WorkOrderPriority>,
    pub public_notes: Option<String>,
    pub internal_notes: Option<String>,

    #[serde(default)]
    pub items: Vec<WorkOrderItemRequest>,
}

// Campos editables fuera del ciclo de estados
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWorkOrderRequest {
    pub vehicle_id: Option<Uuid>,

    #[validate(
        custom = "crate::utils::validation::validate_not_empty",
        length(max = 255)
    )]
    pub vehicle_description: Option<String>,

    pub assigned_to_id: Option<Uuid>,
    pub priority: Option<WorkOrderPriority>,
    pub public_notes: Option<String>,
    pub internal_notes: Option<String>,

    #[validate(custom = "crate::utils::validation::validate_percent")]
    pub discount_percent: Option<Decimal>,

    #[validate(custom = "crate::utils::validation::validate_non_negative_decimal")]
    pub discount_value: Option<Decimal>,
}

impl UpdateWorkOrderRequest {
    /// Copia los campos presentes y recalcula totales
    pub fn apply_to(&self, order: &mut WorkOrder) {
        if self.vehicle_id.is_some() {
            order.vehicle_id = self.vehicle_id;
        }
        if let Some(description) = &self.vehicle_description {
            order.vehicle_description = description.clone();
        }
        if self.assigned_to_id.is_some() {
            order.assigned_to_id = self.assigned_to_id;
        }
        if let Some(priority) = self.priority {
            order.priority = priority;
        }
        if self.public_notes.is_some() {
            order.public_notes = self.public_notes.clone();
        }
        if self.internal_notes.is_some() {
            order.internal_notes = self.internal_notes.clone();
        }
        if self.discount_percent.is_some() {
            order.discount_percent = self.discount_percent;
        }
        if self.discount_value.is_some() {
            order.discount_value = self.discount_value;
        }
        order.recalculate_totals();
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: WorkOrderStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListWorkOrdersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<WorkOrderStatus>,
    pub client_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub priority: Option<WorkOrderPriority>,
}

impl ListWorkOrdersQuery {
    pub fn into_parts(self, default_limit: i64) -> (WorkOrderFilter, Pagination) {
        (
            WorkOrderFilter {
                status: self.status,
                client_id: self.client_id,
                assigned_to_id: self.assigned_to_id,
                priority: self.priority,
            },
            Pagination::new(self.page, self.limit, default_limit),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub client_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub priority: Option<WorkOrderPriority>,
}

impl WorkOrderFilter {
    pub fn matches(&self, order: &WorkOrder) -> bool {
        self.status.map_or(true, |s| order.status == s)
            && self.client_id.map_or(true, |id| order.client_id == id)
            && self.assigned_to_id.map_or(true, |id| order.assigned_to_id == Some(id))
            && self.priority.map_or(true, |p| order.priority == p)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkOrderStatistics {
    pub total: i64,
    pub by_status: BTreeMap<WorkOrderStatus, i64>,
}
