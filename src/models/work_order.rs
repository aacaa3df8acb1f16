//! Modelo de WorkOrder (ordem de serviço)
//!
//! Contiene la orden, sus ítems y el historial de estados, más las reglas
//! puras del ciclo de vida: sellado de hitos y recálculo de totales.
//! Los repositorios aplican estas reglas dentro de una transacción o bajo
//! un único lock de escritura.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::validation::MONEY_SCALE;

/// Estado de la orden - mapea al ENUM work_order_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[sqlx(type_name = "work_order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Estimate,
    Approved,
    InProgress,
    Completed,
    Delivered,
    Cancelled,
}

impl Default for WorkOrderStatus {
    fn default() -> Self {
        WorkOrderStatus::Estimate
    }
}

impl WorkOrderStatus {
    pub const ALL: [WorkOrderStatus; 6] = [
        WorkOrderStatus::Estimate,
        WorkOrderStatus::Approved,
        WorkOrderStatus::InProgress,
        WorkOrderStatus::Completed,
        WorkOrderStatus::Delivered,
        WorkOrderStatus::Cancelled,
    ];

    /// Columna del hito sellado al entrar en este estado
    pub fn milestone_column(self) -> Option<&'static str> {
        match self {
            WorkOrderStatus::Approved => Some("approved_at"),
            WorkOrderStatus::InProgress => Some("started_at"),
            WorkOrderStatus::Completed => Some("finished_at"),
            WorkOrderStatus::Delivered => Some("delivered_at"),
            WorkOrderStatus::Estimate | WorkOrderStatus::Cancelled => None,
        }
    }

    /// Informativo: las transiciones no se restringen
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkOrderStatus::Delivered | WorkOrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkOrderStatus::Estimate => "estimate",
            WorkOrderStatus::Approved => "approved",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Delivered => "delivered",
            WorkOrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Prioridad - mapea al ENUM work_order_priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "work_order_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for WorkOrderPriority {
    fn default() -> Self {
        WorkOrderPriority::Normal
    }
}

/// Tipo de ítem - mapea al ENUM work_order_item_kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "work_order_item_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Service,
    Part,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct WorkOrderItem {
    pub id: Uuid,
    pub work_order_id: Uuid,
    pub kind: ItemKind,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Cache de quantity * unit_price
    pub subtotal: Decimal,
    pub service_id: Option<Uuid>,
    pub part_id: Option<Uuid>,
    pub position: i32,
}

impl WorkOrderItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        work_order_id: Uuid,
        kind: ItemKind,
        description: String,
        quantity: Decimal,
        unit_price: Decimal,
        service_id: Option<Uuid>,
        part_id: Option<Uuid>,
        position: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            work_order_id,
            kind,
            description,
            quantity,
            unit_price,
            subtotal: round_money(quantity * unit_price),
            service_id,
            part_id,
            position,
        }
    }

    pub fn refresh_subtotal(&mut self) {
        self.subtotal = round_money(self.quantity * self.unit_price);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub work_order_id: Uuid,
    /// None en la fila de creación
    pub old_status: Option<WorkOrderStatus>,
    pub new_status: WorkOrderStatus,
    pub changed_by: Uuid,
    pub changed_at: DateTime<Utc>,
    pub reason: Option<String>,
}

impl StatusHistoryEntry {
    pub fn new(
        work_order_id: Uuid,
        old_status: Option<WorkOrderStatus>,
        new_status: WorkOrderStatus,
        changed_by: Uuid,
        reason: Option<String>,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            work_order_id,
            old_status,
            new_status,
            changed_by,
            changed_at,
            reason,
        }
    }
}

/// WorkOrder principal - mapea a la tabla work_orders
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkOrder {
    pub id: Uuid,
    pub client_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub vehicle_description: String,
    pub assigned_to_id: Option<Uuid>,
    pub created_by_id: Uuid,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    pub public_notes: Option<String>,
    pub internal_notes: Option<String>,
    pub total: Decimal,
    pub discount_percent: Option<Decimal>,
    pub discount_value: Option<Decimal>,
    pub final_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub items: Vec<WorkOrderItem>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_history: Vec<StatusHistoryEntry>,
}

/// Total final tras descuentos, nunca negativo
/// Redondeo a centavos igual al de una columna NUMERIC(_, 2)
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn compute_final_total(
    total: Decimal,
    discount_percent: Option<Decimal>,
    discount_value: Option<Decimal>,
) -> Decimal {
    let by_percent = discount_percent
        .map(|p| total * p / Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO);
    let discounted = total - by_percent - discount_value.unwrap_or(Decimal::ZERO);
    round_money(discounted.max(Decimal::ZERO))
}

pub fn sum_subtotals<'a>(items: impl IntoIterator<Item = &'a WorkOrderItem>) -> Decimal {
    items.into_iter().map(|item| item.subtotal).sum()
}

impl WorkOrder {
    /// Orden nueva con su fila de historial inicial. Si el estado inicial es
    /// un hito, se sella en el acto.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_id: Uuid,
        vehicle_id: Option<Uuid>,
        vehicle_description: String,
        assigned_to_id: Option<Uuid>,
        created_by_id: Uuid,
        status: WorkOrderStatus,
        priority: WorkOrderPriority,
        public_notes: Option<String>,
        internal_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let id = Uuid::new_v4();
        let mut order = Self {
            id,
            client_id,
            vehicle_id,
            vehicle_description,
            assigned_to_id,
            created_by_id,
            status,
            priority,
            public_notes,
            internal_notes,
            total: Decimal::ZERO,
            discount_percent: None,
            discount_value: None,
            final_total: Decimal::ZERO,
            created_at: now,
            approved_at: None,
            started_at: None,
            finished_at: None,
            delivered_at: None,
            items: Vec::new(),
            status_history: vec![StatusHistoryEntry::new(
                id,
                None,
                status,
                created_by_id,
                None,
                now,
            )],
        };
        order.stamp_milestone(status, now);
        order
    }

    fn milestone_slot(&mut self, status: WorkOrderStatus) -> Option<&mut Option<DateTime<Utc>>> {
        match status {
            WorkOrderStatus::Approved => Some(&mut self.approved_at),
            WorkOrderStatus::InProgress => Some(&mut self.started_at),
            WorkOrderStatus::Completed => Some(&mut self.finished_at),
            WorkOrderStatus::Delivered => Some(&mut self.delivered_at),
            WorkOrderStatus::Estimate | WorkOrderStatus::Cancelled => None,
        }
    }

    /// Sella el hito de `status` solo si aún no está puesto.
    /// Devuelve true si se selló ahora.
    pub fn stamp_milestone(&mut self, status: WorkOrderStatus, at: DateTime<Utc>) -> bool {
        match self.milestone_slot(status) {
            Some(slot) if slot.is_none() => {
                *slot = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Cambio de estado: sella el hito y agrega exactamente una fila al historial.
    /// No toca ningún otro campo.
    pub fn transition(
        &mut self,
        new_status: WorkOrderStatus,
        changed_by: Uuid,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> StatusHistoryEntry {
        let entry = StatusHistoryEntry::new(self.id, Some(self.status), new_status, changed_by, reason, at);
        self.status = new_status;
        self.stamp_milestone(new_status, at);
        self.status_history.push(entry.clone());
        entry
    }

    pub fn recalculate_totals(&mut self) {
        self.total = sum_subtotals(&self.items);
        self.final_total = compute_final_total(self.total, self.discount_percent, self.discount_value);
    }

    pub fn next_item_position(&self) -> i32 {
        self.items.iter().map(|i| i.position + 1).max().unwrap_or(0)
    }

    pub fn find_item(&self, item_id: Uuid) -> Option<&WorkOrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn order(status: WorkOrderStatus) -> WorkOrder {
        WorkOrder::new(
            Uuid::new_v4(),
            None,
            "Fiat Uno 2010 prata".to_string(),
            None,
            Uuid::new_v4(),
            status,
            WorkOrderPriority::Normal,
            None,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_new_order_has_initial_history_row() {
        let o = order(WorkOrderStatus::Estimate);
        assert_eq!(o.status_history.len(), 1);
        assert_eq!(o.status_history[0].old_status, None);
        assert_eq!(o.status_history[0].new_status, WorkOrderStatus::Estimate);
        assert!(o.approved_at.is_none());
    }

    #[test]
    fn test_initial_milestone_status_is_stamped() {
        let o = order(WorkOrderStatus::Approved);
        assert_eq!(o.approved_at, Some(o.created_at));
    }

    #[test]
    fn test_milestone_is_never_overwritten() {
        let mut o = order(WorkOrderStatus::Estimate);
        let t1 = Utc::now();
        let by = Uuid::new_v4();
        o.transition(WorkOrderStatus::Approved, by, None, t1);
        o.transition(WorkOrderStatus::Estimate, by, None, t1 + Duration::seconds(5));
        o.transition(WorkOrderStatus::Approved, by, None, t1 + Duration::seconds(10));
        assert_eq!(o.approved_at, Some(t1));
        assert_eq!(o.status_history.len(), 4);
    }

    #[test]
    fn test_cancelled_and_estimate_have_no_milestone() {
        assert_eq!(WorkOrderStatus::Cancelled.milestone_column(), None);
        assert_eq!(WorkOrderStatus::Estimate.milestone_column(), None);
        assert_eq!(WorkOrderStatus::Completed.milestone_column(), Some("finished_at"));
    }

    #[test]
    fn test_recalculate_totals() {
        let mut o = order(WorkOrderStatus::Estimate);
        o.items.push(WorkOrderItem::new(o.id, ItemKind::Part, "Filtro".into(), dec!(2), dec!(50), None, None, 0));
        o.items.push(WorkOrderItem::new(o.id, ItemKind::Service, "Troca".into(), dec!(1), dec!(100), None, None, 1));
        o.recalculate_totals();
        assert_eq!(o.total, dec!(200));
        assert_eq!(o.final_total, dec!(200));
        assert_eq!(o.next_item_position(), 2);
    }

    #[test]
    fn test_final_total_with_discounts() {
        assert_eq!(compute_final_total(dec!(200), Some(dec!(10)), None), dec!(180));
        assert_eq!(compute_final_total(dec!(200), Some(dec!(10)), Some(dec!(30))), dec!(150));
        assert_eq!(compute_final_total(dec!(50), None, Some(dec!(80))), dec!(0));
        assert_eq!(compute_final_total(dec!(50), None, None), dec!(50));
    }

    #[test]
    fn test_subtotals_are_rounded_to_cents() {
        let mut o = order(WorkOrderStatus::Estimate);
        for position in 0..3 {
            o.items.push(WorkOrderItem::new(o.id, ItemKind::Part, "Arruela".into(), dec!(1.5), dec!(0.33), None, None, position));
        }
        o.recalculate_totals();

        assert_eq!(o.items[0].subtotal, dec!(0.50));
        assert_eq!(o.total, dec!(1.50));
        assert_eq!(o.total, sum_subtotals(&o.items));
        assert_eq!(compute_final_total(dec!(10.01), Some(dec!(12.5)), None), dec!(8.76));
    }
}
