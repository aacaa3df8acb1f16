use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::dto::ledger_dto::{
    CreateLedgerEntryRequest, LedgerFilter, ListLedgerQuery, SummaryQuery, UpdateLedgerEntryRequest,
};
use crate::models::ledger::{DateRange, LedgerEntry, LedgerSummary};
use crate::models::user::AuthenticatedUser;
use crate::repositories::ledger_repository::LedgerRepository;
use crate::repositories::work_order_repository::WorkOrderRepository;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::normalize_optional;

pub struct LedgerController {
    repository: Arc<dyn LedgerRepository>,
    work_orders: Arc<dyn WorkOrderRepository>,
    default_page_size: i64,
}

fn check_range(range: &DateRange) -> AppResult<()> {
    if range.is_inverted() {
        return Err(AppError::InvalidInput(
            "start_date must not be after end_date".to_string(),
        ));
    }
    Ok(())
}

impl LedgerController {
    pub fn new(state: &AppState) -> Self {
        Self {
            repository: state.repos.ledger.clone(),
            work_orders: state.repos.work_orders.clone(),
            default_page_size: state.config.default_page_size,
        }
    }

    async fn find(&self, id: Uuid) -> AppResult<LedgerEntry> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("LedgerEntry", &id.to_string()))
    }

    async fn ensure_work_order(&self, work_order_id: Option<Uuid>) -> AppResult<()> {
        if let Some(id) = work_order_id {
            if !self.work_orders.exists(id).await? {
                return Err(not_found_error("WorkOrder", &id.to_string()));
            }
        }
        Ok(())
    }

    /// Totales por (tipo, categoría) en el rango, ambos extremos incluidos
    pub async fn summarize(&self, query: SummaryQuery) -> AppResult<LedgerSummary> {
        let range = query.range();
        check_range(&range)?;

        let entries = self.repository.find_all(&LedgerFilter::for_range(range)).await?;
        let summary = LedgerSummary::from_entries(&entries);

        debug!(
            "📊 Resumen financiero: {} entradas, saldo {}",
            entries.len(),
            summary.balance
        );
        Ok(summary)
    }

    pub async fn create(
        &self,
        request: CreateLedgerEntryRequest,
        creator: &AuthenticatedUser,
    ) -> AppResult<ApiResponse<LedgerEntry>> {
        request.validate()?;
        self.ensure_work_order(request.work_order_id).await?;

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            entry_type: request.entry_type,
            amount: request.amount,
            description: request.description.trim().to_string(),
            category: normalize_optional(request.category),
            date: request.date,
            work_order_id: request.work_order_id,
            is_paid: request.is_paid,
            payment_method: request.payment_method,
            created_by_id: creator.user_id,
            created_at: Utc::now(),
        };
        let entry = self.repository.create(&entry).await?;

        info!(
            "✅ Lanzamiento {:?} de {} registrado ({})",
            entry.entry_type, entry.amount, entry.id
        );
        Ok(ApiResponse::success_with_message(
            entry,
            "Lanzamiento registrado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<LedgerEntry> {
        self.find(id).await
    }

    pub async fn list(&self, query: ListLedgerQuery) -> AppResult<Paginated<LedgerEntry>> {
        let (filter, pagination) = query.into_parts(self.default_page_size);
        check_range(&filter.range)?;

        let (entries, total) = self.repository.list(&filter, pagination).await?;
        Ok(Paginated::new(entries, pagination, total))
    }

    pub async fn update(&self, id: Uuid, request: UpdateLedgerEntryRequest) -> AppResult<ApiResponse<LedgerEntry>> {
        request.validate()?;
        let mut entry = self.find(id).await?;

        if request.work_order_id.is_some() && request.work_order_id != entry.work_order_id {
            self.ensure_work_order(request.work_order_id).await?;
            entry.work_order_id = request.work_order_id;
        }
        if let Some(entry_type) = request.entry_type {
            entry.entry_type = entry_type;
        }
        if let Some(amount) = request.amount {
            entry.amount = amount;
        }
        if let Some(description) = request.description {
            entry.description = description.trim().to_string();
        }
        if request.category.is_some() {
            entry.category = normalize_optional(request.category);
        }
        if let Some(date) = request.date {
            entry.date = date;
        }
        if let Some(paid) = request.is_paid {
            entry.is_paid = paid;
        }
        if request.payment_method.is_some() {
            entry.payment_method = request.payment_method;
        }

        let entry = self.repository.update(&entry).await?;
        Ok(ApiResponse::success_with_message(
            entry,
            "Lanzamiento actualizado exitosamente".to_string(),
        ))
    }

    /// Borrado físico, solo admin o manager
    pub async fn delete(&self, id: Uuid, user: &AuthenticatedUser) -> AppResult<ApiResponse<()>> {
        user.require_admin()?;

        if !self.repository.delete(id).await? {
            return Err(not_found_error("LedgerEntry", &id.to_string()));
        }

        info!("🗑️ Lanzamiento {} eliminado por {}", id, user.user_id);
        Ok(ApiResponse::message("Lanzamiento eliminado exitosamente".to_string()))
    }
}
