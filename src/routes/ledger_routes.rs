use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::ledger_controller::LedgerController;
use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::dto::ledger_dto::{
    CreateLedgerEntryRequest, ListLedgerQuery, SummaryQuery, UpdateLedgerEntryRequest,
};
use crate::models::ledger::{LedgerEntry, LedgerSummary};
use crate::models::user::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_ledger_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries).post(create_entry))
        .route("/summary", get(summary))
        .route("/:id", get(get_entry).put(update_entry).delete(delete_entry))
}

async fn create_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateLedgerEntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LedgerEntry>>), AppError> {
    let controller = LedgerController::new(&state);
    let response = controller.create(request, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListLedgerQuery>,
) -> Result<Json<Paginated<LedgerEntry>>, AppError> {
    let controller = LedgerController::new(&state);
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ApiResponse<LedgerSummary>>, AppError> {
    let controller = LedgerController::new(&state);
    let summary = controller.summarize(query).await?;
    Ok(Json(ApiResponse::success(summary)))
}

async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LedgerEntry>>, AppError> {
    let controller = LedgerController::new(&state);
    let entry = controller.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLedgerEntryRequest>,
) -> Result<Json<ApiResponse<LedgerEntry>>, AppError> {
    let controller = LedgerController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = LedgerController::new(&state);
    let response = controller.delete(id, &user).await?;
    Ok(Json(response))
}
