use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::part_controller::PartController;
use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::dto::part_dto::{AdjustStockRequest, CreatePartRequest, ListPartsQuery, UpdatePartRequest};
use crate::models::part::{Part, StockMovement};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_part_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_parts).post(create_part))
        .route("/low-stock", get(low_stock))
        .route("/:id", get(get_part).put(update_part).delete(delete_part))
        .route("/:id/stock", post(adjust_stock))
        .route("/:id/movements", get(list_movements))
}

async fn create_part(
    State(state): State<AppState>,
    Json(request): Json<CreatePartRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Part>>), AppError> {
    let controller = PartController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_parts(
    State(state): State<AppState>,
    Query(query): Query<ListPartsQuery>,
) -> Result<Json<Paginated<Part>>, AppError> {
    let controller = PartController::new(&state);
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn low_stock(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Part>>>, AppError> {
    let controller = PartController::new(&state);
    let parts = controller.low_stock().await?;
    Ok(Json(ApiResponse::success(parts)))
}

async fn get_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Part>>, AppError> {
    let controller = PartController::new(&state);
    let part = controller.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(part)))
}

async fn update_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePartRequest>,
) -> Result<Json<ApiResponse<Part>>, AppError> {
    let controller = PartController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_part(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Part>>, AppError> {
    let controller = PartController::new(&state);
    let response = controller.delete(id).await?;
    Ok(Json(response))
}

async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<ApiResponse<Part>>, AppError> {
    let controller = PartController::new(&state);
    let response = controller.adjust_stock(id, request).await?;
    Ok(Json(response))
}

async fn list_movements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<StockMovement>>>, AppError> {
    let controller = PartController::new(&state);
    let movements = controller.movements(id).await?;
    Ok(Json(ApiResponse::success(movements)))
}
