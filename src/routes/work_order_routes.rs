use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::work_order_controller::WorkOrderController;
use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::dto::work_order_dto::{
    CreateWorkOrderRequest, ListWorkOrdersQuery, UpdateStatusRequest, UpdateWorkOrderItemRequest,
    UpdateWorkOrderRequest, WorkOrderItemRequest, WorkOrderStatistics,
};
use crate::models::user::AuthenticatedUser;
use crate::models::work_order::WorkOrder;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_work_order_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_work_orders).post(create_work_order))
        .route("/statistics", get(statistics))
        .route(
            "/:id",
            get(get_work_order).put(update_work_order).delete(delete_work_order),
        )
        .route("/:id/status", patch(update_status))
        .route("/:id/recalculate", post(recalculate_total))
        .route("/:id/items", post(add_item))
        .route("/:id/items/:item_id", put(update_item).delete(remove_item))
}

async fn create_work_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateWorkOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WorkOrder>>), AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.create(request, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_work_orders(
    State(state): State<AppState>,
    Query(query): Query<ListWorkOrdersQuery>,
) -> Result<Json<Paginated<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WorkOrderStatistics>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let stats = controller.statistics().await?;
    Ok(Json(ApiResponse::success(stats)))
}

async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let order = controller.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

async fn update_work_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWorkOrderRequest>,
) -> Result<Json<ApiResponse<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_work_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.delete(id, &user).await?;
    Ok(Json(response))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.update_status(id, request, &user).await?;
    Ok(Json(response))
}

async fn recalculate_total(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let order = controller.recalculate_total(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<WorkOrderItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WorkOrder>>), AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.add_item(id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateWorkOrderItemRequest>,
) -> Result<Json<ApiResponse<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.update_item(id, item_id, request).await?;
    Ok(Json(response))
}

async fn remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<WorkOrder>>, AppError> {
    let controller = WorkOrderController::new(&state);
    let response = controller.remove_item(id, item_id).await?;
    Ok(Json(response))
}
