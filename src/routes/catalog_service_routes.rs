use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::catalog_service_controller::CatalogServiceController;
use crate::dto::catalog_service_dto::{
    CreateCatalogServiceRequest, ListCatalogServicesQuery, UpdateCatalogServiceRequest,
};
use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::models::catalog_service::CatalogService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_catalog_service_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route("/:id", get(get_service).put(update_service).delete(delete_service))
}

async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<CreateCatalogServiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CatalogService>>), AppError> {
    let controller = CatalogServiceController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ListCatalogServicesQuery>,
) -> Result<Json<Paginated<CatalogService>>, AppError> {
    let controller = CatalogServiceController::new(&state);
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CatalogService>>, AppError> {
    let controller = CatalogServiceController::new(&state);
    let service = controller.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(service)))
}

async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCatalogServiceRequest>,
) -> Result<Json<ApiResponse<CatalogService>>, AppError> {
    let controller = CatalogServiceController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CatalogService>>, AppError> {
    let controller = CatalogServiceController::new(&state);
    let response = controller.delete(id).await?;
    Ok(Json(response))
}
