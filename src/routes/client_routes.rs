use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::client_controller::ClientController;
use crate::dto::client_dto::{CreateClientRequest, ListClientsQuery, UpdateClientRequest};
use crate::dto::common_dto::{ApiResponse, Paginated};
use crate::models::client::Client;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_client_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/:id", get(get_client).put(update_client).delete(delete_client))
}

async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Client>>), AppError> {
    let controller = ClientController::new(&state);
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ListClientsQuery>,
) -> Result<Json<Paginated<Client>>, AppError> {
    let controller = ClientController::new(&state);
    let response = controller.list(query).await?;
    Ok(Json(response))
}

async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Client>>, AppError> {
    let controller = ClientController::new(&state);
    let client = controller.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(client)))
}

async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<ApiResponse<Client>>, AppError> {
    let controller = ClientController::new(&state);
    let response = controller.update(id, request).await?;
    Ok(Json(response))
}

async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Client>>, AppError> {
    let controller = ClientController::new(&state);
    let response = controller.delete(id).await?;
    Ok(Json(response))
}
