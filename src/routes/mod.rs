//! Rutas HTTP
//!
//! `/health` es público; todo lo que cuelga de `/api` pasa por el
//! middleware de autenticación JWT.

pub mod catalog_service_routes;
pub mod client_routes;
pub mod ledger_routes;
pub mod part_routes;
pub mod vehicle_routes;
pub mod work_order_routes;

use axum::{middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::{auth_middleware, cors_layer};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/clients", client_routes::create_client_router())
        .nest("/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/parts", part_routes::create_part_router())
        .nest("/services", catalog_service_routes::create_catalog_service_router())
        .nest("/work-orders", work_order_routes::create_work_order_router())
        .nest("/ledger", ledger_routes::create_ledger_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
