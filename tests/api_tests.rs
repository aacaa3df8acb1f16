use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use workshop_erp::config::environment::EnvironmentConfig;
use workshop_erp::models::user::UserRole;
use workshop_erp::repositories::Repositories;
use workshop_erp::routes::create_router;
use workshop_erp::state::AppState;
use workshop_erp::utils::jwt::generate_token;

struct TestApp {
    router: Router,
    secret: String,
}

impl TestApp {
    fn new() -> Self {
        let config = EnvironmentConfig::default();
        let secret = config.jwt_secret.clone();
        let router = create_router(AppState::new(config, Repositories::in_memory()));
        Self { router, secret }
    }

    fn token(&self, role: UserRole) -> String {
        generate_token(Uuid::new_v4(), role, &self.secret, chrono::Duration::hours(1)).unwrap()
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = self.token(UserRole::Admin);
        self.send(method, uri, Some(&token), body).await
    }

    async fn create_client(&self, name: &str, cpf: Option<&str>) -> Value {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/clients",
                Some(json!({ "name": name, "phone": "11987654321", "cpf": cpf })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    async fn create_part(&self, code: &str, stock: i32, min_stock: i32) -> Value {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/parts",
                Some(json!({
                    "code": code,
                    "name": format!("Peça {}", code),
                    "price": 50.0,
                    "stock": stock,
                    "min_stock": min_stock
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "workshop_erp");
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/api/clients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .send(Method::GET, "/api/clients", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_cpf_is_conflict() {
    let app = TestApp::new();
    app.create_client("Maria Silva", Some("11122233344")).await;

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/clients",
            Some(json!({ "name": "João Souza", "phone": "11912345678", "cpf": "11122233344" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_invalid_client_payload_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/clients",
            Some(json!({ "name": "Ana", "phone": "123" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_soft_delete_keeps_client() {
    let app = TestApp::new();
    let client = app.create_client("Carlos Lima", None).await;
    let uri = format!("/api/clients/{}", id_of(&client));

    let (status, body) = app.admin(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, body) = app.admin(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (_, body) = app
        .admin(Method::GET, "/api/clients?is_active=true", None)
        .await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_client_pagination() {
    let app = TestApp::new();
    for i in 0..5 {
        app.create_client(&format!("Cliente {}", i), None).await;
    }

    let (status, body) = app
        .admin(Method::GET, "/api/clients?page=2&limit=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["pagination"]["page"], 2);
}

#[tokio::test]
async fn test_vehicle_requires_existing_client_and_unique_plate() {
    let app = TestApp::new();

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/vehicles",
            Some(json!({ "client_id": Uuid::new_v4(), "brand": "Fiat", "model": "Uno" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let client = app.create_client("Paula Reis", None).await;
    let payload = json!({ "client_id": id_of(&client), "brand": "Fiat", "model": "Uno", "plate": "abc-1d23" });
    let (status, body) = app.admin(Method::POST, "/api/vehicles", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, _) = app.admin(Method::POST, "/api/vehicles", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_stock_out_beyond_available_is_rejected() {
    let app = TestApp::new();
    let part = app.create_part("FLT-01", 3, 2).await;
    let uri = format!("/api/parts/{}/stock", id_of(&part));

    let (status, body) = app
        .admin(Method::POST, &uri, Some(json!({ "movement_type": "out", "quantity": 5 })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let (_, body) = app
        .admin(Method::GET, &format!("/api/parts/{}", id_of(&part)), None)
        .await;
    assert_eq!(body["data"]["stock"], 3);

    let (status, body) = app
        .admin(Method::POST, &uri, Some(json!({ "movement_type": "out", "quantity": 2 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock"], 1);

    let (_, body) = app.admin(Method::GET, "/api/parts/low-stock", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/parts/{}/movements", id_of(&part)), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_work_order_total_follows_items() {
    let app = TestApp::new();
    let client = app.create_client("Roberto Alves", None).await;
    let part = app.create_part("PAS-02", 10, 1).await;

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/work-orders",
            Some(json!({
                "client_id": id_of(&client),
                "vehicle_description": "Gol 2015 prata",
                "items": [
                    { "kind": "service", "description": "Troca de pastilhas", "quantity": 1, "unit_price": 100.0 },
                    { "kind": "part", "description": "Pastilha", "quantity": 2, "unit_price": 50.0, "part_id": id_of(&part) }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let order = body["data"].clone();
    assert_eq!(order["total"].as_f64(), Some(200.0));
    assert_eq!(order["final_total"].as_f64(), Some(200.0));

    let part_item = order["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["kind"] == "part")
        .unwrap()
        .clone();
    let (status, body) = app
        .admin(
            Method::DELETE,
            &format!("/api/work-orders/{}/items/{}", id_of(&order), id_of(&part_item)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"].as_f64(), Some(100.0));
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/work-orders/{}", id_of(&order)),
            Some(json!({ "discount_percent": 10.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["final_total"].as_f64(), Some(90.0));
}

#[tokio::test]
async fn test_status_transitions_keep_first_milestone() {
    let app = TestApp::new();
    let client = app.create_client("Fernanda Dias", None).await;

    let (_, body) = app
        .admin(
            Method::POST,
            "/api/work-orders",
            Some(json!({ "client_id": id_of(&client), "vehicle_description": "Onix 2020" })),
        )
        .await;
    let order_id = id_of(&body["data"]);
    assert_eq!(body["data"]["status"], "estimate");
    let status_uri = format!("/api/work-orders/{}/status", order_id);

    let (status, body) = app
        .admin(Method::PATCH, &status_uri, Some(json!({ "status": "approved" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let approved_at = body["data"]["approved_at"].clone();
    assert!(approved_at.is_string());

    app.admin(Method::PATCH, &status_uri, Some(json!({ "status": "estimate" })))
        .await;
    let (_, body) = app
        .admin(Method::PATCH, &status_uri, Some(json!({ "status": "approved", "reason": "cliente confirmou" })))
        .await;

    assert_eq!(body["data"]["approved_at"], approved_at);
    assert_eq!(body["data"]["status_history"].as_array().unwrap().len(), 4);

    let (_, body) = app.admin(Method::GET, "/api/work-orders/statistics", None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["by_status"]["approved"], 1);
    assert_eq!(body["data"]["by_status"]["delivered"], 0);
}

#[tokio::test]
async fn test_mechanic_cannot_delete_work_order() {
    let app = TestApp::new();
    let client = app.create_client("Lucas Prado", None).await;
    let (_, body) = app
        .admin(
            Method::POST,
            "/api/work-orders",
            Some(json!({ "client_id": id_of(&client), "vehicle_description": "HB20" })),
        )
        .await;
    let uri = format!("/api/work-orders/{}", id_of(&body["data"]));

    let mechanic = app.token(UserRole::Mechanic);
    let (status, body) = app.send(Method::DELETE, &uri, Some(&mechanic), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app.admin(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.admin(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ledger_summary_groups_by_category() {
    let app = TestApp::new();
    let entries = [
        json!({ "entry_type": "income", "amount": 100.0, "description": "Serviço", "category": "servicos", "date": "2026-03-01" }),
        json!({ "entry_type": "income", "amount": 25.0, "description": "Avulso", "date": "2026-03-02" }),
        json!({ "entry_type": "expense", "amount": 40.0, "description": "Aluguel", "category": "aluguel", "date": "2026-03-03" }),
        json!({ "entry_type": "expense", "amount": 999.0, "description": "Fora do período", "date": "2026-04-10" }),
    ];
    for entry in entries {
        let (status, body) = app.admin(Method::POST, "/api/ledger", Some(entry)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (status, body) = app
        .admin(
            Method::GET,
            "/api/ledger/summary?start_date=2026-03-01&end_date=2026-03-31",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"];
    assert_eq!(summary["total_income"].as_f64(), Some(125.0));
    assert_eq!(summary["total_expense"].as_f64(), Some(40.0));
    assert_eq!(summary["balance"].as_f64(), Some(85.0));
    assert!(summary["by_category"]
        .as_array()
        .unwrap()
        .iter()
        .any(|group| group["category"] == "uncategorized" && group["amount"].as_f64() == Some(25.0)));

    let (status, _) = app
        .admin(
            Method::GET,
            "/api/ledger/summary?start_date=2026-03-31&end_date=2026-03-01",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_soft_deleted_client_still_blocks_cpf_and_email() {
    let app = TestApp::new();
    let (_, body) = app
        .admin(
            Method::POST,
            "/api/clients",
            Some(json!({ "name": "Helena Costa", "phone": "11987654321", "cpf": "11122233344", "email": "helena@oficina.com" })),
        )
        .await;
    let uri = format!("/api/clients/{}", id_of(&body["data"]));
    app.admin(Method::DELETE, &uri, None).await;

    for payload in [
        json!({ "name": "Outra Pessoa", "phone": "11912345678", "cpf": "11122233344" }),
        json!({ "name": "Outra Pessoa", "phone": "11912345678", "email": "helena@oficina.com" }),
    ] {
        let (status, body) = app.admin(Method::POST, "/api/clients", Some(payload)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }
}

#[tokio::test]
async fn test_update_with_own_unique_values_succeeds() {
    let app = TestApp::new();
    let client = app.create_client("Marcos Teixeira", Some("55566677788")).await;
    let uri = format!("/api/clients/{}", id_of(&client));

    let (status, body) = app
        .admin(Method::PUT, &uri, Some(json!({ "cpf": "55566677788", "name": "Marcos T. Teixeira" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "Marcos T. Teixeira");

    let other = app.create_client("Bianca Rocha", Some("99988877766")).await;
    let (status, _) = app
        .admin(
            Method::PUT,
            &format!("/api/clients/{}", id_of(&other)),
            Some(json!({ "cpf": "55566677788" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_does_not_revive_soft_deleted_client() {
    let app = TestApp::new();
    let client = app.create_client("Sergio Nunes", None).await;
    let uri = format!("/api/clients/{}", id_of(&client));
    app.admin(Method::DELETE, &uri, None).await;

    let (status, body) = app
        .admin(Method::PUT, &uri, Some(json!({ "notes": "ligar antes" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (_, body) = app
        .admin(Method::PUT, &uri, Some(json!({ "is_active": true })))
        .await;
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
async fn test_invalid_items_are_rejected() {
    let app = TestApp::new();
    let client = app.create_client("Tiago Mendes", None).await;

    let bad_items = [
        json!({ "kind": "service", "description": "Alinhamento", "quantity": 0, "unit_price": 80.0 }),
        json!({ "kind": "part", "description": "Pneu", "quantity": 1, "unit_price": -5.0 }),
        json!({ "kind": "part", "description": "Parafuso", "quantity": 1, "unit_price": 0.005 }),
    ];
    for bad in &bad_items {
        let (status, body) = app
            .admin(
                Method::POST,
                "/api/work-orders",
                Some(json!({ "client_id": id_of(&client), "vehicle_description": "Civic", "items": [bad] })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    let (_, body) = app
        .admin(
            Method::POST,
            "/api/work-orders",
            Some(json!({ "client_id": id_of(&client), "vehicle_description": "Civic" })),
        )
        .await;
    let items_uri = format!("/api/work-orders/{}/items", id_of(&body["data"]));
    for bad in bad_items {
        let (status, body) = app.admin(Method::POST, &items_uri, Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_update_item_recomputes_total() {
    let app = TestApp::new();
    let client = app.create_client("Renata Lopes", None).await;
    let (_, body) = app
        .admin(
            Method::POST,
            "/api/work-orders",
            Some(json!({
                "client_id": id_of(&client),
                "vehicle_description": "Corolla 2019",
                "items": [
                    { "kind": "service", "description": "Revisão", "quantity": 1, "unit_price": 150.0 },
                    { "kind": "part", "description": "Vela", "quantity": 4, "unit_price": 25.0 }
                ]
            })),
        )
        .await;
    let order = body["data"].clone();
    assert_eq!(order["total"].as_f64(), Some(250.0));

    let vela = order["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["description"] == "Vela")
        .unwrap()
        .clone();
    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/work-orders/{}/items/{}", id_of(&order), id_of(&vela)),
            Some(json!({ "quantity": 2, "unit_price": 30.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"].as_f64(), Some(210.0));
    assert_eq!(body["data"]["final_total"].as_f64(), Some(210.0));

    let (_, body) = app
        .admin(Method::GET, &format!("/api/work-orders/{}", id_of(&order)), None)
        .await;
    assert_eq!(body["data"]["total"].as_f64(), Some(210.0));
}

#[tokio::test]
async fn test_client_search_is_case_insensitive_across_fields() {
    let app = TestApp::new();
    app.create_client("Joana Silva", None).await;
    app.create_client("Pedro Santos", Some("12345678901")).await;
    app.create_client("Oficina Souza", None).await;

    let (_, body) = app.admin(Method::GET, "/api/clients?search=SILVA", None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Joana Silva");

    let (_, body) = app.admin(Method::GET, "/api/clients?search=123456", None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Pedro Santos");

    let (_, body) = app.admin(Method::GET, "/api/clients?search=s", None).await;
    assert_eq!(body["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_status_update_on_unknown_order_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app
        .admin(
            Method::PATCH,
            &format!("/api/work-orders/{}/status", Uuid::new_v4()),
            Some(json!({ "status": "approved" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}
