use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use roster_core::{NewUser, User, UserId};
use roster_infra::{AppConfig, ExecutionMode, InMemoryUserRepository, StorageError, UserRepository};
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

/// A store whose every call panics.
struct ExplodingRepository;

#[async_trait]
impl UserRepository for ExplodingRepository {
    async fn find_all(&self) -> Result<Vec<User>, StorageError> {
        panic!("user table exploded");
    }

    async fn find_by_id(&self, _id: UserId) -> Result<Option<User>, StorageError> {
        panic!("user table exploded");
    }

    async fn create(&self, _new_user: NewUser) -> Result<User, StorageError> {
        panic!("user table exploded");
    }
}

impl TestServer {
    async fn spawn(config: AppConfig) -> Self {
        Self::spawn_with(config, Arc::new(InMemoryUserRepository::new())).await
    }

    async fn spawn_with(config: AppConfig, repo: Arc<dyn UserRepository>) -> Self {
        // Same router as prod, on an ephemeral port.
        let app = roster_api::app::build_app(&config, repo);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn production() -> Self {
        Self::spawn(AppConfig::default()).await
    }

    async fn development() -> Self {
        Self::spawn(AppConfig {
            mode: ExecutionMode::Development,
            ..AppConfig::default()
        })
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn ada() -> Value {
    json!({
        "email": "ada@example.com",
        "password": "analytical-engine",
        "firstName": "Ada",
        "lastName": "Lovelace",
    })
}

async fn create(client: &reqwest::Client, srv: &TestServer, body: &Value) -> reqwest::Response {
    client
        .post(srv.url("/api/v1/users"))
        .json(body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_reports_status_timestamp_and_uptime() {
    let srv = TestServer::production().await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn user_lifecycle_create_fetch_list() {
    let srv = TestServer::production().await;
    let client = reqwest::Client::new();

    let res = create(&client, &srv, &ada()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["id"], 1);
    assert_eq!(created["email"], "ada@example.com");
    assert_eq!(created["firstName"], "Ada");
    assert!(created["createdAt"].is_string());
    assert!(created.get("password").is_none());
    assert!(created.get("passwordHash").is_none());

    let res = client.get(srv.url("/api/v1/users/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), created);

    for path in ["/api/v1/users", "/api/v1/users/"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert_eq!(res.json::<Value>().await.unwrap(), json!([created.clone()]));
    }
}

#[tokio::test]
async fn create_accepts_trailing_slash() {
    let srv = TestServer::production().await;
    let res = reqwest::Client::new()
        .post(srv.url("/api/v1/users/"))
        .json(&ada())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn unknown_user_keeps_the_legacy_body() {
    let srv = TestServer::production().await;

    let res = reqwest::get(srv.url("/api/v1/users/999")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "message": "User not found" }));
}

#[tokio::test]
async fn zero_and_negative_ids_are_unknown_users() {
    let srv = TestServer::production().await;

    for path in ["/api/v1/users/0", "/api/v1/users/-3"] {
        let res = reqwest::get(srv.url(path)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(res.json::<Value>().await.unwrap(), json!({ "message": "User not found" }));
    }
}

#[tokio::test]
async fn panicking_store_answers_with_an_internal_error_envelope() {
    let srv = TestServer::spawn_with(AppConfig::default(), Arc::new(ExplodingRepository)).await;

    let res = reqwest::get(srv.url("/api/v1/users")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "status": "error", "statusCode": 500, "message": "Internal Server Error" })
    );

    let srv = TestServer::spawn_with(
        AppConfig {
            mode: ExecutionMode::Development,
            ..AppConfig::default()
        },
        Arc::new(ExplodingRepository),
    )
    .await;
    let res = reqwest::get(srv.url("/api/v1/users/1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert!(body["stack"].as_str().unwrap().contains("user table exploded"));
}

#[tokio::test]
async fn non_numeric_id_is_a_validation_error() {
    let srv = TestServer::production().await;

    let res = reqwest::get(srv.url("/api/v1/users/abc")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "id");
}

#[tokio::test]
async fn invalid_body_lists_field_errors_in_order() {
    let srv = TestServer::production().await;

    let res = create(&reqwest::Client::new(), &srv, &json!({ "email": "nope" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["message"], "Validation failed");
    assert!(body.get("stack").is_none());

    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "firstName", "lastName"]);
    assert_eq!(body["errors"][0]["message"], "Invalid email address");
}

#[tokio::test]
async fn field_errors_use_the_request_field_names() {
    let srv = TestServer::production().await;
    let mut invalid = ada();
    invalid["lastName"] = json!("L");

    let res = create(&reqwest::Client::new(), &srv, &invalid).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["errors"],
        json!([{ "field": "lastName", "message": "Last name must be at least 2 characters" }])
    );
}

#[tokio::test]
async fn wrongly_typed_body_is_a_validation_error_on_body() {
    let srv = TestServer::production().await;

    let res = create(&reqwest::Client::new(), &srv, &json!({ "email": 5 })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let srv = TestServer::production().await;

    let res = reqwest::Client::new()
        .post(srv.url("/api/v1/users"))
        .header("content-type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "status": "error", "statusCode": 400, "message": "Invalid JSON payload" })
    );
}

#[tokio::test]
async fn missing_content_type_passes_the_rejection_status_through() {
    let srv = TestServer::production().await;

    let res = reqwest::Client::new()
        .post(srv.url("/api/v1/users"))
        .body(ada().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["statusCode"], 415);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let srv = TestServer::spawn(AppConfig {
        body_limit_bytes: 32,
        ..AppConfig::default()
    })
    .await;

    let res = create(&reqwest::Client::new(), &srv, &ada()).await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.json::<Value>().await.unwrap()["statusCode"], 413);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let srv = TestServer::production().await;
    let client = reqwest::Client::new();

    assert_eq!(create(&client, &srv, &ada()).await.status(), StatusCode::CREATED);

    let res = create(&client, &srv, &ada()).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["statusCode"], 409);
    assert_eq!(body["message"], "Duplicate value for email");
}

#[tokio::test]
async fn unknown_route_is_a_not_found_envelope() {
    let srv = TestServer::production().await;

    let res = reqwest::get(srv.url("/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "status": "error", "statusCode": 404, "message": "Route /nope not found" })
    );

    let res = reqwest::get(srv.url("/api/v1/nope?page=2")).await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Route /api/v1/nope?page=2 not found");
}

#[tokio::test]
async fn unsupported_method_is_a_not_found_envelope() {
    let srv = TestServer::production().await;

    let res = reqwest::Client::new()
        .delete(srv.url("/api/v1/users/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Route /api/v1/users/1 not found");
}

#[tokio::test]
async fn development_mode_includes_the_stack() {
    let srv = TestServer::development().await;

    let res = reqwest::get(srv.url("/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Route /nope not found");
    assert!(body["stack"].as_str().unwrap().contains("Route /nope not found"));
}
