use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use musika_server::config::Config;
use musika_server::App;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

const ADMIN_TOKEN: &str = "test-admin-token";
const ADMIN_EMAIL: &str = "admin@musika.test";

static TEST_CONTAINER: OnceCell<Arc<ContainerAsync<Postgres>>> = OnceCell::const_new();
static TEST_POOL: OnceCell<PgPool> = OnceCell::const_new();

async fn get_test_db() -> (PgPool, String) {
    let container = TEST_CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default()
                .start()
                .await
                .expect("Failed to start postgres container");
            Arc::new(container)
        })
        .await;

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");
    let database_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let pool = TEST_POOL
        .get_or_init(|| async {
            sqlx::PgPool::connect(&database_url)
                .await
                .expect("Failed to connect to test database")
        })
        .await
        .clone();

    (pool, database_url)
}

async fn setup() -> (Router, PgPool) {
    let (_pool, database_url) = get_test_db().await;

    let config = Config {
        database_url,
        bind_address: "0.0.0.0:8080".to_string(),
        db_max_connections: 5,
        otlp_endpoint: None,
        rate_limit_per_minute: 1000,
        admin_token: ADMIN_TOKEN.to_string(),
        admin_email: ADMIN_EMAIL.to_string(),
        smtp_host: None,
        smtp_port: 587,
        smtp_username: None,
        smtp_password: None,
        from_address: "Musika <no-reply@musika.test>".to_string(),
    };

    let app = App::new(config).await.expect("Failed to create app");
    let pool = app.db().clone();

    (app.router(), pool)
}

async fn body_json(res: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn post_json(
    router: &Router,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> axum::response::Response {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {}", token));
    }

    router
        .clone()
        .oneshot(req.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn get(router: &Router, uri: &str, token: Option<&str>) -> axum::response::Response {
    let mut req = Request::builder().method("GET").uri(uri);

    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {}", token));
    }

    router
        .clone()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Registers a fresh business and logs it in. Returns (business_id, email, token).
async fn register_business(router: &Router) -> (String, String, String) {
    let email = format!("biz-{}@example.com", Uuid::new_v4());

    let res = post_json(
        router,
        "/api/auth/register",
        None,
        json!({
            "business_name": "Takura Crafts",
            "owner_name": "Takura Moyo",
            "email": email,
            "phone": "0771234567",
            "password": "hunter22",
            "business_type": "retail",
            "description": "Handmade crafts and curios",
            "address": "12 Main Street",
            "city": "Gweru"
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let registered = body_json(res).await;
    let business_id = registered["business_id"].as_str().unwrap().to_string();

    let res = post_json(
        router,
        "/api/auth/login",
        None,
        json!({ "email": email, "password": "hunter22" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let login = body_json(res).await;
    let token = login["token"].as_str().unwrap().to_string();

    (business_id, email, token)
}

async fn submit_payment(router: &Router, token: &str, transaction_id: &str) -> (StatusCode, Value) {
    let res = post_json(
        router,
        "/api/payments/submit",
        Some(token),
        json!({
            "phone_number": "0771234567",
            "transaction_id": transaction_id,
            "payment_method": "ecocash"
        }),
    )
    .await;
    let status = res.status();
    (status, body_json(res).await)
}

async fn decide_payment(
    router: &Router,
    payment_id: &str,
    outcome: &str,
    notes: Option<&str>,
) -> (StatusCode, Value) {
    let mut body = json!({ "outcome": outcome });
    if let Some(notes) = notes {
        body["notes"] = json!(notes);
    }
    let res = post_json(
        router,
        &format!("/api/payments/verify/{}", payment_id),
        Some(ADMIN_TOKEN),
        body,
    )
    .await;
    let status = res.status();
    (status, body_json(res).await)
}

async fn payment_status(router: &Router, token: &str) -> Value {
    let res = get(router, "/api/payments/status", Some(token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

fn new_tx_id() -> String {
    format!("TX-{}", Uuid::new_v4())
}

// =============================================================================
// SUBMISSION TESTS
// =============================================================================

#[tokio::test]
async fn test_submit_payment() {
    let (router, _pool) = setup().await;
    let (business_id, _email, token) = register_business(&router).await;

    let (status, body) = submit_payment(&router, &token, &new_tx_id()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["payment_id"].as_str().is_some());

    let status_body = payment_status(&router, &token).await;
    let payment = &status_body["payment"];
    assert_eq!(payment["status"], "pending");
    assert_eq!(payment["amount"], "2.00");
    assert_eq!(payment["business_id"], business_id.as_str());
}

#[tokio::test]
async fn test_duplicate_transaction_id() {
    let (router, pool) = setup().await;
    let (_id_a, _email_a, token_a) = register_business(&router).await;
    let (_id_b, _email_b, token_b) = register_business(&router).await;

    let tx_id = new_tx_id();
    let (status, _) = submit_payment(&router, &token_a, &tx_id).await;
    assert_eq!(status, StatusCode::CREATED);

    // The guard is system-wide, so a different business reusing the
    // transaction id is rejected too.
    let (status, body) = submit_payment(&router, &token_b, &tx_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "duplicate_transaction");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE transaction_id = $1")
        .bind(&tx_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_second_pending_submission_rejected() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let (status, _) = submit_payment(&router, &token, &new_tx_id()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = submit_payment(&router, &token, &new_tx_id()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "pending_payment_exists");
}

#[tokio::test]
async fn test_submit_missing_phone_number() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let res = post_json(
        &router,
        "/api/payments/submit",
        Some(&token),
        json!({
            "phone_number": "",
            "transaction_id": new_tx_id(),
            "payment_method": "ecocash"
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_submit_invalid_payment_method() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let res = post_json(
        &router,
        "/api/payments/submit",
        Some(&token),
        json!({
            "phone_number": "0771234567",
            "transaction_id": new_tx_id(),
            "payment_method": "paypal"
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_submit_requires_auth() {
    let (router, _pool) = setup().await;

    let res = post_json(
        &router,
        "/api/payments/submit",
        None,
        json!({
            "phone_number": "0771234567",
            "transaction_id": new_tx_id(),
            "payment_method": "ecocash"
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// VERIFICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_verify_activates_business() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let (_, submitted) = submit_payment(&router, &token, &new_tx_id()).await;
    let payment_id = submitted["payment_id"].as_str().unwrap();

    let before = Utc::now();
    let (status, body) = decide_payment(&router, payment_id, "verified", Some("EcoCash ref checked")).await;
    let after = Utc::now();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment verified successfully");

    let status_body = payment_status(&router, &token).await;
    assert_eq!(status_body["payment"]["status"], "verified");
    assert_eq!(status_body["payment"]["verified_by"], "Admin");
    assert_eq!(status_body["business"]["payment_status"], "verified");
    assert_eq!(status_body["business"]["is_active"], true);

    let expiry: DateTime<Utc> = status_body["business"]["subscription_expiry"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(expiry >= before + Duration::days(30));
    assert!(expiry <= after + Duration::days(30));
}

#[tokio::test]
async fn test_reject_deactivates_business() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let (_, submitted) = submit_payment(&router, &token, &new_tx_id()).await;
    let payment_id = submitted["payment_id"].as_str().unwrap();

    let (status, body) = decide_payment(&router, payment_id, "rejected", Some("no matching transfer")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment rejected successfully");

    let status_body = payment_status(&router, &token).await;
    assert_eq!(status_body["payment"]["status"], "rejected");
    assert_eq!(status_body["payment"]["notes"], "no matching transfer");
    assert_eq!(status_body["business"]["payment_status"], "pending");
    assert_eq!(status_body["business"]["is_active"], false);
    assert!(status_body["business"]["subscription_expiry"].is_null());
}

#[tokio::test]
async fn test_rejection_preserves_existing_expiry() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let (_, submitted) = submit_payment(&router, &token, &new_tx_id()).await;
    let (status, _) =
        decide_payment(&router, submitted["payment_id"].as_str().unwrap(), "verified", None).await;
    assert_eq!(status, StatusCode::OK);

    let status_body = payment_status(&router, &token).await;
    let granted_expiry = status_body["business"]["subscription_expiry"].clone();
    assert!(granted_expiry.is_string());

    // A later rejected payment deactivates the account but must not touch the
    // previously granted window.
    let (_, resubmitted) = submit_payment(&router, &token, &new_tx_id()).await;
    let (status, _) =
        decide_payment(&router, resubmitted["payment_id"].as_str().unwrap(), "rejected", None).await;
    assert_eq!(status, StatusCode::OK);

    let status_body = payment_status(&router, &token).await;
    assert_eq!(status_body["business"]["is_active"], false);
    assert_eq!(status_body["business"]["payment_status"], "pending");
    assert_eq!(status_body["business"]["subscription_expiry"], granted_expiry);
}

#[tokio::test]
async fn test_verify_twice_is_conflict() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let (_, submitted) = submit_payment(&router, &token, &new_tx_id()).await;
    let payment_id = submitted["payment_id"].as_str().unwrap();

    let (status, _) = decide_payment(&router, payment_id, "verified", None).await;
    assert_eq!(status, StatusCode::OK);

    let first = payment_status(&router, &token).await;
    let first_expiry = first["business"]["subscription_expiry"].clone();

    // No re-verification path: the terminal business state is unchanged, so
    // the subscription window is not extended a second time.
    let (status, body) = decide_payment(&router, payment_id, "verified", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "payment_already_decided");

    let second = payment_status(&router, &token).await;
    assert_eq!(second["business"]["subscription_expiry"], first_expiry);
    assert_eq!(second["business"]["is_active"], true);
}

#[tokio::test]
async fn test_resubmission_after_rejection() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let (_, submitted) = submit_payment(&router, &token, &new_tx_id()).await;
    let (status, _) =
        decide_payment(&router, submitted["payment_id"].as_str().unwrap(), "rejected", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = submit_payment(&router, &token, &new_tx_id()).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_verify_unknown_payment() {
    let (router, _pool) = setup().await;

    let (status, body) =
        decide_payment(&router, &Uuid::new_v4().to_string(), "verified", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "payment_not_found");
}

#[tokio::test]
async fn test_verify_requires_admin_token() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let (_, submitted) = submit_payment(&router, &token, &new_tx_id()).await;
    let payment_id = submitted["payment_id"].as_str().unwrap();
    let uri = format!("/api/payments/verify/{}", payment_id);

    let res = post_json(&router, &uri, None, json!({ "outcome": "verified" })).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = post_json(&router, &uri, Some("wrong-token"), json!({ "outcome": "verified" })).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // A business credential is not an admin credential.
    let res = post_json(&router, &uri, Some(&token), json!({ "outcome": "verified" })).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let status_body = payment_status(&router, &token).await;
    assert_eq!(status_body["payment"]["status"], "pending");
    assert_eq!(status_body["business"]["is_active"], false);
}

// =============================================================================
// STATUS QUERY TESTS
// =============================================================================

#[tokio::test]
async fn test_status_with_no_payments() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let status_body = payment_status(&router, &token).await;
    assert!(status_body["payment"].is_null());
    assert_eq!(status_body["business"]["payment_status"], "pending");
    assert_eq!(status_body["business"]["is_active"], false);
    assert!(status_body["business"]["subscription_expiry"].is_null());
}

#[tokio::test]
async fn test_status_returns_latest_payment() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let first_tx = new_tx_id();
    let (_, submitted) = submit_payment(&router, &token, &first_tx).await;
    let (status, _) =
        decide_payment(&router, submitted["payment_id"].as_str().unwrap(), "rejected", None).await;
    assert_eq!(status, StatusCode::OK);

    let second_tx = new_tx_id();
    let (status, _) = submit_payment(&router, &token, &second_tx).await;
    assert_eq!(status, StatusCode::CREATED);

    let status_body = payment_status(&router, &token).await;
    assert_eq!(status_body["payment"]["transaction_id"], second_tx.as_str());
    assert_eq!(status_body["payment"]["status"], "pending");
}

// =============================================================================
// REGISTRATION & LOGIN TESTS
// =============================================================================

#[tokio::test]
async fn test_register_and_login() {
    let (router, _pool) = setup().await;
    let (business_id, email, _token) = register_business(&router).await;

    let res = post_json(
        &router,
        "/api/auth/login",
        None,
        json!({ "email": email, "password": "hunter22" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let login = body_json(res).await;
    assert_eq!(login["business"]["id"], business_id.as_str());
    assert_eq!(login["business"]["is_active"], false);
    assert!(login["token"].as_str().unwrap().starts_with("msk_"));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (router, _pool) = setup().await;
    let (_business_id, email, _token) = register_business(&router).await;

    let res = post_json(
        &router,
        "/api/auth/login",
        None,
        json!({ "email": email, "password": "wrong-password" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body["error"]["code"], "invalid_credentials");
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_email() {
    let (router, _pool) = setup().await;
    let (_business_id, email, _token) = register_business(&router).await;

    let res = post_json(
        &router,
        "/api/auth/login",
        None,
        json!({ "email": email.to_uppercase(), "password": "hunter22" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_email_registration() {
    let (router, _pool) = setup().await;
    let (_business_id, email, _token) = register_business(&router).await;

    let res = post_json(
        &router,
        "/api/auth/register",
        None,
        json!({
            "business_name": "Copycat Traders",
            "owner_name": "Rudo Ncube",
            "email": email,
            "phone": "0775555555",
            "password": "hunter22",
            "business_type": "service",
            "description": "Same email, different business",
            "address": "5 Second Ave",
            "city": "Harare"
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_register_short_password() {
    let (router, _pool) = setup().await;

    let res = post_json(
        &router,
        "/api/auth/register",
        None,
        json!({
            "business_name": "Short Pass Ltd",
            "owner_name": "Tafadzwa Dube",
            "email": format!("biz-{}@example.com", Uuid::new_v4()),
            "phone": "0775555555",
            "password": "abc",
            "business_type": "retail",
            "description": "A shop",
            "address": "1 First St",
            "city": "Mutare"
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// NOTIFICATION OUTBOX TESTS
// =============================================================================

#[tokio::test]
async fn test_submission_enqueues_admin_notice() {
    let (router, pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let tx_id = new_tx_id();
    let (status, _) = submit_payment(&router, &token, &tx_id).await;
    assert_eq!(status, StatusCode::CREATED);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notification_outbox WHERE recipient = $1 AND html_body LIKE $2",
    )
    .bind(ADMIN_EMAIL)
    .bind(format!("%{}%", tx_id))
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_verification_enqueues_business_notice() {
    let (router, pool) = setup().await;
    let (_business_id, email, token) = register_business(&router).await;

    let (_, submitted) = submit_payment(&router, &token, &new_tx_id()).await;
    let (status, _) =
        decide_payment(&router, submitted["payment_id"].as_str().unwrap(), "verified", None).await;
    assert_eq!(status, StatusCode::OK);

    let subject: String = sqlx::query_scalar(
        "SELECT subject FROM notification_outbox WHERE recipient = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(&email)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(subject, "Payment Verified - Musika");
}

#[tokio::test]
async fn test_notification_list_and_retry() {
    let (router, pool) = setup().await;

    let failed_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO notification_outbox (id, recipient, subject, html_body, status, attempts, max_attempts, next_attempt_at, last_error, created_at)
        VALUES ($1, $2, 'Payment Verified - Musika', '<p>hello</p>', 'failed', 5, 5, NOW(), 'connection refused', NOW())
        "#,
    )
    .bind(failed_id)
    .bind(format!("dead-letter-{}@example.com", failed_id))
    .execute(&pool)
    .await
    .unwrap();

    let res = get(
        &router,
        "/api/admin/notifications?status=failed&limit=200",
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let listed = body_json(res).await;
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["id"] == failed_id.to_string()));

    let res = post_json(
        &router,
        &format!("/api/admin/notifications/{}/retry", failed_id),
        Some(ADMIN_TOKEN),
        json!({}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let retried = body_json(res).await;
    assert_eq!(retried["status"], "pending");
    assert_eq!(retried["attempts"], 0);

    // Only failed notifications can be re-queued.
    let res = post_json(
        &router,
        &format!("/api/admin/notifications/{}/retry", failed_id),
        Some(ADMIN_TOKEN),
        json!({}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// ADMIN LIST TESTS
// =============================================================================

#[tokio::test]
async fn test_admin_list_pending_payments() {
    let (router, _pool) = setup().await;
    let (_id_a, _email_a, token_a) = register_business(&router).await;
    let (_id_b, _email_b, token_b) = register_business(&router).await;

    let (_, first) = submit_payment(&router, &token_a, &new_tx_id()).await;
    let (_, second) = submit_payment(&router, &token_b, &new_tx_id()).await;
    let first_id = first["payment_id"].as_str().unwrap();
    let second_id = second["payment_id"].as_str().unwrap();

    let res = get(
        &router,
        "/api/admin/payments?status=pending&limit=500",
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let listed = body_json(res).await;
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_str())
        .collect();
    assert!(ids.contains(&first_id));
    assert!(ids.contains(&second_id));

    let res = get(&router, "/api/admin/payments", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// CHAT TESTS
// =============================================================================

#[tokio::test]
async fn test_chat_message_round_trip() {
    let (router, _pool) = setup().await;
    let (business_id, _email, token) = register_business(&router).await;

    let res = post_json(
        &router,
        "/api/chat/messages",
        Some(&token),
        json!({ "message": "Hello, I paid via EcoCash yesterday" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let sent = body_json(res).await;
    assert_eq!(sent["sender_type"], "business");
    assert_eq!(sent["sender"], "Takura Crafts");

    let res = post_json(
        &router,
        &format!("/api/admin/chat/{}", business_id),
        Some(ADMIN_TOKEN),
        json!({ "message": "Checking now, one moment" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let reply = body_json(res).await;
    assert_eq!(reply["sender_type"], "admin");
    assert_eq!(reply["sender"], "Admin");

    let res = get(&router, "/api/chat/messages", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let history = body_json(res).await;
    let messages = history.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["message"], "Hello, I paid via EcoCash yesterday");
    assert_eq!(messages[1]["message"], "Checking now, one moment");

    let res = get(
        &router,
        &format!("/api/admin/chat/{}", business_id),
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let admin_view = body_json(res).await;
    assert_eq!(admin_view.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_chat_unknown_business() {
    let (router, _pool) = setup().await;

    let res = get(
        &router,
        &format!("/api/admin/chat/{}", Uuid::new_v4()),
        Some(ADMIN_TOKEN),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_empty_message_rejected() {
    let (router, _pool) = setup().await;
    let (_business_id, _email, token) = register_business(&router).await;

    let res = post_json(
        &router,
        "/api/chat/messages",
        Some(&token),
        json!({ "message": "   " }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_missing_token() {
    let (router, _pool) = setup().await;

    let res = get(&router, "/api/payments/status", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_token() {
    let (router, _pool) = setup().await;

    let res = get(
        &router,
        "/api/payments/status",
        Some("msk_definitely-not-a-real-token-aaaa"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let (router, _pool) = setup().await;

    let res = router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/payments/status")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// HEALTH CHECK TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let (router, _pool) = setup().await;

    let res = get(&router, "/health", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["status"], "ok");

    let res = get(&router, "/ready", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["status"], "ready");
}
