use std::sync::Arc;

use axum::{
    Extension, Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use savings_ledger::{
    Ledger, LedgerSettings,
    clock::FixedClock,
    middleware::auth::AuthContext,
    routes::{self, AppState},
    store::MemoryStore,
};

fn app() -> Router {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap(),
    ));
    let state = AppState::new(Ledger::with_clock(
        MemoryStore::new(),
        LedgerSettings::default(),
        clock,
    ));

    routes::api_router(state.clone())
        .layer(Extension(AuthContext {
            user_id: Uuid::new_v4(),
            key_label: "test".to_string(),
        }))
        .merge(routes::public_router(state))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn funded(app: &Router, amount: &str) {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/v1/wallet/deposit",
        Some(json!({ "amount": amount, "description": "Salary" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wallet_can_be_opened_funded_and_drained() {
    let app = app();

    let (status, body) = call(&app, Method::POST, "/api/v1/wallet", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);
    assert_eq!(body["wallet"]["currency"], "INR");

    let (status, body) = call(&app, Method::POST, "/api/v1/wallet", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/wallet/deposit",
        Some(json!({ "amount": "500.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], 50000);
    assert_eq!(body["transaction"]["kind"], "deposit");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/wallet/withdraw",
        Some(json!({ "amount": 600 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "insufficient_funds");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/wallet/withdraw",
        Some(json!({ "amount": 120.5, "description": "Rent" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "379.50");

    let (status, body) = call(&app, Method::GET, "/api/v1/wallet/transactions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(body["balance_minor"], 37950);
}

#[tokio::test]
async fn reading_a_missing_wallet_is_not_found() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/v1/wallet", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "wallet_not_found");
}

#[tokio::test]
async fn malformed_amounts_are_rejected() {
    let app = app();
    for amount in [json!("-5"), json!("1.234"), json!(0), json!("abc"), Value::Null] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/wallet/deposit",
            Some(json!({ "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {amount}");
        assert_eq!(body["error"]["code"], "invalid_amount");
    }
}

#[tokio::test]
async fn locked_goal_lifecycle() {
    let app = app();
    funded(&app, "500").await;

    let (status, goal) = call(
        &app,
        Method::POST,
        "/api/v1/savings",
        Some(json!({
            "name": "Holiday",
            "amount": 200,
            "description": "Goa in December",
            "lock_date": "2026-12-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(goal["is_locked"], true);
    assert_eq!(goal["balance_minor"], 20000);
    let uri = format!("/api/v1/savings/{}", goal["id"].as_str().unwrap());

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("{uri}/withdraw"),
        Some(json!({ "amount": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["error"]["code"], "locked");
    assert_eq!(body["error"]["lock_date"], "2026-12-01");

    let (status, body) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["error"]["code"], "locked");

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("{uri}/lock"),
        Some(json!({ "lock_date": "2027-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "already_locked");

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("{uri}/add"),
        Some(json!({ "amount": "50" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], 25000);

    let (status, body) = call(&app, Method::GET, "/api/v1/savings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_saved"], "250.00");
    assert_eq!(body["savings"].as_array().unwrap().len(), 1);

    let (status, body) = call(&app, Method::GET, "/api/v1/overview", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wallet_balance_minor"], 25000);
    assert_eq!(body["total_saved_minor"], 25000);
    assert_eq!(body["locked_goal_count"], 1);

    let (status, body) = call(&app, Method::GET, &format!("{uri}/transactions"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unlocked_goal_can_be_cashed_out_and_deleted() {
    let app = app();
    funded(&app, "100").await;

    let (status, goal) = call(
        &app,
        Method::POST,
        "/api/v1/savings",
        Some(json!({
            "name": "Bike",
            "amount": 80,
            "lock_date": "2026-12-01",
            "locked": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(goal["is_locked"], false);
    let uri = format!("/api/v1/savings/{}", goal["id"].as_str().unwrap());

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("{uri}/withdraw"),
        Some(json!({ "amount": 20, "send_to_wallet": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent_to_wallet"], false);
    assert!(body["wallet_balance_minor"].is_null());
    assert_eq!(body["savings"]["balance_minor"], 6000);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("{uri}/withdraw"),
        Some(json!({ "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent_to_wallet"], true);
    assert_eq!(body["wallet_balance_minor"], 3000);

    let (status, body) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refunded"], "50.00");

    let (status, body) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "savings_not_found");

    let (_, body) = call(&app, Method::GET, "/api/v1/wallet", None).await;
    assert_eq!(body["balance_minor"], 8000);
}

#[tokio::test]
async fn goal_creation_validates_its_input() {
    let app = app();
    funded(&app, "100").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/savings",
        Some(json!({ "name": "Soon", "amount": 10, "lock_date": "next week" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_lock_date");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/savings",
        Some(json!({ "name": "Too much", "amount": 150, "lock_date": "2026-12-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "insufficient_funds");

    let (status, body) = call(&app, Method::GET, "/api/v1/savings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_saved_minor"], 0);
}

#[tokio::test]
async fn health_reports_the_store() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
