//! End-to-End API Flow Tests
//!
//! Drives the full router over in-memory stores: registration, the recharge
//! workflow through admin approval, identifier rotation at the cap,
//! withdrawals, check-in and investments.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wallet_api::auth::AdminCredentials;
use wallet_api::{create_api_router, ApiConfig, AppState, AuthConfig};
use wallet_core::WalletConfig;

// ============================================================================
// HARNESS
// ============================================================================

const ADMIN_USER: &str = "ops";
const ADMIN_PASS: &str = "ops-password";

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let auth = AuthConfig {
            admin: Some(AdminCredentials::new(ADMIN_USER, ADMIN_PASS)),
            ..AuthConfig::default()
        };
        let state = AppState::in_memory(auth, WalletConfig::default());
        Self {
            router: create_api_router(state, &ApiConfig::default()),
        }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
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
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(&self, phone: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "phone": phone, "password": "secret1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/admin-login",
                None,
                Some(json!({ "username": ADMIN_USER, "password": ADMIN_PASS })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn add_identifier(&self, admin: &str, handle: &str, cap: i32) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/admin/identifiers",
                Some(admin),
                Some(json!({ "handle": handle, "maxPaymentsPerCycle": cap })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add identifier failed: {}", body);
        body
    }

    /// Initiate, confirm and approve a recharge; returns the approval body.
    async fn settled_recharge(&self, user: &str, admin: &str, amount: i64) -> Value {
        let (status, recharge) = self
            .call(
                Method::POST,
                "/api/payment/recharge",
                Some(user),
                Some(json!({ "amount": amount })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "recharge failed: {}", recharge);
        let tx = recharge["transactionId"].clone();

        let (status, _) = self
            .call(
                Method::POST,
                "/api/payment/recharge/confirm",
                Some(user),
                Some(json!({ "transactionId": tx, "referenceNumber": "UTR900" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, approval) = self
            .call(
                Method::POST,
                "/api/admin/approve",
                Some(admin),
                Some(json!({ "transactionId": tx })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "approve failed: {}", approval);
        approval
    }
}

// ============================================================================
// AUTH
// ============================================================================

#[tokio::test]
async fn test_register_and_login() {
    let app = TestApp::new();
    app.register("9876543210").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "phone": "9876543210", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["balance"], 0);
    assert_eq!(body["user"]["referralCode"].as_str().unwrap().len(), 6);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "phone": "9876543210", "password": "wrong-one" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_duplicate_phone_is_conflict() {
    let app = TestApp::new();
    app.register("9876543210").await;
    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "phone": "9876543210", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_user_token_cannot_reach_admin_routes() {
    let app = TestApp::new();
    let user = app.register("9876543210").await;
    for uri in ["/api/admin/stats", "/api/admin/identifiers"] {
        let (status, body) = app.call(Method::GET, uri, Some(&user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["code"], "FORBIDDEN");
    }
}

#[tokio::test]
async fn test_admin_token_cannot_act_as_user() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (status, _) = app.call(Method::GET, "/api/user/profile", Some(&admin), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// RECHARGE AND ROTATION
// ============================================================================

#[tokio::test]
async fn test_recharge_with_empty_pool_is_retryable() {
    let app = TestApp::new();
    let user = app.register("9876543210").await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/payment/recharge",
            Some(&user),
            Some(json!({ "amount": 10_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_recharges_rotate_handles_at_cap() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.register("9876543210").await;
    app.add_identifier(&admin, "first@upi", 2).await;
    app.add_identifier(&admin, "second@upi", 2).await;

    let first = app.settled_recharge(&user, &admin, 10_000).await;
    assert_eq!(first["credited"], 10_000);
    assert_eq!(first["bookkeeping"]["identifier"]["successfulPayments"], 1);
    assert!(first["bookkeeping"]["rotatedTo"].is_null());

    let second = app.settled_recharge(&user, &admin, 5_000).await;
    assert_eq!(second["bookkeeping"]["rotatedTo"]["handle"], "second@upi");
    assert_eq!(second["bookkeeping"]["rotatedTo"]["successfulPayments"], 0);

    let (_, recharge) = app
        .call(
            Method::POST,
            "/api/payment/recharge",
            Some(&user),
            Some(json!({ "amount": 1_000 })),
        )
        .await;
    assert_eq!(recharge["upiHandle"], "second@upi");
    assert_eq!(recharge["position"], 2);

    let (_, profile) = app.call(Method::GET, "/api/user/profile", Some(&user), None).await;
    assert_eq!(profile["balance"], 15_000);
    assert_eq!(profile["totalRecharge"], 15_000);

    let (_, stats) = app
        .call(Method::GET, "/api/admin/identifiers/stats", Some(&admin), None)
        .await;
    assert_eq!(stats["totalIdentifiers"], 2);
    assert_eq!(stats["totalPaymentsAcrossPool"], 2);
    assert_eq!(stats["active"]["handle"], "second@upi");
}

#[tokio::test]
async fn test_manual_rotation_wraps_around() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.register("9876543210").await;
    app.add_identifier(&admin, "first@upi", 10).await;
    app.add_identifier(&admin, "second@upi", 10).await;

    // Nothing is active yet: rotation is a no-op.
    let (status, body) = app
        .call(Method::POST, "/api/admin/identifiers/rotate", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["active"].is_null());
    assert_eq!(body["rotated"], false);

    app.call(
        Method::POST,
        "/api/payment/recharge",
        Some(&user),
        Some(json!({ "amount": 1_000 })),
    )
    .await;

    let (_, body) = app
        .call(Method::POST, "/api/admin/identifiers/rotate", Some(&admin), None)
        .await;
    assert_eq!(body["active"]["handle"], "second@upi");
    assert_eq!(body["rotated"], true);
    let (_, body) = app
        .call(Method::POST, "/api/admin/identifiers/rotate", Some(&admin), None)
        .await;
    assert_eq!(body["active"]["handle"], "first@upi");
}

#[tokio::test]
async fn test_identifier_admin_crud() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let added = app.add_identifier(&admin, "shop@upi", 5).await;
    assert_eq!(added["position"], 1);
    assert_eq!(added["active"], false);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/admin/identifiers",
            Some(&admin),
            Some(json!({ "handle": "shop@upi" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let id = added["id"].as_str().unwrap();
    let (status, updated) = app
        .call(
            Method::PATCH,
            &format!("/api/admin/identifiers/{}", id),
            Some(&admin),
            Some(json!({ "handle": "store@upi" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["handle"], "store@upi");

    let (status, removed) = app
        .call(Method::DELETE, &format!("/api/admin/identifiers/{}", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["removed"], id);

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/admin/identifiers/{}", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "IDENTIFIER_NOT_FOUND");
}

#[tokio::test]
async fn test_removing_active_identifier_hands_over() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.register("9876543210").await;
    let first = app.add_identifier(&admin, "first@upi", 10).await;
    app.add_identifier(&admin, "second@upi", 10).await;
    app.call(
        Method::POST,
        "/api/payment/recharge",
        Some(&user),
        Some(json!({ "amount": 1_000 })),
    )
    .await;

    let id = first["id"].as_str().unwrap();
    let (_, removed) = app
        .call(Method::DELETE, &format!("/api/admin/identifiers/{}", id), Some(&admin), None)
        .await;
    assert_eq!(removed["active"]["handle"], "second@upi");
}

// ============================================================================
// APPROVAL WORKFLOW
// ============================================================================

#[tokio::test]
async fn test_double_approval_is_conflict() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.register("9876543210").await;
    app.add_identifier(&admin, "first@upi", 10).await;

    let approval = app.settled_recharge(&user, &admin, 2_000).await;
    let tx = approval["transaction"]["id"].clone();
    let (status, _) = app
        .call(
            Method::POST,
            "/api/admin/approve",
            Some(&admin),
            Some(json!({ "transactionId": tx })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, profile) = app.call(Method::GET, "/api/user/profile", Some(&user), None).await;
    assert_eq!(profile["balance"], 2_000);
}

#[tokio::test]
async fn test_withdraw_then_reject_refunds() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.register("9876543210").await;
    app.add_identifier(&admin, "first@upi", 10).await;
    app.settled_recharge(&user, &admin, 100_000).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/payment/withdraw",
            Some(&user),
            Some(json!({ "amount": 200_000, "upiId": "me@upi" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_BALANCE");

    let (status, withdrawal) = app
        .call(
            Method::POST,
            "/api/payment/withdraw",
            Some(&user),
            Some(json!({ "amount": 40_000, "upiId": "me@upi" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(withdrawal["type"], "withdraw");
    assert_eq!(withdrawal["status"], "pending");

    let (_, pending) = app.call(Method::GET, "/api/admin/pending", Some(&admin), None).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, rejected) = app
        .call(
            Method::POST,
            "/api/admin/reject",
            Some(&admin),
            Some(json!({ "transactionId": withdrawal["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");

    let (_, profile) = app.call(Method::GET, "/api/user/profile", Some(&user), None).await;
    assert_eq!(profile["balance"], 100_000);
    assert_eq!(profile["totalWithdraw"], 0);

    let (_, history) = app.call(Method::GET, "/api/transactions", Some(&user), None).await;
    assert_eq!(history.as_array().unwrap().len(), 2);

    let (_, stats) = app.call(Method::GET, "/api/admin/stats", Some(&admin), None).await;
    assert_eq!(stats["totalUsers"], 1);
    assert_eq!(stats["totalRecharge"], 100_000);
}

#[tokio::test]
async fn test_withdrawal_below_minimum_is_bad_request() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.register("9876543210").await;
    app.add_identifier(&admin, "first@upi", 10).await;
    app.settled_recharge(&user, &admin, 100_000).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/payment/withdraw",
            Some(&user),
            Some(json!({ "amount": 20_000, "upiId": "me@upi" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["message"].as_str().unwrap().contains("300.00"));

    let (_, profile) = app.call(Method::GET, "/api/user/profile", Some(&user), None).await;
    assert_eq!(profile["balance"], 100_000);
}

#[tokio::test]
async fn test_oversized_recharge_is_bad_request() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.register("9876543210").await;
    app.add_identifier(&admin, "first@upi", 10).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/payment/recharge",
            Some(&user),
            Some(json!({ "amount": i64::MAX })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (_, history) = app.call(Method::GET, "/api/transactions", Some(&user), None).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_withdrawal_listings() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.register("9876543210").await;
    let other = app.register("9123456780").await;
    app.add_identifier(&admin, "first@upi", 10).await;
    app.settled_recharge(&user, &admin, 100_000).await;
    app.settled_recharge(&other, &admin, 100_000).await;

    let mut ids = Vec::new();
    for (token, amount) in [(&user, 30_000), (&user, 35_000), (&other, 50_000)] {
        let (status, withdrawal) = app
            .call(
                Method::POST,
                "/api/payment/withdraw",
                Some(token),
                Some(json!({ "amount": amount, "upiId": "me@upi" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        ids.push(withdrawal["id"].clone());
    }
    app.call(
        Method::POST,
        "/api/admin/approve",
        Some(&admin),
        Some(json!({ "transactionId": ids[0] })),
    )
    .await;

    // Only the caller's withdrawals, newest first, whatever their status
    let (status, mine) = app.call(Method::GET, "/api/withdrawals", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|tx| tx["type"] == "withdraw"));
    assert_eq!(mine[0]["id"], ids[1]);
    assert_eq!(mine[1]["status"], "completed");

    // Admin queue holds undecided withdrawals only, never recharges
    let (status, queue) = app
        .call(Method::GET, "/api/admin/pending-withdrawals", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let queue = queue.as_array().unwrap();
    assert_eq!(queue.len(), 2);
    assert!(queue.iter().all(|tx| tx["type"] == "withdraw" && tx["status"] == "pending"));

    let (status, _) = app
        .call(Method::GET, "/api/admin/pending-withdrawals", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// CHECK-IN AND INVESTMENTS
// ============================================================================

#[tokio::test]
async fn test_checkin_once_per_day() {
    let app = TestApp::new();
    let user = app.register("9876543210").await;

    let (status, body) = app.call(Method::POST, "/api/user/checkin", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let bonus = body["checkin"]["amount"].as_i64().unwrap();
    assert!((1_000..=6_000).contains(&bonus));
    assert_eq!(body["balance"], bonus);

    let (status, body) = app.call(Method::POST, "/api/user/checkin", Some(&user), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_CHECKED_IN");
}

#[tokio::test]
async fn test_invest_and_daily_growth() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let user = app.register("9876543210").await;
    app.add_identifier(&admin, "first@upi", 10).await;
    app.settled_recharge(&user, &admin, 60_000).await;

    let (_, plans) = app.call(Method::GET, "/api/investment-plans", Some(&user), None).await;
    assert_eq!(plans.as_array().unwrap().len(), 4);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/invest",
            Some(&user),
            Some(json!({ "planName": "Gold" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_BALANCE");

    let (status, investment) = app
        .call(
            Method::POST,
            "/api/invest",
            Some(&user),
            Some(json!({ "planName": "Starter" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(investment["status"], "active");

    let (_, report) = app
        .call(Method::POST, "/api/admin/daily-growth", Some(&admin), None)
        .await;
    assert_eq!(report["processed"], 1);
    let (_, report) = app
        .call(Method::POST, "/api/admin/daily-growth", Some(&admin), None)
        .await;
    assert_eq!(report["processed"], 0);

    let (_, investments) = app.call(Method::GET, "/api/investments", Some(&user), None).await;
    assert_eq!(investments[0]["daysPaid"], 1);
    assert_eq!(investments[0]["totalProfit"], 2_500);

    let (_, profile) = app.call(Method::GET, "/api/user/profile", Some(&user), None).await;
    assert_eq!(profile["balance"], 60_000 - 50_000 + 2_500);
}

// ============================================================================
// PUBLIC SURFACE
// ============================================================================

#[tokio::test]
async fn test_unknown_api_route_is_json_404() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/api/does-not-exist", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ENTITY_NOT_FOUND");
}

#[tokio::test]
async fn test_readiness_reports_pool_state() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"]["backend"], "memory");
    assert_eq!(body["status"], "degraded");

    let admin = app.admin_token().await;
    app.add_identifier(&admin, "first@upi", 10).await;
    let (_, body) = app.call(Method::GET, "/health/ready", None, None).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["pool"]["identifiers"], 1);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/payment/recharge"].is_object());
}
