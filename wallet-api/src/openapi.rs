//! OpenAPI Specification for the Wallet API
//!
//! Generated by utoipa from the route annotations and schema derives.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{LivenessReport, PoolProbe, ProbeStatus, ReadinessReport, StorageProbe};
use crate::routes::{admin, auth, health, identifiers, investment, payment, user};
use crate::telemetry::metrics;
use crate::types::*;

use wallet_core::{
    Checkin, GrowthReport, Investment, InvestmentPlan, InvestmentStats, InvestmentStatus,
    LedgerStats, PaymentIdentifier, PoolStats, TransactionKind, TransactionStatus, User,
    WalletTransaction,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "UPI Wallet API",
        version = "0.1.0",
        description = "Wallet backend with rotating UPI payment identifiers",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local Development")
    ),
    tags(
        (name = "Auth", description = "Registration and sign-in"),
        (name = "User", description = "Profile and daily check-in"),
        (name = "Payments", description = "Recharges and withdrawals"),
        (name = "Investments", description = "Fixed-return plans"),
        (name = "Admin", description = "Approvals and ledger overviews"),
        (name = "Identifiers", description = "Payment identifier pool administration"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics"),
    ),
    paths(
        auth::register,
        auth::login,
        auth::admin_login_handler,
        user::profile,
        user::checkin,
        payment::recharge,
        payment::confirm_recharge,
        payment::withdraw,
        payment::transactions,
        payment::withdrawals,
        investment::list_plans,
        investment::invest,
        investment::list_investments,
        admin::stats,
        admin::users,
        admin::transactions,
        admin::pending,
        admin::pending_withdrawals,
        admin::investment_stats,
        admin::approve,
        admin::reject,
        admin::daily_growth,
        identifiers::list_identifiers,
        identifiers::add_identifier,
        identifiers::update_identifier,
        identifiers::remove_identifier,
        identifiers::rotate,
        identifiers::stats,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        RegisterRequest,
        LoginRequest,
        AdminLoginRequest,
        UserSummary,
        AuthResponse,
        AdminAuthResponse,
        CheckinResponse,
        RechargeRequest,
        RechargeResponse,
        ConfirmRechargeRequest,
        WithdrawRequest,
        InvestRequest,
        TransactionDecisionRequest,
        IdentifierBookkeeping,
        ApprovalResponse,
        AddIdentifierRequest,
        UpdateIdentifierRequest,
        RotateResponse,
        RemoveIdentifierResponse,
        User,
        Checkin,
        WalletTransaction,
        TransactionKind,
        TransactionStatus,
        PaymentIdentifier,
        PoolStats,
        InvestmentPlan,
        Investment,
        InvestmentStatus,
        GrowthReport,
        LedgerStats,
        InvestmentStats,
        ProbeStatus,
        LivenessReport,
        StorageProbe,
        PoolProbe,
        ReadinessReport,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}
