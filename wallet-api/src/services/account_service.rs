//! Account Service
//!
//! Registration, login, profile and the daily check-in.

use rand::Rng;
use wallet_core::{today_utc, Day, NewUser, User, UserId};

use crate::auth::{generate_referral_code, hash_password, issue_user_token, verify_password};
use crate::constants::{MIN_PASSWORD_LENGTH, MIN_PHONE_LENGTH};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{AuthResponse, CheckinResponse, LoginRequest, RegisterRequest, UserSummary};

/// Create an account and sign the user in.
pub async fn register(state: &AppState, req: RegisterRequest) -> ApiResult<AuthResponse> {
    let phone = req.phone.trim().to_string();
    if phone.is_empty() {
        return Err(ApiError::missing_field("phone"));
    }
    if req.password.is_empty() {
        return Err(ApiError::missing_field("password"));
    }
    if phone.len() < MIN_PHONE_LENGTH {
        return Err(ApiError::invalid_input("Invalid phone number"));
    }
    if req.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::invalid_input(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let referred_by = req
        .referral_code
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty());

    let user = state
        .ledger
        .user_create(NewUser {
            phone,
            password_hash: hash_password(&req.password)?,
            referral_code: generate_referral_code(),
            referred_by,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    let token = issue_user_token(&state.auth, user.id, &user.phone)?;
    Ok(AuthResponse {
        token,
        user: UserSummary::from(&user),
    })
}

/// Check a phone/password pair and issue a token.
///
/// Unknown phones and wrong passwords get the same 401.
pub async fn login(state: &AppState, req: LoginRequest) -> ApiResult<AuthResponse> {
    if req.phone.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::invalid_input("Phone and password are required"));
    }

    let user = state.ledger.user_get_by_phone(req.phone.trim()).await?;
    let Some(user) = user.filter(|user| verify_password(&req.password, &user.password_hash))
    else {
        return Err(ApiError::unauthorized("Invalid phone or password"));
    };

    let token = issue_user_token(&state.auth, user.id, &user.phone)?;
    Ok(AuthResponse {
        token,
        user: UserSummary::from(&user),
    })
}

pub async fn profile(state: &AppState, user_id: UserId) -> ApiResult<User> {
    state
        .ledger
        .user_get(user_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(user_id))
}

/// Claim today's check-in bonus.
pub async fn checkin(state: &AppState, user_id: UserId) -> ApiResult<CheckinResponse> {
    checkin_on(state, user_id, today_utc()).await
}

/// Claim the check-in bonus for `day`, a random amount within the
/// configured range.
pub async fn checkin_on(state: &AppState, user_id: UserId, day: Day) -> ApiResult<CheckinResponse> {
    let range = &state.wallet.checkin;
    let bonus = rand::rng().random_range(range.min_bonus..=range.max_bonus);

    let checkin = state.ledger.checkin_record(user_id, day, bonus).await?;
    let balance = profile(state, user_id).await?.balance;

    tracing::info!(user_id = %user_id, bonus, "Daily check-in claimed");
    Ok(CheckinResponse { checkin, balance })
}
