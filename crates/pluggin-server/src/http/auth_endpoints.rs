use crate::auth::{mint_session_token, SessionClaims};
use crate::http::handlers::{
    client_key, error_json, propagated_request_id, respond_error, with_request_id,
};
use crate::mailer::login_code_email;
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pluggin_api::{
    ApiErrorCode, OtpSendRequestDto, OtpVerifyRequestDto, OtpVerifyResponseDto, SessionDto,
    UserDto,
};
use pluggin_model::{EmailAddress, Role};
use rand::Rng;
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};

fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

/// Issues a 6-digit login code: durable (hashed) first, emailed second.
pub(crate) async fn otp_send_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<OtpSendRequestDto>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    let email = match EmailAddress::parse(&body.email) {
        Ok(v) => v,
        Err(e) => {
            let resp = respond_error(
                error_json(ApiErrorCode::ValidationFailed, &e.to_string(), json!({})),
                &request_id,
            );
            state
                .metrics
                .observe_request("/v1/auth/otp/send", StatusCode::BAD_REQUEST, started.elapsed())
                .await;
            return resp;
        }
    };

    let limiter_key = client_key(&headers, email.as_str());
    if !state
        .otp_limiter
        .allow(&limiter_key, &state.api.otp_rate_limit)
        .await
    {
        warn!(request_id = %request_id, "otp send rate limited");
        let resp = respond_error(
            error_json(
                ApiErrorCode::RateLimited,
                "too many login codes requested; try again later",
                json!({}),
            ),
            &request_id,
        );
        state
            .metrics
            .observe_request(
                "/v1/auth/otp/send",
                StatusCode::TOO_MANY_REQUESTS,
                started.elapsed(),
            )
            .await;
        return resp;
    }

    let code = generate_code();
    let code_hash = pluggin_core::sha256_hex(code.as_bytes());
    let ttl_secs = state.api.otp_ttl.as_secs() as i64;
    if let Err(e) = state
        .store
        .issue_otp(email.clone(), code_hash, ttl_secs)
        .await
    {
        let resp = respond_error(
            error_json(
                ApiErrorCode::Internal,
                "failed to generate login code",
                json!({"message": e.to_string()}),
            ),
            &request_id,
        );
        state
            .metrics
            .observe_request(
                "/v1/auth/otp/send",
                StatusCode::INTERNAL_SERVER_ERROR,
                started.elapsed(),
            )
            .await;
        return resp;
    }

    let (subject, html) = login_code_email(&code);
    if let Err(e) = state.mailer.send(email.as_str(), &subject, &html).await {
        warn!(request_id = %request_id, error = %e, "login code delivery failed");
        let resp = respond_error(
            error_json(ApiErrorCode::Internal, "failed to send login code", json!({})),
            &request_id,
        );
        state
            .metrics
            .observe_request(
                "/v1/auth/otp/send",
                StatusCode::INTERNAL_SERVER_ERROR,
                started.elapsed(),
            )
            .await;
        return resp;
    }

    info!(request_id = %request_id, email = %email, "login code issued");
    let resp = with_request_id(
        Json(json!({"success": true, "message": "login code sent"})).into_response(),
        &request_id,
    );
    state
        .metrics
        .observe_request("/v1/auth/otp/send", StatusCode::OK, started.elapsed())
        .await;
    resp
}

/// Consumes a code and mints a session. First verification creates the
/// profile; allow-listed emails pick up the admin role here (role-table
/// grant, checked on every admin request).
pub(crate) async fn otp_verify_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<OtpVerifyRequestDto>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    let reject = |code: ApiErrorCode, message: &str| {
        respond_error(error_json(code, message, json!({})), &request_id)
    };

    let email = match EmailAddress::parse(&body.email) {
        Ok(v) => v,
        Err(e) => {
            let resp = reject(ApiErrorCode::ValidationFailed, &e.to_string());
            state
                .metrics
                .observe_request(
                    "/v1/auth/otp/verify",
                    StatusCode::BAD_REQUEST,
                    started.elapsed(),
                )
                .await;
            return resp;
        }
    };
    let code = body.code.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        let resp = reject(ApiErrorCode::ValidationFailed, "code must be 6 digits");
        state
            .metrics
            .observe_request(
                "/v1/auth/otp/verify",
                StatusCode::BAD_REQUEST,
                started.elapsed(),
            )
            .await;
        return resp;
    }

    let code_hash = pluggin_core::sha256_hex(code.as_bytes());
    let (status, resp) = match state.store.consume_otp(email.clone(), code_hash).await {
        Ok(false) => {
            warn!(request_id = %request_id, email = %email, "invalid or expired login code");
            (
                StatusCode::BAD_REQUEST,
                reject(ApiErrorCode::InvalidOtp, "invalid or expired code"),
            )
        }
        Ok(true) => match establish_session(&state, &email).await {
            Ok(response_dto) => {
                info!(request_id = %request_id, email = %email, "login code verified");
                (
                    StatusCode::OK,
                    with_request_id(Json(response_dto).into_response(), &request_id),
                )
            }
            Err(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                reject(ApiErrorCode::Internal, &message),
            ),
        },
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            reject(
                ApiErrorCode::Internal,
                &format!("failed to verify code: {e}"),
            ),
        ),
    };
    state
        .metrics
        .observe_request("/v1/auth/otp/verify", status, started.elapsed())
        .await;
    resp
}

async fn establish_session(
    state: &AppState,
    email: &EmailAddress,
) -> Result<OtpVerifyResponseDto, String> {
    let profile = state
        .store
        .ensure_profile(email.clone())
        .await
        .map_err(|e| format!("failed to create user account: {e}"))?;

    if state
        .api
        .admin_emails
        .iter()
        .any(|allowed| pluggin_core::normalize_email_key(allowed) == email.as_str())
    {
        state
            .store
            .grant_role(profile.id.clone(), Role::Admin)
            .await
            .map_err(|e| format!("failed to grant admin role: {e}"))?;
    }

    let secret = state
        .api
        .session_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "session secret is not configured".to_string())?;
    let expires_at = pluggin_core::unix_now_secs() + state.api.session_ttl.as_secs() as i64;
    let claims = SessionClaims {
        user_id: profile.id.clone(),
        email: email.as_str().to_string(),
        expires_at,
    };
    let token = mint_session_token(secret, &claims);

    Ok(OtpVerifyResponseDto {
        success: true,
        user: UserDto {
            id: profile.id,
            email: email.as_str().to_string(),
        },
        session: SessionDto { token, expires_at },
    })
}
