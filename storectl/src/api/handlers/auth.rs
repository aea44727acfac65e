//! Registration, login, logout, and identity endpoints.

use crate::{
    AppState,
    api::models::{
        auth::{LoginRequest, LoginResponse, LogoutResponse, RegisterRequest, SessionUser},
        users::{Role, UserResponse},
    },
    auth::{
        CurrentUser,
        password::{Argon2Params, hash_string_with_params, verify_password},
        session::{clear_session_cookie, create_session_cookie, extract_token},
    },
    config::Config,
    db::{
        errors::DbError,
        handlers::{Credentials, Repository, Sessions, Users},
        models::{credentials::CredentialCreateDBRequest, sessions::SessionCreateDBRequest, users::UserCreateDBRequest},
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

fn argon2_params(config: &Config) -> Argon2Params {
    Argon2Params {
        memory_kib: config.auth.password.argon2_memory_kib,
        iterations: config.auth.password.argon2_iterations,
        parallelism: config.auth.password.argon2_parallelism,
    }
}

fn validate_password(password: &str, config: &Config) -> Result<()> {
    let rules = &config.auth.password;
    if password.len() < rules.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", rules.min_length),
        });
    }
    if password.len() > rules.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at most {} characters", rules.max_length),
        });
    }
    Ok(())
}

/// Hash on a blocking thread; argon2 is deliberately slow
async fn hash_password(password: String, params: Argon2Params) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_string_with_params(&password, params))
        .await
        .map_err(|_| Error::Internal {
            operation: "run password hashing task".to_string(),
        })?
        .map_err(|_| Error::Internal {
            operation: "hash password".to_string(),
        })
}

/// POST /register - self-service account creation
#[instrument(skip(state, request), err)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<impl IntoResponse> {
    if !state.config.auth.allow_registration {
        return Err(Error::InsufficientPermissions {
            resource: "registration".to_string(),
        });
    }

    // Reject missing fields before touching storage
    let Some(identifier) = request.identifier.filter(|s| !s.is_empty()) else {
        return Err(Error::BadRequest {
            message: "Missing required field: identifier".to_string(),
        });
    };
    let Some(password) = request.password.filter(|s| !s.is_empty()) else {
        return Err(Error::BadRequest {
            message: "Missing required field: password".to_string(),
        });
    };
    validate_password(&password, &state.config)?;

    let display_name = request.display_name.filter(|s| !s.is_empty()).unwrap_or_else(|| identifier.clone());
    let verifier = hash_password(password, argon2_params(&state.config)).await?;

    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let user = Users::new(&mut tx)
        .create(&UserCreateDBRequest {
            email: identifier,
            display_name,
            role: Role::Customer,
            active: true,
        })
        .await?;
    Credentials::new(&mut tx)
        .create(&CredentialCreateDBRequest {
            user_id: user.id,
            verifier,
            salt: None,
        })
        .await?;
    tx.commit().await.map_err(DbError::from)?;

    info!(email = %user.email, "Registered new user");
    Ok((
        StatusCode::CREATED,
        Json(json!({"ok": true, "user": UserResponse::from(user)})),
    ))
}

/// POST /login - verify credentials and mint a session token
#[instrument(skip(state, headers, request), err)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<LoginResponse> {
    let Some(identifier) = request.identifier.filter(|s| !s.is_empty()) else {
        return Err(Error::BadRequest {
            message: "Missing required field: identifier".to_string(),
        });
    };
    let Some(password) = request.password.filter(|s| !s.is_empty()) else {
        return Err(Error::BadRequest {
            message: "Missing required field: password".to_string(),
        });
    };

    // Unknown account, inactive account, missing credential, and wrong
    // password all get the same answer so existence is not leaked.
    let invalid = || Error::Unauthenticated {
        message: Some("Invalid identifier or password".to_string()),
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let user = Users::new(&mut conn)
        .get_user_by_email(&identifier)
        .await?
        .filter(|u| u.active)
        .ok_or_else(invalid)?;
    let credential = Credentials::new(&mut conn)
        .latest_for_user(user.id)
        .await?
        .ok_or_else(invalid)?;

    let password_ok = tokio::task::spawn_blocking(move || {
        verify_password(&password, &credential.verifier, credential.salt.as_deref())
    })
    .await
    .map_err(|_| Error::Internal {
        operation: "run password verification task".to_string(),
    })?;
    if !password_ok {
        return Err(invalid());
    }

    let token = crate::auth::password::generate_session_token();
    let expires_at = Utc::now()
        + chrono::Duration::from_std(state.config.session.duration).map_err(|_| Error::Internal {
            operation: "compute session expiry".to_string(),
        })?;
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    Sessions::new(&mut conn)
        .issue(&SessionCreateDBRequest {
            token: token.clone(),
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            expires_at,
            user_agent,
            client_ip,
        })
        .await?;

    info!(email = %user.email, "User logged in");
    Ok(LoginResponse {
        cookie: create_session_cookie(&token, &state.config.session),
    })
}

/// POST /logout - revoke the presented session and clear the cookie.
///
/// Requires a valid session, like every other authenticated route. Once the
/// token checks out, revocation itself is best-effort: a storage hiccup is
/// logged, not surfaced, and the token stays revocable by a retry since the
/// row is still there.
#[instrument(skip(state, request), err)]
pub async fn logout(State(state): State<AppState>, request: Request) -> Result<LogoutResponse> {
    let (parts, _) = request.into_parts();

    let Some(token) = extract_token(&parts, &state.config.session) else {
        return Err(Error::Unauthenticated {
            message: Some("Missing session token".to_string()),
        });
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    if Sessions::new(&mut conn).find_active(&token).await?.is_none() {
        return Err(Error::Unauthenticated {
            message: Some("Invalid or expired session".to_string()),
        });
    }

    if let Err(error) = Sessions::new(&mut conn).revoke(&token).await {
        warn!(%error, "Failed to revoke session during logout");
    }

    Ok(LogoutResponse {
        cookie: clear_session_cookie(&state.config.session),
    })
}

/// GET /me - identity behind the presented token
pub async fn me(current_user: CurrentUser) -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "user": SessionUser {
            identifier: current_user.email,
            role: current_user.role,
        }
    }))
}
