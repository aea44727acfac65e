//! Admin-only user management endpoints.

use crate::{
    AppState,
    api::models::users::{ListQuery, Role, UserCreateRequest, UserResponse, UserUpdateRequest},
    auth::CurrentUser,
    db::{
        errors::DbError,
        handlers::{Credentials, Repository, Sessions, Users, users::UserFilter},
        models::{credentials::CredentialCreateDBRequest, users::{UserCreateDBRequest, UserUpdateDBRequest}},
    },
    errors::{Error, Result},
    types::UserId,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::{info, instrument};

/// GET /api/users
#[instrument(skip(state, current_user), err)]
pub async fn list_users(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    current_user.require_admin()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let users = Users::new(&mut conn)
        .list(&UserFilter::new(query.skip, query.limit.clamp(1, 1000)))
        .await?;

    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(Json(json!({"ok": true, "users": users})))
}

/// GET /api/users/{id}
#[instrument(skip(state, current_user), err)]
pub async fn get_user(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse> {
    current_user.require_admin()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let user = Users::new(&mut conn).get_by_id(user_id).await?.ok_or(Error::NotFound {
        resource: "User".to_string(),
        id: user_id.to_string(),
    })?;

    Ok(Json(json!({"ok": true, "user": UserResponse::from(user)})))
}

/// POST /api/users
#[instrument(skip(state, current_user, request), err)]
pub async fn create_user(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<UserCreateRequest>,
) -> Result<impl IntoResponse> {
    current_user.require_admin()?;

    let Some(email) = request.email.filter(|s| !s.is_empty()) else {
        return Err(Error::BadRequest {
            message: "Missing required field: email".to_string(),
        });
    };
    let Some(password) = request.password.filter(|s| !s.is_empty()) else {
        return Err(Error::BadRequest {
            message: "Missing required field: password".to_string(),
        });
    };
    if password.len() < state.config.auth.password.min_length {
        return Err(Error::BadRequest {
            message: format!(
                "Password must be at least {} characters",
                state.config.auth.password.min_length
            ),
        });
    }

    let params = crate::auth::password::Argon2Params {
        memory_kib: state.config.auth.password.argon2_memory_kib,
        iterations: state.config.auth.password.argon2_iterations,
        parallelism: state.config.auth.password.argon2_parallelism,
    };
    let verifier = tokio::task::spawn_blocking(move || crate::auth::password::hash_string_with_params(&password, params))
        .await
        .map_err(|_| Error::Internal {
            operation: "run password hashing task".to_string(),
        })?
        .map_err(|_| Error::Internal {
            operation: "hash password".to_string(),
        })?;

    let mut tx = state.db.begin().await.map_err(DbError::from)?;
    let user = Users::new(&mut tx)
        .create(&UserCreateDBRequest {
            display_name: request.display_name.filter(|s| !s.is_empty()).unwrap_or_else(|| email.clone()),
            email,
            role: request.role.unwrap_or(Role::Customer),
            active: request.active.unwrap_or(true),
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

    info!(email = %user.email, "Admin created user");
    Ok((
        StatusCode::CREATED,
        Json(json!({"ok": true, "user": UserResponse::from(user)})),
    ))
}

/// PATCH /api/users/{id}
#[instrument(skip(state, current_user, request), err)]
pub async fn update_user(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(request): Json<UserUpdateRequest>,
) -> Result<impl IntoResponse> {
    current_user.require_admin()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let user = Users::new(&mut conn)
        .update(
            user_id,
            &UserUpdateDBRequest {
                display_name: request.display_name,
                role: request.role,
                active: request.active,
            },
        )
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::NotFound {
                resource: "User".to_string(),
                id: user_id.to_string(),
            },
            other => other.into(),
        })?;

    // Deactivation invalidates all live sessions immediately
    if request.active == Some(false) {
        Sessions::new(&mut conn).revoke_all_for_user(user_id).await?;
    }

    Ok(Json(json!({"ok": true, "user": UserResponse::from(user)})))
}

/// DELETE /api/users/{id}
#[instrument(skip(state, current_user), err)]
pub async fn delete_user(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse> {
    current_user.require_admin()?;

    if user_id == current_user.user_id {
        return Err(Error::BadRequest {
            message: "Cannot delete your own account".to_string(),
        });
    }

    // Session and credential rows cascade with the user
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let deleted = Users::new(&mut conn).delete(user_id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "User".to_string(),
            id: user_id.to_string(),
        });
    }

    info!(user_id = %user_id, "Admin deleted user");
    Ok(Json(json!({"ok": true})))
}
