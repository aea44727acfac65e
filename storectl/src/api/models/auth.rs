//! API models for registration, login, and session endpoints.

use crate::api::models::users::Role;
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Body for POST /register.
///
/// Optional fields let handlers answer missing input with a 400 rather than a
/// deserialization error.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub identifier: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
}

/// Body for POST /login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub identifier: Option<String>,
    pub password: Option<String>,
}

/// The identity slice exposed by GET /me
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub identifier: String,
    pub role: Role,
}

/// Successful login: `{ok:true}` plus the session cookie
#[derive(Debug)]
pub struct LoginResponse {
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::SET_COOKIE, self.cookie)],
            Json(json!({"ok": true})),
        )
            .into_response()
    }
}

/// Logout always succeeds client-side: `{ok:true}` plus a clearing cookie
#[derive(Debug)]
pub struct LogoutResponse {
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::SET_COOKIE, self.cookie)],
            Json(json!({"ok": true})),
        )
            .into_response()
    }
}
