//! Database models for session tokens.

use crate::api::models::users::Role;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Request to insert a freshly issued token row.
///
/// Email and role are denormalized at issuance time so validation stays a
/// single-table lookup.
#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub token: String,
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
}

/// A session token row as stored
#[derive(Debug, Clone, FromRow)]
pub struct SessionToken {
    pub token: String,
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
}
