//! Database models for password verifiers.

use crate::types::{CredentialId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Request to insert a new verifier row for a user.
///
/// `salt` is set only for legacy digest verifiers; argon2 PHC strings carry
/// their own salt.
#[derive(Debug, Clone)]
pub struct CredentialCreateDBRequest {
    pub user_id: UserId,
    pub verifier: String,
    pub salt: Option<String>,
}

/// A stored password verifier row
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    pub id: CredentialId,
    pub user_id: UserId,
    pub verifier: String,
    pub salt: Option<String>,
    pub created_at: DateTime<Utc>,
}
