//! Authenticated-request extractor.

use crate::api::models::users::Role;
use crate::auth::session::extract_token;
use crate::db::handlers::Sessions;
use crate::errors::Error;
use crate::AppState;
use crate::types::UserId;
use axum::{extract::FromRequestParts, http::request::Parts};

/// The user behind a validated session token.
///
/// Extracting this from a request performs the session lookup; handlers that
/// take a `CurrentUser` argument are authenticated by construction. Identity
/// comes from the token row itself, so no users-table query is needed.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    /// Admin-only guard for user management endpoints
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(Error::InsufficientPermissions {
                resource: "user management".to_string(),
            })
        }
    }

    /// Catalog writes are allowed for operators and admins
    pub fn require_operator(&self) -> Result<(), Error> {
        match self.role {
            Role::Admin | Role::Operator => Ok(()),
            Role::Customer => Err(Error::InsufficientPermissions {
                resource: "catalog management".to_string(),
            }),
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(parts, &state.config.session) else {
            return Err(Error::Unauthenticated {
                message: Some("Missing session token".to_string()),
            });
        };

        let mut conn = state.db.acquire().await.map_err(crate::db::errors::DbError::from)?;
        let session = Sessions::new(&mut conn).find_active(&token).await?;

        // Unknown, revoked, and expired tokens get the same answer
        let Some(session) = session else {
            return Err(Error::Unauthenticated {
                message: Some("Invalid or expired session".to_string()),
            });
        };

        Ok(CurrentUser {
            user_id: session.user_id,
            email: session.email,
            role: session.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user_with_role(role: Role) -> CurrentUser {
        CurrentUser {
            user_id: Uuid::new_v4(),
            email: "role@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(user_with_role(Role::Admin).require_admin().is_ok());
        assert!(user_with_role(Role::Operator).require_admin().is_err());
        assert!(user_with_role(Role::Customer).require_admin().is_err());
    }

    #[test]
    fn test_require_operator() {
        assert!(user_with_role(Role::Admin).require_operator().is_ok());
        assert!(user_with_role(Role::Operator).require_operator().is_ok());
        assert!(user_with_role(Role::Customer).require_operator().is_err());
    }
}
