//! Database repository for session tokens.
//!
//! Tokens are opaque random strings and the row is the single source of truth
//! for validity. Logout and admin revocation flip the `revoked` flag; rows are
//! never deleted, so the table doubles as a login audit trail.

use crate::db::{
    errors::Result,
    models::sessions::{SessionCreateDBRequest, SessionToken},
};
use crate::types::{UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Sessions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a freshly issued token row
    #[instrument(
        skip(self, request),
        fields(user_id = %abbrev_uuid(&request.user_id), email = %request.email),
        err
    )]
    pub async fn issue(&mut self, request: &SessionCreateDBRequest) -> Result<SessionToken> {
        let session = sqlx::query_as::<_, SessionToken>(
            r#"
            INSERT INTO session_tokens (token, user_id, email, role, expires_at, user_agent, client_ip)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&request.token)
        .bind(request.user_id)
        .bind(&request.email)
        .bind(&request.role)
        .bind(request.expires_at)
        .bind(&request.user_agent)
        .bind(&request.client_ip)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(session)
    }

    /// Look up a token that is unrevoked and unexpired.
    ///
    /// Returns `None` for unknown, revoked, and expired tokens alike; callers
    /// cannot distinguish the three cases.
    #[instrument(skip(self, token), err)]
    pub async fn find_active(&mut self, token: &str) -> Result<Option<SessionToken>> {
        let session = sqlx::query_as::<_, SessionToken>(
            r#"
            SELECT * FROM session_tokens
            WHERE token = $1 AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(session)
    }

    /// Mark a token revoked. Returns whether a row was actually flipped;
    /// revoking an unknown or already-revoked token is not an error.
    #[instrument(skip(self, token), err)]
    pub async fn revoke(&mut self, token: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE session_tokens SET revoked = TRUE WHERE token = $1 AND revoked = FALSE")
            .bind(token)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke every live token for one user. Used when an account is
    /// deactivated or deleted by an admin.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn revoke_all_for_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("UPDATE session_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::auth::password::generate_session_token;
    use crate::db::handlers::{Repository, Users};
    use crate::db::models::users::UserCreateDBRequest;
    use chrono::{Duration, Utc};
    use sqlx::PgPool;

    async fn create_user(pool: &PgPool, email: &str) -> UserId {
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                display_name: "Session Test".to_string(),
                role: Role::Customer,
                active: true,
            })
            .await
            .unwrap()
            .id
    }

    fn request(user_id: UserId, email: &str, hours: i64) -> SessionCreateDBRequest {
        SessionCreateDBRequest {
            token: generate_session_token(),
            user_id,
            email: email.to_string(),
            role: Role::Customer,
            expires_at: Utc::now() + Duration::hours(hours),
            user_agent: None,
            client_ip: None,
        }
    }

    #[sqlx::test]
    async fn test_issued_token_is_active(pool: PgPool) {
        let user_id = create_user(&pool, "live@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let issued = repo.issue(&request(user_id, "live@example.com", 4)).await.unwrap();
        assert!(!issued.revoked);

        let found = repo.find_active(&issued.token).await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);
        assert_eq!(found.email, "live@example.com");
        assert_eq!(found.role, Role::Customer);
    }

    #[sqlx::test]
    async fn test_unknown_token_is_not_active(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();

        let found = Sessions::new(&mut conn)
            .find_active(&generate_session_token())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[sqlx::test]
    async fn test_expired_token_is_not_active(pool: PgPool) {
        let user_id = create_user(&pool, "expired@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        // Insert a row whose expiry is already in the past
        let issued = repo.issue(&request(user_id, "expired@example.com", -1)).await.unwrap();

        assert!(repo.find_active(&issued.token).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_expired_and_revoked_token_is_not_active(pool: PgPool) {
        let user_id = create_user(&pool, "stale@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        // Expired row still flips its revoked flag; the token stays inactive
        let issued = repo.issue(&request(user_id, "stale@example.com", -1)).await.unwrap();
        assert!(repo.revoke(&issued.token).await.unwrap());

        assert!(repo.find_active(&issued.token).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_revoke_is_idempotent(pool: PgPool) {
        let user_id = create_user(&pool, "revoke@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let issued = repo.issue(&request(user_id, "revoke@example.com", 4)).await.unwrap();

        assert!(repo.revoke(&issued.token).await.unwrap());
        assert!(repo.find_active(&issued.token).await.unwrap().is_none());

        // Revoking again, or revoking garbage, reports no change but no error
        assert!(!repo.revoke(&issued.token).await.unwrap());
        assert!(!repo.revoke("not-a-token").await.unwrap());
    }

    #[sqlx::test]
    async fn test_concurrent_sessions_are_independent(pool: PgPool) {
        let user_id = create_user(&pool, "multi@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let first = repo.issue(&request(user_id, "multi@example.com", 4)).await.unwrap();
        let second = repo.issue(&request(user_id, "multi@example.com", 4)).await.unwrap();
        assert_ne!(first.token, second.token);

        repo.revoke(&first.token).await.unwrap();

        assert!(repo.find_active(&first.token).await.unwrap().is_none());
        assert!(repo.find_active(&second.token).await.unwrap().is_some());
    }

    #[sqlx::test]
    async fn test_revoke_all_for_user(pool: PgPool) {
        let user_id = create_user(&pool, "bulk@example.com").await;
        let other_id = create_user(&pool, "other@example.com").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Sessions::new(&mut conn);

        let a = repo.issue(&request(user_id, "bulk@example.com", 4)).await.unwrap();
        let b = repo.issue(&request(user_id, "bulk@example.com", 4)).await.unwrap();
        let keep = repo.issue(&request(other_id, "other@example.com", 4)).await.unwrap();

        assert_eq!(repo.revoke_all_for_user(user_id).await.unwrap(), 2);
        assert!(repo.find_active(&a.token).await.unwrap().is_none());
        assert!(repo.find_active(&b.token).await.unwrap().is_none());
        assert!(repo.find_active(&keep.token).await.unwrap().is_some());
    }
}
