//! Database repository for password credentials.
//!
//! A user may accumulate several credential rows over time (imports, password
//! changes). Login always verifies against the most recent row.

use crate::db::{
    errors::Result,
    models::credentials::{Credential, CredentialCreateDBRequest},
};
use crate::types::{UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct Credentials<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Credentials<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a new credential row for a user
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &CredentialCreateDBRequest) -> Result<Credential> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO credentials (id, user_id, verifier, salt)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.verifier)
        .bind(&request.salt)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(credential)
    }

    /// Fetch the newest credential for a user, if any.
    ///
    /// Ties on `created_at` are broken by id so the result is deterministic.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn latest_for_user(&mut self, user_id: UserId) -> Result<Option<Credential>> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            SELECT * FROM credentials
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(credential)
    }
}
