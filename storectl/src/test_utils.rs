//! Shared helpers for integration tests.

use crate::{
    Application, Config,
    api::models::users::Role,
    auth::password::{Argon2Params, hash_string_with_params},
    db::handlers::{Credentials, Repository, Users},
    db::models::{credentials::CredentialCreateDBRequest, users::{UserCreateDBRequest, UserDBResponse}},
};
use axum_test::TestServer;
use serde_json::json;
use sqlx::PgPool;

/// Cheap argon2 parameters so password-hashing tests stay fast
pub fn test_argon2_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}

/// A config suitable for tests: registration open, cheap hashing
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.auth.password.argon2_memory_kib = 8;
    config.auth.password.argon2_iterations = 1;
    config.auth.password.argon2_parallelism = 1;
    config
}

/// Build a test server on top of an already-migrated pool
pub async fn create_test_app(pool: PgPool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: PgPool, config: Config) -> TestServer {
    Application::with_pool(config, pool)
        .expect("Failed to build test application")
        .into_test_server()
}

async fn create_user_with_role(pool: &PgPool, email: &str, password: &str, role: Role) -> UserDBResponse {
    let verifier = hash_string_with_params(password, test_argon2_params()).expect("Failed to hash test password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            display_name: email.to_string(),
            role,
            active: true,
        })
        .await
        .expect("Failed to create test user");
    Credentials::new(&mut conn)
        .create(&CredentialCreateDBRequest {
            user_id: user.id,
            verifier,
            salt: None,
        })
        .await
        .expect("Failed to create test credential");

    user
}

/// Create an active customer with an argon2 credential
pub async fn create_test_user(pool: &PgPool, email: &str, password: &str) -> UserDBResponse {
    create_user_with_role(pool, email, password, Role::Customer).await
}

/// Create an active admin with an argon2 credential
pub async fn create_test_admin(pool: &PgPool, email: &str, password: &str) -> UserDBResponse {
    create_user_with_role(pool, email, password, Role::Admin).await
}

/// Log in through the API and return the issued session token
pub async fn login_user(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/login")
        .json(&json!({"identifier": email, "password": password}))
        .await;
    response.assert_status_ok();
    response.cookie("st").value().to_string()
}
