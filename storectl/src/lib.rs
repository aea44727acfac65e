//! # storectl: storefront control backend
//!
//! `storectl` is the backend for a small storefront: user registration and
//! login with hashed credentials, database-backed session tokens, CRUD
//! endpoints for users and catalog products, and a thin proxy to a
//! third-party character API.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); all persistent
//! state lives in PostgreSQL. Sessions are opaque random tokens stored in the
//! `session_tokens` table and validated with a single indexed lookup on every
//! authenticated request, so any number of instances can share one database
//! with no coordination.
//!
//! ### Request flow
//!
//! A login request verifies the submitted password against the user's latest
//! credential row (Argon2id, with a legacy SHA-256 scheme still accepted for
//! imported rows), mints a token, writes it to the session store, and sets it
//! as an HTTP-only cookie. Subsequent requests present the token via cookie,
//! bearer header, or query parameter; the [`auth::CurrentUser`] extractor
//! resolves it back to an identity. Logout flips the row's revoked flag; rows
//! are never deleted, so the table doubles as a login audit trail.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use storectl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = storectl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     storectl::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::password::{Argon2Params, hash_string_with_params},
    db::handlers::{Credentials, Repository, Users},
    db::models::{credentials::CredentialCreateDBRequest, users::UserCreateDBRequest},
};
use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, patch, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};

pub use types::{CredentialId, ProductId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Shared client for the character proxy
    pub http: reqwest::Client,
}

/// Get the storectl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: if the user already exists, a provided password is recorded as
/// a fresh credential row (verification always uses the latest row); otherwise
/// the call is a no-op. Called during application startup so a fresh
/// deployment is never locked out.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    email: &str,
    password: Option<&str>,
    params: Argon2Params,
    db: &PgPool,
) -> anyhow::Result<UserId> {
    let verifier = password.map(|pwd| hash_string_with_params(pwd, params)).transpose()?;

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    let user_id = match user_repo.get_user_by_email(email).await? {
        Some(existing) => existing.id,
        None => {
            let created = user_repo
                .create(&UserCreateDBRequest {
                    email: email.to_string(),
                    display_name: email.to_string(),
                    role: Role::Admin,
                    active: true,
                })
                .await?;
            info!(email = %email, "Created initial admin user");
            created.id
        }
    };

    if let Some(verifier) = verifier {
        Credentials::new(&mut tx)
            .create(&CredentialCreateDBRequest {
                user_id,
                verifier,
                salt: None,
            })
            .await?;
    }

    tx.commit().await?;
    Ok(user_id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Session lifecycle routes at root level
    let auth_routes = Router::new()
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route("/logout", post(api::handlers::auth::logout))
        .route("/me", get(api::handlers::auth::me));

    let api_routes = Router::new()
        // User management (admin only)
        .route("/users", get(api::handlers::users::list_users))
        .route("/users", post(api::handlers::users::create_user))
        .route("/users/{id}", get(api::handlers::users::get_user))
        .route("/users/{id}", patch(api::handlers::users::update_user))
        .route("/users/{id}", delete(api::handlers::users::delete_user))
        // Catalog (reads for any session, writes for operators/admins)
        .route("/products", get(api::handlers::products::list_products))
        .route("/products", post(api::handlers::products::create_product))
        .route("/products/{id}", get(api::handlers::products::get_product))
        .route("/products/{id}", patch(api::handlers::products::update_product))
        .route("/products/{id}", delete(api::handlers::products::delete_product))
        // Third-party character proxy
        .route("/characters/{id}", get(api::handlers::characters::get_character));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .nest("/api", api_routes)
        .with_state(state)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, and bootstraps the admin user
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting storectl with configuration: {:#?}", config);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.pool.max_connections)
            .min_connections(config.database.pool.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.database.pool.acquire_timeout_secs))
            .connect(&config.database.url)
            .await?;
        migrator().run(&pool).await?;

        let params = Argon2Params {
            memory_kib: config.auth.password.argon2_memory_kib,
            iterations: config.auth.password.argon2_iterations,
            parallelism: config.auth.password.argon2_parallelism,
        };
        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), params, &pool).await?;

        Self::with_pool(config, pool)
    }

    /// Build the application around an existing pool (migrations already run)
    pub fn with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.characters.timeout).build()?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).http(http).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "storectl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::create_initial_admin_user;
    use crate::auth::password::Argon2Params;
    use crate::db::handlers::{Credentials, Users};
    use sqlx::PgPool;

    fn params() -> Argon2Params {
        Argon2Params { memory_kib: 8, iterations: 1, parallelism: 1 }
    }

    #[sqlx::test]
    async fn test_admin_bootstrap_is_idempotent(pool: PgPool) {
        let first = create_initial_admin_user("admin@example.com", Some("AdminPass1"), params(), &pool)
            .await
            .unwrap();
        let second = create_initial_admin_user("admin@example.com", None, params(), &pool)
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn)
            .get_user_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, crate::api::models::users::Role::Admin);

        // Only the first call wrote a credential
        let credential = Credentials::new(&mut conn).latest_for_user(first).await.unwrap();
        assert!(credential.is_some());
    }

    #[sqlx::test]
    async fn test_admin_bootstrap_without_password(pool: PgPool) {
        let user_id = create_initial_admin_user("nopass@example.com", None, params(), &pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let credential = Credentials::new(&mut conn).latest_for_user(user_id).await.unwrap();
        assert!(credential.is_none());
    }
}
