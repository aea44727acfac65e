//! Database layer: repositories and entity models.
//!
//! - [`handlers`]: repository types executing parameterized SQL against
//!   `PgConnection`
//! - [`models`]: database request/response structs
//! - [`errors`]: `DbError` categorization of sqlx failures

pub mod errors;
pub mod handlers;
pub mod models;
