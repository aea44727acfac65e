//! Database repositories.
//!
//! Each repository wraps a `&mut PgConnection` and exposes the parameterized
//! queries for one table:
//!
//! - [`Users`]: account rows, lookup by id or email
//! - [`Credentials`]: password verifier rows, latest-wins semantics
//! - [`Sessions`]: token issue / validity lookup / revocation
//! - [`Products`]: catalog rows
//!
//! [`Users`] and [`Products`] implement the common [`Repository`] trait;
//! credentials and sessions have bespoke operations instead of full CRUD.

pub mod credentials;
pub mod products;
pub mod repository;
pub mod sessions;
pub mod users;

pub use credentials::Credentials;
pub use products::Products;
pub use repository::Repository;
pub use sessions::Sessions;
pub use users::Users;
