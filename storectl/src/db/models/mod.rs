//! Database entity models, grouped per table.

pub mod credentials;
pub mod products;
pub mod sessions;
pub mod users;
