//! HTTP route handlers.

pub mod auth;
pub mod characters;
pub mod products;
pub mod users;
