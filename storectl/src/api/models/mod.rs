//! API request and response models.

pub mod auth;
pub mod products;
pub mod users;
