//! HTTP API: request/response models and route handlers.

pub mod handlers;
pub mod models;
