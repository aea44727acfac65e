//! API models for catalog products.

use crate::db::models::products::ProductDBResponse;
use crate::types::ProductId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body for POST /api/products (operator or admin)
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreateRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
}

/// Body for PATCH /api/products/{id}; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
}

/// Pagination and filtering for GET /api/products
#[derive(Debug, Clone, Deserialize)]
pub struct ProductListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub active: Option<bool>,
}

fn default_limit() -> i64 {
    100
}

/// A product as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductDBResponse> for ProductResponse {
    fn from(product: ProductDBResponse) -> Self {
        Self {
            id: product.id,
            sku: product.sku,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image_url: product.image_url,
            active: product.active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}
