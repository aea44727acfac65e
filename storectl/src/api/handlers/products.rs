//! Catalog product endpoints.
//!
//! Reads are open to any valid session; writes need operator or admin.

use crate::{
    AppState,
    api::models::products::{ProductCreateRequest, ProductListQuery, ProductResponse, ProductUpdateRequest},
    auth::CurrentUser,
    db::{
        errors::DbError,
        handlers::{Products, Repository, products::ProductFilter},
        models::products::{ProductCreateDBRequest, ProductUpdateDBRequest},
    },
    errors::{Error, Result},
    types::ProductId,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::{info, instrument};

/// GET /api/products
#[instrument(skip(state, _current_user), err)]
pub async fn list_products(
    _current_user: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let products = Products::new(&mut conn)
        .list(&ProductFilter {
            skip: query.skip,
            limit: query.limit.clamp(1, 1000),
            active: query.active,
        })
        .await?;

    let products: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(Json(json!({"ok": true, "products": products})))
}

/// GET /api/products/{id}
#[instrument(skip(state, _current_user), err)]
pub async fn get_product(
    _current_user: CurrentUser,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let product = Products::new(&mut conn)
        .get_by_id(product_id)
        .await?
        .ok_or(Error::NotFound {
            resource: "Product".to_string(),
            id: product_id.to_string(),
        })?;

    Ok(Json(json!({"ok": true, "product": ProductResponse::from(product)})))
}

/// POST /api/products
#[instrument(skip(state, current_user, request), err)]
pub async fn create_product(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Json(request): Json<ProductCreateRequest>,
) -> Result<impl IntoResponse> {
    current_user.require_operator()?;

    let Some(sku) = request.sku.filter(|s| !s.is_empty()) else {
        return Err(Error::BadRequest {
            message: "Missing required field: sku".to_string(),
        });
    };
    let Some(name) = request.name.filter(|s| !s.is_empty()) else {
        return Err(Error::BadRequest {
            message: "Missing required field: name".to_string(),
        });
    };
    let Some(price) = request.price else {
        return Err(Error::BadRequest {
            message: "Missing required field: price".to_string(),
        });
    };
    if price.is_sign_negative() {
        return Err(Error::BadRequest {
            message: "Price cannot be negative".to_string(),
        });
    }
    let stock = request.stock.unwrap_or(0);
    if stock < 0 {
        return Err(Error::BadRequest {
            message: "Stock cannot be negative".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let product = Products::new(&mut conn)
        .create(&ProductCreateDBRequest {
            sku,
            name,
            description: request.description,
            price,
            stock,
            image_url: request.image_url,
            active: request.active.unwrap_or(true),
        })
        .await?;

    info!(sku = %product.sku, "Created product");
    Ok((
        StatusCode::CREATED,
        Json(json!({"ok": true, "product": ProductResponse::from(product)})),
    ))
}

/// PATCH /api/products/{id}
#[instrument(skip(state, current_user, request), err)]
pub async fn update_product(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(request): Json<ProductUpdateRequest>,
) -> Result<impl IntoResponse> {
    current_user.require_operator()?;

    if let Some(price) = request.price {
        if price.is_sign_negative() {
            return Err(Error::BadRequest {
                message: "Price cannot be negative".to_string(),
            });
        }
    }
    if let Some(stock) = request.stock {
        if stock < 0 {
            return Err(Error::BadRequest {
                message: "Stock cannot be negative".to_string(),
            });
        }
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let product = Products::new(&mut conn)
        .update(
            product_id,
            &ProductUpdateDBRequest {
                name: request.name,
                description: request.description,
                price: request.price,
                stock: request.stock,
                image_url: request.image_url,
                active: request.active,
            },
        )
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::NotFound {
                resource: "Product".to_string(),
                id: product_id.to_string(),
            },
            other => other.into(),
        })?;

    Ok(Json(json!({"ok": true, "product": ProductResponse::from(product)})))
}

/// DELETE /api/products/{id}
#[instrument(skip(state, current_user), err)]
pub async fn delete_product(
    current_user: CurrentUser,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    current_user.require_operator()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let deleted = Products::new(&mut conn).delete(product_id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "Product".to_string(),
            id: product_id.to_string(),
        });
    }

    info!(product_id = %product_id, "Deleted product");
    Ok(Json(json!({"ok": true})))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_admin, create_test_app, create_test_user, login_user};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[test_log::test(sqlx::test)]
    async fn test_products_crud_as_admin(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_test_admin(&pool, "admin@example.com", "AdminPass1").await;
        let token = login_user(&server, "admin@example.com", "AdminPass1").await;
        let auth = ("authorization", format!("Bearer {token}"));

        let response = server
            .post("/api/products")
            .add_header(auth.0, auth.1.clone())
            .json(&json!({"sku": "WID-001", "name": "Widget", "price": "19.99", "stock": 5}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["product"]["price"], json!("19.99"));
        let product_id = body["product"]["id"].as_str().unwrap().to_string();

        let response = server
            .get(&format!("/api/products/{product_id}"))
            .add_header(auth.0, auth.1.clone())
            .await;
        response.assert_status_ok();

        let response = server
            .patch(&format!("/api/products/{product_id}"))
            .add_header(auth.0, auth.1.clone())
            .json(&json!({"stock": 0, "active": false}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["product"]["active"], json!(false));

        let response = server
            .delete(&format!("/api/products/{product_id}"))
            .add_header(auth.0, auth.1.clone())
            .await;
        response.assert_status_ok();

        let response = server
            .get(&format!("/api/products/{product_id}"))
            .add_header(auth.0, auth.1)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(sqlx::test)]
    async fn test_customers_can_read_but_not_write(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_test_user(&pool, "shopper@example.com", "Password1").await;
        let token = login_user(&server, "shopper@example.com", "Password1").await;
        let auth = ("authorization", format!("Bearer {token}"));

        let response = server.get("/api/products").add_header(auth.0, auth.1.clone()).await;
        response.assert_status_ok();

        let response = server
            .post("/api/products")
            .add_header(auth.0, auth.1)
            .json(&json!({"sku": "WID-002", "name": "Widget", "price": "9.99"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[test_log::test(sqlx::test)]
    async fn test_duplicate_sku_is_409(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_test_admin(&pool, "admin@example.com", "AdminPass1").await;
        let token = login_user(&server, "admin@example.com", "AdminPass1").await;

        let body = json!({"sku": "WID-DUP", "name": "Widget", "price": "9.99"});
        server
            .post("/api/products")
            .add_header("authorization", format!("Bearer {token}"))
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/products")
            .add_header("authorization", format!("Bearer {token}"))
            .json(&body)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[test_log::test(sqlx::test)]
    async fn test_create_product_missing_fields_is_400(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_test_admin(&pool, "admin@example.com", "AdminPass1").await;
        let token = login_user(&server, "admin@example.com", "AdminPass1").await;

        let response = server
            .post("/api/products")
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "No SKU", "price": "9.99"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(sqlx::test)]
    async fn test_products_require_session(pool: PgPool) {
        let server = create_test_app(pool).await;
        server.get("/api/products").await.assert_status(StatusCode::UNAUTHORIZED);
    }
}
