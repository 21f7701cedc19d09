//! Cart behavior over the public API: adding, updating, and removing lines,
//! guest identity minting, and the price snapshot rules.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use tamarind_core::{ProductId, Role};
use tamarind_integration_tests::{TestContext, money};

/// Seed an admin plus one published product priced at 10.
async fn seeded_context() -> (TestContext, ProductId) {
    let ctx = TestContext::new();
    let admin = ctx
        .create_user("Admin User", "admin@example.com", Role::Admin)
        .await;
    let product = ctx
        .create_product("TEE-001", Decimal::from(10), admin.id)
        .await;
    (ctx, product.id)
}

#[tokio::test]
async fn test_first_guest_add_creates_cart_and_mints_identity() {
    let (ctx, product_id) = seeded_context().await;

    let (status, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "quantity": 2,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let guest_id = cart["owner"]["guest"].as_str().unwrap();
    assert!(guest_id.starts_with("guest_"), "got owner {:?}", cart["owner"]);
    assert_eq!(cart["products"].as_array().unwrap().len(), 1);
    assert_eq!(cart["products"][0]["quantity"], 2);
    assert_eq!(money(&cart, "total_price"), Decimal::from(20));
}

#[tokio::test]
async fn test_adding_the_same_line_accumulates_quantity() {
    let (ctx, product_id) = seeded_context().await;

    let (_, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "quantity": 2,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;
    let guest_id = cart["owner"]["guest"].as_str().unwrap().to_string();

    let (status, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "quantity": 3,
                "size": "M",
                "color": "Black",
                "guest_id": guest_id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["products"].as_array().unwrap().len(), 1);
    assert_eq!(cart["products"][0]["quantity"], 5);
    assert_eq!(money(&cart, "total_price"), Decimal::from(50));
}

#[tokio::test]
async fn test_a_different_size_gets_its_own_line() {
    let (ctx, product_id) = seeded_context().await;

    let (_, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;
    let guest_id = cart["owner"]["guest"].as_str().unwrap().to_string();

    let (_, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "size": "L",
                "color": "Black",
                "guest_id": guest_id,
            })),
        )
        .await;

    assert_eq!(cart["products"].as_array().unwrap().len(), 2);
    assert_eq!(money(&cart, "total_price"), Decimal::from(20));
}

#[tokio::test]
async fn test_add_rejects_a_non_positive_quantity() {
    let (ctx, product_id) = seeded_context().await;

    let (status, body) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "quantity": 0,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Quantity must be at least 1");
}

#[tokio::test]
async fn test_add_with_an_unknown_product_is_not_found() {
    let (ctx, _) = seeded_context().await;

    let (status, body) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": ProductId::generate(),
                "size": "M",
                "color": "Black",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn test_update_sets_quantity_and_zero_removes_the_line() {
    let (ctx, product_id) = seeded_context().await;

    let (_, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "quantity": 2,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;
    let guest_id = cart["owner"]["guest"].as_str().unwrap().to_string();

    let (status, cart) = ctx
        .put(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "quantity": 4,
                "size": "M",
                "color": "Black",
                "guest_id": guest_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["products"][0]["quantity"], 4);
    assert_eq!(money(&cart, "total_price"), Decimal::from(40));

    let (status, cart) = ctx
        .put(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "quantity": 0,
                "size": "M",
                "color": "Black",
                "guest_id": guest_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["products"].as_array().unwrap().is_empty());
    assert_eq!(money(&cart, "total_price"), Decimal::ZERO);
}

#[tokio::test]
async fn test_update_of_an_unknown_line_is_not_found() {
    let (ctx, product_id) = seeded_context().await;

    let (_, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;
    let guest_id = cart["owner"]["guest"].as_str().unwrap().to_string();

    // Same product, different color: not the same line.
    let (status, body) = ctx
        .put(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "quantity": 3,
                "size": "M",
                "color": "White",
                "guest_id": guest_id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found in cart");
}

#[tokio::test]
async fn test_remove_deletes_only_the_matching_line() {
    let (ctx, product_id) = seeded_context().await;

    let (_, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;
    let guest_id = cart["owner"]["guest"].as_str().unwrap().to_string();
    ctx.post(
        "/api/cart",
        None,
        Some(json!({
            "product_id": product_id,
            "size": "L",
            "color": "Black",
            "guest_id": guest_id,
        })),
    )
    .await;

    let (status, cart) = ctx
        .delete(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "size": "M",
                "color": "Black",
                "guest_id": guest_id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let lines = cart["products"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["size"], "L");
}

#[tokio::test]
async fn test_fetch_without_any_identity_is_not_found() {
    let (ctx, _) = seeded_context().await;

    let (status, body) = ctx.get("/api/cart", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cart not found");
}

#[tokio::test]
async fn test_fetch_returns_the_guest_cart() {
    let (ctx, product_id) = seeded_context().await;

    let (_, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product_id,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;
    let guest_id = cart["owner"]["guest"].as_str().unwrap().to_string();

    let (status, fetched) = ctx
        .get(&format!("/api/cart?guest_id={guest_id}"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], cart["id"]);
}

#[tokio::test]
async fn test_cart_lines_keep_their_price_snapshot() {
    let ctx = TestContext::new();
    let admin = ctx
        .create_user("Admin User", "admin@example.com", Role::Admin)
        .await;
    let shopper = ctx
        .create_user("Shopper", "shopper@example.com", Role::Customer)
        .await;
    let product = ctx
        .create_product("TEE-001", Decimal::from(10), admin.id)
        .await;
    let admin_token = ctx.token_for(&admin);
    let shopper_token = ctx.token_for(&shopper);

    let (status, _) = ctx
        .post(
            "/api/cart",
            Some(&shopper_token),
            Some(json!({
                "product_id": product.id,
                "quantity": 2,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Reprice the product after the line was snapshotted.
    let (status, _) = ctx
        .put(
            &format!("/api/admin/products/{}", product.id),
            Some(&admin_token),
            Some(json!({"price": "99"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, cart) = ctx.get("/api/cart", Some(&shopper_token)).await;
    assert_eq!(money(&cart["products"][0], "price"), Decimal::from(10));

    // Accumulating into the existing line keeps the old snapshot too.
    let (_, cart) = ctx
        .post(
            "/api/cart",
            Some(&shopper_token),
            Some(json!({
                "product_id": product.id,
                "quantity": 3,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;
    assert_eq!(cart["products"][0]["quantity"], 5);
    assert_eq!(money(&cart, "total_price"), Decimal::from(50));
}
