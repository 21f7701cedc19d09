//! The unauthenticated surface: health probes, the public catalog, the
//! newsletter, and the token-gating rules shared by every protected route.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tamarind_api::store::UserStore;
use tamarind_core::Role;
use tamarind_integration_tests::{TestContext, product_input};

#[tokio::test]
async fn test_health_probes_respond() {
    let ctx = TestContext::new();

    let response = ctx
        .request(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");

    let (status, _) = ctx.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_product_listing_shows_only_published_products() {
    let ctx = TestContext::new();
    let admin = ctx
        .create_user("Admin", "admin@example.com", Role::Admin)
        .await;
    ctx.create_product("TEE-001", Decimal::from(10), admin.id)
        .await;
    let mut hidden = product_input("TEE-002", Decimal::from(10));
    hidden.is_published = false;
    let hidden = ctx.create_product_from(hidden, admin.id).await;

    let (status, listing) = ctx.get("/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    let skus: Vec<&str> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|product| product["sku"].as_str().unwrap())
        .collect();
    assert_eq!(skus, ["TEE-001"]);

    // The detail route still resolves unpublished products.
    let (status, product) = ctx.get(&format!("/api/products/{}", hidden.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["is_published"], false);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .get(
            &format!("/api/products/{}", tamarind_core::ProductId::generate()),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn test_subscribe_normalizes_and_rejects_duplicates() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/api/subscribe",
            None,
            Some(json!({"email": "  News@Example.COM "})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Successfully subscribed to the newsletter!");

    // The stored address is lowercased, so the raw form collides.
    let (status, body) = ctx
        .post(
            "/api/subscribe",
            None,
            Some(json!({"email": "news@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email is already subscribed");
}

#[tokio::test]
async fn test_subscribe_validates_the_address() {
    let ctx = TestContext::new();

    let (status, body) = ctx.post("/api/subscribe", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email is required");

    let (status, body) = ctx
        .post("/api/subscribe", None, Some(json!({"email": "not-an-address"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "email must contain an @ symbol");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/api/orders/my-orders", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not authorized");
}

#[tokio::test]
async fn test_non_bearer_authorization_is_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .request(
            Request::builder()
                .uri("/api/orders/my-orders")
                .header(header::AUTHORIZATION, "Token abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Not authorized");
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let ctx = TestContext::new();
    let user = ctx
        .create_user("Shopper", "shopper@example.com", Role::Customer)
        .await;
    let token = ctx.token_for(&user);

    // Flip the last signature nibble.
    let flipped = if token.ends_with('0') { "1" } else { "0" };
    let tampered = format!("{}{flipped}", &token[..token.len() - 1]);

    let (status, body) = ctx.get("/api/orders/my-orders", Some(&tampered)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token, authorization denied");
}

#[tokio::test]
async fn test_token_for_a_deleted_user_is_rejected() {
    let ctx = TestContext::new();
    let user = ctx
        .create_user("Shopper", "shopper@example.com", Role::Customer)
        .await;
    let token = ctx.token_for(&user);
    assert!(ctx.store().delete_user(user.id).await.unwrap());

    let (status, body) = ctx.get("/api/orders/my-orders", Some(&token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token, authorization denied");
}

#[tokio::test]
async fn test_garbage_bearer_falls_back_to_the_guest_cart() {
    let ctx = TestContext::new();
    let admin = ctx
        .create_user("Admin", "admin@example.com", Role::Admin)
        .await;
    let product = ctx
        .create_product("TEE-001", Decimal::from(10), admin.id)
        .await;

    let (status, cart) = ctx
        .post(
            "/api/cart",
            None,
            Some(json!({
                "product_id": product.id,
                "quantity": 1,
                "size": "M",
                "color": "Black",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let guest_id = cart["owner"]["guest"].as_str().unwrap().to_string();

    // Cart routes take the caller optionally, so a broken token does not
    // reject the request; it just leaves it anonymous.
    let (status, fetched) = ctx
        .get(
            &format!("/api/cart?guest_id={guest_id}"),
            Some("not-a-token"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["owner"]["guest"], guest_id);
}

#[tokio::test]
async fn test_error_envelope_shape() {
    let ctx = TestContext::new();

    let (_, body) = ctx
        .get(
            &format!("/api/products/{}", tamarind_core::ProductId::generate()),
            None,
        )
        .await;

    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert_eq!(object["success"], false);
    assert!(object["message"].is_string());
}
