//! Storefront routes driven in-process and over HTTP.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode},
};
use construmax_integration_tests::{
    MockCatalog, sheet_rows, spawn_storefront, storefront_config, test_state, unreachable_url,
};
use construmax_storefront::catalog::{CatalogLoader, CatalogSnapshot};
use construmax_storefront::cart::CART_STORAGE_KEY;
use construmax_storefront::middleware::REQUEST_ID_HEADER;
use construmax_storefront::routes;
use construmax_storefront::state::AppState;
use construmax_storefront::storage::{FileStore, KeyValueStore, MemoryStore};
use futures::StreamExt;
use serde_json::Value;
use tower::ServiceExt;

async fn fallback_state() -> AppState {
    test_state(&unreachable_url().await, Arc::new(MemoryStore::new())).await
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn cart_json(state: &AppState) -> Value {
    let response = send(routes::app(state.clone()), get("/api/cart")).await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = send(routes::app(fallback_state().await), get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_home_shows_featured_and_fallback_notice() {
    let response = send(routes::app(fallback_state().await), get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Taladro Percutor 650W"));
    // Featured but sold out
    assert!(!html.contains("Martillo Demoledor"));
    // Not featured
    assert!(!html.contains("Cable Eléctrico"));
    assert!(html.contains("Mostrando productos de referencia"));
}

#[tokio::test]
async fn test_home_from_remote_catalog() {
    let mock = MockCatalog::with_products(&sheet_rows()).await;
    let state = test_state(&mock.url(), Arc::new(MemoryStore::new())).await;

    let html = body_text(send(routes::app(state), get("/")).await).await;
    assert!(html.contains("Amoladora Angular 115mm"));
    assert!(html.contains("$ 32.999,50"));
    assert!(!html.contains("Mostrando productos de referencia"));
}

#[tokio::test]
async fn test_listing_filters_by_category_and_search() {
    let state = fallback_state().await;

    let html = body_text(send(routes::app(state.clone()), get("/products")).await).await;
    assert!(html.contains("Martillo Demoledor"));
    assert!(html.contains("Sin stock"));

    // Named categories hide sold-out products
    let html = body_text(
        send(routes::app(state.clone()), get("/products?category=construccion")).await,
    )
    .await;
    assert!(!html.contains("Martillo Demoledor"));
    assert!(html.contains("No hay productos disponibles"));

    let html = body_text(send(routes::app(state), get("/products?q=cable")).await).await;
    assert!(html.contains("Cable Eléctrico 2.5mm"));
    assert!(!html.contains("Taladro Percutor 650W"));
}

#[tokio::test]
async fn test_listing_htmx_request_gets_fragment() {
    let request = Request::builder()
        .uri("/products?category=electricidad")
        .header("hx-request", "true")
        .body(Body::empty())
        .unwrap();

    let html = body_text(send(routes::app(fallback_state().await), request).await).await;
    assert!(!html.contains("<html"));
    assert!(html.contains("Cable Eléctrico 2.5mm"));
    assert!(html.contains("Taladro Percutor 650W"));
}

#[tokio::test]
async fn test_add_to_cart_triggers_update() {
    let state = fallback_state().await;

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=taladro-001&quantity=2"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("HX-Trigger").unwrap(), "cart-updated");
    assert_eq!(body_text(response).await.trim(), "2");

    // Quantity defaults to one
    let response = send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=taladro-001"),
    )
    .await;
    assert_eq!(body_text(response).await.trim(), "3");

    let cart = cart_json(&state).await;
    assert_eq!(cart["itemCount"], 3);
    assert_eq!(cart["total"], 77_997.0);
    assert_eq!(cart["lines"][0]["productId"], "taladro-001");
    assert_eq!(cart["lines"][0]["price"], 25_999.0);
}

#[tokio::test]
async fn test_add_rejections() {
    let state = fallback_state().await;

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=taladro-001&quantity=16"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_text(response).await,
        "Stock insuficiente. Solo quedan 15 unidades"
    );

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=martillo-002"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=no-existe"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Producto no encontrado");

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=cable-003&quantity=0"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(cart_json(&state).await["itemCount"], 0);
}

#[tokio::test]
async fn test_update_and_remove() {
    let state = fallback_state().await;
    send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=cable-003&quantity=3"),
    )
    .await;

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/update", "product_id=cable-003&quantity=5"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("HX-Trigger").unwrap(), "cart-updated");
    let html = body_text(response).await;
    assert!(html.contains("id=\"cart-items\""));
    assert!(html.contains("$ 44.995,00"));

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/update", "product_id=cable-003&quantity=51"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(cart_json(&state).await["itemCount"], 5);

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/update", "product_id=cable-003&quantity=-1"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Tu carrito está vacío"));

    // Removing an absent line is fine
    let response = send(
        routes::app(state.clone()),
        post_form("/cart/remove", "product_id=cable-003"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cart_json(&state).await["itemCount"], 0);
}

#[tokio::test]
async fn test_cart_page_lists_dangling_lines() {
    let mock = MockCatalog::with_products(&sheet_rows()).await;
    let state = test_state(&mock.url(), Arc::new(MemoryStore::new())).await;

    send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=cinta-011&quantity=2"),
    )
    .await;

    // The product disappears from the sheet
    mock.set_response(200, r#"{"products": []}"#);
    let response = send(
        routes::app(state.clone()),
        Request::post("/catalog/refresh").body(Body::empty()).unwrap(),
    )
    .await;
    let refreshed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(refreshed["source"], "remote");
    assert_eq!(refreshed["count"], 0);

    let html = body_text(send(routes::app(state.clone()), get("/cart")).await).await;
    assert!(html.contains("cinta-011"));
    assert!(html.contains("Producto no disponible"));
    assert!(html.contains("$ 3.000,00"));
}

#[tokio::test]
async fn test_refresh_falls_back_then_recovers() {
    let mock = MockCatalog::with_products(&sheet_rows()).await;
    let state = test_state(&mock.url(), Arc::new(MemoryStore::new())).await;

    mock.set_response(500, "boom");
    let response = send(
        routes::app(state.clone()),
        Request::post("/catalog/refresh").body(Body::empty()).unwrap(),
    )
    .await;
    let refreshed: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(refreshed["source"], "fallback");
    assert_eq!(refreshed["count"], 3);

    mock.set_response(
        200,
        serde_json::json!({ "products": sheet_rows() }).to_string(),
    );
    state.refresh_catalog().await;

    let response = send(routes::app(state), get("/api/products")).await;
    let snapshot: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(snapshot["source"], "remote");
    assert_eq!(snapshot["products"][0]["id"], "amoladora-010");
    assert_eq!(snapshot["products"][0]["allCategories"][1], "electricidad");
}

#[tokio::test]
async fn test_cart_count_stream_sends_current_count() {
    let state = fallback_state().await;
    send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=cable-003&quantity=4"),
    )
    .await;

    let response = send(routes::app(state.clone()), get("/cart/count/stream")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    let first = String::from_utf8(first.to_vec()).unwrap();
    assert!(first.contains("event: count"));
    assert!(first.contains("data: 4"));

    send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=cable-003"),
    )
    .await;
    let next = body.next().await.unwrap().unwrap();
    assert!(String::from_utf8(next.to_vec()).unwrap().contains("data: 5"));

    state.begin_shutdown();
    assert!(body.next().await.is_none());
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_url = unreachable_url().await;

    let state = test_state(&catalog_url, Arc::new(FileStore::new(dir.path()))).await;
    send(
        routes::app(state),
        post_form("/cart/add", "product_id=taladro-001&quantity=2"),
    )
    .await;

    let stored = FileStore::new(dir.path()).get(CART_STORAGE_KEY).unwrap().unwrap();
    assert!(stored.contains("taladro-001"));

    let restarted = test_state(&catalog_url, Arc::new(FileStore::new(dir.path()))).await;
    assert_eq!(cart_json(&restarted).await["itemCount"], 2);
}

#[tokio::test]
async fn test_storefront_over_http() {
    let (base_url, server) = spawn_storefront(fallback_state().await).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base_url}/cart/count"))
        .header(REQUEST_ID_HEADER, "edge-7")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "edge-7");
    assert_eq!(response.text().await.unwrap().trim(), "0");

    let response = client
        .post(format!("{base_url}/cart/add"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("product_id=cable-003&quantity=2")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let cart: Value = client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["itemCount"], 2);

    server.abort();
}

#[tokio::test]
async fn test_out_of_range_price_cannot_overflow_cart() {
    let mock = MockCatalog::with_products(&serde_json::json!([
        { "id": "grua-900", "name": "Grúa Torre", "price": "1e30", "stock": 3 },
        { "id": "pala-901", "name": "Pala", "price": 4500, "stock": 10 }
    ]))
    .await;
    let state = test_state(&mock.url(), Arc::new(MemoryStore::new())).await;

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/add", "product_id=grua-900"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    for form in ["product_id=grua-900", "product_id=pala-901"] {
        let response = send(routes::app(state.clone()), post_form("/cart/add", form)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{form}");
        assert!(body_text(response).await.contains("supera el máximo"));
    }

    let response = send(
        routes::app(state.clone()),
        post_form("/cart/update", "product_id=grua-900&quantity=3"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let cart = cart_json(&state).await;
    assert_eq!(cart["itemCount"], 1);

    let response = send(routes::app(state), get("/cart")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_resources_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("resources")).unwrap();
    std::fs::write(dir.path().join("resources/taladro.jpg"), b"jpeg bytes").unwrap();

    let config = storefront_config(&unreachable_url().await, dir.path().to_path_buf());
    let loader = CatalogLoader::new(&config.catalog).unwrap();
    let state = AppState::new(
        config,
        loader,
        Arc::new(MemoryStore::new()),
        CatalogSnapshot::fallback(),
    );

    let response = send(routes::app(state.clone()), get("/resources/taladro.jpg")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "jpeg bytes");

    let response = send(routes::app(state), get("/resources/martillo.jpg")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
