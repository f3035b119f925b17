//! Order history, order detail and cancellation through the full router.

use axum::http::StatusCode;
use eshop_integration_tests::{
    FakeStoreApi, Failure, TestApp, body_text, location, order_detail, order_summary,
};

fn app_with_orders() -> TestApp {
    TestApp::new(
        FakeStoreApi::new()
            .with_orders(vec![
                order_summary("11111111-aaaa", "Pending", "12 MG Road"),
                order_summary("22222222-bbbb", "Delivered", "7 Park Street"),
                order_summary("33333333-cccc", "Shipped", "45 Brigade Road"),
            ])
            .with_order_detail("11111111-aaaa", order_detail("11111111-aaaa", "Pending"))
            .with_order_detail("22222222-bbbb", order_detail("22222222-bbbb", "Delivered")),
    )
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn test_orders_requires_login() {
    let app = app_with_orders();

    let response = app.get("/orders", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login"));
}

#[tokio::test]
async fn test_htmx_request_without_login_gets_hx_redirect() {
    let app = app_with_orders();

    let response = app.htmx_get("/orders?q=mg", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["hx-redirect"], "/auth/login");
}

#[tokio::test]
async fn test_orders_page_lists_every_order() {
    let app = app_with_orders();
    let cookie = app.login().await;

    let response = app.get("/orders", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<html"));
    assert!(html.contains("My Orders"));
    assert!(html.contains("#11111111"));
    assert!(html.contains("#22222222"));
    assert!(html.contains("#33333333"));
}

#[tokio::test]
async fn test_htmx_search_returns_only_matching_fragment() {
    let app = app_with_orders();
    let cookie = app.login().await;
    let _ = app.get("/orders", Some(&cookie)).await;

    let response = app
        .htmx_get("/orders?q=park+street&status=all", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(!html.contains("<html"));
    assert!(html.contains("#22222222"));
    assert!(!html.contains("#11111111"));
    assert!(!html.contains("#33333333"));
}

#[tokio::test]
async fn test_htmx_filter_is_served_from_cached_list() {
    let app = app_with_orders();
    let cookie = app.login().await;
    let _ = app.get("/orders", Some(&cookie)).await;
    assert_eq!(app.api.data().order_fetches, 1);

    let response = app.htmx_get("/orders?status=Shipped", Some(&cookie)).await;
    let html = body_text(response).await;
    assert!(html.contains("#33333333"));
    assert!(!html.contains("#22222222"));
    assert_eq!(app.api.data().order_fetches, 1);
}

#[tokio::test]
async fn test_narrowed_search_without_matches_shows_empty_state() {
    let app = app_with_orders();
    let cookie = app.login().await;

    let response = app.htmx_get("/orders?q=nowhere", Some(&cookie)).await;
    let html = body_text(response).await;
    assert!(html.contains("No orders found"));
    assert!(html.contains("Try adjusting your search or filter criteria"));
}

#[tokio::test]
async fn test_api_failure_renders_error_page() {
    let app = app_with_orders();
    let cookie = app.login().await;
    app.api.fail_reads(Failure::Unavailable);

    let response = app.get("/orders", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_text(response).await;
    assert!(html.contains("Oops! Something went wrong"));
    assert!(html.contains("Failed to fetch orders. Please try again later."));
    assert!(html.contains("Try Again"));
}

#[tokio::test]
async fn test_expired_token_logs_customer_out() {
    let app = app_with_orders();
    let cookie = app.login().await;
    app.api.fail_reads(Failure::Expired);

    let response = app.get("/orders", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login"));

    // The stored login is gone, so the login page renders instead of redirecting.
    let response = app.get("/auth/login", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Detail
// ============================================================================

#[tokio::test]
async fn test_order_detail_renders_items_and_totals() {
    let app = app_with_orders();
    let cookie = app.login().await;

    let response = app.get("/orders/11111111-aaaa", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Order #11111111"));
    assert!(html.contains("Cotton Kurta"));
    assert!(html.contains("Silk Scarf"));
    assert!(html.contains("Order received"));
    assert!(html.contains("Cancel order"));
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = app_with_orders();
    let cookie = app.login().await;

    let response = app.get("/orders/does-not-exist", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_text(response).await;
    assert!(html.contains("Order not found"));
    assert!(html.contains("Back to Orders"));
}

#[tokio::test]
async fn test_invoice_tab() {
    let app = app_with_orders();
    let cookie = app.login().await;

    let response = app
        .get("/orders/22222222-bbbb?tab=invoice", Some(&cookie))
        .await;
    let html = body_text(response).await;
    assert!(html.contains("Invoice"));
    assert!(html.contains("Subtotal"));
    assert!(!html.contains("Cancel order"));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_pending_order() {
    let app = app_with_orders();
    let cookie = app.login().await;
    let _ = app.get("/orders", Some(&cookie)).await;

    let response = app
        .post_form("/orders/11111111-aaaa/cancel", Some(&cookie), "")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/orders/11111111-aaaa"));
    assert_eq!(app.api.data().cancelled.len(), 1);

    // The detail still reads Pending upstream; the page shows the cancellation.
    let html = body_text(app.get("/orders/11111111-aaaa", Some(&cookie)).await).await;
    assert!(html.contains("Order cancelled successfully"));
    assert!(html.contains("Cancelled"));
    assert!(!html.contains("Cancel order"));

    // The cached history reflects the cancellation without a refetch.
    let response = app.htmx_get("/orders?status=Cancelled", Some(&cookie)).await;
    let html = body_text(response).await;
    assert!(html.contains("#11111111"));
    assert!(!html.contains("#22222222"));
    assert_eq!(app.api.data().order_fetches, 1);
}

#[tokio::test]
async fn test_reloading_after_cancel_does_not_resubmit() {
    let app = app_with_orders();
    let cookie = app.login().await;

    let _ = app
        .post_form("/orders/11111111-aaaa/cancel", Some(&cookie), "")
        .await;
    let _ = app.get("/orders/11111111-aaaa", Some(&cookie)).await;

    let html = body_text(app.get("/orders/11111111-aaaa", Some(&cookie)).await).await;
    assert!(!html.contains("Order cancelled successfully"));
    assert!(!html.contains("can no longer be cancelled"));
    assert_eq!(app.api.data().cancelled.len(), 1);
}

#[tokio::test]
async fn test_delivered_order_cannot_be_cancelled() {
    let app = app_with_orders();
    let cookie = app.login().await;

    let response = app
        .post_form("/orders/22222222-bbbb/cancel", Some(&cookie), "")
        .await;
    assert_eq!(location(&response), Some("/orders/22222222-bbbb"));
    assert!(app.api.data().cancelled.is_empty());

    let html = body_text(app.get("/orders/22222222-bbbb", Some(&cookie)).await).await;
    assert!(html.contains("This order is delivered and can no longer be cancelled"));
}

#[tokio::test]
async fn test_rejected_cancel_shows_api_message_and_keeps_status() {
    let app = app_with_orders();
    let cookie = app.login().await;
    let _ = app.get("/orders", Some(&cookie)).await;
    app.api.fail_writes(Failure::Rejected("Order already packed"));

    let response = app
        .post_form("/orders/11111111-aaaa/cancel", Some(&cookie), "")
        .await;
    assert_eq!(location(&response), Some("/orders/11111111-aaaa"));

    let html = body_text(app.get("/orders/11111111-aaaa", Some(&cookie)).await).await;
    assert!(html.contains("Order already packed"));
    assert!(html.contains("Cancel order"));

    let html = body_text(app.htmx_get("/orders?status=Cancelled", Some(&cookie)).await).await;
    assert!(!html.contains("#11111111"));
    let html = body_text(app.htmx_get("/orders?status=Pending", Some(&cookie)).await).await;
    assert!(html.contains("#11111111"));
}

#[tokio::test]
async fn test_failed_cancel_uses_generic_message() {
    let app = app_with_orders();
    let cookie = app.login().await;
    app.api.fail_writes(Failure::Unavailable);

    let _ = app
        .post_form("/orders/11111111-aaaa/cancel", Some(&cookie), "")
        .await;

    let html = body_text(app.get("/orders/11111111-aaaa", Some(&cookie)).await).await;
    assert!(html.contains("Failed to cancel order"));
    assert!(html.contains("Cancel order"));
    assert!(app.api.data().cancelled.is_empty());
}

#[tokio::test]
async fn test_expired_token_on_cancel_logs_customer_out() {
    let app = app_with_orders();
    let cookie = app.login().await;
    app.api.fail_writes(Failure::Expired);

    let response = app
        .post_form("/orders/11111111-aaaa/cancel", Some(&cookie), "")
        .await;
    assert_eq!(location(&response), Some("/auth/login"));

    let response = app.get("/orders", Some(&cookie)).await;
    assert_eq!(location(&response), Some("/auth/login"));
}
