//! Checkout, online payment verification and saved addresses.

use axum::http::StatusCode;
use eshop_core::{PaymentMethod, Price};
use eshop_integration_tests::{
    CREATED_ORDER_ID, FakeStoreApi, Failure, RAZORPAY_ORDER_ID, TestApp, address, body_text,
    location,
};
use rust_decimal::Decimal;
use serde_json::json;

fn app_with_cart() -> TestApp {
    TestApp::new(
        FakeStoreApi::new()
            .with_cart(vec![
                json!({ "cartId": "c1", "productName": "Cotton Kurta", "price": 699, "quantity": 2 }),
                json!({ "cartId": "c2", "productName": "Silk Scarf", "price": "200", "quantity": 0 }),
            ])
            .with_addresses(vec![address("addr-1", false), address("addr-2", true)]),
    )
}

#[tokio::test]
async fn test_checkout_shows_cart_and_preselects_default_address() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app.get("/checkout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Cotton Kurta"));
    assert!(html.contains("Silk Scarf"));
    assert!(html.contains(r#"value="addr-2" checked"#));
    assert!(!html.contains(r#"value="addr-1" checked"#));
}

#[tokio::test]
async fn test_checkout_honours_requested_address() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app.get("/checkout?address=addr-1", Some(&cookie)).await;
    let html = body_text(response).await;
    assert!(html.contains(r#"value="addr-1" checked"#));
}

#[tokio::test]
async fn test_empty_cart_redirects_home() {
    let app = TestApp::new(FakeStoreApi::new());
    let cookie = app.login().await;

    let response = app.get("/checkout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_place_order_without_address_is_refused() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app
        .post_form("/checkout", Some(&cookie), "payment_method=COD")
        .await;
    assert_eq!(location(&response), Some("/checkout"));
    assert!(app.api.data().created.is_empty());

    let html = body_text(app.get("/checkout", Some(&cookie)).await).await;
    assert!(html.contains("Please select or add an address"));
}

#[tokio::test]
async fn test_cash_on_delivery_order() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app
        .post_form(
            "/checkout",
            Some(&cookie),
            "address_id=addr-2&payment_method=COD",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/orders"));
    {
        let data = app.api.data();
        assert_eq!(data.created.len(), 1);
        assert_eq!(data.created[0].payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(data.created[0].address_id.as_str(), "addr-2");
    }

    let html = body_text(app.get("/orders", Some(&cookie)).await).await;
    assert!(html.contains("Order placed successfully!"));
}

#[tokio::test]
async fn test_online_payment_is_verified() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app
        .post_form(
            "/checkout",
            Some(&cookie),
            "address_id=addr-1&payment_method=Razorpay",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Complete your payment"));
    assert!(html.contains(RAZORPAY_ORDER_ID));
    assert!(html.contains("rzp_test_key"));
    assert!(html.contains("49900"));

    let form = format!(
        "order_id={CREATED_ORDER_ID}&razorpay_order_id={RAZORPAY_ORDER_ID}\
         &razorpay_payment_id=pay_1&razorpay_signature=sig_1"
    );
    let response = app.post_form("/checkout/verify", Some(&cookie), &form).await;
    assert_eq!(location(&response), Some("/orders"));
    assert_eq!(app.api.data().verified.len(), 1);

    let html = body_text(app.get("/orders", Some(&cookie)).await).await;
    assert!(html.contains("Payment successful! Order placed."));
}

#[tokio::test]
async fn test_verification_for_another_order_is_rejected() {
    let app = app_with_cart();
    let cookie = app.login().await;
    let _ = app
        .post_form(
            "/checkout",
            Some(&cookie),
            "address_id=addr-1&payment_method=Razorpay",
        )
        .await;

    let form = format!(
        "order_id={CREATED_ORDER_ID}&razorpay_order_id=order_forged\
         &razorpay_payment_id=pay_1&razorpay_signature=sig_1"
    );
    let response = app.post_form("/checkout/verify", Some(&cookie), &form).await;
    assert_eq!(location(&response), Some("/orders"));
    assert!(app.api.data().verified.is_empty());

    let html = body_text(app.get("/orders", Some(&cookie)).await).await;
    assert!(html.contains("Failed to verify payment"));
}

#[tokio::test]
async fn test_rejected_order_shows_api_message() {
    let app = app_with_cart();
    let cookie = app.login().await;
    app.api.fail_writes(Failure::Rejected("Cotton Kurta is out of stock"));

    let response = app
        .post_form("/checkout", Some(&cookie), "address_id=addr-2&payment_method=COD")
        .await;
    assert_eq!(location(&response), Some("/checkout?address=addr-2"));
    assert!(app.api.data().created.is_empty());

    let html = body_text(app.get("/checkout?address=addr-2", Some(&cookie)).await).await;
    assert!(html.contains("Cotton Kurta is out of stock"));
}

#[tokio::test]
async fn test_failed_order_uses_generic_message() {
    let app = app_with_cart();
    let cookie = app.login().await;
    app.api.fail_writes(Failure::Unavailable);

    let response = app
        .post_form("/checkout", Some(&cookie), "address_id=addr-1&payment_method=Razorpay")
        .await;
    assert_eq!(location(&response), Some("/checkout?address=addr-1"));

    let html = body_text(app.get("/checkout?address=addr-1", Some(&cookie)).await).await;
    assert!(html.contains("Failed to place order. Please try again."));
}

#[tokio::test]
async fn test_expired_token_when_placing_order_logs_customer_out() {
    let app = app_with_cart();
    let cookie = app.login().await;
    app.api.fail_writes(Failure::Expired);

    let response = app
        .post_form("/checkout", Some(&cookie), "address_id=addr-2&payment_method=COD")
        .await;
    assert_eq!(location(&response), Some("/auth/login"));

    let response = app.get("/checkout", Some(&cookie)).await;
    assert_eq!(location(&response), Some("/auth/login"));
}

#[tokio::test]
async fn test_amount_that_cannot_be_charged_is_refused() {
    let app = TestApp::new(
        FakeStoreApi::new()
            .with_cart(vec![json!({ "cartId": "c1", "productName": "Cotton Kurta", "price": 699, "quantity": 1 })])
            .with_addresses(vec![address("addr-1", true)])
            .with_created_amount(Price::new(Decimal::MAX)),
    );
    let cookie = app.login().await;

    let response = app
        .post_form("/checkout", Some(&cookie), "address_id=addr-1&payment_method=Razorpay")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/checkout?address=addr-1"));

    let html = body_text(app.get("/checkout?address=addr-1", Some(&cookie)).await).await;
    assert!(html.contains("Failed to place order. Please try again."));
}

#[tokio::test]
async fn test_failed_payment_verification_reports_error() {
    let app = app_with_cart();
    let cookie = app.login().await;
    let _ = app
        .post_form("/checkout", Some(&cookie), "address_id=addr-1&payment_method=Razorpay")
        .await;
    app.api.fail_writes(Failure::Unavailable);

    let form = format!(
        "order_id={CREATED_ORDER_ID}&razorpay_order_id={RAZORPAY_ORDER_ID}\
         &razorpay_payment_id=pay_1&razorpay_signature=sig_1"
    );
    let response = app.post_form("/checkout/verify", Some(&cookie), &form).await;
    assert_eq!(location(&response), Some("/orders"));
    assert!(app.api.data().verified.is_empty());

    let html = body_text(app.get("/orders", Some(&cookie)).await).await;
    assert!(html.contains("Failed to verify payment"));
}

// ============================================================================
// Addresses
// ============================================================================

#[tokio::test]
async fn test_create_address_with_missing_fields_rerenders_form() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app
        .post_form("/addresses", Some(&cookie), "address_line=12+MG+Road&city=Pune")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Please fill in: state, country, ZIP code"));
    assert!(html.contains("12 MG Road"));
    assert!(app.api.data().saved_addresses.is_empty());
}

#[tokio::test]
async fn test_create_address() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app
        .post_form(
            "/addresses",
            Some(&cookie),
            "address_line=1+Residency+Road&city=Bengaluru&state=Karnataka\
             &country=India&zip_code=560025&phone=&is_default=on",
        )
        .await;
    assert_eq!(location(&response), Some("/checkout"));
    {
        let data = app.api.data();
        assert_eq!(data.saved_addresses.len(), 1);
        assert!(data.saved_addresses[0].is_default);
    }

    let html = body_text(app.get("/checkout", Some(&cookie)).await).await;
    assert!(html.contains("Address added successfully"));
}

#[tokio::test]
async fn test_edit_unknown_address_redirects_to_checkout() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app.get("/addresses/missing/edit", Some(&cookie)).await;
    assert_eq!(location(&response), Some("/checkout"));

    let html = body_text(app.get("/checkout", Some(&cookie)).await).await;
    assert!(html.contains("Address not found"));
}

#[tokio::test]
async fn test_edit_form_is_prefilled() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app.get("/addresses/addr-1/edit", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Edit address"));
    assert!(html.contains(r#"action="/addresses/addr-1""#));
    assert!(html.contains("411001"));
}

#[tokio::test]
async fn test_delete_address_uses_default_message() {
    let app = app_with_cart();
    let cookie = app.login().await;

    let response = app
        .post_form("/addresses/addr-1/delete", Some(&cookie), "")
        .await;
    assert_eq!(location(&response), Some("/checkout"));
    assert_eq!(app.api.data().deleted_addresses.len(), 1);

    let html = body_text(app.get("/checkout", Some(&cookie)).await).await;
    assert!(html.contains("Address deleted"));
}

#[tokio::test]
async fn test_failed_delete_keeps_address() {
    let app = app_with_cart();
    let cookie = app.login().await;
    app.api.fail_writes(Failure::Unavailable);

    let response = app
        .post_form("/addresses/addr-1/delete", Some(&cookie), "")
        .await;
    assert_eq!(location(&response), Some("/checkout"));
    assert!(app.api.data().deleted_addresses.is_empty());

    let html = body_text(app.get("/checkout", Some(&cookie)).await).await;
    assert!(html.contains("Failed to delete address"));
}
