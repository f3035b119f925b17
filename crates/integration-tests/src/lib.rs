//! Integration tests for the E-Shop storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eshop-integration-tests
//! ```
//!
//! The full router (sessions, middleware, templates) runs in-process through
//! `tower::ServiceExt::oneshot`. The store API is replaced by
//! [`FakeStoreApi`], an in-memory implementation of `StoreApi` that records
//! the calls it receives.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use eshop_core::{AddressId, Email, OrderId, PaymentMethod, Price};
use eshop_storefront::api::{
    AccessToken, Address, AddressInput, ApiError, CreateOrderRequest, CreatedOrder,
    CustomerProfile, LoginResult, PaymentVerification, StoreApi,
};
use eshop_storefront::config::{PaymentConfig, StoreApiConfig, StorefrontConfig};
use eshop_storefront::middleware::create_session_layer;
use eshop_storefront::state::AppState;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Password the fake accepts for every customer.
pub const PASSWORD: &str = "correct-horse-battery";

/// Email used by [`TestApp::login`].
pub const CUSTOMER_EMAIL: &str = "asha@example.in";

/// Gateway order id the fake hands out for online payments.
pub const RAZORPAY_ORDER_ID: &str = "order_rzp_123";

/// Id of every order the fake creates.
pub const CREATED_ORDER_ID: &str = "99999999-new";

// =============================================================================
// Fake store API
// =============================================================================

/// How the fake fails a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The API is down.
    Unavailable,
    /// The customer's token has expired.
    Expired,
    /// The API answers `success: false` with this message.
    Rejected(&'static str),
}

impl Failure {
    fn error(self) -> ApiError {
        match self {
            Self::Unavailable => ApiError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            },
            Self::Expired => ApiError::Unauthorized,
            Self::Rejected(message) => ApiError::Rejected(message.to_string()),
        }
    }
}

/// Data served and calls recorded by [`FakeStoreApi`].
#[derive(Debug, Default)]
pub struct FakeData {
    pub products: Vec<Value>,
    pub orders: Vec<Value>,
    pub details: HashMap<String, Value>,
    pub cart: Vec<Value>,
    pub addresses: Vec<Address>,
    pub failure: Option<Failure>,
    pub write_failure: Option<Failure>,
    /// Amount of created orders; 499.00 when unset.
    pub created_amount: Option<Price>,
    pub order_fetches: usize,
    pub cancelled: Vec<OrderId>,
    pub created: Vec<CreateOrderRequest>,
    pub verified: Vec<PaymentVerification>,
    pub saved_addresses: Vec<AddressInput>,
    pub deleted_addresses: Vec<AddressId>,
}

/// In-memory `StoreApi`.
#[derive(Debug, Default)]
pub struct FakeStoreApi {
    data: Mutex<FakeData>,
}

impl FakeStoreApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_products(mut self, products: Vec<Value>) -> Self {
        self.data_mut().products = products;
        self
    }

    #[must_use]
    pub fn with_orders(mut self, orders: Vec<Value>) -> Self {
        self.data_mut().orders = orders;
        self
    }

    #[must_use]
    pub fn with_order_detail(mut self, id: &str, detail: Value) -> Self {
        self.data_mut().details.insert(id.to_string(), detail);
        self
    }

    #[must_use]
    pub fn with_cart(mut self, cart: Vec<Value>) -> Self {
        self.data_mut().cart = cart;
        self
    }

    #[must_use]
    pub fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.data_mut().addresses = addresses;
        self
    }

    #[must_use]
    pub fn with_created_amount(mut self, amount: Price) -> Self {
        self.data_mut().created_amount = Some(amount);
        self
    }

    /// Make every read call fail.
    pub fn fail_reads(&self, failure: Failure) {
        self.data().failure = Some(failure);
    }

    /// Make every write call fail without recording it.
    pub fn fail_writes(&self, failure: Failure) {
        self.data().write_failure = Some(failure);
    }

    /// Lock the recorded data.
    pub fn data(&self) -> MutexGuard<'_, FakeData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn data_mut(&mut self) -> &mut FakeData {
        self.data.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_reads(&self) -> Result<(), ApiError> {
        self.data().failure.map_or(Ok(()), |failure| Err(failure.error()))
    }

    fn check_writes(&self) -> Result<(), ApiError> {
        self.data()
            .write_failure
            .map_or(Ok(()), |failure| Err(failure.error()))
    }
}

#[async_trait]
impl StoreApi for FakeStoreApi {
    async fn login(&self, email: &Email, password: &str) -> Result<LoginResult, ApiError> {
        if password != PASSWORD {
            return Err(ApiError::Rejected("Invalid credentials".to_string()));
        }
        Ok(LoginResult {
            token: AccessToken::new(format!("token-{email}")),
            customer: CustomerProfile {
                id: "cust-1".into(),
                email: email.to_string(),
                first_name: Some("Asha".to_string()),
                phone: Some("9876543210".to_string()),
            },
        })
    }

    async fn get_products(&self) -> Result<Vec<Value>, ApiError> {
        self.check_reads()?;
        Ok(self.data().products.clone())
    }

    async fn get_orders(&self, _token: &AccessToken) -> Result<Vec<Value>, ApiError> {
        self.check_reads()?;
        let mut data = self.data();
        data.order_fetches += 1;
        Ok(data.orders.clone())
    }

    async fn get_order_details(
        &self,
        _token: &AccessToken,
        order_id: &OrderId,
    ) -> Result<Value, ApiError> {
        self.check_reads()?;
        Ok(self
            .data()
            .details
            .get(order_id.as_str())
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn cancel_order(
        &self,
        _token: &AccessToken,
        order_id: &OrderId,
    ) -> Result<String, ApiError> {
        self.check_writes()?;
        self.data().cancelled.push(order_id.clone());
        Ok("Order cancelled".to_string())
    }

    async fn get_cart(&self, _token: &AccessToken) -> Result<Vec<Value>, ApiError> {
        self.check_reads()?;
        Ok(self.data().cart.clone())
    }

    async fn get_addresses(&self, _token: &AccessToken) -> Result<Vec<Address>, ApiError> {
        self.check_reads()?;
        Ok(self.data().addresses.clone())
    }

    async fn create_address(
        &self,
        _token: &AccessToken,
        input: &AddressInput,
    ) -> Result<String, ApiError> {
        self.check_writes()?;
        self.data().saved_addresses.push(input.clone());
        Ok("Address added successfully".to_string())
    }

    async fn update_address(
        &self,
        _token: &AccessToken,
        _address_id: &AddressId,
        input: &AddressInput,
    ) -> Result<String, ApiError> {
        self.check_writes()?;
        self.data().saved_addresses.push(input.clone());
        Ok("Address updated successfully".to_string())
    }

    async fn delete_address(
        &self,
        _token: &AccessToken,
        address_id: &AddressId,
    ) -> Result<String, ApiError> {
        self.check_writes()?;
        self.data().deleted_addresses.push(address_id.clone());
        Ok(String::new())
    }

    async fn create_order(
        &self,
        _token: &AccessToken,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, ApiError> {
        self.check_writes()?;
        let mut data = self.data();
        data.created.push(request.clone());
        Ok(CreatedOrder {
            order_id: OrderId::new(CREATED_ORDER_ID),
            amount: data
                .created_amount
                .unwrap_or_else(|| Price::new(Decimal::new(49_900, 2))),
            currency: "INR".to_string(),
            razorpay_order_id: (request.payment_method == PaymentMethod::Razorpay)
                .then(|| RAZORPAY_ORDER_ID.to_string()),
        })
    }

    async fn verify_payment(
        &self,
        _token: &AccessToken,
        verification: &PaymentVerification,
    ) -> Result<String, ApiError> {
        self.check_writes()?;
        if verification.razorpay_signature.is_empty() {
            return Err(ApiError::Rejected("Invalid payment signature".to_string()));
        }
        self.data().verified.push(verification.clone());
        Ok("Payment verified".to_string())
    }
}

// =============================================================================
// Sample payloads
// =============================================================================

/// An order history entry as the store API sends it.
#[must_use]
pub fn order_summary(id: &str, status: &str, address_line: &str) -> Value {
    json!({
        "order_id": id,
        "created_at": "2024-03-05T10:30:00Z",
        "total_amount": "1299.00",
        "order_status": status,
        "address_line": address_line,
        "city": "Pune",
        "state": "Maharashtra",
        "payment_method": "COD",
        "items": [
            { "productName": "Cotton Kurta", "price": 1299, "quantity": 1, "images": [] }
        ]
    })
}

/// An order detail payload (`{ order, items, tracking }`).
#[must_use]
pub fn order_detail(id: &str, status: &str) -> Value {
    json!({
        "order": {
            "order_id": id,
            "created_at": "2024-03-05T10:30:00Z",
            "total_amount": 1598,
            "order_status": status,
            "payment_method": "COD",
            "payment_status": "Pending",
            "address_line": "12 MG Road",
            "city": "Pune",
            "state": "Maharashtra",
            "country": "India",
            "zip_code": "411001",
            "phone": "9876543210"
        },
        "items": [
            { "productName": "Cotton Kurta", "description": "Handloom", "price": 699, "quantity": 2 },
            { "productName": "Silk Scarf", "price": "200", "quantity": 1 }
        ],
        "tracking": [
            { "status": status, "update_time": "2024-03-05T11:00:00Z", "notes": "Order received" }
        ]
    })
}

/// A saved address.
#[must_use]
pub fn address(id: &str, is_default: bool) -> Address {
    Address {
        address_id: AddressId::new(id),
        address_line: "12 MG Road".to_string(),
        city: "Pune".to_string(),
        state: "Maharashtra".to_string(),
        country: "India".to_string(),
        zip_code: "411001".to_string(),
        phone: "9876543210".to_string(),
        is_default,
    }
}

// =============================================================================
// Test application
// =============================================================================

/// Configuration for an in-process storefront.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from(
            "kq83Jd9vLw2mZp7XtR4bNc6HsY1eGf5AuQ0oVi8lTj3KxWz9PdMr2Ey7Bn4Cs6Ha".to_string(),
        ),
        api: StoreApiConfig {
            base_url: url::Url::parse("http://store-api.invalid/api/")
                .unwrap_or_else(|e| panic!("test URL: {e}")),
        },
        payments: PaymentConfig {
            razorpay_key_id: "rzp_test_key".to_string(),
            store_name: "E-Shop".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// The storefront router wired to a [`FakeStoreApi`].
pub struct TestApp {
    router: Router,
    pub api: Arc<FakeStoreApi>,
}

impl TestApp {
    /// Build the app around `api`.
    ///
    /// # Panics
    ///
    /// Panics if the test session secret cannot sign cookies.
    #[must_use]
    pub fn new(api: FakeStoreApi) -> Self {
        let config = test_config();
        let api = Arc::new(api);
        let session_layer =
            create_session_layer(&config).unwrap_or_else(|e| panic!("session layer: {e}"));
        let state = AppState::new(config, Arc::clone(&api) as Arc<dyn StoreApi>);
        Self {
            router: eshop_storefront::app(state, session_layer),
            api,
        }
    }

    /// Send a request through the full router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(infallible) => match infallible {},
        }
    }

    /// `GET path`, with the session cookie if given.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(build(Request::get(path), cookie, None, Body::empty()))
            .await
    }

    /// `GET path` as HTMX would issue it.
    pub async fn htmx_get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(build(
            Request::get(path),
            cookie,
            Some(("hx-request", "true")),
            Body::empty(),
        ))
        .await
    }

    /// `POST path` with an urlencoded form body.
    pub async fn post_form(&self, path: &str, cookie: Option<&str>, form: &str) -> Response<Body> {
        self.send(build(
            Request::post(path),
            cookie,
            Some((header::CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded")),
            Body::from(form.to_string()),
        ))
        .await
    }

    /// Log in as [`CUSTOMER_EMAIL`] and return the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if login does not set a session cookie.
    pub async fn login(&self) -> String {
        let form = format!("email=asha%40example.in&password={PASSWORD}");
        let response = self.post_form("/auth/login", None, &form).await;
        session_cookie(&response).unwrap_or_else(|| panic!("login set no session cookie"))
    }
}

fn build(
    builder: axum::http::request::Builder,
    cookie: Option<&str>,
    extra_header: Option<(&str, &str)>,
    body: Body,
) -> Request<Body> {
    let mut builder = builder;
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some((name, value)) = extra_header {
        builder = builder.header(name, value);
    }
    builder
        .body(body)
        .unwrap_or_else(|e| panic!("invalid test request: {e}"))
}

/// The `name=value` part of the session cookie a response sets.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("eshop_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

/// Read the whole response body as text.
///
/// # Panics
///
/// Panics if the body cannot be read.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|e| panic!("read body: {e}"));
    String::from_utf8_lossy(&bytes).into_owned()
}
