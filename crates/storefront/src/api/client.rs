//! HTTP implementation of [`StoreApi`] using `reqwest`.

use std::sync::Arc;

use async_trait::async_trait;
use eshop_core::{AddressId, DEFAULT_CURRENCY_CODE, Email, OrderId, Price};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;
use url::Url;

use super::{
    AccessToken, Address, AddressInput, ApiError, CreateOrderRequest, CreatedOrder,
    CustomerProfile, LoginResult, PaymentVerification, StoreApi,
};
use crate::config::StoreApiConfig;
use crate::orders::normalize::{json_decimal, json_text};

/// Response bodies are truncated to this many characters in logs and errors.
const BODY_PREVIEW_CHARS: usize = 300;

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// The `{ success, message, ...payload }` wrapper around every response.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "redirectToLogin")]
    redirect_to_login: bool,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Envelope {
    /// Turn `success: false` into an error, keep the payload otherwise.
    fn into_payload(self) -> Result<Map<String, Value>, ApiError> {
        if self.redirect_to_login {
            return Err(ApiError::Unauthorized);
        }
        if !self.success {
            return Err(ApiError::Rejected(self.message.unwrap_or_default()));
        }
        Ok(self.payload)
    }

    /// The confirmation message of a successful action.
    fn into_message(self) -> Result<String, ApiError> {
        if self.redirect_to_login {
            return Err(ApiError::Unauthorized);
        }
        if !self.success {
            return Err(ApiError::Rejected(self.message.unwrap_or_default()));
        }
        Ok(self.message.unwrap_or_default())
    }
}

/// Take an array field out of a payload; anything else reads as empty.
fn take_list(payload: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match payload.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the store's REST API.
#[derive(Clone)]
pub struct HttpStoreApi {
    inner: Arc<HttpStoreApiInner>,
}

struct HttpStoreApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpStoreApi {
    /// Create a new store API client.
    #[must_use]
    pub fn new(config: &StoreApiConfig) -> Self {
        Self {
            inner: Arc::new(HttpStoreApiInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
            }),
        }
    }

    /// Send a request and parse the envelope.
    async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: Option<&AccessToken>,
        body: Option<&B>,
    ) -> Result<Envelope, ApiError> {
        let url = self.inner.base_url.join(path)?;

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        // Read as text first for better error diagnostics
        let body = response.text().await?;

        match serde_json::from_str::<Envelope>(&body) {
            // Error statuses usually still carry `{ success: false, message }`
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => {
                tracing::error!(
                    error = %e,
                    body = %preview(&body),
                    "Failed to parse store API response"
                );
                Err(ApiError::Parse(e))
            }
            Err(_) => {
                tracing::error!(
                    status = %status,
                    body = %preview(&body),
                    "Store API returned non-success status"
                );
                Err(ApiError::Status {
                    status: status.as_u16(),
                    body: preview(&body),
                })
            }
        }
    }

    async fn get(&self, path: &str, token: &AccessToken) -> Result<Envelope, ApiError> {
        self.send::<()>(Method::GET, path, Some(token), None).await
    }
}

#[async_trait]
impl StoreApi for HttpStoreApi {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: &Email, password: &str) -> Result<LoginResult, ApiError> {
        #[derive(Serialize)]
        struct Credentials<'a> {
            email: &'a str,
            password: &'a str,
        }

        let credentials = Credentials {
            email: email.as_str(),
            password,
        };
        let mut payload = self
            .send(Method::POST, "auth/login", None, Some(&credentials))
            .await?
            .into_payload()?;

        let token = json_text(payload.get("token"))
            .ok_or_else(|| ApiError::Rejected("Login response did not include a token".into()))?;
        let customer = match payload.remove("user") {
            Some(user) => serde_json::from_value::<CustomerProfile>(user)?,
            None => CustomerProfile {
                email: email.to_string(),
                ..CustomerProfile::default()
            },
        };

        Ok(LoginResult {
            token: AccessToken::new(token),
            customer,
        })
    }

    #[instrument(skip(self))]
    async fn get_products(&self) -> Result<Vec<Value>, ApiError> {
        let mut payload = self
            .send::<()>(Method::GET, "products", None, None)
            .await?
            .into_payload()?;
        Ok(take_list(&mut payload, "products"))
    }

    #[instrument(skip(self, token))]
    async fn get_orders(&self, token: &AccessToken) -> Result<Vec<Value>, ApiError> {
        let mut payload = self.get("orders", token).await?.into_payload()?;
        Ok(take_list(&mut payload, "orders"))
    }

    #[instrument(skip(self, token), fields(order_id = %order_id))]
    async fn get_order_details(
        &self,
        token: &AccessToken,
        order_id: &OrderId,
    ) -> Result<Value, ApiError> {
        let path = format!("orders/{}", urlencoding::encode(order_id.as_str()));
        let mut payload = self.get(&path, token).await?.into_payload()?;
        Ok(payload.remove("order").unwrap_or(Value::Null))
    }

    #[instrument(skip(self, token), fields(order_id = %order_id))]
    async fn cancel_order(
        &self,
        token: &AccessToken,
        order_id: &OrderId,
    ) -> Result<String, ApiError> {
        let path = format!("orders/{}/cancel", urlencoding::encode(order_id.as_str()));
        self.send::<()>(Method::POST, &path, Some(token), None)
            .await?
            .into_message()
    }

    #[instrument(skip(self, token))]
    async fn get_cart(&self, token: &AccessToken) -> Result<Vec<Value>, ApiError> {
        let mut payload = self.get("cart", token).await?.into_payload()?;
        Ok(take_list(&mut payload, "cartItems"))
    }

    #[instrument(skip(self, token))]
    async fn get_addresses(&self, token: &AccessToken) -> Result<Vec<Address>, ApiError> {
        let mut payload = self.get("addresses", token).await?.into_payload()?;
        take_list(&mut payload, "addresses")
            .into_iter()
            .map(|address| serde_json::from_value(address).map_err(ApiError::from))
            .collect()
    }

    #[instrument(skip(self, token, input))]
    async fn create_address(
        &self,
        token: &AccessToken,
        input: &AddressInput,
    ) -> Result<String, ApiError> {
        self.send(Method::POST, "addresses", Some(token), Some(input))
            .await?
            .into_message()
    }

    #[instrument(skip(self, token, input), fields(address_id = %address_id))]
    async fn update_address(
        &self,
        token: &AccessToken,
        address_id: &AddressId,
        input: &AddressInput,
    ) -> Result<String, ApiError> {
        let path = format!("addresses/{}", urlencoding::encode(address_id.as_str()));
        self.send(Method::PUT, &path, Some(token), Some(input))
            .await?
            .into_message()
    }

    #[instrument(skip(self, token), fields(address_id = %address_id))]
    async fn delete_address(
        &self,
        token: &AccessToken,
        address_id: &AddressId,
    ) -> Result<String, ApiError> {
        let path = format!("addresses/{}", urlencoding::encode(address_id.as_str()));
        self.send::<()>(Method::DELETE, &path, Some(token), None)
            .await?
            .into_message()
    }

    #[instrument(skip(self, token), fields(payment_method = %request.payment_method))]
    async fn create_order(
        &self,
        token: &AccessToken,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, ApiError> {
        let payload = self
            .send(Method::POST, "orders", Some(token), Some(request))
            .await?
            .into_payload()?;
        Ok(created_order_from(payload.get("order")))
    }

    #[instrument(skip(self, token, verification), fields(order_id = %verification.order_id))]
    async fn verify_payment(
        &self,
        token: &AccessToken,
        verification: &PaymentVerification,
    ) -> Result<String, ApiError> {
        self.send(Method::POST, "payments/verify", Some(token), Some(verification))
            .await?
            .into_message()
    }
}

/// Read the `order` object of a create-order response.
fn created_order_from(order: Option<&Value>) -> CreatedOrder {
    let field = |key: &str| order.and_then(|o| o.get(key));
    CreatedOrder {
        order_id: OrderId::new(json_text(field("order_id")).unwrap_or_default()),
        amount: Price::new(json_decimal(field("amount")).unwrap_or_default()),
        currency: json_text(field("currency"))
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string()),
        razorpay_order_id: json_text(field("razorpay_order_id")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_envelope_success_keeps_payload() {
        let payload = envelope(json!({ "success": true, "orders": [1, 2] }))
            .into_payload()
            .unwrap();
        assert_eq!(payload.get("orders"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_envelope_failure_carries_message() {
        let err = envelope(json!({ "success": false, "message": "Order not found" }))
            .into_payload()
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(m) if m == "Order not found"));
    }

    #[test]
    fn test_envelope_missing_success_is_failure() {
        let err = envelope(json!({ "orders": [] })).into_payload().unwrap_err();
        assert!(matches!(err, ApiError::Rejected(m) if m.is_empty()));
    }

    #[test]
    fn test_envelope_redirect_to_login() {
        let err = envelope(json!({ "success": false, "redirectToLogin": true }))
            .into_message()
            .unwrap_err();
        assert!(err.requires_login());
    }

    #[test]
    fn test_take_list_ignores_non_arrays() {
        let mut payload = Map::new();
        payload.insert("orders".to_string(), json!({ "not": "a list" }));
        assert!(take_list(&mut payload, "orders").is_empty());
        assert!(take_list(&mut payload, "missing").is_empty());
    }

    #[test]
    fn test_created_order_from_payload() {
        let order = json!({
            "order_id": "9b1c",
            "amount": "1499.50",
            "razorpay_order_id": "order_Nx1"
        });
        let created = created_order_from(Some(&order));
        assert_eq!(created.order_id.as_str(), "9b1c");
        assert_eq!(
            created.amount,
            Price::new(Decimal::from_str("1499.50").unwrap())
        );
        assert_eq!(created.currency, "INR");
        assert_eq!(created.razorpay_order_id.as_deref(), Some("order_Nx1"));
    }

    #[test]
    fn test_created_order_from_nothing() {
        let created = created_order_from(None);
        assert!(created.order_id.is_empty());
        assert_eq!(created.amount, Price::ZERO);
        assert_eq!(created.razorpay_order_id, None);
    }
}
