//! Request and response types for the store API.
//!
//! Only the shapes the storefront sends, or stores in the session, are typed
//! here. Catalogue and order payloads stay as `serde_json::Value` until
//! normalization.

use std::fmt;

use eshop_core::{AddressId, CustomerId, OrderId, PaymentMethod, Price};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

/// Bearer token issued by the store API at login.
///
/// `Debug` is redacted; the value only leaves the process in the
/// `Authorization` header.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Customer profile returned at login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerProfile {
    /// Customer id.
    #[serde(alias = "user_id")]
    pub id: CustomerId,
    /// Login email.
    pub email: String,
    /// Given name, used in greetings and payment prefill.
    pub first_name: Option<String>,
    /// Contact phone, used in payment prefill.
    pub phone: Option<String>,
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    /// Token for subsequent calls.
    pub token: AccessToken,
    /// The customer who logged in.
    pub customer: CustomerProfile,
}

// ─────────────────────────────────────────────────────────────────────────────
// Addresses
// ─────────────────────────────────────────────────────────────────────────────

/// A saved shipping address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    /// Address id.
    pub address_id: AddressId,
    /// Street line.
    pub address_line: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// Country.
    pub country: String,
    /// Postal code.
    pub zip_code: String,
    /// Contact phone for delivery.
    pub phone: String,
    /// Whether this is the customer's default address.
    pub is_default: bool,
}

impl Address {
    /// One-line summary, e.g. "12 MG Road, Bengaluru, Karnataka".
    #[must_use]
    pub fn summary(&self) -> String {
        [&self.address_line, &self.city, &self.state]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Fields submitted when creating or editing an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressInput {
    /// Street line.
    pub address_line: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// Country.
    pub country: String,
    /// Postal code.
    pub zip_code: String,
    /// Contact phone for delivery.
    pub phone: String,
    /// Make this the default address.
    pub is_default: bool,
}

impl AddressInput {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("address line", &self.address_line),
            ("city", &self.city),
            ("state", &self.state),
            ("country", &self.country),
            ("ZIP code", &self.zip_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl From<&Address> for AddressInput {
    fn from(address: &Address) -> Self {
        Self {
            address_line: address.address_line.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            country: address.country.clone(),
            zip_code: address.zip_code.clone(),
            phone: address.phone.clone(),
            is_default: address.is_default,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders & Payments
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST orders`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    /// Shipping address.
    pub address_id: AddressId,
    /// Chosen payment method.
    pub payment_method: PaymentMethod,
}

/// An order the API has just created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    /// The store's order id.
    pub order_id: OrderId,
    /// Amount to charge.
    pub amount: Price,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Gateway order id; present for online payment.
    pub razorpay_order_id: Option<String>,
}

/// Fields the checkout widget hands back after a payment, forwarded for
/// signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    /// The store's order id.
    pub order_id: OrderId,
    /// Gateway order id.
    pub razorpay_order_id: String,
    /// Gateway payment id.
    pub razorpay_payment_id: String,
    /// HMAC signature over order and payment ids.
    pub razorpay_signature: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("eyJhbGciOi.secret.payload");
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret"));
        assert_eq!(token.expose(), "eyJhbGciOi.secret.payload");
    }

    #[test]
    fn test_address_deserializes_with_missing_fields() {
        let address: Address =
            serde_json::from_str(r#"{"address_id":"a1","city":"Pune","is_default":true}"#)
                .unwrap();
        assert_eq!(address.address_id.as_str(), "a1");
        assert_eq!(address.address_line, "");
        assert!(address.is_default);
    }

    #[test]
    fn test_address_summary_skips_blanks() {
        let address = Address {
            address_line: "12 MG Road".to_string(),
            state: "Karnataka".to_string(),
            ..Address::default()
        };
        assert_eq!(address.summary(), "12 MG Road, Karnataka");
    }

    #[test]
    fn test_missing_fields() {
        let input = AddressInput {
            address_line: "12 MG Road".to_string(),
            city: " ".to_string(),
            state: "Karnataka".to_string(),
            ..AddressInput::default()
        };
        assert_eq!(input.missing_fields(), vec!["city", "country", "ZIP code"]);
    }

    #[test]
    fn test_create_order_request_wire_format() {
        let request = CreateOrderRequest {
            address_id: AddressId::new("a1"),
            payment_method: PaymentMethod::CashOnDelivery,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "address_id": "a1", "payment_method": "COD" })
        );
    }

    #[test]
    fn test_customer_profile_accepts_user_id_alias() {
        let profile: CustomerProfile =
            serde_json::from_str(r#"{"user_id":"u9","email":"a@b.in"}"#).unwrap();
        assert_eq!(profile.id.as_str(), "u9");
        assert_eq!(profile.first_name, None);
    }
}
