//! Store API access.
//!
//! # Architecture
//!
//! - The store API is the source of truth for products, carts, orders,
//!   addresses and payments. Nothing is persisted locally.
//! - Route handlers only see the [`StoreApi`] trait, held in `AppState` as a
//!   trait object. Production uses [`HttpStoreApi`]; tests inject fakes.
//! - Every endpoint answers with the same envelope:
//!   `{ "success": bool, "message"?: string, ...payload }`.
//! - Order, product and cart payloads are returned as raw JSON and shaped by
//!   `crate::orders::normalize`, which never fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use eshop_storefront::api::{HttpStoreApi, StoreApi};
//!
//! let api = HttpStoreApi::new(&config.api);
//! let login = api.login(&email, "hunter2").await?;
//! let orders = api.get_orders(&login.token).await?;
//! ```

mod client;
pub mod types;

pub use client::HttpStoreApi;
pub use types::*;

use async_trait::async_trait;
use eshop_core::{AddressId, Email, OrderId};
use thiserror::Error;

/// Message shown when the failure is ours or the network's, not the customer's.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Errors that can occur when calling the store API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Non-success HTTP status without a readable envelope.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// First part of the response body.
        body: String,
    },

    /// The API answered `success: false`.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The customer's token is missing, expired or revoked.
    #[error("Unauthorized")]
    Unauthorized,
}

impl ApiError {
    /// Text that is safe to show to the customer.
    ///
    /// Rejections carry the API's own message; transport failures collapse
    /// to a generic sentence.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) if !message.is_empty() => message.clone(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Like [`Self::user_message`], but with a page-specific sentence instead
    /// of the generic one.
    #[must_use]
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            Self::Rejected(message) if !message.is_empty() => message.clone(),
            Self::Unauthorized => self.user_message(),
            _ => fallback.to_string(),
        }
    }

    /// Whether the customer must log in again before retrying.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// The storefront's view of the store API.
///
/// Calls that act on a customer's data take that customer's access token.
/// Implementations must not retry; failures surface to the page.
#[async_trait]
pub trait StoreApi: Send + Sync {
    /// Exchange credentials for an access token and profile.
    async fn login(&self, email: &Email, password: &str) -> Result<LoginResult, ApiError>;

    /// Product catalogue, raw.
    async fn get_products(&self) -> Result<Vec<serde_json::Value>, ApiError>;

    /// The customer's order summaries, raw.
    async fn get_orders(&self, token: &AccessToken) -> Result<Vec<serde_json::Value>, ApiError>;

    /// One order as `{ order, items, tracking }`, raw.
    async fn get_order_details(
        &self,
        token: &AccessToken,
        order_id: &OrderId,
    ) -> Result<serde_json::Value, ApiError>;

    /// Cancel an order. Returns the API's confirmation message.
    async fn cancel_order(&self, token: &AccessToken, order_id: &OrderId)
    -> Result<String, ApiError>;

    /// The customer's cart lines, raw.
    async fn get_cart(&self, token: &AccessToken) -> Result<Vec<serde_json::Value>, ApiError>;

    /// The customer's saved addresses.
    async fn get_addresses(&self, token: &AccessToken) -> Result<Vec<Address>, ApiError>;

    /// Save a new address.
    async fn create_address(
        &self,
        token: &AccessToken,
        input: &AddressInput,
    ) -> Result<String, ApiError>;

    /// Replace an existing address.
    async fn update_address(
        &self,
        token: &AccessToken,
        address_id: &AddressId,
        input: &AddressInput,
    ) -> Result<String, ApiError>;

    /// Delete an address.
    async fn delete_address(
        &self,
        token: &AccessToken,
        address_id: &AddressId,
    ) -> Result<String, ApiError>;

    /// Turn the current cart into an order.
    async fn create_order(
        &self,
        token: &AccessToken,
        request: &CreateOrderRequest,
    ) -> Result<CreatedOrder, ApiError>;

    /// Confirm a payment reported by the checkout widget.
    async fn verify_payment(
        &self,
        token: &AccessToken,
        verification: &PaymentVerification,
    ) -> Result<String, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_is_shown_verbatim() {
        let err = ApiError::Rejected("Order already shipped".to_string());
        assert_eq!(err.user_message(), "Order already shipped");
        assert!(!err.requires_login());
    }

    #[test]
    fn test_empty_rejection_falls_back_to_generic() {
        let err = ApiError::Rejected(String::new());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_transport_errors_are_generic() {
        let err = ApiError::Status {
            status: 502,
            body: "<html>bad gateway</html>".to_string(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(
            err.to_string(),
            "Unexpected status 502: <html>bad gateway</html>"
        );
    }

    #[test]
    fn test_user_message_or_uses_page_fallback() {
        let rejected = ApiError::Rejected("Order not found".to_string());
        assert_eq!(rejected.user_message_or("Failed to cancel order"), "Order not found");

        let empty = ApiError::Rejected(String::new());
        assert_eq!(empty.user_message_or("Failed to cancel order"), "Failed to cancel order");

        let transport = ApiError::Status {
            status: 503,
            body: String::new(),
        };
        assert_eq!(transport.user_message_or("Failed to cancel order"), "Failed to cancel order");
    }

    #[test]
    fn test_unauthorized_requires_login() {
        assert!(ApiError::Unauthorized.requires_login());
    }
}
