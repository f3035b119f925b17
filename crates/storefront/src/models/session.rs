//! Session-related types.
//!
//! Types stored in the session: the logged-in customer, one-shot flash
//! messages, and the online payment awaiting verification.

use eshop_core::{CustomerId, OrderId};
use serde::{Deserialize, Serialize};

use crate::api::{AccessToken, LoginResult};

/// Session-stored customer identity.
///
/// Holds the store API token, so every customer-scoped call can be made
/// without asking the customer to log in again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub id: CustomerId,
    pub email: String,
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub token: AccessToken,
}

impl CurrentCustomer {
    /// Name used in greetings and payment prefill; falls back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }

    /// Key for per-customer caches. Falls back to the email when the API
    /// returned no id.
    #[must_use]
    pub fn cache_key(&self) -> String {
        if self.id.is_empty() {
            self.email.clone()
        } else {
            self.id.to_string()
        }
    }
}

impl From<LoginResult> for CurrentCustomer {
    fn from(login: LoginResult) -> Self {
        Self {
            id: login.customer.id,
            email: login.customer.email,
            first_name: login.customer.first_name,
            phone: login.customer.phone,
            token: login.token,
        }
    }
}

/// Flash message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

impl Flash {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, FlashKind::Error)
    }
}

/// An order placed with online payment whose widget callback has not been
/// verified yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub order_id: OrderId,
    pub razorpay_order_id: String,
}

/// Session keys.
pub mod session_keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the flash message shown on the next page.
    pub const FLASH: &str = "flash";

    /// Key for the online payment awaiting verification.
    pub const PENDING_PAYMENT: &str = "pending_payment";

    /// Key for the order cancelled by the previous request.
    pub const CANCELLED_ORDER: &str = "cancelled_order";
}

#[cfg(test)]
mod tests {
    use crate::api::CustomerProfile;

    use super::*;

    fn customer(first_name: Option<&str>) -> CurrentCustomer {
        CurrentCustomer::from(LoginResult {
            token: AccessToken::new("t"),
            customer: CustomerProfile {
                id: CustomerId::new("c42"),
                email: "asha@example.in".to_string(),
                first_name: first_name.map(str::to_string),
                phone: None,
            },
        })
    }

    #[test]
    fn test_display_name_prefers_first_name() {
        assert_eq!(customer(Some("Asha")).display_name(), "Asha");
        assert_eq!(customer(Some("")).display_name(), "asha@example.in");
        assert_eq!(customer(None).display_name(), "asha@example.in");
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(customer(None).cache_key(), "c42");

        let mut anonymous = customer(None);
        anonymous.id = CustomerId::default();
        assert_eq!(anonymous.cache_key(), "asha@example.in");
    }

    #[test]
    fn test_flash_serializes_kind_lowercase() {
        let json = serde_json::to_value(Flash::error("Failed to cancel order")).unwrap_or_default();
        assert_eq!(json["kind"], "error");
        assert!(Flash::error("x").is_error());
        assert!(!Flash::success("x").is_error());
    }
}
