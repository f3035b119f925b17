//! Payment methods offered at checkout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error parsing a [`PaymentMethod`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported payment method: {0}")]
pub struct PaymentMethodError(pub String);

/// How the customer pays for an order.
///
/// Wire values are `Razorpay` and `COD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Online payment through the Razorpay checkout widget.
    #[default]
    Razorpay,
    /// Cash on delivery; the order is placed without a payment step.
    #[serde(rename = "COD")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Every method, in the order shown on the checkout page.
    pub const ALL: [Self; 2] = [Self::Razorpay, Self::CashOnDelivery];

    /// Wire value sent to the store API and used in form fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Razorpay => "Razorpay",
            Self::CashOnDelivery => "COD",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Razorpay => "Pay online (cards, UPI, netbanking)",
            Self::CashOnDelivery => "Cash on delivery",
        }
    }

    /// Whether placing the order must be followed by an online payment.
    #[must_use]
    pub const fn requires_online_payment(self) -> bool {
        matches!(self, Self::Razorpay)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Razorpay" => Ok(Self::Razorpay),
            "COD" => Ok(Self::CashOnDelivery),
            other => Err(PaymentMethodError(other.to_owned())),
        }
    }
}
