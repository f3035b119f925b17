//! Status enums for orders and payments.
//!
//! The store API reports statuses as display labels ("Pending", "Shipped").
//! Known labels map onto variants; anything else is kept verbatim in
//! `Other` so an unexpected backend value still renders and still filters
//! by exact match.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Order lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    /// A label outside the known set, kept as received.
    Other(String),
}

impl OrderStatus {
    /// The statuses offered as filter tabs on the order history page.
    pub const FILTERABLE: [Self; 4] = [
        Self::Pending,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Parse an exact backend label.
    ///
    /// Returns `None` for an empty label so callers can apply their default.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let status = match label {
            "" => return None,
            "Pending" => Self::Pending,
            "Confirmed" => Self::Confirmed,
            "Shipped" => Self::Shipped,
            "Delivered" => Self::Delivered,
            "Cancelled" => Self::Cancelled,
            other => Self::Other(other.to_owned()),
        };
        Some(status)
    }

    /// The display label, identical to the wire value.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Other(label) => label,
        }
    }

    /// Whether the customer may still cancel an order in this status.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Colour family used by status badges and timeline markers.
    #[must_use]
    pub const fn tone(&self) -> &'static str {
        match self {
            Self::Delivered => "emerald",
            Self::Cancelled => "rose",
            Self::Pending => "amber",
            Self::Shipped => "blue",
            Self::Confirmed | Self::Other(_) => "gray",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label).unwrap_or_default())
    }
}

/// Payment settlement status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Other(String),
}

impl PaymentStatus {
    /// Parse an exact backend label; `None` for an empty label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let status = match label {
            "" => return None,
            "Pending" => Self::Pending,
            "Completed" => Self::Completed,
            "Failed" => Self::Failed,
            other => Self::Other(other.to_owned()),
        };
        Some(status)
    }

    /// The display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Other(label) => label,
        }
    }

    /// Colour family for the payment badge. Anything unsettled reads as pending.
    #[must_use]
    pub const fn tone(&self) -> &'static str {
        match self {
            Self::Completed => "emerald",
            Self::Failed => "rose",
            Self::Pending | Self::Other(_) => "amber",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status selector for the order history filter.
///
/// `All` is the wildcard; `Only` matches one status exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    /// Wire value of the wildcard.
    pub const ALL: &'static str = "all";

    /// Parse a query-string value. Empty and `all` both mean the wildcard.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == Self::ALL {
            return Self::All;
        }
        OrderStatus::from_label(value).map_or(Self::All, Self::Only)
    }

    /// Whether an order in `status` passes this filter.
    #[must_use]
    pub fn matches(&self, status: &OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }

    /// Query-string value for links.
    #[must_use]
    pub fn as_param(&self) -> &str {
        match self {
            Self::All => Self::ALL,
            Self::Only(status) => status.label(),
        }
    }

    /// Whether this is the wildcard.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}
