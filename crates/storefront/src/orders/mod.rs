//! Order, product and cart view models.
//!
//! Everything here is built from raw store API JSON by [`normalize`] and is
//! complete: every field a template reads already holds its default.
//! [`filter`] holds the pure operations on order lists.

pub mod filter;
pub mod normalize;

pub use filter::{StatusTab, filter_orders, mark_cancelled, status_tabs};
pub use normalize::{
    normalize_cart_item, normalize_order_detail, normalize_order_summary, normalize_product,
};

use chrono::{DateTime, Utc};
use eshop_core::{OrderId, OrderStatus, PaymentStatus, Price, ProductId};

/// Date shown on order history rows, e.g. "Mar 4, 2025".
const DATE_FORMAT: &str = "%b %-d, %Y";
/// Date and time shown on the order detail page, e.g. "Mar 4, 2025, 02:30 PM".
const DATE_TIME_FORMAT: &str = "%b %-d, %Y, %I:%M %p";

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

/// One row of the order history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub total: Price,
    pub status: OrderStatus,
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub payment_method: String,
    pub items: Vec<LineItem>,
}

impl OrderSummary {
    /// "Mar 4, 2025".
    #[must_use]
    pub fn placed_on(&self) -> String {
        self.created_at.format(DATE_FORMAT).to_string()
    }

    /// City and state joined with a comma when both are present.
    #[must_use]
    pub fn city_state(&self) -> String {
        join_present(&self.city, &self.state)
    }
}

/// A single order with everything the detail page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetail {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub total: Price,
    pub status: OrderStatus,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub address: ShippingAddress,
    pub items: Vec<LineItem>,
    pub tracking: Vec<TrackingEvent>,
}

impl OrderDetail {
    /// "Mar 4, 2025, 02:30 PM".
    #[must_use]
    pub fn placed_at(&self) -> String {
        self.created_at.format(DATE_TIME_FORMAT).to_string()
    }

    /// Whether the cancel action is offered.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        self.status.is_cancellable()
    }

    /// Sum of line totals; the backend total is shown, this is for the invoice breakdown.
    #[must_use]
    pub fn items_subtotal(&self) -> Price {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Apply a confirmed cancellation without refetching.
    pub fn mark_cancelled(&mut self) {
        self.status = OrderStatus::Cancelled;
    }
}

/// Shipping address as printed on an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    pub line: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub phone: String,
}

impl ShippingAddress {
    /// "Pune, Maharashtra"; no dangling comma when either is blank.
    #[must_use]
    pub fn city_state(&self) -> String {
        join_present(&self.city, &self.state)
    }

    /// "411001, India"; no dangling comma when either is blank.
    #[must_use]
    pub fn zip_country(&self) -> String {
        join_present(&self.zip_code, &self.country)
    }
}

/// A purchased product within an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_name: String,
    pub description: String,
    pub price: Price,
    /// Always at least 1.
    pub quantity: u32,
    pub images: Vec<String>,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }

    #[must_use]
    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// One entry of an order's tracking timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingEvent {
    pub status: String,
    pub updated_at: DateTime<Utc>,
    pub notes: String,
}

impl TrackingEvent {
    #[must_use]
    pub fn updated_on(&self) -> String {
        self.updated_at.format(DATE_TIME_FORMAT).to_string()
    }

    /// Badge colour, shared with order statuses.
    #[must_use]
    pub fn tone(&self) -> &'static str {
        OrderStatus::from_label(&self.status).map_or("gray", |status| status.tone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalogue & cart
// ─────────────────────────────────────────────────────────────────────────────

/// A product as shown in the catalogue grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    /// Shown struck through next to the price when present.
    pub original_price: Option<Price>,
    /// Units in stock.
    pub quantity: i64,
    pub images: Vec<String>,
}

impl ProductCard {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    #[must_use]
    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// One line of the customer's cart at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub cart_id: String,
    pub product_name: String,
    pub price: Price,
    pub quantity: u32,
    pub images: Vec<String>,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }

    #[must_use]
    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Amount the customer will be charged for a cart.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::line_total).sum()
}

fn join_present(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (false, false) => format!("{first}, {second}"),
        (false, true) => first.to_string(),
        (true, _) => second.to_string(),
    }
}
