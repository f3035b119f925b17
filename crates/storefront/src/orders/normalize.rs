//! Shape raw store API JSON into complete view models.
//!
//! These functions never fail. A missing key, a `null`, an empty string or a
//! value of the wrong JSON type all read as "missing" and the field takes its
//! default. Numbers may arrive as JSON numbers or numeric strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use eshop_core::{OrderId, OrderStatus, PaymentStatus, Price, ProductId};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde_json::Value;

use super::{CartLine, LineItem, OrderDetail, OrderSummary, ProductCard, ShippingAddress, TrackingEvent};

const NOT_SPECIFIED: &str = "Not specified";
const NOT_PROVIDED: &str = "Not provided";
const UNNAMED_PRODUCT: &str = "Unnamed Product";
const UNTITLED_PRODUCT: &str = "Untitled Product";
const NO_DESCRIPTION: &str = "No description available";
const DEFAULT_TRACKING_STATUS: &str = "Pending";
const DEFAULT_TRACKING_NOTE: &str = "Status update";

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

/// Build an order detail from `{ order, items, tracking }`.
///
/// `requested_id` is the id from the URL, used when the payload has none.
#[must_use]
pub fn normalize_order_detail(raw: &Value, requested_id: &OrderId) -> OrderDetail {
    normalize_order_detail_at(raw, requested_id, Utc::now())
}

fn normalize_order_detail_at(raw: &Value, requested_id: &OrderId, now: DateTime<Utc>) -> OrderDetail {
    let order = raw.get("order");
    let field = |key: &str| order.and_then(|o| o.get(key));

    OrderDetail {
        id: json_text(field("order_id")).map_or_else(|| requested_id.clone(), OrderId::new),
        created_at: timestamp(field("created_at"), now),
        total: price(field("total_amount")),
        status: order_status(field("order_status")),
        payment_method: text_or(field("payment_method"), NOT_SPECIFIED),
        payment_status: json_text(field("payment_status"))
            .and_then(|label| PaymentStatus::from_label(&label))
            .unwrap_or_default(),
        address: ShippingAddress {
            line: text_or(field("address_line"), NOT_SPECIFIED),
            city: text_or(field("city"), ""),
            state: text_or(field("state"), ""),
            country: text_or(field("country"), ""),
            zip_code: text_or(field("zip_code"), ""),
            phone: text_or(field("phone"), NOT_PROVIDED),
        },
        items: array(raw.get("items")).map(line_item).collect(),
        tracking: array(raw.get("tracking"))
            .map(|track| tracking_event(track, now))
            .collect(),
    }
}

/// Build an order history row from one entry of the orders list.
#[must_use]
pub fn normalize_order_summary(raw: &Value) -> OrderSummary {
    normalize_order_summary_at(raw, Utc::now())
}

fn normalize_order_summary_at(raw: &Value, now: DateTime<Utc>) -> OrderSummary {
    OrderSummary {
        id: OrderId::new(text_or(raw.get("order_id"), "")),
        created_at: timestamp(raw.get("created_at"), now),
        total: price(raw.get("total_amount")),
        status: order_status(raw.get("order_status")),
        address_line: text_or(raw.get("address_line"), NOT_SPECIFIED),
        city: text_or(raw.get("city"), ""),
        state: text_or(raw.get("state"), ""),
        payment_method: text_or(raw.get("payment_method"), NOT_SPECIFIED),
        items: array(raw.get("items")).map(line_item).collect(),
    }
}

fn line_item(raw: &Value) -> LineItem {
    LineItem {
        product_name: json_text(raw.get("productName"))
            .or_else(|| json_text(raw.get("product_name")))
            .unwrap_or_else(|| UNNAMED_PRODUCT.to_string()),
        description: text_or(raw.get("description"), NO_DESCRIPTION),
        price: price(raw.get("price")),
        quantity: quantity(raw.get("quantity")),
        images: string_list(raw.get("images")),
    }
}

fn tracking_event(raw: &Value, now: DateTime<Utc>) -> TrackingEvent {
    TrackingEvent {
        status: text_or(raw.get("status"), DEFAULT_TRACKING_STATUS),
        updated_at: timestamp(raw.get("update_time"), now),
        notes: text_or(raw.get("notes"), DEFAULT_TRACKING_NOTE),
    }
}

fn order_status(value: Option<&Value>) -> OrderStatus {
    json_text(value)
        .and_then(|label| OrderStatus::from_label(&label))
        .unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalogue & cart
// ─────────────────────────────────────────────────────────────────────────────

/// Build a catalogue card from one product.
#[must_use]
pub fn normalize_product(raw: &Value) -> ProductCard {
    ProductCard {
        product_id: ProductId::new(text_or(raw.get("productId"), "")),
        name: text_or(raw.get("productName"), UNTITLED_PRODUCT),
        price: price(raw.get("price")),
        original_price: json_decimal(raw.get("originalPrice"))
            .filter(|amount| !amount.is_zero())
            .map(Price::new),
        quantity: json_decimal(raw.get("quantity"))
            .and_then(|amount| amount.trunc().to_i64())
            .unwrap_or(0),
        images: string_list(raw.get("images")),
    }
}

/// Build a checkout line from one cart entry.
#[must_use]
pub fn normalize_cart_item(raw: &Value) -> CartLine {
    CartLine {
        cart_id: text_or(raw.get("cartId"), ""),
        product_name: json_text(raw.get("productName"))
            .or_else(|| json_text(raw.get("product_name")))
            .unwrap_or_else(|| UNNAMED_PRODUCT.to_string()),
        price: price(raw.get("price")),
        quantity: quantity(raw.get("quantity")),
        images: string_list(raw.get("images")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lenient readers
// ─────────────────────────────────────────────────────────────────────────────

/// A non-empty string, or a number rendered as text.
pub(crate) fn json_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A decimal from a JSON number or a numeric string.
pub(crate) fn json_decimal(value: Option<&Value>) -> Option<Decimal> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    json_text(value).unwrap_or_else(|| default.to_string())
}

fn price(value: Option<&Value>) -> Price {
    Price::new(json_decimal(value).unwrap_or_default())
}

/// A positive whole quantity; anything else reads as 1.
fn quantity(value: Option<&Value>) -> u32 {
    json_decimal(value)
        .and_then(|amount| amount.trunc().to_u32())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

/// RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.fff]` taken as UTC.
fn timestamp(value: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = json_text(value) else {
        return now;
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return parsed.with_timezone(&Utc);
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())
        .map_or(now, |naive| naive.and_utc())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    array(value)
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn array(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}
