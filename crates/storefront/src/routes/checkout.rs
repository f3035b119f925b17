//! Checkout handlers: review, place order, online payment verification.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use eshop_core::{AddressId, PaymentMethod};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use super::{action_failed, fetch_failed, flash_redirect};
use crate::api::{Address, CreateOrderRequest, CreatedOrder, PaymentVerification};
use crate::components::{EmptyState, Layout, LoadingSpinner};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{RequireAuth, take_flash};
use crate::models::{CurrentCustomer, Flash, PendingPayment, session_keys};
use crate::orders::{CartLine, cart_total, normalize_cart_item};
use crate::state::AppState;

const CHECKOUT_PATH: &str = "/checkout";
const ORDERS_PATH: &str = "/orders";
const PLACE_ORDER_FAILED: &str = "Failed to place order. Please try again.";
const VERIFY_FAILED: &str = "Failed to verify payment";

/// Brand colour of the payment widget.
const WIDGET_THEME_COLOR: &str = "#4F46E5";

// =============================================================================
// Form & Query Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutQuery {
    pub address: Option<String>,
}

/// Place-order form data.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderForm {
    #[serde(default)]
    pub address_id: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data.
#[derive(Clone)]
pub struct CartLineView {
    pub name: String,
    pub image: Option<String>,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            name: line.product_name.clone(),
            image: line.first_image().map(str::to_string),
            unit_price: line.price.display(),
            quantity: line.quantity,
            line_total: line.line_total().display(),
        }
    }
}

/// Saved address as a selectable card.
#[derive(Clone)]
pub struct AddressOptionView {
    pub id: String,
    pub summary: String,
    pub country_zip: String,
    pub phone: String,
    pub is_default: bool,
    pub selected: bool,
}

impl AddressOptionView {
    fn new(address: &Address, selected: Option<&AddressId>) -> Self {
        Self {
            id: address.address_id.to_string(),
            summary: address.summary(),
            country_zip: format!("{} - {}", address.country, address.zip_code),
            phone: address.phone.clone(),
            is_default: address.is_default,
            selected: selected == Some(&address.address_id),
        }
    }
}

/// Payment method radio option.
#[derive(Clone)]
pub struct PaymentOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub addresses: Vec<AddressOptionView>,
    pub payment_options: Vec<PaymentOptionView>,
}

/// Online payment page template; opens the payment widget.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/pay.html")]
pub struct PayTemplate {
    pub layout: Layout,
    pub order_id: String,
    pub short_code: String,
    pub amount: String,
    /// JSON options for the widget, read by `app.js`.
    pub widget_options: String,
    /// Covers the page while the verification form submits.
    pub spinner: LoadingSpinner,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout page.
#[instrument(skip(state, session, headers, customer, query))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Query(query): Query<CheckoutQuery>,
) -> Response {
    let layout = Layout::for_customer(&customer, take_flash(&session).await);

    let (cart, addresses) = tokio::join!(
        state.api().get_cart(&customer.token),
        state.api().get_addresses(&customer.token),
    );
    let (cart, addresses) = match (cart, addresses) {
        (Ok(cart), Ok(addresses)) => (cart, addresses),
        (Err(e), _) | (_, Err(e)) => {
            return fetch_failed(
                &session,
                &headers,
                layout,
                &e,
                EmptyState::something_went_wrong(e.user_message()),
            )
            .await;
        }
    };

    let lines: Vec<CartLine> = cart.iter().map(normalize_cart_item).collect();
    if lines.is_empty() {
        return flash_redirect(&session, Flash::error("Your cart is empty"), "/").await;
    }

    let requested = query
        .address
        .filter(|id| !id.is_empty())
        .map(AddressId::new);
    let selected = select_address(&addresses, requested.as_ref());

    CheckoutTemplate {
        layout,
        total: cart_total(&lines).display(),
        lines: lines.iter().map(CartLineView::from).collect(),
        addresses: addresses
            .iter()
            .map(|address| AddressOptionView::new(address, selected))
            .collect(),
        payment_options: PaymentMethod::ALL
            .into_iter()
            .map(|method| PaymentOptionView {
                value: method.as_str(),
                label: method.label(),
                checked: method == PaymentMethod::default(),
            })
            .collect(),
    }
    .into_response()
}

/// The address preselected at checkout: the requested one if it exists,
/// else the default, else the first.
fn select_address<'a>(addresses: &'a [Address], requested: Option<&AddressId>) -> Option<&'a AddressId> {
    requested
        .and_then(|id| addresses.iter().find(|a| &a.address_id == id))
        .or_else(|| addresses.iter().find(|a| a.is_default))
        .or_else(|| addresses.first())
        .map(|a| &a.address_id)
}

/// Place the order. Cash on delivery finishes here; online payment continues
/// on the payment page.
#[instrument(skip(state, session, headers, customer, form), fields(payment_method = %form.payment_method))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<PlaceOrderForm>,
) -> Response {
    let Some(address_id) = form.address_id.filter(|id| !id.is_empty()).map(AddressId::new) else {
        return flash_redirect(
            &session,
            Flash::error("Please select or add an address"),
            CHECKOUT_PATH,
        )
        .await;
    };
    let retry_path = format!("{CHECKOUT_PATH}?address={}", urlencoding::encode(address_id.as_str()));

    let request = CreateOrderRequest {
        address_id,
        payment_method: form.payment_method,
    };
    let created = match state.api().create_order(&customer.token, &request).await {
        Ok(created) => created,
        Err(e) => {
            return action_failed(&session, &headers, &e, PLACE_ORDER_FAILED, &retry_path).await;
        }
    };

    add_breadcrumb(
        "checkout",
        "Order created",
        Some(&[("order_id", created.order_id.as_str())]),
    );
    state.forget_orders(&customer.cache_key()).await;

    if !form.payment_method.requires_online_payment() {
        tracing::info!(order_id = %created.order_id, "Cash on delivery order placed");
        return flash_redirect(&session, Flash::success("Order placed successfully!"), ORDERS_PATH)
            .await;
    }

    let Some(razorpay_order_id) = created.razorpay_order_id.clone() else {
        tracing::error!(order_id = %created.order_id, "Order created without a gateway order id");
        return flash_redirect(&session, Flash::error(PLACE_ORDER_FAILED), &retry_path).await;
    };

    let Some(amount_paise) = created.amount.to_minor_units().filter(|&paise| paise > 0) else {
        tracing::error!(order_id = %created.order_id, amount = %created.amount, "Order amount cannot be charged online");
        return flash_redirect(&session, Flash::error(PLACE_ORDER_FAILED), &retry_path).await;
    };

    let pending = PendingPayment {
        order_id: created.order_id.clone(),
        razorpay_order_id,
    };
    if let Err(e) = session.insert(session_keys::PENDING_PAYMENT, &pending).await {
        tracing::error!(error = %e, "Failed to store pending payment");
        return flash_redirect(&session, Flash::error(PLACE_ORDER_FAILED), &retry_path).await;
    }

    PayTemplate {
        layout: Layout::for_customer(&customer, None),
        order_id: created.order_id.to_string(),
        short_code: created.order_id.short_code(),
        amount: created.amount.display(),
        widget_options: widget_options(&state, &customer, &created, &pending, amount_paise).to_string(),
        spinner: LoadingSpinner::FULL_SCREEN,
    }
    .into_response()
}

/// Options for the payment widget.
fn widget_options(
    state: &AppState,
    customer: &CurrentCustomer,
    order: &CreatedOrder,
    pending: &PendingPayment,
    amount_paise: i64,
) -> serde_json::Value {
    let payments = &state.config().payments;
    json!({
        "key": payments.razorpay_key_id,
        "amount": amount_paise,
        "currency": order.currency,
        "name": payments.store_name,
        "description": "Order Payment",
        "order_id": pending.razorpay_order_id,
        "prefill": {
            "name": customer.first_name.clone().unwrap_or_default(),
            "email": customer.email,
            "contact": customer.phone.clone().unwrap_or_default(),
        },
        "theme": { "color": WIDGET_THEME_COLOR },
    })
}

/// Verify the payment the widget reported.
#[instrument(skip(state, session, headers, customer, verification), fields(order_id = %verification.order_id))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Form(verification): Form<PaymentVerification>,
) -> Response {
    let pending = session
        .get::<PendingPayment>(session_keys::PENDING_PAYMENT)
        .await
        .ok()
        .flatten();

    let matches_pending = pending.as_ref().is_some_and(|p| {
        p.order_id == verification.order_id && p.razorpay_order_id == verification.razorpay_order_id
    });
    if !matches_pending {
        tracing::warn!("Payment callback does not match the pending payment");
        return flash_redirect(&session, Flash::error(VERIFY_FAILED), ORDERS_PATH).await;
    }

    match state.api().verify_payment(&customer.token, &verification).await {
        Ok(_) => {
            if let Err(e) = session
                .remove::<PendingPayment>(session_keys::PENDING_PAYMENT)
                .await
            {
                tracing::warn!(error = %e, "Failed to clear pending payment");
            }
            state.forget_orders(&customer.cache_key()).await;
            tracing::info!("Payment verified");
            flash_redirect(&session, Flash::success("Payment successful! Order placed."), ORDERS_PATH)
                .await
        }
        Err(e) => action_failed(&session, &headers, &e, VERIFY_FAILED, ORDERS_PATH).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(id: &str, is_default: bool) -> Address {
        Address {
            address_id: AddressId::new(id),
            is_default,
            ..Address::default()
        }
    }

    #[test]
    fn test_select_address_prefers_requested() {
        let addresses = vec![address("a", false), address("b", true), address("c", false)];
        let requested = AddressId::new("c");
        assert_eq!(
            select_address(&addresses, Some(&requested)).map(AddressId::as_str),
            Some("c")
        );
    }

    #[test]
    fn test_select_address_falls_back_to_default_then_first() {
        let with_default = vec![address("a", false), address("b", true)];
        let unknown = AddressId::new("deleted");
        assert_eq!(
            select_address(&with_default, Some(&unknown)).map(AddressId::as_str),
            Some("b")
        );

        let without_default = vec![address("a", false), address("b", false)];
        assert_eq!(
            select_address(&without_default, None).map(AddressId::as_str),
            Some("a")
        );

        assert_eq!(select_address(&[], None), None);
    }

    #[test]
    fn test_address_option_view() {
        let mut saved = address("a", true);
        saved.address_line = "12 MG Road".to_string();
        saved.city = "Pune".to_string();
        saved.state = "Maharashtra".to_string();
        saved.country = "India".to_string();
        saved.zip_code = "411001".to_string();

        let view = AddressOptionView::new(&saved, Some(&AddressId::new("a")));
        assert_eq!(view.summary, "12 MG Road, Pune, Maharashtra");
        assert_eq!(view.country_zip, "India - 411001");
        assert!(view.selected);
    }
}
