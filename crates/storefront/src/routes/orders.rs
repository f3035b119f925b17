//! Order history, order detail and cancellation handlers.
//!
//! The history page keeps the customer's order list in `AppState`'s order
//! cache. A full page load refetches it; HTMX search and filter requests
//! re-render the results fragment from the cached list.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use eshop_core::{OrderId, OrderStatus, StatusFilter};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{fetch_failed, flash_redirect, is_htmx};
use crate::api::ApiError;
use crate::components::{
    EmptyState, EmptyStateAction, EmptyStateIcon, ErrorPage, Layout, LoadingSpinner,
};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{RequireAuth, expire_login, take_flash};
use crate::models::{CurrentCustomer, Flash, session_keys};
use crate::orders::{
    LineItem, OrderDetail, OrderSummary, TrackingEvent, filter_orders, normalize_order_detail,
    normalize_order_summary, status_tabs,
};
use crate::state::AppState;

const FETCH_ORDERS_FAILED: &str = "Failed to fetch orders. Please try again later.";
const LOAD_ORDER_FAILED: &str = "Failed to load order details";
const LOAD_ORDER_ERROR: &str = "An error occurred while loading order details";
const CANCEL_FAILED: &str = "Failed to cancel order";

// =============================================================================
// Query Types
// =============================================================================

/// Order history search, filter and expanded row.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrdersQuery {
    pub q: String,
    pub status: StatusFilter,
    pub expanded: Option<String>,
}

impl OrdersQuery {
    fn expanded_id(&self) -> Option<&str> {
        self.expanded.as_deref().filter(|id| !id.is_empty())
    }

    fn is_narrowed(&self) -> bool {
        !self.q.is_empty() || !self.status.is_all()
    }

    /// Link to the history with this search, a given filter and expanded row.
    fn href(&self, status: &StatusFilter, expanded: Option<&str>) -> String {
        let mut href = format!(
            "/orders?q={}&status={}",
            urlencoding::encode(&self.q),
            urlencoding::encode(status.as_param())
        );
        if let Some(id) = expanded {
            href.push_str("&expanded=");
            href.push_str(&urlencoding::encode(id));
        }
        href
    }
}

/// Which tab of the order detail page is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailTab {
    #[default]
    Details,
    Invoice,
    Support,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetailQuery {
    pub tab: DetailTab,
}

// =============================================================================
// View Types
// =============================================================================

/// Product line shown in an expanded history row.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub image: Option<String>,
}

impl From<&LineItem> for OrderItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.product_name.clone(),
            quantity: item.quantity,
            price: item.price.display(),
            image: item.first_image().map(str::to_string),
        }
    }
}

/// One order history row.
#[derive(Clone)]
pub struct OrderRowView {
    pub id: String,
    pub short_code: String,
    pub placed_on: String,
    pub total: String,
    pub status: String,
    pub tone: &'static str,
    pub address_line: String,
    pub city_state: String,
    pub payment_method: String,
    pub items: Vec<OrderItemView>,
    pub expanded: bool,
    pub toggle_href: String,
}

impl OrderRowView {
    fn new(order: &OrderSummary, query: &OrdersQuery) -> Self {
        let expanded = query.expanded_id() == Some(order.id.as_str());
        let toggle = if expanded { None } else { Some(order.id.as_str()) };

        Self {
            id: order.id.to_string(),
            short_code: order.id.short_code(),
            placed_on: order.placed_on(),
            total: order.total.display(),
            status: order.status.label().to_string(),
            tone: order.status.tone(),
            address_line: order.address_line.clone(),
            city_state: order.city_state(),
            payment_method: order.payment_method.clone(),
            items: order.items.iter().map(OrderItemView::from).collect(),
            expanded,
            toggle_href: query.href(&query.status, toggle),
        }
    }
}

/// A status filter link.
#[derive(Clone)]
pub struct TabView {
    pub label: String,
    pub count: usize,
    pub active: bool,
    pub href: String,
}

/// Counters in the page header.
#[derive(Clone, Copy)]
pub struct OrderStats {
    pub total: usize,
    pub delivered: usize,
    pub shipped: usize,
    pub pending: usize,
}

impl OrderStats {
    fn new(orders: &[OrderSummary]) -> Self {
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();
        Self {
            total: orders.len(),
            delivered: count(OrderStatus::Delivered),
            shipped: count(OrderStatus::Shipped),
            pending: count(OrderStatus::Pending),
        }
    }
}

/// The part of the history page HTMX swaps: tabs and result rows.
#[derive(Clone)]
pub struct OrdersResultsView {
    pub tabs: Vec<TabView>,
    pub rows: Vec<OrderRowView>,
    pub empty: Option<EmptyState>,
}

impl OrdersResultsView {
    fn new(orders: &[OrderSummary], query: &OrdersQuery) -> Self {
        let tabs = status_tabs(orders, &query.status)
            .into_iter()
            .map(|tab| TabView {
                href: query.href(&StatusFilter::parse(&tab.value), None),
                label: tab.label,
                count: tab.count,
                active: tab.active,
            })
            .collect();

        let rows: Vec<OrderRowView> = filter_orders(orders, &query.q, &query.status)
            .into_iter()
            .map(|order| OrderRowView::new(order, query))
            .collect();

        let empty = rows.is_empty().then(|| no_orders_state(query.is_narrowed()));

        Self { tabs, rows, empty }
    }

    fn failed(message: String) -> Self {
        Self {
            tabs: Vec::new(),
            rows: Vec::new(),
            empty: Some(EmptyState::something_went_wrong(message)),
        }
    }
}

fn no_orders_state(narrowed: bool) -> EmptyState {
    let description = if narrowed {
        "Try adjusting your search or filter criteria"
    } else {
        "You haven't placed any orders yet"
    };
    EmptyState::new(EmptyStateIcon::Box, "No orders found", description)
        .with_action(EmptyStateAction::link("Continue Shopping", "/"))
}

/// Line of the order detail page.
#[derive(Clone)]
pub struct LineItemView {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&LineItem> for LineItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.product_name.clone(),
            description: item.description.clone(),
            image: item.first_image().map(str::to_string),
            quantity: item.quantity,
            unit_price: item.price.display(),
            line_total: item.line_total().display(),
        }
    }
}

/// Entry of the tracking timeline.
#[derive(Clone)]
pub struct TrackingView {
    pub status: String,
    pub tone: &'static str,
    pub updated_on: String,
    pub notes: String,
}

impl From<&TrackingEvent> for TrackingView {
    fn from(event: &TrackingEvent) -> Self {
        Self {
            status: event.status.clone(),
            tone: event.tone(),
            updated_on: event.updated_on(),
            notes: event.notes.clone(),
        }
    }
}

/// Order detail display data.
#[derive(Clone)]
pub struct OrderDetailView {
    pub id: String,
    pub short_code: String,
    pub status: String,
    pub tone: &'static str,
    pub placed_at: String,
    pub total: String,
    pub subtotal: String,
    pub can_cancel: bool,
    pub payment_method: String,
    pub payment_status: String,
    pub payment_tone: &'static str,
    pub address_line: String,
    pub city_state: String,
    pub zip_country: String,
    pub phone: String,
    pub items: Vec<LineItemView>,
    pub tracking: Vec<TrackingView>,
}

impl From<&OrderDetail> for OrderDetailView {
    fn from(order: &OrderDetail) -> Self {
        Self {
            id: order.id.to_string(),
            short_code: order.id.short_code(),
            status: order.status.label().to_string(),
            tone: order.status.tone(),
            placed_at: order.placed_at(),
            total: order.total.display(),
            subtotal: order.items_subtotal().display(),
            can_cancel: order.can_cancel(),
            payment_method: order.payment_method.clone(),
            payment_status: order.payment_status.label().to_string(),
            payment_tone: order.payment_status.tone(),
            address_line: order.address.line.clone(),
            city_state: order.address.city_state(),
            zip_country: order.address.zip_country(),
            phone: order.address.phone.clone(),
            items: order.items.iter().map(LineItemView::from).collect(),
            tracking: order.tracking.iter().map(TrackingView::from).collect(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub stats: OrderStats,
    pub q: String,
    pub status: String,
    pub results: OrdersResultsView,
    pub spinner: LoadingSpinner,
}

/// Order history results fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "orders/_results.html")]
pub struct OrdersResultsTemplate {
    pub results: OrdersResultsView,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderDetailView,
    pub tab: DetailTab,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the order history, or only its results for HTMX requests.
#[instrument(skip(state, session, headers, customer, query), fields(q = %query.q, status = %query.status.as_param()))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Response {
    let cache_key = customer.cache_key();

    if is_htmx(&headers) {
        let orders = match state.cached_orders(&cache_key).await {
            Some(orders) => Ok(orders),
            None => fetch_orders(&state, &customer).await,
        };
        return match orders {
            Ok(orders) => OrdersResultsTemplate {
                results: OrdersResultsView::new(&orders, &query),
            }
            .into_response(),
            Err(e) if e.requires_login() => expire_login(&session, &headers).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch orders");
                OrdersResultsTemplate {
                    results: OrdersResultsView::failed(e.user_message_or(FETCH_ORDERS_FAILED)),
                }
                .into_response()
            }
        };
    }

    let layout = Layout::for_customer(&customer, take_flash(&session).await);
    match fetch_orders(&state, &customer).await {
        Ok(orders) => OrdersIndexTemplate {
            layout,
            stats: OrderStats::new(&orders),
            q: query.q.clone(),
            status: query.status.as_param().to_string(),
            results: OrdersResultsView::new(&orders, &query),
            spinner: LoadingSpinner::INLINE,
        }
        .into_response(),
        Err(e) => {
            let message = e.user_message_or(FETCH_ORDERS_FAILED);
            fetch_failed(
                &session,
                &headers,
                layout,
                &e,
                EmptyState::something_went_wrong(message),
            )
            .await
        }
    }
}

/// Fetch, normalize and cache the customer's orders.
async fn fetch_orders(
    state: &AppState,
    customer: &CurrentCustomer,
) -> Result<Arc<Vec<OrderSummary>>, ApiError> {
    let raw = state.api().get_orders(&customer.token).await?;
    let orders = Arc::new(raw.iter().map(normalize_order_summary).collect::<Vec<_>>());
    state
        .cache_orders(customer.cache_key(), Arc::clone(&orders))
        .await;
    Ok(orders)
}

/// Display one order.
#[instrument(skip(state, session, headers, customer, query), fields(order_id = %order_id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Path(order_id): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Response {
    let order_id = OrderId::new(order_id);
    let layout = Layout::for_customer(&customer, take_flash(&session).await);
    let just_cancelled = take_just_cancelled(&session, &order_id).await;

    match fetch_order(&state, &customer, &order_id).await {
        Ok(Some(mut order)) => {
            // The backend may not report the cancellation yet.
            if just_cancelled {
                order.mark_cancelled();
            }
            OrderShowTemplate {
                layout,
                order: OrderDetailView::from(&order),
                tab: query.tab,
            }
            .into_response()
        }
        Ok(None) => order_not_found(layout),
        Err(e) => {
            let description = match &e {
                ApiError::Rejected(_) => e.user_message_or(LOAD_ORDER_FAILED),
                _ => LOAD_ORDER_ERROR.to_string(),
            };
            fetch_failed(&session, &headers, layout, &e, order_error_state(description)).await
        }
    }
}

/// Fetch and normalize one order. `None` when the API returned no order.
async fn fetch_order(
    state: &AppState,
    customer: &CurrentCustomer,
    order_id: &OrderId,
) -> Result<Option<OrderDetail>, ApiError> {
    let raw = state
        .api()
        .get_order_details(&customer.token, order_id)
        .await?;
    if raw.is_null() {
        return Ok(None);
    }
    Ok(Some(normalize_order_detail(&raw, order_id)))
}

fn order_error_state(description: String) -> EmptyState {
    EmptyState::new(EmptyStateIcon::Error, "Error loading order", description)
        .with_action(EmptyStateAction::link("Back to Orders", "/orders"))
}

fn order_not_found(layout: Layout) -> Response {
    ErrorPage::new(
        StatusCode::NOT_FOUND,
        layout,
        EmptyState::new(
            EmptyStateIcon::Box,
            "Order not found",
            "We couldn't find details for this order",
        )
        .with_action(EmptyStateAction::link("Back to Orders", "/orders"))
        .with_action(EmptyStateAction::link("Continue Shopping", "/").secondary()),
    )
    .into_response()
}

/// Cancel an order, then redirect to its detail page with the outcome.
#[instrument(skip(state, session, headers, customer), fields(order_id = %order_id))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Path(order_id): Path<String>,
) -> Response {
    let order_id = OrderId::new(order_id);

    let order = match fetch_order(&state, &customer, &order_id).await {
        Ok(Some(order)) => order,
        Ok(None) => return order_not_found(Layout::for_customer(&customer, None)),
        Err(e) => {
            let layout = Layout::for_customer(&customer, None);
            return fetch_failed(
                &session,
                &headers,
                layout,
                &e,
                order_error_state(e.user_message_or(LOAD_ORDER_FAILED)),
            )
            .await;
        }
    };

    let flash = if order.can_cancel() {
        match state.api().cancel_order(&customer.token, &order_id).await {
            Ok(_) => {
                state
                    .cancel_cached_order(&customer.cache_key(), &order_id)
                    .await;
                if let Err(e) = session.insert(session_keys::CANCELLED_ORDER, &order_id).await {
                    tracing::warn!(error = %e, "Failed to remember cancelled order");
                }
                add_breadcrumb("orders", "Cancelled order", Some(&[("order_id", order_id.as_str())]));
                tracing::info!("Order cancelled");
                Flash::success("Order cancelled successfully")
            }
            Err(e) if e.requires_login() => return expire_login(&session, &headers).await,
            Err(e) => {
                tracing::warn!(error = %e, "Cancel order failed");
                Flash::error(e.user_message_or(CANCEL_FAILED))
            }
        }
    } else {
        Flash::error(format!(
            "This order is {} and can no longer be cancelled",
            order.status.label().to_lowercase()
        ))
    };

    flash_redirect(&session, flash, &detail_path(&order_id)).await
}

fn detail_path(order_id: &OrderId) -> String {
    format!("/orders/{}", urlencoding::encode(order_id.as_str()))
}

/// Whether the request that redirected here cancelled `order_id`. The marker
/// is consumed, so only the first render after the cancel sees it.
async fn take_just_cancelled(session: &Session, order_id: &OrderId) -> bool {
    session
        .remove::<OrderId>(session_keys::CANCELLED_ORDER)
        .await
        .ok()
        .flatten()
        .is_some_and(|cancelled| &cancelled == order_id)
}
