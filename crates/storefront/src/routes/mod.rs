//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Product grid
//! GET  /products                  - Product grid
//!
//! # Orders (requires auth)
//! GET  /orders                    - Order history (?q=&status=&expanded=)
//!                                   HTMX requests get the results fragment
//! GET  /orders/{id}               - Order detail (?tab=details|invoice|support)
//! POST /orders/{id}/cancel        - Cancel order
//!
//! # Checkout (requires auth)
//! GET  /checkout                  - Cart, address and payment method (?address=)
//! POST /checkout                  - Place order
//! POST /checkout/verify           - Verify online payment
//!
//! # Addresses (requires auth)
//! GET  /addresses/new             - New address form
//! POST /addresses                 - Create address
//! GET  /addresses/{id}/edit       - Edit address form
//! POST /addresses/{id}            - Update address
//! POST /addresses/{id}/delete     - Delete address
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! POST /auth/logout               - Logout action
//! ```

pub mod addresses;
pub mod auth;
pub mod checkout;
pub mod orders;
pub mod products;

use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::components::{EmptyState, ErrorPage, Layout};
use crate::middleware::{HX_REQUEST, expire_login, set_flash};
use crate::models::Flash;
use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/verify", post(checkout::verify))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(addresses::create))
        .route("/new", get(addresses::new))
        .route("/{id}", post(addresses::update))
        .route("/{id}/edit", get(addresses::edit))
        .route("/{id}/delete", post(addresses::delete))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/products", get(products::index))
        .nest("/orders", order_routes())
        .nest("/checkout", checkout_routes())
        .nest("/addresses", address_routes())
        .nest("/auth", auth_routes())
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Whether the request was issued by HTMX.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key(HX_REQUEST)
}

/// Response for a page whose data could not be loaded.
///
/// An expired login sends the customer to log in; anything else renders
/// `page` as the error state.
pub(crate) async fn fetch_failed(
    session: &Session,
    headers: &HeaderMap,
    layout: Layout,
    err: &ApiError,
    page: EmptyState,
) -> Response {
    if err.requires_login() {
        return expire_login(session, headers).await;
    }

    tracing::error!(error = %err, "Failed to load page data");
    let status = match err {
        ApiError::Rejected(_) => StatusCode::OK,
        _ => StatusCode::BAD_GATEWAY,
    };
    ErrorPage::new(status, layout, page).into_response()
}

/// Store a flash message and redirect.
pub(crate) async fn flash_redirect(session: &Session, flash: Flash, to: &str) -> Response {
    set_flash(session, flash).await;
    Redirect::to(to).into_response()
}

/// Response for a failed action: an expired login goes to the login page,
/// anything else is reported as an error flash on `to`.
pub(crate) async fn action_failed(
    session: &Session,
    headers: &HeaderMap,
    err: &ApiError,
    fallback: &str,
    to: &str,
) -> Response {
    if err.requires_login() {
        return expire_login(session, headers).await;
    }
    tracing::warn!(error = %err, "Store API action failed");
    flash_redirect(session, Flash::error(err.user_message_or(fallback)), to).await
}
