//! Authentication route handlers.
//!
//! Customers log in with the store API's email and password; the returned
//! access token lives in the session for every later call.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use eshop_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::flash_redirect;
use crate::api::ApiError;
use crate::components::Layout;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer, take_flash};
use crate::models::{CurrentCustomer, Flash};
use crate::state::AppState;

const AFTER_LOGIN_PATH: &str = "/orders";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

fn login_error(email: String, error: impl Into<String>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        LoginTemplate {
            layout: Layout::default(),
            email,
            error: Some(error.into()),
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(session: Session, OptionalAuth(customer): OptionalAuth) -> Response {
    if customer.is_some() {
        return Redirect::to(AFTER_LOGIN_PATH).into_response();
    }

    LoginTemplate {
        layout: Layout::new(None, take_flash(&session).await),
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let entered = form.email.trim().to_string();
    let Ok(email) = Email::parse(&entered) else {
        return Ok(login_error(entered, "Please enter a valid email address"));
    };
    if form.password.is_empty() {
        return Ok(login_error(entered, "Please enter your password"));
    }

    let login = match state.api().login(&email, &form.password).await {
        Ok(login) => login,
        Err(ApiError::Rejected(message)) => {
            tracing::info!("Login rejected");
            let message = if message.trim().is_empty() {
                INVALID_CREDENTIALS.to_string()
            } else {
                message
            };
            return Ok(login_error(entered, message));
        }
        Err(ApiError::Unauthorized) => return Ok(login_error(entered, INVALID_CREDENTIALS)),
        Err(e) => return Err(e.into()),
    };

    let customer = CurrentCustomer::from(login);

    // New identity, new session id.
    session.cycle_id().await?;
    set_current_customer(&session, &customer).await?;
    set_sentry_user(&customer.id, Some(&customer.email));
    tracing::info!(customer_id = %customer.id, "Customer logged in");

    Ok(Redirect::to(AFTER_LOGIN_PATH).into_response())
}

/// Handle logout.
#[instrument(skip(state, session, customer))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    if let Some(customer) = customer {
        state.forget_orders(&customer.cache_key()).await;
    }
    clear_current_customer(&session).await?;
    clear_sentry_user();

    Ok(flash_redirect(&session, Flash::success("You have been logged out"), "/").await)
}
