//! Saved address handlers, reached from the checkout page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use eshop_core::AddressId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{action_failed, fetch_failed, flash_redirect};
use crate::api::{AddressInput, ApiError};
use crate::components::{EmptyState, Layout};
use crate::filters;
use crate::middleware::{RequireAuth, take_flash};
use crate::models::Flash;
use crate::state::AppState;

const CHECKOUT_PATH: &str = "/checkout";

// =============================================================================
// Form Types
// =============================================================================

/// Address form data.
///
/// The default checkbox posts `on` when ticked and nothing otherwise.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    pub address_line: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub phone: String,
    pub is_default: Option<String>,
}

impl From<AddressForm> for AddressInput {
    fn from(form: AddressForm) -> Self {
        Self {
            address_line: form.address_line.trim().to_string(),
            city: form.city.trim().to_string(),
            state: form.state.trim().to_string(),
            country: form.country.trim().to_string(),
            zip_code: form.zip_code.trim().to_string(),
            phone: form.phone.trim().to_string(),
            is_default: form.is_default.is_some_and(|v| !v.is_empty()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// New/edit address form template.
#[derive(Template, WebTemplate)]
#[template(path = "addresses/form.html")]
pub struct AddressFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub values: AddressInput,
    pub error: Option<String>,
}

impl AddressFormTemplate {
    fn create(layout: Layout, values: AddressInput, error: Option<String>) -> Self {
        Self {
            layout,
            title: "Add a new address",
            action: "/addresses".to_string(),
            submit_label: "Save address",
            values,
            error,
        }
    }

    fn edit(layout: Layout, id: &AddressId, values: AddressInput, error: Option<String>) -> Self {
        Self {
            layout,
            title: "Edit address",
            action: format!("/addresses/{}", urlencoding::encode(id.as_str())),
            submit_label: "Update address",
            values,
            error,
        }
    }
}

/// Form re-render after a validation error.
fn invalid(template: AddressFormTemplate) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, template).into_response()
}

fn missing_fields_message(missing: &[&str]) -> String {
    format!("Please fill in: {}", missing.join(", "))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the new address form.
pub async fn new(session: Session, RequireAuth(customer): RequireAuth) -> impl IntoResponse {
    AddressFormTemplate::create(
        Layout::for_customer(&customer, take_flash(&session).await),
        AddressInput::default(),
        None,
    )
}

/// Save a new address and return to checkout.
#[instrument(skip(state, session, headers, customer, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Response {
    let input = AddressInput::from(form);
    let missing = input.missing_fields();
    if !missing.is_empty() {
        let error = missing_fields_message(&missing);
        return invalid(AddressFormTemplate::create(
            Layout::for_customer(&customer, None),
            input,
            Some(error),
        ));
    }

    match state.api().create_address(&customer.token, &input).await {
        Ok(message) => {
            let text = non_empty_or(message, "Address added successfully");
            flash_redirect(&session, Flash::success(text), CHECKOUT_PATH).await
        }
        Err(ApiError::Rejected(message)) => invalid(AddressFormTemplate::create(
            Layout::for_customer(&customer, None),
            input,
            Some(non_empty_or(message, "Failed to save address")),
        )),
        Err(e) => action_failed(&session, &headers, &e, "Failed to save address", CHECKOUT_PATH).await,
    }
}

/// Display the edit form for a saved address.
#[instrument(skip(state, session, headers, customer))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Response {
    let layout = Layout::for_customer(&customer, take_flash(&session).await);
    let id = AddressId::new(id);

    let addresses = match state.api().get_addresses(&customer.token).await {
        Ok(addresses) => addresses,
        Err(e) => {
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

    match addresses.iter().find(|a| a.address_id == id) {
        Some(address) => {
            AddressFormTemplate::edit(layout, &id, AddressInput::from(address), None).into_response()
        }
        None => flash_redirect(&session, Flash::error("Address not found"), CHECKOUT_PATH).await,
    }
}

/// Replace a saved address and return to checkout with it selected.
#[instrument(skip(state, session, headers, customer, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Response {
    let id = AddressId::new(id);
    let input = AddressInput::from(form);
    let missing = input.missing_fields();
    if !missing.is_empty() {
        let error = missing_fields_message(&missing);
        return invalid(AddressFormTemplate::edit(
            Layout::for_customer(&customer, None),
            &id,
            input,
            Some(error),
        ));
    }

    let selected = format!("{CHECKOUT_PATH}?address={}", urlencoding::encode(id.as_str()));
    match state.api().update_address(&customer.token, &id, &input).await {
        Ok(message) => {
            let text = non_empty_or(message, "Address updated successfully");
            flash_redirect(&session, Flash::success(text), &selected).await
        }
        Err(ApiError::Rejected(message)) => invalid(AddressFormTemplate::edit(
            Layout::for_customer(&customer, None),
            &id,
            input,
            Some(non_empty_or(message, "Failed to update address")),
        )),
        Err(e) => action_failed(&session, &headers, &e, "Failed to update address", &selected).await,
    }
}

/// Delete a saved address.
#[instrument(skip(state, session, headers, customer))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Response {
    let id = AddressId::new(id);
    match state.api().delete_address(&customer.token, &id).await {
        Ok(message) => {
            let text = non_empty_or(message, "Address deleted");
            flash_redirect(&session, Flash::success(text), CHECKOUT_PATH).await
        }
        Err(e) => {
            action_failed(&session, &headers, &e, "Failed to delete address", CHECKOUT_PATH).await
        }
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_trims_and_reads_checkbox() {
        let form = AddressForm {
            address_line: " 12 MG Road ".to_string(),
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            country: "India".to_string(),
            zip_code: " 411001".to_string(),
            phone: String::new(),
            is_default: Some("on".to_string()),
        };
        let input = AddressInput::from(form);
        assert_eq!(input.address_line, "12 MG Road");
        assert_eq!(input.zip_code, "411001");
        assert!(input.is_default);
        assert!(input.missing_fields().is_empty());
    }

    #[test]
    fn test_unticked_checkbox_is_not_default() {
        let input = AddressInput::from(AddressForm::default());
        assert!(!input.is_default);
    }

    #[test]
    fn test_missing_fields_message() {
        assert_eq!(
            missing_fields_message(&["city", "ZIP code"]),
            "Please fill in: city, ZIP code"
        );
    }

    #[test]
    fn test_edit_action_encodes_id() {
        let template = AddressFormTemplate::edit(
            Layout::default(),
            &AddressId::new("a 1"),
            AddressInput::default(),
            None,
        );
        assert_eq!(template.action, "/addresses/a%201");
    }

    #[test]
    fn test_non_empty_or() {
        assert_eq!(non_empty_or(String::new(), "Address deleted"), "Address deleted");
        assert_eq!(non_empty_or("Removed".to_string(), "Address deleted"), "Removed");
    }
}
