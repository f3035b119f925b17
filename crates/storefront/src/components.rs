//! Reusable page pieces: layout data, empty states and the error page.

use askama::Template;
use askama_web::WebTemplate;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::filters;
use crate::models::{CurrentCustomer, Flash};

/// Data every full page passes to `base.html`.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Greeting name of the logged-in customer.
    pub customer_name: Option<String>,
    /// One-shot message shown above the page content.
    pub flash: Option<Flash>,
}

impl Layout {
    #[must_use]
    pub fn new(customer: Option<&CurrentCustomer>, flash: Option<Flash>) -> Self {
        Self {
            customer_name: customer.map(|c| c.display_name().to_string()),
            flash,
        }
    }

    #[must_use]
    pub fn for_customer(customer: &CurrentCustomer, flash: Option<Flash>) -> Self {
        Self::new(Some(customer), flash)
    }
}

/// Icon shown at the top of an empty state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyStateIcon {
    Box,
    Error,
    Search,
}

impl EmptyStateIcon {
    /// CSS modifier used by the stylesheet.
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Box => "icon-box",
            Self::Error => "icon-error",
            Self::Search => "icon-search",
        }
    }
}

/// A button under an empty state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyStateAction {
    pub label: String,
    /// Link target; `None` renders a reload button.
    pub href: Option<String>,
    pub primary: bool,
}

impl EmptyStateAction {
    #[must_use]
    pub fn link(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: Some(href.into()),
            primary: true,
        }
    }

    /// A reload button.
    #[must_use]
    pub fn retry() -> Self {
        Self {
            label: "Try Again".to_string(),
            href: None,
            primary: false,
        }
    }

    #[must_use]
    pub const fn secondary(mut self) -> Self {
        self.primary = false;
        self
    }
}

/// Loading indicator shown while a request is in flight.
///
/// Rendered hidden; the page script or htmx adds `htmx-request` to show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadingSpinner {
    /// Cover the whole viewport instead of sitting inline.
    pub full_screen: bool,
}

impl LoadingSpinner {
    pub const INLINE: Self = Self { full_screen: false };
    pub const FULL_SCREEN: Self = Self { full_screen: true };

    /// CSS classes for the wrapper element.
    #[must_use]
    pub const fn class(self) -> &'static str {
        if self.full_screen {
            "spinner spinner-full-screen htmx-indicator"
        } else {
            "spinner htmx-indicator"
        }
    }
}

/// Centered icon, title, description and actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub icon: EmptyStateIcon,
    pub title: String,
    pub description: String,
    pub actions: Vec<EmptyStateAction>,
}

impl EmptyState {
    #[must_use]
    pub fn new(icon: EmptyStateIcon, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            icon,
            title: title.into(),
            description: description.into(),
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: EmptyStateAction) -> Self {
        self.actions.push(action);
        self
    }

    /// The generic failure page.
    #[must_use]
    pub fn something_went_wrong(description: impl Into<String>) -> Self {
        Self::new(EmptyStateIcon::Error, "Oops! Something went wrong", description)
            .with_action(EmptyStateAction::link("Return to Home", "/"))
            .with_action(EmptyStateAction::retry())
    }
}

/// A full page containing only an empty state.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorPageTemplate {
    pub layout: Layout,
    pub state: EmptyState,
}

/// An error page with its HTTP status.
pub struct ErrorPage {
    pub status: StatusCode,
    pub template: ErrorPageTemplate,
}

impl ErrorPage {
    #[must_use]
    pub const fn new(status: StatusCode, layout: Layout, state: EmptyState) -> Self {
        Self {
            status,
            template: ErrorPageTemplate { layout, state },
        }
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        (self.status, self.template).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_something_went_wrong_offers_home_and_retry() {
        let state = EmptyState::something_went_wrong("Failed to load orders");
        assert_eq!(state.title, "Oops! Something went wrong");
        assert_eq!(state.actions.len(), 2);
        assert_eq!(state.actions[0].href.as_deref(), Some("/"));
        assert_eq!(state.actions[1].href, None);
        assert_eq!(state.actions[1].label, "Try Again");
    }

    #[test]
    fn test_spinner_classes() {
        assert_eq!(LoadingSpinner::default(), LoadingSpinner::INLINE);
        assert!(!LoadingSpinner::INLINE.class().contains("full-screen"));
        assert!(LoadingSpinner::FULL_SCREEN.class().contains("spinner-full-screen"));
    }

    #[test]
    fn test_error_page_renders_state() {
        let page = ErrorPageTemplate {
            layout: Layout::default(),
            state: EmptyState::new(
                EmptyStateIcon::Box,
                "Order not found",
                "We couldn't find details for this order",
            )
            .with_action(EmptyStateAction::link("Back to Orders", "/orders")),
        };
        let html = page.render().unwrap_or_default();
        assert!(html.contains("Order not found"));
        assert!(html.contains("find details for this order"));
        assert!(html.contains(r#"href="/orders""#));
    }
}
