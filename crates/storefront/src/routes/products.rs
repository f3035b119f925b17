//! Product catalogue route handlers.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::components::{EmptyState, ErrorPage, Layout};
use crate::filters;
use crate::middleware::{OptionalAuth, take_flash};
use crate::orders::{ProductCard, normalize_product};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub original_price: Option<String>,
    pub image: Option<String>,
    pub in_stock: bool,
}

impl From<&ProductCard> for ProductCardView {
    fn from(card: &ProductCard) -> Self {
        Self {
            id: card.product_id.to_string(),
            name: card.name.clone(),
            price: card.price.display(),
            original_price: card.original_price.map(|p| p.display()),
            image: card.first_image().map(str::to_string),
            in_stock: card.in_stock(),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
}

/// Display the product grid.
#[instrument(skip(state, session, customer))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Response {
    let layout = Layout::new(customer.as_ref(), take_flash(&session).await);

    match load_products(&state).await {
        Ok(products) => ProductsIndexTemplate {
            layout,
            products: products.iter().map(ProductCardView::from).collect(),
        }
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load products");
            ErrorPage::new(
                StatusCode::BAD_GATEWAY,
                layout,
                EmptyState::something_went_wrong(e.user_message()),
            )
            .into_response()
        }
    }
}

/// Catalogue from cache, or from the API when the cache has expired.
async fn load_products(state: &AppState) -> Result<Arc<Vec<ProductCard>>, ApiError> {
    if let Some(products) = state.cached_products().await {
        tracing::debug!("Cache hit for products");
        return Ok(products);
    }

    let raw = state.api().get_products().await?;
    let products = Arc::new(raw.iter().map(normalize_product).collect::<Vec<_>>());
    state.cache_products(Arc::clone(&products)).await;
    Ok(products)
}
