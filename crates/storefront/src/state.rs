//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use eshop_core::OrderId;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};

use crate::api::StoreApi;
use crate::config::StorefrontConfig;
use crate::orders::{OrderSummary, ProductCard, mark_cancelled};

/// How long the product catalogue is served from memory.
const PRODUCTS_TTL: Duration = Duration::from_secs(300);

/// How long a customer's order list survives without being read.
const ORDERS_TTI: Duration = Duration::from_secs(30 * 60);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration, the store API and the in-memory caches.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: Arc<dyn StoreApi>,
    products: Cache<(), Arc<Vec<ProductCard>>>,
    orders: Cache<String, Arc<Vec<OrderSummary>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `api` - Store API implementation (HTTP in production, fakes in tests)
    #[must_use]
    pub fn new(config: StorefrontConfig, api: Arc<dyn StoreApi>) -> Self {
        let products = Cache::builder()
            .max_capacity(1)
            .time_to_live(PRODUCTS_TTL)
            .build();

        let orders = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(ORDERS_TTI)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                products,
                orders,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the store API.
    #[must_use]
    pub fn api(&self) -> &dyn StoreApi {
        self.inner.api.as_ref()
    }

    /// The cached product catalogue, if still fresh.
    pub async fn cached_products(&self) -> Option<Arc<Vec<ProductCard>>> {
        self.inner.products.get(&()).await
    }

    /// Replace the cached product catalogue.
    pub async fn cache_products(&self, products: Arc<Vec<ProductCard>>) {
        self.inner.products.insert((), products).await;
    }

    /// A customer's last fetched order list.
    pub async fn cached_orders(&self, customer_key: &str) -> Option<Arc<Vec<OrderSummary>>> {
        self.inner.orders.get(customer_key).await
    }

    /// Replace a customer's cached order list.
    pub async fn cache_orders(&self, customer_key: String, orders: Arc<Vec<OrderSummary>>) {
        self.inner.orders.insert(customer_key, orders).await;
    }

    /// Apply a confirmed cancellation to a customer's cached order list.
    ///
    /// Returns whether the order was in the cached list.
    pub async fn cancel_cached_order(&self, customer_key: &str, order_id: &OrderId) -> bool {
        cancel_in_cache(&self.inner.orders, customer_key, order_id).await
    }

    /// Drop a customer's cached order list so the next page load refetches.
    pub async fn forget_orders(&self, customer_key: &str) {
        self.inner.orders.invalidate(customer_key).await;
    }
}

type OrdersCache = Cache<String, Arc<Vec<OrderSummary>>>;

/// Mark one order cancelled as a single read-modify-write on the entry, so a
/// concurrent cancel or refill of the same list cannot drop the update.
async fn cancel_in_cache(cache: &OrdersCache, customer_key: &str, order_id: &OrderId) -> bool {
    let result = cache
        .entry_by_ref(customer_key)
        .and_compute_with(|entry| {
            let updated = entry.and_then(|entry| {
                let mut orders = entry.into_value().as_ref().clone();
                mark_cancelled(&mut orders, order_id).then(|| Arc::new(orders))
            });
            std::future::ready(updated.map_or(Op::Nop, Op::Put))
        })
        .await;

    matches!(result, CompResult::ReplacedWith(_))
}
