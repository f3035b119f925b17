//! Search, status filtering and local updates on the order history.

use eshop_core::{OrderId, OrderStatus, StatusFilter};

use super::OrderSummary;

/// Orders whose id or address line contains `term` (case-insensitive) and
/// whose status passes `status`. Input order is preserved.
#[must_use]
pub fn filter_orders<'a>(
    orders: &'a [OrderSummary],
    term: &str,
    status: &StatusFilter,
) -> Vec<&'a OrderSummary> {
    let needle = term.to_lowercase();
    orders
        .iter()
        .filter(|order| matches_term(order, &needle) && status.matches(&order.status))
        .collect()
}

fn matches_term(order: &OrderSummary, needle: &str) -> bool {
    needle.is_empty()
        || order.id.as_str().to_lowercase().contains(needle)
        || order.address_line.to_lowercase().contains(needle)
}

/// One entry of the status filter bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTab {
    pub label: String,
    /// Query-string value.
    pub value: String,
    /// Orders in this status, regardless of the search term.
    pub count: usize,
    pub active: bool,
}

/// The filter bar: "All Orders" followed by each filterable status.
#[must_use]
pub fn status_tabs(orders: &[OrderSummary], active: &StatusFilter) -> Vec<StatusTab> {
    let all = StatusTab {
        label: "All Orders".to_string(),
        value: StatusFilter::ALL.to_string(),
        count: orders.len(),
        active: active.is_all(),
    };

    let per_status = OrderStatus::FILTERABLE.into_iter().map(|status| {
        let filter = StatusFilter::Only(status.clone());
        StatusTab {
            label: status.label().to_string(),
            value: filter.as_param().to_string(),
            count: orders.iter().filter(|o| o.status == status).count(),
            active: *active == filter,
        }
    });

    std::iter::once(all).chain(per_status).collect()
}

/// Apply a confirmed cancellation to the matching order.
///
/// Returns whether an order with `id` was found.
pub fn mark_cancelled(orders: &mut [OrderSummary], id: &OrderId) -> bool {
    orders.iter_mut().find(|order| &order.id == id).is_some_and(|order| {
        order.status = OrderStatus::Cancelled;
        true
    })
}
