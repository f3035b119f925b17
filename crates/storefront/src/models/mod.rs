//! Session-scoped models for the storefront.

pub mod session;

pub use session::{CurrentCustomer, Flash, FlashKind, PendingPayment, session_keys};
