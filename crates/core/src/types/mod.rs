//! Core types for E-Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod payment;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use payment::{PaymentMethod, PaymentMethodError};
pub use price::{CURRENCY_SYMBOL, DEFAULT_CURRENCY_CODE, Price};
pub use status::*;
