//! E-Shop Core - Shared domain types.
//!
//! This crate provides the types used across the E-Shop components:
//! - `storefront` - Server-rendered customer storefront
//! - `integration-tests` - Router-level tests against a fake store API
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Anything that talks to the store API lives in the storefront.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, order/payment statuses, payment methods, prices, emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
