//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first, see `crate::app`)
//!
//! 1. Sentry layers (capture errors and transactions)
//! 2. Request ID (add unique ID to each request)
//! 3. Security headers (CSP, permissions policy, etc.)
//! 4. `TraceLayer` (request tracing)
//! 5. Session layer (tower-sessions, in-memory store, signed cookie)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    HX_REQUEST, LOGIN_PATH, OptionalAuth, RequireAuth, clear_current_customer, expire_login,
    set_current_customer,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{StorefrontSessionLayer, create_session_layer, set_flash, take_flash};
