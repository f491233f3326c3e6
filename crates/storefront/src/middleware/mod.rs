//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame and referrer policies)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Rate limiting (governor), on login/registration and the chat API
//!
//! Authentication is enforced per handler by the extractors in [`auth`];
//! [`page::PageContext`] gives every page the shared layout data.

pub mod auth;
pub mod page;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalAuth, RequireAdmin, RequireAuth, RequireRider, RequireVendor,
    clear_session_user, load_session_user, set_session_user,
};
pub use page::PageContext;
pub use rate_limit::{auth_rate_limiter, chat_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
