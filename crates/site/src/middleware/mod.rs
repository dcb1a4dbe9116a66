//! HTTP middleware stack for the site.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, when configured)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame denial, ...)
//! 5. Session gate (authentication and admin checks)
//! 6. Rate limiting on form submissions (per route)

pub mod auth;
pub mod gate;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{AdminRejection, AdminSession, RequireAdmin};
pub use gate::{Access, Decision, GateOutcome, classify, decide, evaluate, is_admin, session_gate};
pub use rate_limit::form_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
