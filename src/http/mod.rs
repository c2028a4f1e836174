//! HTTP surface: axum router, middleware and handlers over a shared [`Hub`].
//!
//! [`Hub`]: crate::hub::Hub

pub mod envelope;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use envelope::{Envelope, Pagination};
pub use middleware::LimitScope;
pub use router::build_router;
pub use server::HttpServer;
