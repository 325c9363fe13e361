//! # Observability Module
//!
//! Structured logging and request tracing for the Pantry node:
//!
//! - **Structured Logging**: JSON or pretty logs with configurable level
//! - **Request Tracing**: Request ID generation and propagation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::Router;
//! use pantry_node::observability::{init_logging, middleware::request_id_middleware};
//!
//! init_logging("info", false);
//!
//! let app: Router<()> = Router::new()
//!     .layer(axum::middleware::from_fn(request_id_middleware));
//! ```

mod logging;
pub mod middleware;

pub use logging::{init_logging, LogFormat};
pub use middleware::{RequestId, REQUEST_ID_HEADER};
