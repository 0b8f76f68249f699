//! Observability for the Balade API
//!
//! Structured logging through `tracing`. HTTP requests are traced by the
//! tower-http layer installed in the server.

mod logging;

pub use logging::{init_tracing, DEFAULT_LOG_FILTER};
