//! # Balade REST API Module
//!
//! Error taxonomy, request bodies and response shapes shared by the
//! Balade endpoints.

pub mod errors;
pub mod request;
pub mod response;

pub use errors::{ErrorResponse, RestError, RestResult};
pub use request::{AddKeywordRequest, RenameRequest};
pub use response::{CountResponse, MessageResponse};
