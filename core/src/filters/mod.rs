//! Ready-made filters for logging and authentication.

mod auth;
mod logging;

pub use auth::{BasicAuthFilter, FormAuthFilter};
pub use logging::{ErrorLoggingFilter, LogBuffer, LogSink, RequestLoggingFilter, ResponseLoggingFilter};
