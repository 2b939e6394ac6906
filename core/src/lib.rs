//! A fluent HTTP-testing DSL built around a request/response filter chain.
//!
//! # Overview
//! A request starts from a set of [`Defaults`] (explicit, or the process-wide
//! ones behind [`given`]), is shaped through [`RequestSpec`] setters and is
//! run by invoking a method such as [`RequestSpec::get`]. Invocation runs the
//! default filters, then the request's own filters, then dispatches through
//! the [`Transport`]. Any filter can rewrite the request, short-circuit with
//! a fabricated response, or alter the response on the way back.
//!
//! ```no_run
//! use restcheck_core::Defaults;
//!
//! # fn main() -> restcheck_core::Result<()> {
//! let response = Defaults::default()
//!     .port(8080)
//!     .given()
//!     .filter_fn(|req, res, ctx| {
//!         req.query_param("firstName", "John");
//!         ctx.next(req, res)
//!     })
//!     .get("/greetJSON")?;
//! response.then().status_code(200)?.root("greeting").json_path("firstName", "John")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - The core does not install a tracing subscriber; it only emits events.
//! - Path parameters are resolved at dispatch, so filters can still fill or
//!   replace them.
//! - Validation failures are `Err(Error::Assertion)`, never panics.

pub mod builder;
pub mod config;
pub mod defaults;
pub mod error;
pub mod filter;
pub mod filters;
pub mod http;
pub mod path_params;
pub mod request;
pub mod response;
pub mod transport;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use builder::{RequestSpecBuilder, RequestSpecification};
pub use config::{Config, EncoderConfig};
pub use defaults::{configure, configure_scoped, current, filters, given, reset, set_config, Defaults, DefaultsGuard};
pub use error::{Error, Result};
pub use filter::{run_chain, Filter, FilterContext, FnFilter};
pub use filters::{
    BasicAuthFilter, ErrorLoggingFilter, FormAuthFilter, LogBuffer, LogSink, RequestLoggingFilter,
    ResponseLoggingFilter,
};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use path_params::PathParams;
pub use request::RequestSpec;
pub use response::{ResponseBuilder, ResponseSpec};
pub use transport::{Transport, UreqTransport};
pub use validation::ValidatableResponse;
pub use xml_path::{XmlPath, XmlPathConfig, XmlPathError};
