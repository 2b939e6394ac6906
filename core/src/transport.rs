//! The capability that performs the actual HTTP round-trip.
//!
//! # Design
//! The filter chain only ever talks to `dyn Transport`. A request spec holds
//! a shared handle to one and exposes it read-only to filters, so a filter
//! can inspect which client will run the request or issue side requests
//! through it. `UreqTransport` is the blocking default; tests substitute
//! recording fakes.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};
use ureq::http::Response;
use ureq::typestate::WithoutBody;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    /// Short identifier for logs and for filters inspecting the client.
    fn name(&self) -> &str;

    /// Execute `request`. Non-2xx statuses are responses, not errors.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport").field("name", &self.name()).finish()
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// Status codes are never turned into errors, so 4xx/5xx responses reach
/// filters and validation as data.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn Transport> {
        Arc::new(Self::new())
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Send a method that normally has no body, forcing `body` out if one is set.
fn call(
    builder: RequestBuilder<WithoutBody>,
    body: Option<&[u8]>,
) -> std::result::Result<Response<Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.force_send_body().send(bytes),
        None => builder.call(),
    }
}

impl Transport for UreqTransport {
    fn name(&self) -> &str {
        "ureq"
    }

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref();

        let result = match request.method {
            HttpMethod::Get => call(with_headers(self.agent.get(url), headers), body),
            HttpMethod::Head => call(with_headers(self.agent.head(url), headers), body),
            HttpMethod::Delete => call(with_headers(self.agent.delete(url), headers), body),
            HttpMethod::Options => call(with_headers(self.agent.options(url), headers), body),
            HttpMethod::Post => {
                let builder = with_headers(self.agent.post(url), headers);
                match body {
                    Some(bytes) => builder.send(bytes),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = with_headers(self.agent.put(url), headers);
                match body {
                    Some(bytes) => builder.send(bytes),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Patch => {
                let builder = with_headers(self.agent.patch(url), headers);
                match body {
                    Some(bytes) => builder.send(bytes),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        let status_line = format!(
            "{:?} {} {}",
            response.version(),
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| Error::Transport(e.to_string()))?;

        debug!(transport = self.name(), status = status.as_u16(), "received response");
        trace!(body = %String::from_utf8_lossy(&body), "response body");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_line,
            headers,
            body,
        })
    }
}
