//! The response side of a filter chain.

use crate::http::{default_status_line, HttpResponse};

/// Holder for the response of one chain execution.
///
/// Empty until the transport answers. A filter may fill or replace it to
/// hand a fabricated response to the filters that run after it on the way
/// back.
#[derive(Debug, Clone, Default)]
pub struct ResponseSpec {
    response: Option<HttpResponse>,
    dispatched: bool,
}

impl ResponseSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// Replace the held response, returning the previous one.
    pub fn replace(&mut self, response: HttpResponse) -> Option<HttpResponse> {
        self.response.replace(response)
    }

    pub fn take(&mut self) -> Option<HttpResponse> {
        self.response.take()
    }

    /// Whether the transport was called during this chain.
    pub fn was_dispatched(&self) -> bool {
        self.dispatched
    }

    pub(crate) fn record_dispatch(&mut self, response: HttpResponse) {
        self.dispatched = true;
        self.response = Some(response);
    }
}

/// Builds a response without going through the transport.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: u16,
    status_line: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self {
            status: 200,
            status_line: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing response, keeping its status line.
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            status_line: Some(response.status_line.clone()),
            headers: response.headers.clone(),
            body: response.body.clone(),
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        if self.status != status {
            self.status_line = None;
        }
        self.status = status;
        self
    }

    pub fn status_line(mut self, line: impl Into<String>) -> Self {
        self.status_line = Some(line.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set `Content-Type`, replacing any previous one.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
        self.headers.push(("Content-Type".to_string(), content_type.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> HttpResponse {
        HttpResponse {
            status_line: self
                .status_line
                .unwrap_or_else(|| default_status_line(self.status)),
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}
