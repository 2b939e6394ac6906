//! Filters that print requests and responses to a writer.
//!
//! Output is plain text meant for humans reading a test log: a response is
//! printed as its status line, one `Name: value` line per header, an empty
//! line and the body.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::filter::{Filter, FilterContext};
use crate::http::HttpResponse;
use crate::request::RequestSpec;
use crate::response::ResponseSpec;

/// Shared destination for log output. Clones write to the same writer.
#[derive(Clone)]
pub struct LogSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl LogSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    fn write(&self, text: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}

/// In-memory writer for capturing log output.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn sink(&self) -> LogSink {
        LogSink::new(self.clone())
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn render_response(response: &HttpResponse) -> String {
    let mut out = String::new();
    out.push_str(&response.status_line);
    out.push('\n');
    for (name, value) in &response.headers {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&response.body_string());
    out.push('\n');
    out
}

/// Prints every response.
#[derive(Debug, Clone, Default)]
pub struct ResponseLoggingFilter {
    sink: LogSink,
}

impl ResponseLoggingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl Filter for ResponseLoggingFilter {
    fn filter(
        &self,
        request: &mut RequestSpec,
        response: &mut ResponseSpec,
        ctx: FilterContext<'_>,
    ) -> Result<HttpResponse> {
        let result = ctx.next(request, response)?;
        debug!(status = result.status, "logging response");
        self.sink.write(&render_response(&result))?;
        Ok(result)
    }

    fn name(&self) -> &str {
        "response-logging"
    }
}

/// Prints responses with a status of 400 or above.
#[derive(Debug, Clone, Default)]
pub struct ErrorLoggingFilter {
    sink: LogSink,
}

impl ErrorLoggingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl Filter for ErrorLoggingFilter {
    fn filter(
        &self,
        request: &mut RequestSpec,
        response: &mut ResponseSpec,
        ctx: FilterContext<'_>,
    ) -> Result<HttpResponse> {
        let result = ctx.next(request, response)?;
        if result.status >= 400 {
            debug!(status = result.status, "logging error response");
            self.sink.write(&render_response(&result))?;
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "error-logging"
    }
}

/// Prints the request as it stands when this filter runs.
#[derive(Debug, Clone, Default)]
pub struct RequestLoggingFilter {
    sink: LogSink,
}

impl RequestLoggingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl Filter for RequestLoggingFilter {
    fn filter(
        &self,
        request: &mut RequestSpec,
        response: &mut ResponseSpec,
        ctx: FilterContext<'_>,
    ) -> Result<HttpResponse> {
        let mut out = String::new();
        // Placeholders may still be filled in by later filters.
        match request.to_http_request() {
            Ok(rendered) => {
                out.push_str(&format!("{} {}\n", rendered.method, rendered.url));
                for (name, value) in &rendered.headers {
                    out.push_str(&format!("{name}: {value}\n"));
                }
                out.push('\n');
                if let Some(body) = &rendered.body {
                    out.push_str(&String::from_utf8_lossy(body));
                }
            }
            Err(_) => {
                out.push_str(&format!("{} {}\n", request.method(), request.get_path()));
                for (name, value) in request.headers() {
                    out.push_str(&format!("{name}: {value}\n"));
                }
                out.push('\n');
            }
        }
        out.push('\n');

        debug!(method = %request.method(), path = request.get_path(), "logging request");
        self.sink.write(&out)?;
        ctx.next(request, response)
    }

    fn name(&self) -> &str {
        "request-logging"
    }
}
