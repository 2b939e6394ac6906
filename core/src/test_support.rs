use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::response::ResponseBuilder;
use crate::transport::Transport;

/// Transport double that records every request and answers with a canned
/// response, or fails with a canned transport error.
pub(crate) struct RecordingTransport {
    outcome: std::result::Result<HttpResponse, String>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub(crate) fn shared(response: HttpResponse) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(response),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone().map_err(Error::Transport)
    }
}

pub(crate) fn ok_response(body: &str) -> HttpResponse {
    ResponseBuilder::new().body(body).build()
}
