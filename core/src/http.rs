//! HTTP request and response values exchanged with the transport.
//!
//! # Design
//! These types describe a single round-trip as plain data. The request spec
//! renders itself into an `HttpRequest` at the end of the filter chain, the
//! transport turns it into an `HttpResponse`, and filters may fabricate an
//! `HttpResponse` without any I/O at all.
//!
//! Header names are compared case-insensitively on lookup but stored as
//! given, so fabricated responses log exactly what the filter wrote.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::Result;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully rendered request: no placeholders left, query string encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response as produced by the transport or fabricated by a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Status line as received, e.g. `HTTP/1.1 409 Conflict`.
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First header value named `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn json_value(&self) -> Result<serde_json::Value> {
        self.json()
    }

    pub fn xml_path(&self) -> Result<xml_path::XmlPath> {
        Ok(xml_path::XmlPath::new(self.body_string())?)
    }
}

/// Status line for a status code without a recorded one.
pub(crate) fn default_status_line(status: u16) -> String {
    let reason = ureq::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("");
    format!("HTTP/1.1 {status} {reason}").trim_end().to_string()
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(headers: Vec<(&str, &str)>, body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            status_line: default_status_line(200),
            headers: headers
                .into_iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn method_renders_uppercase() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Get.as_str(), "GET");
    }

    #[test]
    fn status_line_uses_canonical_reason() {
        assert_eq!(default_status_line(409), "HTTP/1.1 409 Conflict");
        assert_eq!(default_status_line(200), "HTTP/1.1 200 OK");
        assert_eq!(default_status_line(599), "HTTP/1.1 599");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = response(vec![("Content-Type", "application/json")], "{}");
        assert_eq!(resp.content_type(), Some("application/json"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(resp.header("server"), None);
    }

    #[test]
    fn repeated_headers_are_all_visible() {
        let resp = response(vec![("Set-Cookie", "a=1"), ("set-cookie", "b=2")], "");
        assert_eq!(resp.headers_named("Set-Cookie").collect::<Vec<_>>(), vec!["a=1", "b=2"]);
    }

    #[test]
    fn json_body_parses() {
        let resp = response(vec![], r#"{"message":"hello"}"#);
        let value = resp.json_value().unwrap();
        assert_eq!(value["message"], "hello");
    }

    #[test]
    fn bad_json_is_an_error() {
        let resp = response(vec![], "not json");
        assert!(matches!(resp.json_value(), Err(crate::Error::Json(_))));
    }
}
