//! Expectations on a response.
//!
//! Each check returns `Err(Error::Assertion)` on mismatch so tests can use
//! `?` and filters never see a panic from validation.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::http::HttpResponse;

impl HttpResponse {
    /// Start validating this response.
    pub fn then(&self) -> ValidatableResponse<'_> {
        ValidatableResponse {
            response: self,
            root: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatableResponse<'a> {
    response: &'a HttpResponse,
    root: Option<String>,
}

impl<'a> ValidatableResponse<'a> {
    pub fn response(&self) -> &'a HttpResponse {
        self.response
    }

    /// Prefix every following `json_path`/`xml_path` expression with `root`.
    pub fn root(&self, root: impl Into<String>) -> ValidatableResponse<'a> {
        ValidatableResponse {
            response: self.response,
            root: Some(root.into()),
        }
    }

    pub fn status_code(&self, expected: u16) -> Result<&Self> {
        if self.response.status != expected {
            return Err(Error::Assertion(format!(
                "Expected status code <{expected}> but was <{}>.",
                self.response.status
            )));
        }
        Ok(self)
    }

    /// Compare the media type, ignoring parameters unless `expected` has some.
    pub fn content_type(&self, expected: &str) -> Result<&Self> {
        let actual = self.response.content_type().unwrap_or("");
        let matches = if expected.contains(';') {
            normalize(actual) == normalize(expected)
        } else {
            media_type(actual).eq_ignore_ascii_case(expected.trim())
        };
        if !matches {
            return Err(Error::Assertion(format!(
                "Expected content-type \"{expected}\" doesn't match actual content-type \"{actual}\"."
            )));
        }
        Ok(self)
    }

    pub fn header(&self, name: &str, expected: &str) -> Result<&Self> {
        match self.response.header(name) {
            Some(actual) if actual == expected => Ok(self),
            actual => Err(Error::Assertion(format!(
                "Expected header \"{name}\" was not \"{expected}\", was \"{}\".",
                actual.unwrap_or("<absent>")
            ))),
        }
    }

    pub fn body(&self, expected: &str) -> Result<&Self> {
        let actual = self.response.body_string();
        if actual != expected {
            return Err(Error::Assertion(format!(
                "Response body doesn't match expectation.\nExpected: \"{expected}\"\n  Actual: \"{actual}\""
            )));
        }
        Ok(self)
    }

    /// Compare the JSON value at a dotted path such as `greeting.firstName`
    /// or `items[1].name`.
    pub fn json_path(&self, path: &str, expected: impl Into<Value>) -> Result<&Self> {
        let expected = expected.into();
        let full = self.qualify(path);
        let document = self.response.json_value()?;
        let pointer = json_pointer(&full)?;
        let null = Value::Null;
        let actual = document.pointer(&pointer).unwrap_or(&null);
        if *actual != expected {
            return Err(Error::Assertion(format!(
                "JSON path {full} doesn't match.\nExpected: {expected}\n  Actual: {actual}"
            )));
        }
        Ok(self)
    }

    /// Compare the text an XML path selects.
    pub fn xml_path(&self, path: &str, expected: &str) -> Result<&Self> {
        let full = self.qualify(path);
        let actual = self.response.xml_path()?.get_string(&full)?;
        if actual != expected {
            return Err(Error::Assertion(format!(
                "XML path {full} doesn't match.\nExpected: {expected}\n  Actual: {actual}"
            )));
        }
        Ok(self)
    }

    fn qualify(&self, path: &str) -> String {
        match &self.root {
            Some(root) if path.is_empty() => root.clone(),
            Some(root) => format!("{root}.{path}"),
            None => path.to_string(),
        }
    }
}

fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

fn normalize(content_type: &str) -> String {
    content_type
        .split(';')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(";")
        .to_ascii_lowercase()
}

/// Translate `a.b[0].c` into the JSON pointer `/a/b/0/c`.
fn json_pointer(path: &str) -> Result<String> {
    let mut pointer = String::new();
    if path.is_empty() {
        return Ok(pointer);
    }
    for segment in path.split('.') {
        let (key, mut indexes) = match segment.find('[') {
            Some(at) => segment.split_at(at),
            None => (segment, ""),
        };
        if !key.is_empty() {
            pointer.push('/');
            pointer.push_str(&key.replace('~', "~0").replace('/', "~1"));
        }
        while !indexes.is_empty() {
            let close = indexes
                .find(']')
                .filter(|_| indexes.starts_with('['))
                .ok_or_else(|| Error::Assertion(format!("malformed JSON path '{path}'")))?;
            let index = &indexes[1..close];
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::Assertion(format!("malformed JSON path '{path}'")));
            }
            pointer.push('/');
            pointer.push_str(index);
            indexes = &indexes[close + 1..];
        }
    }
    Ok(pointer)
}
