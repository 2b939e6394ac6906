//! Reusable request specifications.
//!
//! A `RequestSpecification` is a fragment: it holds only what was set on the
//! builder and never a copy of the process-wide defaults, so merging it into
//! any number of requests cannot apply the default filters twice.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::Config;
use crate::error::Result;
use crate::filter::{Filter, FilterContext, FnFilter};
use crate::http::HttpResponse;
use crate::request::RequestSpec;
use crate::response::ResponseSpec;

#[derive(Clone, Default)]
pub struct RequestSpecification {
    pub(crate) base_uri: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) base_path: Option<String>,
    pub(crate) path_params: IndexMap<String, String>,
    pub(crate) query_params: IndexMap<String, String>,
    pub(crate) form_params: IndexMap<String, String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) content_type: Option<String>,
    pub(crate) config: Option<Config>,
    pub(crate) filters: Vec<Arc<dyn Filter>>,
    pub(crate) ignore_default_filters: bool,
}

impl RequestSpecification {
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    pub fn ignores_default_filters(&self) -> bool {
        self.ignore_default_filters
    }
}

impl std::fmt::Debug for RequestSpecification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSpecification")
            .field("base_uri", &self.base_uri)
            .field("port", &self.port)
            .field("base_path", &self.base_path)
            .field("path_params", &self.path_params)
            .field("query_params", &self.query_params)
            .field("form_params", &self.form_params)
            .field("headers", &self.headers)
            .field("content_type", &self.content_type)
            .field("filters", &self.filters.len())
            .field("ignore_default_filters", &self.ignore_default_filters)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct RequestSpecBuilder {
    spec: RequestSpecification,
}

impl RequestSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.spec.base_uri = Some(base_uri.into());
        self
    }

    pub fn set_port(mut self, port: u16) -> Self {
        self.spec.port = Some(port);
        self
    }

    pub fn set_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.spec.base_path = Some(base_path.into());
        self
    }

    pub fn add_path_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.spec.path_params.insert(name.into(), value.to_string());
        self
    }

    pub fn add_query_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.spec.query_params.insert(name.into(), value.to_string());
        self
    }

    pub fn add_form_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.spec.form_params.insert(name.into(), value.to_string());
        self
    }

    pub fn add_header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.spec.headers.push((name.into(), value.to_string()));
        self
    }

    pub fn set_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.spec.body = Some(body.into());
        self
    }

    pub fn set_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.spec.content_type = Some(content_type.into());
        self
    }

    pub fn set_config(mut self, config: Config) -> Self {
        self.spec.config = Some(config);
        self
    }

    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.spec.filters.push(Arc::new(filter));
        self
    }

    pub fn add_filter_fn<F>(self, f: F) -> Self
    where
        F: Fn(&mut RequestSpec, &mut ResponseSpec, FilterContext<'_>) -> Result<HttpResponse>
            + Send
            + Sync
            + 'static,
    {
        self.add_filter(FnFilter::new(f))
    }

    /// Requests this specification is merged into skip the default filters.
    pub fn ignore_default_filters(mut self) -> Self {
        self.spec.ignore_default_filters = true;
        self
    }

    pub fn build(self) -> RequestSpecification {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_carries_nothing() {
        let spec = RequestSpecBuilder::new().build();
        assert_eq!(spec.filter_count(), 0);
        assert!(!spec.ignores_default_filters());
        assert!(spec.headers.is_empty());
        assert!(spec.port.is_none());
    }

    #[test]
    fn builder_collects_settings() {
        let spec = RequestSpecBuilder::new()
            .set_port(9000)
            .add_query_param("a", 1)
            .add_query_param("a", 2)
            .add_header("X", "1")
            .add_header("X", "2")
            .add_filter_fn(|req, res, ctx| ctx.next(req, res))
            .ignore_default_filters()
            .build();

        assert_eq!(spec.port, Some(9000));
        assert_eq!(spec.query_params.get("a").map(String::as_str), Some("2"));
        assert_eq!(spec.headers.len(), 2);
        assert_eq!(spec.filter_count(), 1);
        assert!(spec.ignores_default_filters());
    }
}
