//! The mutable request specification threaded through a filter chain.
//!
//! # Design
//! `RequestSpec` follows the `std::process::Command` shape: setters take
//! `&mut self` and return `&mut Self`. The same methods therefore serve a
//! fluent `given()...get(..)` expression and a filter that receives the spec
//! as `&mut RequestSpec` mid-chain. Getters that would collide with a setter
//! carry a `get_` prefix.
//!
//! Default filters and per-request filters are kept apart. The defaults
//! snapshot taken when the spec was created is prepended exactly once, when
//! the request method is invoked, no matter how many reusable
//! specifications were merged in.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::builder::RequestSpecification;
use crate::config::{Config, FORM_URLENCODED};
use crate::defaults::Defaults;
use crate::error::{Error, Result};
use crate::filter::{run_chain, Filter, FilterContext, FnFilter};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::path_params::PathParams;
use crate::response::ResponseSpec;
use crate::transport::Transport;

#[derive(Clone)]
pub struct RequestSpec {
    method: HttpMethod,
    base_uri: String,
    port: Option<u16>,
    base_path: String,
    path_params: PathParams,
    query_params: IndexMap<String, String>,
    form_params: IndexMap<String, String>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    content_type: Option<String>,
    config: Config,
    filters: Vec<Arc<dyn Filter>>,
    default_filters: Vec<Arc<dyn Filter>>,
    ignore_default_filters: bool,
    transport: Arc<dyn Transport>,
}

impl RequestSpec {
    pub(crate) fn from_defaults(defaults: &Defaults) -> Self {
        Self {
            method: HttpMethod::Get,
            base_uri: defaults.base_uri.clone(),
            port: defaults.port,
            base_path: defaults.base_path.clone(),
            path_params: PathParams::default(),
            query_params: IndexMap::new(),
            form_params: IndexMap::new(),
            headers: Vec::new(),
            body: None,
            content_type: None,
            config: defaults.config.clone(),
            filters: Vec::new(),
            default_filters: defaults.filters.clone(),
            ignore_default_filters: false,
            transport: Arc::clone(&defaults.transport),
        }
    }

    /// A blank spec aimed at the same server through the same transport,
    /// with no parameters and no filters. Used for side requests such as a
    /// login that must not re-enter the chain.
    pub fn detached(&self) -> Self {
        Self {
            method: HttpMethod::Get,
            base_uri: self.base_uri.clone(),
            port: self.port,
            base_path: self.base_path.clone(),
            path_params: PathParams::default(),
            query_params: IndexMap::new(),
            form_params: IndexMap::new(),
            headers: Vec::new(),
            body: None,
            content_type: None,
            config: self.config.clone(),
            filters: Vec::new(),
            default_filters: Vec::new(),
            ignore_default_filters: true,
            transport: Arc::clone(&self.transport),
        }
    }

    // --- target ---

    pub fn base_uri(&mut self, base_uri: impl Into<String>) -> &mut Self {
        self.base_uri = base_uri.into();
        self
    }

    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    pub fn base_path(&mut self, base_path: impl Into<String>) -> &mut Self {
        self.base_path = base_path.into();
        self
    }

    /// Replace the path template. Unnamed path params are re-bound against
    /// the new template's placeholders.
    pub fn path(&mut self, path: impl Into<String>) -> &mut Self {
        self.path_params.set_template(path);
        self
    }

    pub fn get_base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn get_port(&self) -> Option<u16> {
        self.port
    }

    pub fn get_base_path(&self) -> &str {
        &self.base_path
    }

    /// The path template, placeholders included.
    pub fn get_path(&self) -> &str {
        self.path_params.template()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    // --- path params ---

    pub fn path_param(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.path_params.set_named(name, value.to_string());
        self
    }

    pub fn named_path_params(&self) -> &IndexMap<String, String> {
        self.path_params.named()
    }

    pub fn unnamed_path_param_values(&self) -> Vec<&str> {
        self.path_params.unnamed_values()
    }

    /// Named params plus unnamed params keyed by the placeholder they fill.
    pub fn path_params(&self) -> IndexMap<String, String> {
        self.path_params.path_params()
    }

    pub fn path_param_placeholders(&self) -> Vec<String> {
        self.path_params.placeholders()
    }

    pub fn undefined_path_param_placeholders(&self) -> Vec<String> {
        self.path_params.undefined_placeholders()
    }

    pub fn remove_path_param(&mut self, name: &str) -> &mut Self {
        self.path_params.remove(name);
        self
    }

    pub fn remove_named_path_param(&mut self, name: &str) -> &mut Self {
        self.path_params.remove_named(name);
        self
    }

    pub fn remove_unnamed_path_param(&mut self, name: &str) -> &mut Self {
        self.path_params.remove_unnamed(name);
        self
    }

    pub fn remove_unnamed_path_param_by_value(&mut self, value: &str) -> &mut Self {
        self.path_params.remove_unnamed_by_value(value);
        self
    }

    // --- query, form, headers, body ---

    /// Set a query parameter; a later value for the same name wins.
    pub fn query_param(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.query_params.insert(name.into(), value.to_string());
        self
    }

    pub fn remove_query_param(&mut self, name: &str) -> &mut Self {
        self.query_params.shift_remove(name);
        self
    }

    pub fn query_params(&self) -> &IndexMap<String, String> {
        &self.query_params
    }

    pub fn form_param(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.form_params.insert(name.into(), value.to_string());
        self
    }

    pub fn form_params(&self) -> &IndexMap<String, String> {
        &self.form_params
    }

    /// Add a header. Repeated names are all sent.
    pub fn header(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.headers.push((name.into(), value.to_string()));
        self
    }

    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json_body<T: Serialize>(&mut self, value: &T) -> Result<&mut Self> {
        self.body = Some(serde_json::to_vec(value)?);
        if self.content_type.is_none() {
            self.content_type = Some("application/json".to_string());
        }
        Ok(self)
    }

    pub fn get_body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// The content type that will be sent, after the encoder config has had
    /// its say. Form params imply `application/x-www-form-urlencoded`.
    pub fn request_content_type(&self) -> Option<String> {
        let content_type = match &self.content_type {
            Some(content_type) => content_type.as_str(),
            None if !self.form_params.is_empty() => FORM_URLENCODED,
            None => return None,
        };
        Some(self.config.encoder.content_type_with_charset(content_type))
    }

    // --- config, filters, transport ---

    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn filter(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn filter_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut RequestSpec, &mut ResponseSpec, FilterContext<'_>) -> Result<HttpResponse>
            + Send
            + Sync
            + 'static,
    {
        self.filter(FnFilter::new(f))
    }

    pub fn filters<I>(&mut self, filters: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn Filter>>,
    {
        self.filters.extend(filters);
        self
    }

    /// The shared client this request will be dispatched through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) -> &mut Self {
        self.transport = transport;
        self
    }

    /// Merge a reusable specification into this request.
    pub fn spec(&mut self, spec: &RequestSpecification) -> &mut Self {
        if let Some(base_uri) = &spec.base_uri {
            self.base_uri = base_uri.clone();
        }
        if let Some(port) = spec.port {
            self.port = Some(port);
        }
        if let Some(base_path) = &spec.base_path {
            self.base_path = base_path.clone();
        }
        for (name, value) in &spec.path_params {
            self.path_params.set_named(name.clone(), value.clone());
        }
        self.query_params.extend(spec.query_params.clone());
        self.form_params.extend(spec.form_params.clone());
        self.headers.extend(spec.headers.iter().cloned());
        if let Some(body) = &spec.body {
            self.body = Some(body.clone());
        }
        if let Some(content_type) = &spec.content_type {
            self.content_type = Some(content_type.clone());
        }
        if let Some(config) = &spec.config {
            self.config = config.clone();
        }
        self.filters.extend(spec.filters.iter().cloned());
        self.ignore_default_filters |= spec.ignore_default_filters;
        self
    }

    // --- execution ---

    pub fn get(&mut self, path: &str) -> Result<HttpResponse> {
        self.request(HttpMethod::Get, path, std::iter::empty::<&str>())
    }

    /// GET with positional path param values.
    pub fn get_with<I, T>(&mut self, path: &str, unnamed: I) -> Result<HttpResponse>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.request(HttpMethod::Get, path, unnamed)
    }

    pub fn post(&mut self, path: &str) -> Result<HttpResponse> {
        self.request(HttpMethod::Post, path, std::iter::empty::<&str>())
    }

    pub fn put(&mut self, path: &str) -> Result<HttpResponse> {
        self.request(HttpMethod::Put, path, std::iter::empty::<&str>())
    }

    pub fn patch(&mut self, path: &str) -> Result<HttpResponse> {
        self.request(HttpMethod::Patch, path, std::iter::empty::<&str>())
    }

    pub fn delete(&mut self, path: &str) -> Result<HttpResponse> {
        self.request(HttpMethod::Delete, path, std::iter::empty::<&str>())
    }

    pub fn head(&mut self, path: &str) -> Result<HttpResponse> {
        self.request(HttpMethod::Head, path, std::iter::empty::<&str>())
    }

    pub fn options(&mut self, path: &str) -> Result<HttpResponse> {
        self.request(HttpMethod::Options, path, std::iter::empty::<&str>())
    }

    /// Run the filter chain for `method` against `path`.
    ///
    /// A query string in `path` is moved into the query params. `unnamed`
    /// values are bound positionally to the placeholders of `path` that no
    /// named param covers yet.
    ///
    /// The chain runs on a copy. Positional values, the query string of
    /// `path` and whatever filters change apply to this request only, so the
    /// spec can be invoked again from its configured state.
    pub fn request<I, T>(&mut self, method: HttpMethod, path: &str, unnamed: I) -> Result<HttpResponse>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let mut request = self.clone();
        request.method = method;

        let template = match path.split_once('?') {
            Some((template, query)) => {
                for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
                    request.query_params.insert(name.into_owned(), value.into_owned());
                }
                template
            }
            None => path,
        };
        request.path_params.set_template(template);
        request
            .path_params
            .bind_unnamed(unnamed.into_iter().map(|value| value.to_string()));

        let filters: Vec<Arc<dyn Filter>> = if request.ignore_default_filters {
            request.filters.clone()
        } else {
            request
                .default_filters
                .iter()
                .chain(&request.filters)
                .cloned()
                .collect()
        };

        debug!(%method, path = template, filters = filters.len(), "executing request");
        let mut response = ResponseSpec::new();
        run_chain(&filters, &mut request, &mut response)
    }

    /// The full URL this spec currently renders to.
    pub fn uri(&self) -> Result<String> {
        let path = self.path_params.render(self.config.url_encoding_enabled)?;
        Ok(self.build_url(&path)?.to_string())
    }

    /// Render the spec into the request the transport will execute.
    pub fn to_http_request(&self) -> Result<HttpRequest> {
        let url = self.uri()?;

        let mut headers = self.headers.clone();
        if let Some(content_type) = self.request_content_type() {
            if !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case("content-type")) {
                headers.push(("Content-Type".to_string(), content_type));
            }
        }

        let body = match &self.body {
            Some(body) => Some(body.clone()),
            None if !self.form_params.is_empty() => Some(
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(self.form_params.iter())
                    .finish()
                    .into_bytes(),
            ),
            None => None,
        };

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path)?
        } else {
            let mut url = Url::parse(&self.base_uri)?;
            if let Some(port) = self.port {
                url.set_port(Some(port))
                    .map_err(|()| Error::InvalidUrl(self.base_uri.clone()))?;
            }
            url.set_path(&join_paths(&self.base_path, path));
            url
        };

        if !self.query_params.is_empty() {
            if self.config.url_encoding_enabled {
                url.query_pairs_mut().extend_pairs(self.query_params.iter());
            } else {
                let query = self
                    .query_params
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join("&");
                url.set_query(Some(&query));
            }
        }
        Ok(url)
    }
}

fn join_paths(base_path: &str, path: &str) -> String {
    let base_path = base_path.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    let mut joined = String::with_capacity(base_path.len() + path.len() + 2);
    if !base_path.is_empty() && !base_path.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(base_path);
    joined.push('/');
    joined.push_str(path);
    joined
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("base_uri", &self.base_uri)
            .field("port", &self.port)
            .field("base_path", &self.base_path)
            .field("path_params", &self.path_params)
            .field("query_params", &self.query_params)
            .field("form_params", &self.form_params)
            .field("headers", &self.headers)
            .field("content_type", &self.content_type)
            .field(
                "filters",
                &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .field("default_filters", &self.default_filters.len())
            .field("transport", &self.transport.name())
            .finish_non_exhaustive()
    }
}
