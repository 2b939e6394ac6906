//! Request defaults, explicit and process-wide.
//!
//! # Design
//! `Defaults` is a plain value: build one, call [`Defaults::given`] and every
//! request it creates starts from it. Services should prefer this form.
//!
//! The process-wide instance exists for test suites that want a
//! `given()`-style entry point. It is shared mutable state with an explicit
//! lifecycle: [`configure`] (or [`filters`] / [`set_config`]) at a defined
//! boundary, [`reset`] afterwards. [`configure_scoped`] ties the reset to a
//! guard so a failing test cannot leak its configuration. Tests that touch
//! it must not run concurrently with each other.

use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use tracing::debug;

use crate::config::Config;
use crate::filter::Filter;
use crate::request::RequestSpec;
use crate::transport::{Transport, UreqTransport};

pub const DEFAULT_BASE_URI: &str = "http://localhost";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Clone)]
pub struct Defaults {
    pub(crate) base_uri: String,
    pub(crate) port: Option<u16>,
    pub(crate) base_path: String,
    pub(crate) config: Config,
    pub(crate) filters: Vec<Arc<dyn Filter>>,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            port: Some(DEFAULT_PORT),
            base_path: String::new(),
            config: Config::default(),
            filters: Vec::new(),
            transport: UreqTransport::shared(),
        }
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defaults")
            .field("base_uri", &self.base_uri)
            .field("port", &self.port)
            .field("base_path", &self.base_path)
            .field("config", &self.config)
            .field("filters", &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>())
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl Defaults {
    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Leave the port to the base URI.
    pub fn without_port(mut self) -> Self {
        self.port = None;
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Append a default filter.
    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Replace the default filters wholesale.
    pub fn filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Filter>>,
    {
        self.filters = filters.into_iter().collect();
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn filter_list(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// Start a request from these defaults.
    pub fn given(&self) -> RequestSpec {
        RequestSpec::from_defaults(self)
    }
}

static GLOBAL: LazyLock<RwLock<Defaults>> = LazyLock::new(|| RwLock::new(Defaults::default()));

/// A snapshot of the process-wide defaults.
pub fn current() -> Defaults {
    GLOBAL.read().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Start a request from the process-wide defaults.
pub fn given() -> RequestSpec {
    GLOBAL.read().unwrap_or_else(PoisonError::into_inner).given()
}

/// Transform the process-wide defaults.
///
/// `f` runs on a snapshot with no lock held, so it may call [`current`] or
/// [`given`]. The result replaces whatever is installed when `f` returns.
pub fn configure<F>(f: F)
where
    F: FnOnce(Defaults) -> Defaults,
{
    let updated = f(current());
    debug!(filters = updated.filters.len(), "configured global defaults");
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = updated;
}

/// Like [`configure`], resetting everything when the guard drops.
pub fn configure_scoped<F>(f: F) -> DefaultsGuard
where
    F: FnOnce(Defaults) -> Defaults,
{
    configure(f);
    DefaultsGuard { _private: () }
}

/// Replace the process-wide default filters.
pub fn filters<I>(filters: I)
where
    I: IntoIterator<Item = Arc<dyn Filter>>,
{
    configure(|defaults| defaults.filters(filters));
}

pub fn set_config(config: Config) {
    configure(|defaults| defaults.config(config));
}

/// Restore the library defaults.
pub fn reset() {
    *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = Defaults::default();
    debug!("reset global defaults");
}

/// Resets the process-wide defaults when dropped.
#[must_use = "the defaults are reset as soon as the guard is dropped"]
#[derive(Debug)]
pub struct DefaultsGuard {
    _private: (),
}

impl Drop for DefaultsGuard {
    fn drop(&mut self) {
        reset();
    }
}
