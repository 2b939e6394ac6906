//! Filters and the chain that runs them.
//!
//! # Design
//! A chain is an immutable slice of filters plus one `RequestSpec` and one
//! `ResponseSpec` threaded mutably through every stage. A filter receives a
//! one-shot [`FilterContext`] bound to the suffix after it: calling
//! [`FilterContext::next`] runs the next filter, or performs the real
//! dispatch once the suffix is empty. Returning without calling `next`
//! short-circuits the chain, and the returned response becomes the final one.
//!
//! The request spec is shared rather than copied per filter. Whatever a
//! filter changes before calling `next` is what later filters see and what
//! gets sent; changes made after `next` returns are allowed but have no
//! effect on the request that already went out.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::http::HttpResponse;
use crate::request::RequestSpec;
use crate::response::ResponseSpec;

/// A stage of the request pipeline.
pub trait Filter: Send + Sync {
    fn filter(
        &self,
        request: &mut RequestSpec,
        response: &mut ResponseSpec,
        ctx: FilterContext<'_>,
    ) -> Result<HttpResponse>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Adapts a closure into a [`Filter`].
///
/// Built by [`RequestSpec::filter_fn`] and
/// [`RequestSpecBuilder::add_filter_fn`](crate::RequestSpecBuilder::add_filter_fn),
/// whose bounds let the closure's argument types be inferred.
pub struct FnFilter<F> {
    f: F,
}

impl<F> FnFilter<F>
where
    F: Fn(&mut RequestSpec, &mut ResponseSpec, FilterContext<'_>) -> Result<HttpResponse> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Filter for FnFilter<F>
where
    F: Fn(&mut RequestSpec, &mut ResponseSpec, FilterContext<'_>) -> Result<HttpResponse> + Send + Sync,
{
    fn filter(
        &self,
        request: &mut RequestSpec,
        response: &mut ResponseSpec,
        ctx: FilterContext<'_>,
    ) -> Result<HttpResponse> {
        (self.f)(request, response, ctx)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// The continuation handed to a filter.
pub struct FilterContext<'a> {
    remaining: &'a [Arc<dyn Filter>],
    position: usize,
}

impl<'a> FilterContext<'a> {
    pub(crate) fn new(filters: &'a [Arc<dyn Filter>]) -> Self {
        Self {
            remaining: filters,
            position: 0,
        }
    }

    /// Index of the next filter in the whole chain.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Filters that have not run yet.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Run the rest of the chain, ending in the real dispatch.
    pub fn next(self, request: &mut RequestSpec, response: &mut ResponseSpec) -> Result<HttpResponse> {
        match self.remaining.split_first() {
            Some((filter, rest)) => {
                debug!(filter = filter.name(), position = self.position, "invoking filter");
                let ctx = FilterContext {
                    remaining: rest,
                    position: self.position + 1,
                };
                filter.filter(request, response, ctx)
            }
            None => dispatch(request, response),
        }
    }
}

fn dispatch(request: &mut RequestSpec, response: &mut ResponseSpec) -> Result<HttpResponse> {
    let http_request = request.to_http_request()?;
    debug!(
        method = %http_request.method,
        url = %http_request.url,
        transport = request.transport().name(),
        "dispatching request"
    );
    let http_response = request.transport().execute(&http_request)?;
    response.record_dispatch(http_response.clone());
    Ok(http_response)
}

/// Run `filters` in order against one request.
pub fn run_chain(
    filters: &[Arc<dyn Filter>],
    request: &mut RequestSpec,
    response: &mut ResponseSpec,
) -> Result<HttpResponse> {
    let result = FilterContext::new(filters).next(request, response);
    if result.is_ok() && !response.was_dispatched() {
        debug!(filters = filters.len(), "filter chain short-circuited");
    }
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::test_support::{ok_response, RecordingTransport};
    use crate::{Defaults, Error, ResponseBuilder};

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Filter for Recorder {
        fn filter(
            &self,
            request: &mut RequestSpec,
            response: &mut ResponseSpec,
            ctx: FilterContext<'_>,
        ) -> Result<HttpResponse> {
            self.log.lock().unwrap().push(self.label);
            ctx.next(request, response)
        }
    }

    fn recorder(label: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Recorder {
        Recorder {
            label,
            log: Arc::clone(log),
        }
    }

    fn defaults(transport: &Arc<RecordingTransport>) -> Defaults {
        Defaults::default().transport(transport.clone())
    }

    #[test]
    fn empty_chain_dispatches_once() {
        let transport = RecordingTransport::shared(ok_response("done"));
        let response = defaults(&transport).given().get("/x").unwrap();
        assert_eq!(response.body_string(), "done");
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn short_circuit_skips_later_filters_and_dispatch() {
        let transport = RecordingTransport::shared(ok_response("network"));
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&log);

        let response = defaults(&transport)
            .given()
            .filter_fn(move |_, _, _| {
                seen.lock().unwrap().push("A");
                Ok(ResponseBuilder::new().status(201).body("fabricated").build())
            })
            .filter(recorder("B", &log))
            .get("/x")
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body_string(), "fabricated");
        assert_eq!(*log.lock().unwrap(), vec!["A"]);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn default_filters_run_before_request_filters() {
        let transport = RecordingTransport::shared(ok_response(""));
        let log = Arc::new(Mutex::new(Vec::new()));
        let defaults = defaults(&transport)
            .filter(recorder("L1", &log))
            .filter(recorder("L2", &log));

        defaults.given().filter(recorder("P1", &log)).get("/x").unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["L1", "L2", "P1"]);
    }

    #[test]
    fn mutations_are_visible_downstream_and_to_dispatch() {
        let transport = RecordingTransport::shared(ok_response(""));
        defaults(&transport)
            .given()
            .base_path("/x")
            .port(80)
            .filter_fn(|req, res, ctx| {
                req.port(8081).base_path("/John");
                ctx.next(req, res)
            })
            .filter_fn(|req, res, ctx| {
                assert_eq!(req.get_port(), Some(8081));
                assert_eq!(req.get_base_path(), "/John");
                ctx.next(req, res)
            })
            .get("/Doe")
            .unwrap();

        assert_eq!(transport.requests()[0].url, "http://localhost:8081/John/Doe");
    }

    #[test]
    fn mutation_after_next_has_no_effect_on_sent_request() {
        let transport = RecordingTransport::shared(ok_response(""));
        defaults(&transport)
            .given()
            .filter_fn(|req, res, ctx| {
                let response = ctx.next(req, res)?;
                req.path("/afterwards").query_param("late", "yes");
                Ok(response)
            })
            .get("/before")
            .unwrap();

        assert_eq!(transport.requests()[0].url, "http://localhost:8080/before");
    }

    #[test]
    fn filter_can_replace_the_response_on_the_way_back() {
        let transport = RecordingTransport::shared(ok_response("original"));
        let response = defaults(&transport)
            .given()
            .filter_fn(|req, res, ctx| {
                let response = ctx.next(req, res)?;
                assert_eq!(res.response().map(|r| r.body_string()), Some("original".into()));
                Ok(ResponseBuilder::from_response(&response).body("altered").build())
            })
            .get("/x")
            .unwrap();

        assert_eq!(response.body_string(), "altered");
        assert_eq!(response.status, 200);
    }

    #[test]
    fn filter_errors_abort_the_request() {
        let transport = RecordingTransport::shared(ok_response(""));
        let log = Arc::new(Mutex::new(Vec::new()));
        let err = defaults(&transport)
            .given()
            .filter_fn(|_, _, _| Err(Error::Authentication("denied".into())))
            .filter(recorder("never", &log))
            .get("/x")
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
        assert!(log.lock().unwrap().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn transport_errors_propagate_through_filters() {
        let transport = RecordingTransport::failing("connection refused");
        let err = defaults(&transport)
            .given()
            .filter_fn(|req, res, ctx| ctx.next(req, res))
            .get("/x")
            .unwrap_err();

        assert!(matches!(err, Error::Transport(msg) if msg == "connection refused"));
    }

    #[test]
    fn context_reports_position_in_chain() {
        let transport = RecordingTransport::shared(ok_response(""));
        let positions = Arc::new(Mutex::new(Vec::new()));
        let (a, b) = (Arc::clone(&positions), Arc::clone(&positions));

        defaults(&transport)
            .given()
            .filter_fn(move |req, res, ctx| {
                a.lock().unwrap().push((ctx.position(), ctx.remaining()));
                ctx.next(req, res)
            })
            .filter_fn(move |req, res, ctx| {
                b.lock().unwrap().push((ctx.position(), ctx.remaining()));
                ctx.next(req, res)
            })
            .get("/x")
            .unwrap();

        assert_eq!(*positions.lock().unwrap(), vec![(1, 1), (2, 0)]);
    }
}
