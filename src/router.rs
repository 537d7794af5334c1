//! Route sinks.
//!
//! The composer's output is an ordered list of [`RegistrationRecord`]s. A
//! [`RouteSink`] receives them one at a time, in emission order. Order is the
//! whole point: the first registration that matches a request runs first.
//!
//! [`Router`] is a small in-process sink. It keeps registrations in order,
//! compiles each pattern into its own radix tree, and at dispatch time runs
//! every matching registration's chain back to back, so a middleware that
//! calls `next` at the end of one registration falls through to the next.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::error::{Error, Result};
use crate::handler::{BoxedHandler, Handler, Next, Step};
use crate::method::{Method, Verb};
use crate::request::Request;
use crate::response::Response;

/// Path parameter holding whatever a trailing `*` matched.
pub const WILDCARD_PARAM: &str = "0";

/// One entry of the composed route table.
#[derive(Clone, Debug)]
pub struct RegistrationRecord {
    pub verb: Verb,
    /// `/`-separated pattern; `:name` segments are parameters, a trailing `*`
    /// matches the path and everything under it.
    pub pattern: String,
    pub middleware: Vec<BoxedHandler>,
    pub handlers: Vec<BoxedHandler>,
}

impl RegistrationRecord {
    /// Middleware then handlers, the order they run in.
    pub fn chain(&self) -> impl Iterator<Item = &BoxedHandler> {
        self.middleware.iter().chain(&self.handlers)
    }
}

/// Receiver of composed registrations.
pub trait RouteSink {
    /// # Errors
    /// Implementations reject registrations they cannot represent.
    fn register(&mut self, record: RegistrationRecord) -> Result<()>;
}

impl RouteSink for Vec<RegistrationRecord> {
    fn register(&mut self, record: RegistrationRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

struct Route {
    verb: Verb,
    pattern: String,
    matcher: MatchitRouter<()>,
    chain: Arc<[BoxedHandler]>,
}

/// Ordered, matchit-backed route table.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a router from composed records, keeping their order.
    pub fn from_records(records: impl IntoIterator<Item = RegistrationRecord>) -> Result<Self> {
        let mut router = Self::new();
        for record in records {
            router.register(record)?;
        }
        Ok(router)
    }

    /// Register a single handler by hand. Returns `self` for chaining.
    pub fn on<M>(mut self, verb: impl Into<Verb>, pattern: &str, handler: impl Handler<M>) -> Result<Self> {
        self.register(RegistrationRecord {
            verb: verb.into(),
            pattern: pattern.to_owned(),
            middleware: Vec::new(),
            handlers: vec![BoxedHandler::new(handler)],
        })?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered verbs and patterns, in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = (Verb, &str)> {
        self.routes.iter().map(|r| (r.verb, r.pattern.as_str()))
    }

    /// Runs `req` through every matching registration in order.
    ///
    /// `404 Not Found` when nothing matches or the last step calls `next`.
    pub async fn dispatch(&self, req: Request) -> Response {
        let steps = self.matching(req.method(), req.path());
        Next::new(steps.into()).run(req).await
    }

    pub(crate) fn matching(&self, method: Method, path: &str) -> Vec<Step> {
        let mut steps = Vec::new();
        for route in self.routes.iter().filter(|r| r.verb.accepts(method)) {
            let Ok(matched) = route.matcher.at(path) else { continue };
            let params: HashMap<String, String> = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            let params = Arc::new(params);
            steps.extend(route.chain.iter().map(|handler| Step {
                handler: handler.clone(),
                params: Arc::clone(&params),
            }));
        }
        steps
    }
}

impl RouteSink for Router {
    fn register(&mut self, record: RegistrationRecord) -> Result<()> {
        let matcher = compile(&record.pattern)?;
        debug!(verb = %record.verb, pattern = %record.pattern, "route added");
        let chain: Vec<BoxedHandler> = record.chain().cloned().collect();
        self.routes.push(Route {
            verb: record.verb,
            pattern: record.pattern,
            matcher,
            chain: chain.into(),
        });
        Ok(())
    }
}

/// Compiles one composed pattern into a matchit tree.
///
/// `:id` becomes `{id}`; a trailing `*` adds both the bare prefix and a
/// catch-all beneath it. Literal braces are escaped.
fn compile(pattern: &str) -> Result<MatchitRouter<()>> {
    let (base, star) = match pattern.strip_suffix('*') {
        Some(base) => (base, true),
        None => (pattern, false),
    };

    let translated: Vec<String> = base
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => segment.replace('{', "{{").replace('}', "}}"),
        })
        .collect();
    let base = translated.join("/");

    let mut routes = Vec::with_capacity(2);
    routes.push(if base.is_empty() { "/".to_owned() } else { base.clone() });
    if star {
        routes.push(format!("{}/{{*{WILDCARD_PARAM}}}", base.trim_end_matches('/')));
    }

    let mut matcher = MatchitRouter::new();
    for route in routes {
        matcher
            .insert(route, ())
            .map_err(|source| Error::InvalidPattern { pattern: pattern.to_owned(), source })?;
    }
    Ok(matcher)
}
