//! Outgoing HTTP requests issued by page code.
//!
//! [`HttpRequest`] mirrors the browser request object: `open` records the
//! method and URL through a replaceable entry point, `send` runs the
//! exchange against the page's [`Responder`] and raises lifecycle events
//! (`loadstart`, `load` / `timeout` / `error`, `loadend`) on the request.

use crate::page::clock::PageClock;
use crate::page::event::{Event, EventKind};
use crate::page::target::{EventTarget, Phase};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("SyntaxError: '{0}' is not a valid HTTP method")]
    InvalidMethod(String),
    #[error("InvalidStateError: the request must be opened before it is sent")]
    NotOpened,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Unsent,
    Opened,
    Done,
}

/// How an exchange ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A response arrived
    Completed,
    /// No response within the request timeout
    TimedOut,
    /// The connection failed
    NetworkError,
    /// Refused before it started; only `loadend` is raised
    Blocked,
}

/// What a request sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub url: String,
    pub body: Option<String>,
}

/// What the network answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub latency_ms: u64,
    pub outcome: Outcome,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            latency_ms: 0,
            outcome: Outcome::Completed,
        }
    }

    pub fn timed_out(after_ms: u64) -> Self {
        Self::failed(Outcome::TimedOut).latency(after_ms)
    }

    pub fn network_error() -> Self {
        Self::failed(Outcome::NetworkError)
    }

    pub fn blocked() -> Self {
        Self::failed(Outcome::Blocked)
    }

    fn failed(outcome: Outcome) -> Self {
        Self {
            status: 0,
            body: String::new(),
            latency_ms: 0,
            outcome,
        }
    }

    pub fn latency(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }
}

/// The page's view of the network.
pub trait Responder: Send + Sync {
    fn respond(&self, request: &RequestLine) -> Response;
}

/// A page without connectivity: every request fails.
#[derive(Debug, Default)]
pub struct NoNetwork;

impl Responder for NoNetwork {
    fn respond(&self, _request: &RequestLine) -> Response {
        Response::network_error()
    }
}

/// Canned responses keyed by URL (query string ignored); 404 otherwise.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<String, Response>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, response: Response) -> Self {
        self.routes.insert(strip_query(url).to_string(), response);
        self
    }
}

impl Responder for RouteTable {
    fn respond(&self, request: &RequestLine) -> Response {
        self.routes
            .get(strip_query(&request.url))
            .cloned()
            .unwrap_or_else(|| Response::with_status(404, "Not Found"))
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// The `open` entry point: receives the request it was invoked on.
pub type OpenFn = Arc<dyn Fn(&HttpRequest, &str, &str) -> Result<(), RequestError> + Send + Sync>;

#[derive(Debug)]
struct RequestState {
    ready_state: ReadyState,
    method: String,
    url: String,
    status: u16,
    response_text: String,
    timed_out: bool,
}

struct RequestInner {
    target: EventTarget,
    state: Mutex<RequestState>,
    open: RwLock<OpenFn>,
    clock: PageClock,
    responder: Arc<dyn Responder>,
}

#[derive(Clone)]
pub struct HttpRequest {
    inner: Arc<RequestInner>,
}

/// Non-owning handle, for listeners stored on the request itself.
#[derive(Clone)]
pub struct WeakHttpRequest {
    inner: Weak<RequestInner>,
}

impl WeakHttpRequest {
    pub fn upgrade(&self) -> Option<HttpRequest> {
        self.inner.upgrade().map(|inner| HttpRequest { inner })
    }
}

impl HttpRequest {
    pub fn new(clock: PageClock, responder: Arc<dyn Responder>) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                target: EventTarget::new(),
                state: Mutex::new(RequestState {
                    ready_state: ReadyState::Unsent,
                    method: String::new(),
                    url: String::new(),
                    status: 0,
                    response_text: String::new(),
                    timed_out: false,
                }),
                open: RwLock::new(Arc::new(native_open)),
                clock,
                responder,
            }),
        }
    }

    pub fn downgrade(&self) -> WeakHttpRequest {
        WeakHttpRequest {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Initialise the request through the current `open` entry point.
    pub fn open(&self, method: &str, url: &str) -> Result<(), RequestError> {
        let open = self.open_entry();
        open(self, method, url)
    }

    pub fn open_entry(&self) -> OpenFn {
        Arc::clone(&self.inner.open.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Install a new `open` entry point, returning the previous one.
    pub fn replace_open(&self, open: OpenFn) -> OpenFn {
        std::mem::replace(
            &mut *self.inner.open.write().unwrap_or_else(PoisonError::into_inner),
            open,
        )
    }

    pub fn add_event_listener<F>(&self, name: &str, capture: bool, listener: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.target.add_event_listener(name, capture, listener);
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.inner.target.listener_count(name)
    }

    /// Run the exchange. Lifecycle listeners run before this returns.
    pub fn send(&self, body: Option<&str>) -> Result<(), RequestError> {
        let line = {
            let state = self.lock_state();
            if state.ready_state != ReadyState::Opened {
                return Err(RequestError::NotOpened);
            }
            RequestLine {
                method: state.method.clone(),
                url: state.url.clone(),
                body: body.map(str::to_string),
            }
        };

        let response = self.inner.responder.respond(&line);

        if response.outcome != Outcome::Blocked {
            self.fire("loadstart");
        }
        self.inner.clock.advance(response.latency_ms);

        {
            let mut state = self.lock_state();
            state.ready_state = ReadyState::Done;
            state.status = response.status;
            state.timed_out = response.outcome == Outcome::TimedOut;
            state.response_text = if response.outcome == Outcome::Completed {
                response.body
            } else {
                String::new()
            };
        }

        match response.outcome {
            Outcome::Completed => self.fire("load"),
            Outcome::TimedOut => self.fire("timeout"),
            Outcome::NetworkError => self.fire("error"),
            Outcome::Blocked => {}
        }
        self.fire("loadend");
        Ok(())
    }

    fn fire(&self, name: &str) {
        let event = Event::new(name, EventKind::Progress, self.inner.clock.now(), false);
        self.inner.target.dispatch_event(&event, Phase::AtTarget);
    }

    fn lock_state(&self) -> MutexGuard<'_, RequestState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ready_state(&self) -> ReadyState {
        self.lock_state().ready_state
    }

    /// HTTP status, 0 until a response completes.
    pub fn status(&self) -> u16 {
        self.lock_state().status
    }

    /// Response body, empty unless the request completed.
    pub fn response_text(&self) -> String {
        self.lock_state().response_text.clone()
    }

    /// Whether the last send ended in a timeout.
    pub fn timed_out(&self) -> bool {
        self.lock_state().timed_out
    }

    /// Method as normalised by `open`.
    pub fn method(&self) -> String {
        self.lock_state().method.clone()
    }

    /// URL passed to `open`.
    pub fn url(&self) -> String {
        self.lock_state().url.clone()
    }
}

fn native_open(request: &HttpRequest, method: &str, url: &str) -> Result<(), RequestError> {
    let valid = !method.is_empty()
        && method
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c));
    if !valid {
        return Err(RequestError::InvalidMethod(method.to_string()));
    }

    let mut state = request.lock_state();
    state.ready_state = ReadyState::Opened;
    state.method = method.to_ascii_uppercase();
    state.url = url.to_string();
    state.status = 0;
    state.response_text.clear();
    state.timed_out = false;
    Ok(())
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("HttpRequest")
            .field("ready_state", &state.ready_state)
            .field("method", &state.method)
            .field("url", &state.url)
            .field("status", &state.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(responder: impl Responder + 'static) -> HttpRequest {
        HttpRequest::new(PageClock::manual(0), Arc::new(responder))
    }

    #[test]
    fn test_send_requires_open() {
        let req = request(NoNetwork);
        assert_eq!(req.send(None), Err(RequestError::NotOpened));
    }

    #[test]
    fn test_invalid_method_is_rejected() {
        let req = request(NoNetwork);
        assert!(matches!(
            req.open("GE T", "/x"),
            Err(RequestError::InvalidMethod(_))
        ));
        assert_eq!(req.ready_state(), ReadyState::Unsent);
    }

    #[test]
    fn test_completed_exchange() {
        let routes = RouteTable::new().route("/api/items", Response::ok("[1,2]").latency(40));
        let req = request(routes);
        req.open("get", "/api/items?page=1").unwrap();
        req.send(None).unwrap();

        assert_eq!(req.ready_state(), ReadyState::Done);
        assert_eq!(req.status(), 200);
        assert_eq!(req.response_text(), "[1,2]");
        assert_eq!(req.method(), "GET");
        assert!(!req.timed_out());
    }

    #[test]
    fn test_unknown_route_is_404() {
        let req = request(RouteTable::new());
        req.open("GET", "/missing").unwrap();
        req.send(None).unwrap();
        assert_eq!(req.status(), 404);
        assert_eq!(req.response_text(), "Not Found");
    }

    #[test]
    fn test_lifecycle_events() {
        let routes = RouteTable::new().route("/slow", Response::timed_out(3_000));
        let req = request(routes);
        let starts = Arc::new(AtomicUsize::new(0));
        let ends = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&starts);
        req.add_event_listener("loadstart", false, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        let e = Arc::clone(&ends);
        req.add_event_listener("loadend", false, move |ev| {
            e.lock().unwrap().push(ev.time_stamp());
        });

        req.open("POST", "/slow").unwrap();
        req.send(Some("{}")).unwrap();

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(*ends.lock().unwrap(), vec![3_000.0]);
        assert!(req.timed_out());
        assert_eq!(req.status(), 0);
    }

    #[test]
    fn test_blocked_request_skips_loadstart() {
        let routes = RouteTable::new().route("/blocked", Response::blocked());
        let req = request(routes);
        let starts = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&starts);
        req.add_event_listener("loadstart", false, move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        req.open("GET", "/blocked").unwrap();
        req.send(None).unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 0);
        assert_eq!(req.ready_state(), ReadyState::Done);
    }
}
