//! In-process model of the page a tracker is embedded in.
//!
//! A [`Page`] owns everything the interceptors hook into: the window and
//! document event targets, the session history, the request constructor,
//! the location and a high-resolution clock. Host operations such as
//! [`Page::click`] or [`Page::raise_script_error`] route events the same
//! way a browser would, so instrumentation sees exactly what it would see
//! in the real environment.

pub mod clock;
pub mod element;
pub mod event;
pub mod history;
pub mod location;
pub mod request;
pub mod target;

pub use clock::PageClock;
pub use element::Element;
pub use event::{ErrorEvent, ErrorId, ErrorObject, Event, EventKind};
pub use history::{History, HistoryError, HistoryMethod, StateArgs, StateFn};
pub use location::Location;
pub use request::{
    HttpRequest, NoNetwork, OpenFn, Outcome, ReadyState, RequestError, RequestLine, Responder,
    Response, RouteTable, WeakHttpRequest,
};
pub use target::{EventTarget, Listener, Phase};

use crate::tracker::Tracker;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Builds a fresh request object for page code (`new XMLHttpRequest()`).
pub type RequestConstructor = Arc<dyn Fn(&Page) -> HttpRequest + Send + Sync>;

/// User agent used when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

struct PageInner {
    location: Location,
    window: EventTarget,
    document: EventTarget,
    history: History,
    request_constructor: RwLock<RequestConstructor>,
    user_agent: String,
    clock: PageClock,
    responder: Arc<dyn Responder>,
    tracker: OnceLock<Arc<Tracker>>,
}

/// Cheaply cloneable handle to one page.
#[derive(Clone)]
pub struct Page {
    inner: Arc<PageInner>,
}

impl Page {
    pub fn builder() -> PageBuilder {
        PageBuilder::default()
    }

    /// A page at `url` with default settings.
    pub fn new(url: &str) -> Self {
        Self::builder().url(url).build()
    }

    /// Shared handle to the current URL.
    pub fn location(&self) -> &Location {
        &self.inner.location
    }

    /// The window event target.
    pub fn window(&self) -> &EventTarget {
        &self.inner.window
    }

    /// The document event target, below the window in event routing.
    pub fn document(&self) -> &EventTarget {
        &self.inner.document
    }

    /// Session history.
    pub fn history(&self) -> &History {
        &self.inner.history
    }

    /// Clock behind every event time stamp.
    pub fn clock(&self) -> &PageClock {
        &self.inner.clock
    }

    /// The user agent string the page reports.
    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }

    pub(crate) fn tracker_slot(&self) -> &OnceLock<Arc<Tracker>> {
        &self.inner.tracker
    }

    /// The tracker installed on this page, if any.
    pub fn tracker(&self) -> Option<Arc<Tracker>> {
        self.inner.tracker.get().cloned()
    }

    /// Create a request through the current constructor.
    pub fn new_request(&self) -> HttpRequest {
        let constructor = self.request_constructor();
        constructor(self)
    }

    /// A request built by the page's own, unwrapped constructor.
    pub fn native_request(&self) -> HttpRequest {
        HttpRequest::new(self.inner.clock.clone(), Arc::clone(&self.inner.responder))
    }

    pub fn request_constructor(&self) -> RequestConstructor {
        Arc::clone(
            &self
                .inner
                .request_constructor
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Install a new request constructor, returning the previous one.
    pub fn replace_request_constructor(
        &self,
        constructor: RequestConstructor,
    ) -> RequestConstructor {
        std::mem::replace(
            &mut *self
                .inner
                .request_constructor
                .write()
                .unwrap_or_else(PoisonError::into_inner),
            constructor,
        )
    }

    /// Change the fragment; raises `hashchange` on the window if the URL changed.
    pub fn set_hash(&self, fragment: &str) {
        let old_url = self.inner.location.href();
        let new_url = self.inner.location.with_fragment(fragment);
        if old_url == new_url {
            return;
        }
        self.inner.location.set_href(new_url.clone());

        let event = Event::new(
            "hashchange",
            EventKind::HashChange { old_url, new_url },
            self.inner.clock.now(),
            false,
        );
        self.inner.window.dispatch_event(&event, Phase::AtTarget);
    }

    /// Click on `target`; the event bubbles to the document and window.
    pub fn click(&self, target: &Element) {
        let event = Event::new(
            "click",
            EventKind::Click {
                target: target.clone(),
            },
            self.inner.clock.now(),
            true,
        );
        self.route_to_element(&event);
    }

    /// Report an uncaught script error on the window.
    ///
    /// Returns `true` when a listener suppressed default handling. Otherwise
    /// the page logs the error as uncaught.
    pub fn raise_script_error(&self, error: ErrorEvent) -> bool {
        let event = Event::new(
            "error",
            EventKind::ScriptError(error.clone()),
            self.inner.clock.now(),
            false,
        );
        self.inner.window.dispatch_event(&event, Phase::AtTarget);

        let handled = event.default_prevented();
        if !handled {
            tracing::warn!(
                message = %error.message,
                filename = %error.filename,
                line = error.lineno,
                column = error.colno,
                "Uncaught script error"
            );
        }
        handled
    }

    /// `target` failed to load. The failure event does not bubble.
    pub fn fail_resource(&self, target: &Element) {
        let event = Event::new(
            "error",
            EventKind::ResourceError {
                target: target.clone(),
            },
            self.inner.clock.now(),
            false,
        );
        self.route_to_element(&event);
    }

    /// Capture through window and document, then bubble back if the event bubbles.
    fn route_to_element(&self, event: &Event) {
        self.inner.window.dispatch_event(event, Phase::Capturing);
        self.inner.document.dispatch_event(event, Phase::Capturing);
        if event.bubbles() {
            self.inner.document.dispatch_event(event, Phase::Bubbling);
            self.inner.window.dispatch_event(event, Phase::Bubbling);
        }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("location", &self.inner.location.href())
            .field("user_agent", &self.inner.user_agent)
            .field("tracker", &self.inner.tracker.get().is_some())
            .finish()
    }
}

/// Builder for [`Page`].
pub struct PageBuilder {
    url: String,
    user_agent: String,
    clock: PageClock,
    responder: Arc<dyn Responder>,
}

impl Default for PageBuilder {
    fn default() -> Self {
        Self {
            url: "http://localhost/".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            clock: PageClock::system(),
            responder: Arc::new(NoNetwork),
        }
    }
}

impl PageBuilder {
    pub fn url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn responder(mut self, responder: impl Responder + 'static) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    /// Freeze the clock at `start_ms`; it then only moves with request latency.
    pub fn manual_clock(mut self, start_ms: u64) -> Self {
        self.clock = PageClock::manual(start_ms);
        self
    }

    pub fn build(self) -> Page {
        let location = Location::new(self.url);
        let native: RequestConstructor = Arc::new(|page: &Page| page.native_request());
        Page {
            inner: Arc::new(PageInner {
                history: History::new(location.clone()),
                location,
                window: EventTarget::new(),
                document: EventTarget::new(),
                request_constructor: RwLock::new(native),
                user_agent: self.user_agent,
                clock: self.clock,
                responder: self.responder,
                tracker: OnceLock::new(),
            }),
        }
    }
}
