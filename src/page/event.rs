//! Page events as seen by listeners.

use crate::page::element::Element;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Process-unique identity of a thrown error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorId(u64);

static NEXT_ERROR_ID: AtomicU64 = AtomicU64::new(1);

/// The value that was thrown. Shared between every event that carries it,
/// so two events reporting the same throw compare equal by [`ErrorId`].
#[derive(Debug)]
pub struct ErrorObject {
    id: ErrorId,
    pub name: String,
    pub message: String,
}

impl ErrorObject {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: ErrorId(NEXT_ERROR_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            message: message.into(),
        })
    }

    pub fn id(&self) -> ErrorId {
        self.id
    }
}

/// Details of an uncaught script error.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub message: String,
    pub filename: String,
    pub lineno: u32,
    pub colno: u32,
    /// Absent for errors the page may not inspect (e.g. cross-origin scripts)
    pub error: Option<Arc<ErrorObject>>,
}

impl ErrorEvent {
    /// Build the event for a thrown error; the message is taken from it.
    pub fn from_error(error: &Arc<ErrorObject>, filename: &str, lineno: u32, colno: u32) -> Self {
        Self {
            message: format!("Uncaught {}: {}", error.name, error.message),
            filename: filename.to_string(),
            lineno,
            colno,
            error: Some(Arc::clone(error)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EventKind {
    /// Synthetic event raised by page code
    Custom,
    HashChange { old_url: String, new_url: String },
    Click { target: Element },
    /// Rich error event raised on the window
    ScriptError(ErrorEvent),
    /// Plain failure event on an element that could not load
    ResourceError { target: Element },
    /// Request lifecycle progress
    Progress,
}

#[derive(Debug)]
pub struct Event {
    name: String,
    kind: EventKind,
    time_stamp: f64,
    bubbles: bool,
    default_prevented: AtomicBool,
}

impl Event {
    pub fn new(name: impl Into<String>, kind: EventKind, time_stamp: f64, bubbles: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            time_stamp,
            bubbles,
            default_prevented: AtomicBool::new(false),
        }
    }

    pub fn custom(name: impl Into<String>, time_stamp: f64) -> Self {
        Self::new(name, EventKind::Custom, time_stamp, false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn time_stamp(&self) -> f64 {
        self.time_stamp
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Suppress the environment's default handling of this event.
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}
