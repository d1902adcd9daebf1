//! Session history with replaceable mutation entry points.
//!
//! `push_state` and `replace_state` do not call their implementation
//! directly: they look up the current entry point for the method, so page
//! code (or a tracker) can wrap it. The native entries change the URL
//! without raising any event.

use crate::page::location::{origin_of, Location};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;

/// The two navigation-state mutation entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryMethod {
    PushState,
    ReplaceState,
}

impl HistoryMethod {
    pub const ALL: [HistoryMethod; 2] = [HistoryMethod::PushState, HistoryMethod::ReplaceState];

    pub fn name(&self) -> &'static str {
        match self {
            HistoryMethod::PushState => "pushState",
            HistoryMethod::ReplaceState => "replaceState",
        }
    }
}

/// Arguments of a `pushState` / `replaceState` call.
#[derive(Debug, Clone, PartialEq)]
pub struct StateArgs {
    pub state: Value,
    pub title: String,
    pub url: Option<String>,
}

impl StateArgs {
    pub fn new(state: Value, title: impl Into<String>, url: Option<&str>) -> Self {
        Self {
            state,
            title: title.into(),
            url: url.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("SecurityError: cannot change history to '{url}' from origin '{origin}'")]
    SecurityError { url: String, origin: String },
}

/// An entry point: receives the history it was invoked on plus the call arguments.
pub type StateFn = Arc<dyn Fn(&History, StateArgs) -> Result<(), HistoryError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub url: String,
    pub state: Value,
    pub title: String,
}

struct Stack {
    entries: Vec<HistoryEntry>,
    index: usize,
}

struct HistoryInner {
    location: Location,
    stack: Mutex<Stack>,
    push_state: RwLock<StateFn>,
    replace_state: RwLock<StateFn>,
}

#[derive(Clone)]
pub struct History {
    inner: Arc<HistoryInner>,
}

impl History {
    pub fn new(location: Location) -> Self {
        let first = HistoryEntry {
            url: location.href(),
            state: Value::Null,
            title: String::new(),
        };
        Self {
            inner: Arc::new(HistoryInner {
                location,
                stack: Mutex::new(Stack {
                    entries: vec![first],
                    index: 0,
                }),
                push_state: RwLock::new(Arc::new(native_push_state)),
                replace_state: RwLock::new(Arc::new(native_replace_state)),
            }),
        }
    }

    pub fn push_state(
        &self,
        state: Value,
        title: &str,
        url: Option<&str>,
    ) -> Result<(), HistoryError> {
        self.call(HistoryMethod::PushState, StateArgs::new(state, title, url))
    }

    pub fn replace_state(
        &self,
        state: Value,
        title: &str,
        url: Option<&str>,
    ) -> Result<(), HistoryError> {
        self.call(HistoryMethod::ReplaceState, StateArgs::new(state, title, url))
    }

    /// Invoke the current entry point for `method` with this history as receiver.
    pub fn call(&self, method: HistoryMethod, args: StateArgs) -> Result<(), HistoryError> {
        let entry = self.entry(method);
        entry(self, args)
    }

    /// The entry point currently installed for `method`.
    pub fn entry(&self, method: HistoryMethod) -> StateFn {
        Arc::clone(&self.slot(method).read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Install a new entry point for `method`, returning the previous one.
    pub fn replace_entry(&self, method: HistoryMethod, entry: StateFn) -> StateFn {
        std::mem::replace(
            &mut *self.slot(method).write().unwrap_or_else(PoisonError::into_inner),
            entry,
        )
    }

    fn slot(&self, method: HistoryMethod) -> &RwLock<StateFn> {
        match method {
            HistoryMethod::PushState => &self.inner.push_state,
            HistoryMethod::ReplaceState => &self.inner.replace_state,
        }
    }

    pub fn len(&self) -> usize {
        self.lock_stack().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn state(&self) -> Value {
        let stack = self.lock_stack();
        stack.entries[stack.index].state.clone()
    }

    fn lock_stack(&self) -> std::sync::MutexGuard<'_, Stack> {
        self.inner.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the target URL and reject cross-origin changes.
    fn target_entry(&self, args: StateArgs) -> Result<HistoryEntry, HistoryError> {
        let location = &self.inner.location;
        let url = match args.url.as_deref() {
            Some(url) => location.resolve(url),
            None => location.href(),
        };
        let origin = location.origin();
        if origin_of(&url) != origin {
            return Err(HistoryError::SecurityError { url, origin });
        }
        Ok(HistoryEntry {
            url,
            state: args.state,
            title: args.title,
        })
    }
}

fn native_push_state(history: &History, args: StateArgs) -> Result<(), HistoryError> {
    let entry = history.target_entry(args)?;
    let url = entry.url.clone();
    {
        let mut stack = history.lock_stack();
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(entry);
        stack.index = keep;
    }
    history.inner.location.set_href(url);
    Ok(())
}

fn native_replace_state(history: &History, args: StateArgs) -> Result<(), HistoryError> {
    let entry = history.target_entry(args)?;
    let url = entry.url.clone();
    {
        let mut stack = history.lock_stack();
        let index = stack.index;
        stack.entries[index] = entry;
    }
    history.inner.location.set_href(url);
    Ok(())
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("length", &self.len())
            .field("location", &self.inner.location.href())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn history() -> (History, Location) {
        let location = Location::new("https://shop.test/home");
        (History::new(location.clone()), location)
    }

    #[test]
    fn test_push_and_replace() {
        let (history, location) = history();

        history.push_state(json!({"step": 1}), "", Some("/cart")).unwrap();
        assert_eq!(location.href(), "https://shop.test/cart");
        assert_eq!(history.len(), 2);
        assert_eq!(history.state(), json!({"step": 1}));

        history.replace_state(Value::Null, "", Some("/cart?x=1")).unwrap();
        assert_eq!(location.href(), "https://shop.test/cart?x=1");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_cross_origin_is_rejected() {
        let (history, location) = history();
        let err = history
            .push_state(Value::Null, "", Some("https://evil.test/"))
            .unwrap_err();
        assert!(matches!(err, HistoryError::SecurityError { .. }));
        assert_eq!(location.href(), "https://shop.test/home");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_scheme_relative_url_is_checked_against_origin() {
        let (history, location) = history();
        let err = history
            .replace_state(Value::Null, "", Some("//evil.test/x"))
            .unwrap_err();
        assert!(matches!(err, HistoryError::SecurityError { .. }));
        assert_eq!(location.href(), "https://shop.test/home");

        history
            .push_state(Value::Null, "", Some("//shop.test/next"))
            .unwrap();
        assert_eq!(location.href(), "https://shop.test/next");
    }

    #[test]
    fn test_replaced_entry_receives_calls() {
        let (history, _) = history();
        let original = history.entry(HistoryMethod::PushState);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        history.replace_entry(
            HistoryMethod::PushState,
            Arc::new(move |h: &History, args: StateArgs| {
                log.lock().unwrap().push(args.url.clone());
                original(h, args)
            }),
        );

        history.push_state(Value::Null, "", Some("/a")).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Some("/a".to_string())]);
        assert_eq!(history.len(), 2);
    }
}
