//! Event targets and listener dispatch.

use crate::page::event::Event;
use std::sync::{Arc, PoisonError, RwLock};

/// Callback registered on an [`EventTarget`].
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Where an event is relative to the target it is dispatched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Travelling down towards a descendant target
    Capturing,
    /// Dispatched on this target itself
    AtTarget,
    /// Travelling back up from a descendant target
    Bubbling,
}

struct Registration {
    name: String,
    capture: bool,
    listener: Listener,
}

/// A node that listeners can be attached to (window, document, request).
#[derive(Clone, Default)]
pub struct EventTarget {
    registrations: Arc<RwLock<Vec<Registration>>>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener<F>(&self, name: &str, capture: bool, listener: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                name: name.to_string(),
                capture,
                listener: Arc::new(listener),
            });
    }

    /// Run every listener for `event` that applies in `phase`.
    ///
    /// Listeners run in registration order. The list is snapshotted first,
    /// so a listener may register listeners or dispatch further events.
    pub fn dispatch_event(&self, event: &Event, phase: Phase) {
        let listeners: Vec<Listener> = self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.name == event.name())
            .filter(|r| match phase {
                Phase::Capturing => r.capture,
                Phase::AtTarget => true,
                Phase::Bubbling => !r.capture,
            })
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.name == name)
            .count()
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .registrations
            .read()
            .map(|r| r.len())
            .unwrap_or_default();
        f.debug_struct("EventTarget")
            .field("listeners", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_phase_filtering() {
        let target = EventTarget::new();
        let captured = Arc::new(AtomicUsize::new(0));
        let bubbled = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&captured);
        target.add_event_listener("error", true, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let b = Arc::clone(&bubbled);
        target.add_event_listener("error", false, move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        });

        let event = Event::custom("error", 0.0);
        target.dispatch_event(&event, Phase::Capturing);
        assert_eq!(captured.load(Ordering::SeqCst), 1);
        assert_eq!(bubbled.load(Ordering::SeqCst), 0);

        target.dispatch_event(&event, Phase::Bubbling);
        assert_eq!(bubbled.load(Ordering::SeqCst), 1);

        target.dispatch_event(&event, Phase::AtTarget);
        assert_eq!(captured.load(Ordering::SeqCst), 2);
        assert_eq!(bubbled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        let target = EventTarget::new();
        let inner = target.clone();
        target.add_event_listener("click", false, move |_| {
            inner.add_event_listener("click", false, |_| {});
        });

        target.dispatch_event(&Event::custom("click", 0.0), Phase::AtTarget);
        assert_eq!(target.listener_count("click"), 2);
        assert_eq!(target.listener_count("other"), 0);
    }
}
