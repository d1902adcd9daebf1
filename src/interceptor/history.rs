//! Navigation-state interceptor.
//!
//! The page raises no event when history is mutated programmatically. Each
//! mutation entry point is wrapped so that, once the original call has
//! succeeded, an event named after the method (`pushState`,
//! `replaceState`) is raised on the window. A window listener for that event
//! reports the change.

use crate::envelope::EnvelopeBuilder;
use crate::page::{Event, History, HistoryError, HistoryMethod, Page, Phase, StateArgs};
use crate::record::{HistoryAction, Payload};
use std::sync::Arc;

pub(crate) fn install(page: &Page, envelope: &Arc<EnvelopeBuilder>) {
    let history = page.history();

    for method in HistoryMethod::ALL {
        let original = history.entry(method);
        let window = page.window().clone();
        let clock = page.clock().clone();

        history.replace_entry(
            method,
            Arc::new(move |history: &History, args: StateArgs| -> Result<(), HistoryError> {
                original(history, args)?;
                window.dispatch_event(&Event::custom(method.name(), clock.now()), Phase::AtTarget);
                Ok(())
            }),
        );

        let action = match method {
            HistoryMethod::PushState => HistoryAction::Push,
            HistoryMethod::ReplaceState => HistoryAction::Replace,
        };
        let envelope = Arc::clone(envelope);
        page.window().add_event_listener(method.name(), false, move |_| {
            envelope.send(Payload::History { action });
        });
    }
}
