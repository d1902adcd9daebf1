//! Uncaught-error interceptor.
//!
//! One capturing listener on the window observes both error channels:
//! script errors (rich [`ErrorEvent`](crate::page::ErrorEvent)s raised on the
//! window) and resource load failures (plain events on the element, which
//! do not bubble and so are only visible while capturing).
//!
//! Default handling is suppressed for every error seen. A script error is
//! reported at most once per thrown value: identities already reported are
//! kept in a side table instead of being stamped on the error itself.

use crate::envelope::EnvelopeBuilder;
use crate::page::{Element, ErrorId, EventKind, Page};
use crate::record::Payload;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

pub(crate) fn install(page: &Page, envelope: &Arc<EnvelopeBuilder>) {
    let envelope = Arc::clone(envelope);
    let reported: Mutex<HashSet<ErrorId>> = Mutex::new(HashSet::new());

    page.window().add_event_listener("error", true, move |event| {
        event.prevent_default();

        match event.kind() {
            EventKind::ScriptError(error) => {
                // Without the thrown value there is nothing to de-duplicate on.
                if let Some(thrown) = &error.error {
                    let first_time = reported
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(thrown.id());
                    if !first_time {
                        tracing::trace!(message = %error.message, "Script error already reported");
                        return;
                    }
                }
                envelope.send(Payload::JsError {
                    message: error.message.clone(),
                    filename: error.filename.clone(),
                    colno: error.colno,
                    lineno: error.lineno,
                });
            }
            EventKind::ResourceError { target } => {
                if let Some(source) = resource_source(target) {
                    envelope.send(Payload::SourceError {
                        source: source.to_string(),
                        tag_name: target.tag_name().to_string(),
                    });
                }
            }
            _ => {}
        }
    });
}

/// `src`, falling back to `href`; empty values count as absent.
fn resource_source(target: &Element) -> Option<&str> {
    target
        .get_attribute("src")
        .filter(|s| !s.is_empty())
        .or_else(|| target.get_attribute("href").filter(|s| !s.is_empty()))
}
