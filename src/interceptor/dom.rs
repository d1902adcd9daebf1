//! Click-target interceptor.
//!
//! A single listener at the document root sees every click. Only targets
//! carrying a non-empty [`TRACKER_ATTRIBUTE`] are reported.

use super::TRACKER_ATTRIBUTE;
use crate::envelope::EnvelopeBuilder;
use crate::page::{EventKind, Page};
use crate::record::Payload;
use std::sync::Arc;

pub(crate) fn install(page: &Page, envelope: &Arc<EnvelopeBuilder>) {
    let envelope = Arc::clone(envelope);
    page.document().add_event_listener("click", false, move |event| {
        let EventKind::Click { target } = event.kind() else {
            return;
        };
        if let Some(key) = target
            .get_attribute(TRACKER_ATTRIBUTE)
            .filter(|key| !key.is_empty())
        {
            envelope.send(Payload::DomClick {
                target_key: key.to_string(),
            });
        }
    });
}
