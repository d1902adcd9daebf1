//! Fragment-change interceptor.

use crate::envelope::EnvelopeBuilder;
use crate::page::{EventKind, Page};
use crate::record::Payload;
use std::sync::Arc;

pub(crate) fn install(page: &Page, envelope: &Arc<EnvelopeBuilder>) {
    let envelope = Arc::clone(envelope);
    page.window().add_event_listener("hashchange", false, move |event| {
        if let EventKind::HashChange { old_url, .. } = event.kind() {
            envelope.send(Payload::HashChange {
                old_url: old_url.clone(),
            });
        }
    });
}
