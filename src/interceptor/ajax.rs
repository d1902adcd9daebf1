//! Network-request interceptor.
//!
//! The page's request constructor is wrapped. Every request it builds gets
//! two capturing lifecycle listeners (`loadstart`, `loadend`) and an `open`
//! wrapper that notes the method and the URL without its query string
//! before delegating to the original `open` with the same arguments.
//!
//! Elapsed time is `loadend - loadstart`. If `loadstart` never fired the
//! start is taken as 0, so the value is the page age at `loadend` rather
//! than a duration.

use crate::envelope::EnvelopeBuilder;
use crate::page::{HttpRequest, Page, RequestError};
use crate::record::{AjaxRecord, Payload};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What the instrumentation learns about one request object.
#[derive(Debug, Default)]
struct RequestTrace {
    method: Option<String>,
    request_url: Option<String>,
    started_at: Option<f64>,
}

type SharedTrace = Arc<Mutex<RequestTrace>>;

fn lock(trace: &SharedTrace) -> MutexGuard<'_, RequestTrace> {
    trace.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn install(page: &Page, envelope: &Arc<EnvelopeBuilder>) {
    let original = page.request_constructor();
    let envelope = Arc::clone(envelope);

    page.replace_request_constructor(Arc::new(move |page: &Page| {
        let request = original(page);
        instrument(&request, &envelope);
        request
    }));
}

fn instrument(request: &HttpRequest, envelope: &Arc<EnvelopeBuilder>) {
    let trace: SharedTrace = Arc::default();

    let start = Arc::clone(&trace);
    request.add_event_listener("loadstart", true, move |event| {
        lock(&start).started_at = Some(event.time_stamp());
    });

    let end = Arc::clone(&trace);
    let handle = request.downgrade();
    let envelope = Arc::clone(envelope);
    request.add_event_listener("loadend", true, move |event| {
        let Some(request) = handle.upgrade() else {
            return;
        };

        let (method, request_url, started_at) = {
            let mut trace = lock(&end);
            (
                trace.method.clone(),
                trace.request_url.clone(),
                trace.started_at.take(),
            )
        };
        if started_at.is_none() {
            tracing::debug!(
                url = ?request_url,
                "loadend without loadstart, timing from page origin"
            );
        }

        let status = request.status();
        let response_text = if status != 200 {
            request.response_text()
        } else {
            String::new()
        };

        envelope.send(Payload::Ajax(AjaxRecord {
            status,
            timed_out: request.timed_out(),
            response_text,
            method,
            request_url,
            elapsed_ms: Some(event.time_stamp() - started_at.unwrap_or(0.0)),
        }));
    });

    let original_open = request.open_entry();
    request.replace_open(Arc::new(
        move |request: &HttpRequest, method: &str, url: &str| -> Result<(), RequestError> {
            {
                let mut trace = lock(&trace);
                trace.method = Some(method.to_string());
                trace.request_url = Some(strip_query(url).to_string());
            }
            original_open(request, method, url)
        },
    ));
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
