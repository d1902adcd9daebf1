//! The tracker facade: one per page.
//!
//! [`Tracker::install`] is the only way to obtain a tracker. The first call
//! on a page builds it and wires the enabled interceptors; every later call
//! returns that same tracker and ignores its arguments.

use crate::agent::EnvironmentInfo;
use crate::config::TrackerOptions;
use crate::envelope::EnvelopeBuilder;
use crate::identity::Identity;
use crate::interceptor::InterceptorKind;
use crate::page::Page;
use crate::record::Payload;
use crate::stats::{DeliverySnapshot, DeliveryStats};
use crate::transport::{Beacon, Transport};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

pub struct Tracker {
    instance_id: Uuid,
    options: TrackerOptions,
    /// `None` when the options were invalid: nothing is ever sent
    envelope: Option<Arc<EnvelopeBuilder>>,
    installed: Vec<InterceptorKind>,
    stats: Arc<DeliveryStats>,
}

impl Tracker {
    /// Get the page's tracker, creating it on first use.
    ///
    /// Invalid options (empty endpoint or project) yield an inert tracker:
    /// no interceptor is wired and reports are discarded. It still occupies
    /// the page, so a later call with valid options does not replace it.
    pub fn install(page: &Page, options: TrackerOptions, beacon: Arc<dyn Beacon>) -> Arc<Tracker> {
        let mut fresh = false;
        let tracker = page.tracker_slot().get_or_init(|| {
            fresh = true;
            Arc::new(Tracker::build(page, options, beacon))
        });
        if !fresh {
            tracing::debug!(
                instance_id = %tracker.instance_id,
                "Tracker already installed on this page, ignoring new options"
            );
        }
        Arc::clone(tracker)
    }

    fn build(page: &Page, options: TrackerOptions, beacon: Arc<dyn Beacon>) -> Tracker {
        let instance_id = Uuid::new_v4();
        let stats = Arc::new(DeliveryStats::new());

        if let Err(e) = options.validate() {
            tracing::debug!(%instance_id, error = %e, "Tracker inactive");
            return Tracker {
                instance_id,
                options,
                envelope: None,
                installed: Vec::new(),
                stats,
            };
        }

        let transport = Transport::new(options.request_url.clone(), beacon, Arc::clone(&stats));
        let envelope = Arc::new(EnvelopeBuilder::new(
            options.project.clone(),
            page.location().clone(),
            EnvironmentInfo::from_user_agent(page.user_agent()),
            transport,
        ));

        let installed = options.enabled_interceptors();
        for kind in &installed {
            kind.install(page, &envelope);
        }

        tracing::info!(
            %instance_id,
            project = %options.project,
            endpoint = %options.request_url,
            sdk_version = %options.sdk_version,
            interceptors = ?installed,
            "Tracker installed"
        );

        Tracker {
            instance_id,
            options,
            envelope: Some(envelope),
            installed,
            stats,
        }
    }

    /// Send a payload through the envelope, bypassing the interceptors.
    pub fn report(&self, payload: Payload) {
        match &self.envelope {
            Some(envelope) => envelope.send(payload),
            None => tracing::trace!(kind = payload.kind(), "Inactive tracker, report dropped"),
        }
    }

    /// Report a custom event with free-form fields.
    pub fn report_custom(&self, kind: &str, fields: Map<String, Value>) {
        self.report(Payload::custom(kind, fields));
    }

    /// Report a JSON object carrying its own string `type`.
    ///
    /// Returns `false` (and sends nothing) when `value` has no such `type`.
    pub fn report_json(&self, value: Value) -> bool {
        match Payload::from_json(value) {
            Some(payload) => {
                self.report(payload);
                true
            }
            None => false,
        }
    }

    /// Replace the function consulted for `userId` at every send.
    pub fn bind_identity<F>(&self, provider: F)
    where
        F: Fn() -> Option<Identity> + Send + Sync + 'static,
    {
        if let Some(envelope) = &self.envelope {
            envelope.identity().bind(provider);
        }
    }

    /// Whether the options were valid and records are being sent.
    pub fn is_active(&self) -> bool {
        self.envelope.is_some()
    }

    /// Interceptors wired at installation.
    pub fn installed(&self) -> &[InterceptorKind] {
        &self.installed
    }

    /// Options the tracker was installed with.
    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    /// Unique id of this tracker instance.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Environment fields stamped on records; `None` for an inactive tracker.
    pub fn environment(&self) -> Option<&EnvironmentInfo> {
        self.envelope.as_deref().map(EnvelopeBuilder::environment)
    }

    /// Current delivery counters.
    pub fn stats(&self) -> DeliverySnapshot {
        self.stats.snapshot()
    }

    /// Human-readable delivery summary.
    pub fn summary(&self) -> String {
        self.stats.summary()
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("instance_id", &self.instance_id)
            .field("project", &self.options.project)
            .field("active", &self.is_active())
            .field("installed", &self.installed)
            .finish()
    }
}

/// Factory shorthand for [`Tracker::install`].
pub fn tracker(page: &Page, options: TrackerOptions, beacon: Arc<dyn Beacon>) -> Arc<Tracker> {
    Tracker::install(page, options, beacon)
}
