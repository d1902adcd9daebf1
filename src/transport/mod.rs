//! Fire-and-forget delivery of outbound records.
//!
//! The [`Transport`] flattens a record and hands it to a [`Beacon`]. A
//! beacon only says whether it accepted the submission; whether the server
//! ever received it is unknowable, and nothing here retries.

pub mod log;
pub mod memory;

#[cfg(feature = "http")]
pub mod http;

pub use self::log::LogBeacon;
pub use memory::{MemoryBeacon, Submission};

#[cfg(feature = "http")]
pub use http::HttpBeacon;

use crate::record::{FormData, OutboundRecord};
use crate::stats::DeliveryStats;
use std::sync::Arc;

/// Background, best-effort delivery primitive.
pub trait Beacon: Send + Sync {
    /// Queue `form` for delivery to `endpoint` without blocking.
    ///
    /// Returns `true` if the submission was accepted for sending.
    fn send_beacon(&self, endpoint: &str, form: FormData) -> bool;
}

/// Sends records to one configured endpoint.
pub struct Transport {
    endpoint: String,
    beacon: Arc<dyn Beacon>,
    stats: Arc<DeliveryStats>,
}

impl Transport {
    pub fn new(
        endpoint: impl Into<String>,
        beacon: Arc<dyn Beacon>,
        stats: Arc<DeliveryStats>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            beacon,
            stats,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Flatten and submit `record`. Never fails; a refused beacon is only logged.
    pub fn dispatch(&self, record: &OutboundRecord) {
        let form = record.to_form_data();
        let fields = form.len();
        let queued = self.beacon.send_beacon(&self.endpoint, form);

        self.stats.record_dispatched();
        self.stats.record_beacon(queued);

        if queued {
            tracing::debug!(
                endpoint = %self.endpoint,
                kind = record.payload.kind(),
                fields,
                "Beacon queued"
            );
        } else {
            tracing::warn!(
                endpoint = %self.endpoint,
                kind = record.payload.kind(),
                "Beacon refused, record dropped"
            );
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::EnvironmentInfo;
    use crate::record::Payload;

    fn record() -> OutboundRecord {
        OutboundRecord {
            payload: Payload::DomClick {
                target_key: "buy".into(),
            },
            time: 1,
            url: "https://shop.test/".into(),
            project: "shop".into(),
            user_id: None,
            environment: EnvironmentInfo::default(),
        }
    }

    #[test]
    fn test_dispatch_submits_once() {
        let beacon = MemoryBeacon::new();
        let stats = Arc::new(DeliveryStats::new());
        let transport = Transport::new(
            "https://collect.test/t",
            Arc::new(beacon.clone()),
            Arc::clone(&stats),
        );

        transport.dispatch(&record());

        let sent = beacon.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].endpoint, "https://collect.test/t");
        assert_eq!(sent[0].form.get("targetKey"), Some("buy"));
        assert_eq!(stats.snapshot().beacons_queued, 1);
    }

    #[test]
    fn test_refused_beacon_is_counted_not_raised() {
        let stats = Arc::new(DeliveryStats::new());
        let transport = Transport::new(
            "not a url",
            Arc::new(MemoryBeacon::rejecting()),
            Arc::clone(&stats),
        );

        transport.dispatch(&record());
        let snap = stats.snapshot();
        assert_eq!(snap.records_dispatched, 1);
        assert_eq!(snap.beacons_rejected, 1);
    }
}
