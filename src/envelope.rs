//! Enrichment of raw payloads into outbound records.

use crate::agent::EnvironmentInfo;
use crate::identity::IdentitySlot;
use crate::page::Location;
use crate::record::{OutboundRecord, Payload};
use crate::transport::Transport;
use chrono::Utc;

/// Adds the common fields to a payload and passes it to the transport.
pub struct EnvelopeBuilder {
    project: String,
    location: Location,
    environment: EnvironmentInfo,
    identity: IdentitySlot,
    transport: Transport,
}

impl EnvelopeBuilder {
    pub fn new(
        project: impl Into<String>,
        location: Location,
        environment: EnvironmentInfo,
        transport: Transport,
    ) -> Self {
        Self {
            project: project.into(),
            location,
            environment,
            identity: IdentitySlot::new(),
            transport,
        }
    }

    pub fn identity(&self) -> &IdentitySlot {
        &self.identity
    }

    pub fn environment(&self) -> &EnvironmentInfo {
        &self.environment
    }

    /// Build the record for `payload` as of now.
    ///
    /// The URL and user id are read at this moment, not when the event
    /// source was set up.
    pub fn enrich(&self, payload: Payload) -> OutboundRecord {
        OutboundRecord {
            payload,
            time: Utc::now().timestamp_millis(),
            url: self.location.href(),
            project: self.project.clone(),
            user_id: self.identity.resolve(),
            environment: self.environment.clone(),
        }
    }

    /// Enrich `payload` and hand it to the transport. Exactly one dispatch per call.
    pub fn send(&self, payload: Payload) {
        let record = self.enrich(payload);
        self.transport.dispatch(&record);
    }
}
