//! page-tracker - behavioral telemetry for instrumented pages.
//!
//! A tracker observes what happens on a page (navigation, clicks, script
//! and resource errors, outgoing requests) and sends one flat record per
//! event to a collection endpoint, without ever blocking or altering the
//! page.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Page                               │
//! │  history · hashchange · click · error · request lifecycle    │
//! └───────┬──────────┬──────────┬──────────┬──────────┬──────────┘
//!         ▼          ▼          ▼          ▼          ▼
//!   ┌──────────┐┌─────────┐┌─────────┐┌─────────┐┌──────────┐
//!   │ History  ││  Hash   ││   Dom   ││ JsError ││   Ajax   │  interceptors
//!   └────┬─────┘└────┬────┘└────┬────┘└────┬────┘└────┬─────┘
//!        └───────────┴────┬─────┴──────────┴──────────┘
//!                         ▼               Tracker::report ──┐
//!                 ┌───────────────┐                         │
//!                 │   Envelope    │◀────────────────────────┘
//!                 │ time url user │
//!                 └───────┬───────┘
//!                         ▼
//!                 ┌───────────────┐      ┌──────────────┐
//!                 │   Transport   │─────▶│    Beacon    │ fire-and-forget
//!                 └───────────────┘      └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use page_tracker::{page::Element, Page, Tracker, TrackerOptions};
//! use page_tracker::transport::MemoryBeacon;
//! use std::sync::Arc;
//!
//! let page = Page::new("https://shop.example/");
//! let beacon = MemoryBeacon::new();
//! let options = TrackerOptions::new("https://collect.example/t", "shop")
//!     .with_dom(true)
//!     .with_js_error(true);
//!
//! let tracker = Tracker::install(&page, options, Arc::new(beacon.clone()));
//! tracker.bind_identity(|| Some("user-42".into()));
//!
//! page.click(&Element::new("button").with_attribute("data-tracker", "buy"));
//! assert_eq!(beacon.len(), 1);
//! ```

pub mod agent;
pub mod config;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod interceptor;
pub mod logging;
pub mod page;
pub mod record;
pub mod stats;
pub mod tracker;
pub mod transport;

// Re-export key types at crate root for convenience
pub use agent::EnvironmentInfo;
pub use config::{ConfigError, TrackerOptions, DEFAULT_SDK_VERSION};
pub use error::{Error, Result};
pub use identity::Identity;
pub use interceptor::{InterceptorKind, TRACKER_ATTRIBUTE};
pub use page::Page;
pub use record::{AjaxRecord, FormData, HistoryAction, OutboundRecord, Payload};
pub use stats::{DeliverySnapshot, DeliveryStats};
pub use tracker::{tracker, Tracker};
pub use transport::{Beacon, LogBeacon, MemoryBeacon, Transport};

#[cfg(feature = "http")]
pub use transport::HttpBeacon;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert_eq!(TRACKER_ATTRIBUTE, "data-tracker");
    }
}
