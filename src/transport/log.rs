//! Beacon that only logs what it would send.

use super::Beacon;
use crate::record::FormData;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogBeacon;

impl Beacon for LogBeacon {
    fn send_beacon(&self, endpoint: &str, form: FormData) -> bool {
        let body = form
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        tracing::info!(target: "page_tracker::beacon", endpoint, %body, "beacon");
        true
    }
}
