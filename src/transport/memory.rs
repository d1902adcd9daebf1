//! Beacon that keeps every submission in memory.

use super::Beacon;
use crate::record::FormData;
use std::sync::{Arc, Mutex, PoisonError};

/// One accepted beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub endpoint: String,
    pub form: FormData,
}

/// Records submissions instead of sending them. Clones share the same log.
#[derive(Debug, Clone)]
pub struct MemoryBeacon {
    submissions: Arc<Mutex<Vec<Submission>>>,
    accept: bool,
}

impl MemoryBeacon {
    pub fn new() -> Self {
        Self {
            submissions: Arc::new(Mutex::new(Vec::new())),
            accept: true,
        }
    }

    /// A beacon that refuses everything, like a full queue.
    pub fn rejecting() -> Self {
        Self {
            accept: false,
            ..Self::new()
        }
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().clone()
    }

    /// Submitted forms, oldest first.
    pub fn forms(&self) -> Vec<FormData> {
        self.lock().iter().map(|s| s.form.clone()).collect()
    }

    pub fn last(&self) -> Option<FormData> {
        self.lock().last().map(|s| s.form.clone())
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<Submission> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Submission>> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryBeacon {
    fn default() -> Self {
        Self::new()
    }
}

impl Beacon for MemoryBeacon {
    fn send_beacon(&self, endpoint: &str, form: FormData) -> bool {
        if !self.accept {
            return false;
        }
        self.lock().push(Submission {
            endpoint: endpoint.to_string(),
            form,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let beacon = MemoryBeacon::new();
        let other = beacon.clone();
        let mut form = FormData::new();
        form.append("type", "dom.click");

        assert!(other.send_beacon("https://collect.test/t", form));
        assert_eq!(beacon.len(), 1);
        assert_eq!(
            beacon.last().and_then(|f| f.get("type").map(String::from)),
            Some("dom.click".to_string())
        );

        assert_eq!(beacon.take().len(), 1);
        assert!(other.is_empty());
    }

    #[test]
    fn test_rejecting_records_nothing() {
        let beacon = MemoryBeacon::rejecting();
        assert!(!beacon.send_beacon("https://collect.test/t", FormData::new()));
        assert!(beacon.is_empty());
    }
}
