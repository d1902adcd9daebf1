//! Construction options for the tracker.

use crate::interceptor::InterceptorKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Version tag reported when the options do not carry one.
pub const DEFAULT_SDK_VERSION: &str = "v1.0.0";

/// Options consumed once when a tracker is installed.
///
/// Field names on the wire/JSON side keep the camelCase keys embedders
/// already use (`requestUrl`, `historyTracker`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerOptions {
    /// Collection endpoint every beacon is posted to
    pub request_url: String,

    /// Project identifier stamped on every record
    pub project: String,

    /// Report `history.pushState` / `history.replaceState`
    pub history_tracker: bool,

    /// Report `hashchange`
    pub hash_tracker: bool,

    /// Report clicks on elements carrying the marker attribute
    pub dom_tracker: bool,

    /// Report uncaught script errors and failed resource loads
    pub js_error: bool,

    /// Report request lifecycle and outcome
    pub ajax_tracker: bool,

    /// Collector version tag
    pub sdk_version: String,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            request_url: String::new(),
            project: String::new(),
            history_tracker: false,
            hash_tracker: false,
            dom_tracker: false,
            js_error: false,
            ajax_tracker: false,
            sdk_version: DEFAULT_SDK_VERSION.to_string(),
        }
    }
}

impl TrackerOptions {
    /// Options with the two required fields set and every interceptor off.
    pub fn new(request_url: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            request_url: request_url.into(),
            project: project.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, enabled: bool) -> Self {
        self.history_tracker = enabled;
        self
    }

    pub fn with_hash(mut self, enabled: bool) -> Self {
        self.hash_tracker = enabled;
        self
    }

    pub fn with_dom(mut self, enabled: bool) -> Self {
        self.dom_tracker = enabled;
        self
    }

    pub fn with_js_error(mut self, enabled: bool) -> Self {
        self.js_error = enabled;
        self
    }

    pub fn with_ajax(mut self, enabled: bool) -> Self {
        self.ajax_tracker = enabled;
        self
    }

    /// Enable every interceptor named in a comma-separated list.
    ///
    /// Accepts the interceptor names (`history`, `hash`, `dom`, `error`,
    /// `ajax`) and `all`. Unknown names are ignored.
    pub fn with_interceptors_csv(mut self, s: &str) -> Self {
        for name in s.split(',').map(|s| s.trim().to_lowercase()) {
            if name == "all" {
                for kind in InterceptorKind::ALL {
                    self.set_enabled(kind, true);
                }
            } else if let Some(kind) = InterceptorKind::from_name(&name) {
                self.set_enabled(kind, true);
            }
        }
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json(&content)?)
    }

    /// Check the required fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_url.trim().is_empty() {
            return Err(ConfigError::MissingField("requestUrl"));
        }
        if self.project.trim().is_empty() {
            return Err(ConfigError::MissingField("project"));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn is_enabled(&self, kind: InterceptorKind) -> bool {
        match kind {
            InterceptorKind::History => self.history_tracker,
            InterceptorKind::Hash => self.hash_tracker,
            InterceptorKind::Dom => self.dom_tracker,
            InterceptorKind::JsError => self.js_error,
            InterceptorKind::Ajax => self.ajax_tracker,
        }
    }

    fn set_enabled(&mut self, kind: InterceptorKind, enabled: bool) {
        match kind {
            InterceptorKind::History => self.history_tracker = enabled,
            InterceptorKind::Hash => self.hash_tracker = enabled,
            InterceptorKind::Dom => self.dom_tracker = enabled,
            InterceptorKind::JsError => self.js_error = enabled,
            InterceptorKind::Ajax => self.ajax_tracker = enabled,
        }
    }

    /// Interceptors switched on, in installation order.
    pub fn enabled_interceptors(&self) -> Vec<InterceptorKind> {
        InterceptorKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Missing required option: {0}")]
    MissingField(&'static str),
}
