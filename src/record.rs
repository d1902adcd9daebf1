//! Event payloads and the enriched outbound record.
//!
//! A [`Payload`] is what an interceptor (or the embedder) observed. The
//! envelope step turns it into an [`OutboundRecord`] by adding the common
//! fields, and the transport flattens that into [`FormData`].

use crate::agent::EnvironmentInfo;
use crate::identity::Identity;
use serde_json::{Map, Value};

/// Keys the envelope owns. Custom payload fields with these names are
/// dropped so each appears once, carrying the collector's value.
pub const COMMON_KEYS: [&str; 8] = [
    "type",
    "time",
    "url",
    "project",
    "userId",
    "browser",
    "browserVersion",
    "system",
];

/// Navigation-state mutation reported by the history interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Push,
    Replace,
}

/// Outcome of one instrumented request.
#[derive(Debug, Clone, PartialEq)]
pub struct AjaxRecord {
    pub status: u16,
    pub timed_out: bool,
    /// Only filled for non-200 responses
    pub response_text: String,
    pub method: Option<String>,
    /// Request URL without its query string
    pub request_url: Option<String>,
    /// `loadend` minus `loadstart`, in milliseconds
    pub elapsed_ms: Option<f64>,
}

/// Tagged event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    History {
        action: HistoryAction,
    },
    HashChange {
        old_url: String,
    },
    DomClick {
        target_key: String,
    },
    JsError {
        message: String,
        filename: String,
        colno: u32,
        lineno: u32,
    },
    SourceError {
        source: String,
        tag_name: String,
    },
    Ajax(AjaxRecord),
    /// Caller-defined discriminant with free-form fields
    Custom {
        kind: String,
        fields: Map<String, Value>,
    },
}

impl Payload {
    /// A custom payload. A `type` key inside `fields` is ignored in favour of `kind`.
    pub fn custom(kind: impl Into<String>, fields: Map<String, Value>) -> Self {
        Payload::Custom {
            kind: kind.into(),
            fields,
        }
    }

    /// Build a custom payload from a JSON object carrying its own `type`.
    ///
    /// Returns `None` unless `value` is an object with a string `type`.
    pub fn from_json(value: Value) -> Option<Self> {
        let mut fields = match value {
            Value::Object(map) => map,
            _ => return None,
        };
        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => return None,
        };
        Some(Payload::Custom { kind, fields })
    }

    /// The `type` discriminant sent on the wire.
    pub fn kind(&self) -> &str {
        match self {
            Payload::History {
                action: HistoryAction::Push,
            } => "history.pushState",
            Payload::History {
                action: HistoryAction::Replace,
            } => "history.replaceState",
            Payload::HashChange { .. } => "hashchange",
            Payload::DomClick { .. } => "dom.click",
            Payload::JsError { .. } => "jsError",
            Payload::SourceError { .. } => "sourceError",
            Payload::Ajax(_) => "ajaxTracker",
            Payload::Custom { kind, .. } => kind,
        }
    }

    /// The payload's own fields, `type` first.
    pub fn fields(&self) -> Vec<(String, Value)> {
        let mut out = vec![("type".to_string(), Value::from(self.kind()))];
        let mut put = |key: &str, value: Value| out.push((key.to_string(), value));

        match self {
            Payload::History { .. } => {}
            Payload::HashChange { old_url } => put("oldURL", Value::from(old_url.as_str())),
            Payload::DomClick { target_key } => put("targetKey", Value::from(target_key.as_str())),
            Payload::JsError {
                message,
                filename,
                colno,
                lineno,
            } => {
                put("message", Value::from(message.as_str()));
                put("filename", Value::from(filename.as_str()));
                put("colno", Value::from(*colno));
                put("lineno", Value::from(*lineno));
            }
            Payload::SourceError { source, tag_name } => {
                put("source", Value::from(source.as_str()));
                put("tagName", Value::from(tag_name.as_str()));
            }
            Payload::Ajax(record) => {
                put("status", Value::from(record.status));
                put("timeout", Value::from(record.timed_out));
                put("responseText", Value::from(record.response_text.as_str()));
                if let Some(method) = &record.method {
                    put("method", Value::from(method.as_str()));
                }
                if let Some(url) = &record.request_url {
                    put("requestUrl", Value::from(url.as_str()));
                }
                if let Some(elapsed) = record.elapsed_ms {
                    put("timeStampCompute", Value::from(elapsed));
                }
            }
            Payload::Custom { fields, .. } => {
                for (key, value) in fields {
                    if !COMMON_KEYS.contains(&key.as_str()) {
                        put(key, value.clone());
                    }
                }
            }
        }
        out
    }
}

/// A payload enriched with the fields every record carries.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRecord {
    pub payload: Payload,
    /// Send time, milliseconds since the Unix epoch
    pub time: i64,
    pub url: String,
    pub project: String,
    pub user_id: Option<Identity>,
    pub environment: EnvironmentInfo,
}

impl OutboundRecord {
    /// Flatten to string pairs: payload fields, then the common fields.
    ///
    /// An absent user id is left out rather than sent as a placeholder.
    pub fn to_form_data(&self) -> FormData {
        let mut form = FormData::new();
        for (key, value) in self.payload.fields() {
            form.append(key, stringify(&value));
        }
        form.append("time", self.time.to_string());
        form.append("url", self.url.as_str());
        form.append("project", self.project.as_str());
        if let Some(user_id) = &self.user_id {
            form.append("userId", user_id.to_string());
        }
        form.append("browser", self.environment.browser.as_str());
        form.append("browserVersion", self.environment.browser_version.as_str());
        form.append("system", self.environment.system.as_str());
        form
    }
}

/// Ordered string key/value pairs, as submitted by a beacon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// String form of a field value.
///
/// Strings are sent verbatim, integral numbers without a fraction and
/// nested structures as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Format a float the way the page would print it (`250`, not `250.0`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
