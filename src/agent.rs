//! Browser and operating-system identification from the user agent.
//!
//! Rules are tried in order and the first match wins, so more specific
//! engines (Edge, Opera) are listed before the ones they masquerade as.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Environment fields merged into every outbound record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub browser: String,
    pub browser_version: String,
    pub system: String,
}

struct BrowserRule {
    name: &'static str,
    pattern: Regex,
}

struct SystemRule {
    name: &'static str,
    pattern: Regex,
}

fn browser_rules() -> &'static [BrowserRule] {
    static RULES: OnceLock<Vec<BrowserRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            ("IE", r"rv:([\d.]+)\) like gecko"),
            ("IE", r"msie ([\d.]+)"),
            ("Edge", r"edg/([\d.]+)"),
            ("Firefox", r"firefox/([\d.]+)"),
            ("Opera", r"(?:opera|opr).([\d.]+)"),
            ("Chrome", r"chrome/([\d.]+)"),
            ("Safari", r"version/([\d.]+).*safari"),
        ]
        .into_iter()
        .filter_map(|(name, pattern)| {
            Regex::new(pattern)
                .ok()
                .map(|pattern| BrowserRule { name, pattern })
        })
        .collect()
    })
}

fn system_rules() -> &'static [SystemRule] {
    static RULES: OnceLock<Vec<SystemRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            ("Window", r"compatible"),
            ("Window", r"windows"),
            ("MacOS", r"macintosh"),
            ("MacOS", r"macintel"),
            ("IOS", r"iphone"),
            ("IOS", r"ipad"),
            ("Android", r"android"),
        ]
        .into_iter()
        .filter_map(|(name, pattern)| {
            Regex::new(pattern)
                .ok()
                .map(|pattern| SystemRule { name, pattern })
        })
        .collect()
    })
}

impl EnvironmentInfo {
    /// Identify browser, version and system. Unknown parts stay empty.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        let mut info = Self::default();

        if let Some((rule, caps)) = browser_rules()
            .iter()
            .find_map(|rule| rule.pattern.captures(&ua).map(|caps| (rule, caps)))
        {
            info.browser = rule.name.to_string();
            info.browser_version = caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
        }

        if let Some(rule) = system_rules().iter().find(|rule| rule.pattern.is_match(&ua)) {
            info.system = rule.name.to_string();
        }

        info
    }
}
