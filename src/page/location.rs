//! The page's current URL.

use std::sync::{Arc, PoisonError, RwLock};

/// Shared handle to the current URL of a page.
#[derive(Debug, Clone)]
pub struct Location {
    href: Arc<RwLock<String>>,
}

impl Location {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: Arc::new(RwLock::new(href.into())),
        }
    }

    pub fn href(&self) -> String {
        self.href
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_href(&self, href: impl Into<String>) {
        *self.href.write().unwrap_or_else(PoisonError::into_inner) = href.into();
    }

    /// `scheme://host[:port]`, or an empty string for URLs without an authority.
    pub fn origin(&self) -> String {
        origin_of(&self.href())
    }

    /// The fragment including its `#`, or an empty string.
    pub fn hash(&self) -> String {
        let href = self.href();
        href.find('#')
            .map(|i| href[i..].to_string())
            .unwrap_or_default()
    }

    /// The current URL with its fragment replaced by `fragment`.
    pub fn with_fragment(&self, fragment: &str) -> String {
        let fragment = fragment.trim_start_matches('#');
        format!("{}#{}", strip_fragment(&self.href()), fragment)
    }

    /// Resolve `url` against the current URL.
    pub fn resolve(&self, url: &str) -> String {
        let base = self.href();
        if url.contains("://") {
            url.to_string()
        } else if url.is_empty() {
            base
        } else if url.starts_with('#') {
            format!("{}{}", strip_fragment(&base), url)
        } else if url.starts_with('?') {
            format!("{}{}", strip_query(&base), url)
        } else if url.starts_with("//") {
            // Scheme-relative: only the scheme comes from the base.
            match base.find("://") {
                Some(scheme_end) => format!("{}:{}", &base[..scheme_end], url),
                None => url.to_string(),
            }
        } else if url.starts_with('/') {
            format!("{}{}", origin_of(&base), url)
        } else {
            let path = strip_query(&base);
            let dir_end = path.rfind('/').map(|i| i + 1).unwrap_or(path.len());
            format!("{}{}", &path[..dir_end], url)
        }
    }
}

pub(crate) fn origin_of(url: &str) -> String {
    match url.find("://") {
        Some(scheme_end) => {
            let authority_start = scheme_end + 3;
            let authority_end = url[authority_start..]
                .find(|c: char| c == '/' || c == '?' || c == '#')
                .map(|i| authority_start + i)
                .unwrap_or(url.len());
            url[..authority_end].to_string()
        }
        None => String::new(),
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

fn strip_query(url: &str) -> &str {
    strip_fragment(url).split('?').next().unwrap_or(url)
}
