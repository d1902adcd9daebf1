//! User identity resolution.
//!
//! The tracker never stores a user id. It asks the bound provider at every
//! send, so a page can log in or out without re-binding.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// An opaque user identifier as handed over by the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Text(String),
    Number(f64),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Text(s) => f.write_str(s),
            Identity::Number(n) => f.write_str(&crate::record::format_number(*n)),
        }
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity::Text(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Identity::Text(s)
    }
}

impl From<i64> for Identity {
    fn from(n: i64) -> Self {
        Identity::Number(n as f64)
    }
}

impl From<u32> for Identity {
    fn from(n: u32) -> Self {
        Identity::Number(f64::from(n))
    }
}

impl From<f64> for Identity {
    fn from(n: f64) -> Self {
        Identity::Number(n)
    }
}

/// Zero-argument function yielding the current user, if any.
pub type IdentityProvider = Arc<dyn Fn() -> Option<Identity> + Send + Sync>;

/// Holds the bound provider; starts out resolving to no user.
pub struct IdentitySlot {
    provider: RwLock<IdentityProvider>,
}

impl IdentitySlot {
    pub fn new() -> Self {
        Self {
            provider: RwLock::new(Arc::new(|| None)),
        }
    }

    /// Replace the provider. Later sends use it; earlier ones are unaffected.
    pub fn bind<F>(&self, provider: F)
    where
        F: Fn() -> Option<Identity> + Send + Sync + 'static,
    {
        *self.provider.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(provider);
    }

    /// Call the provider now.
    pub fn resolve(&self) -> Option<Identity> {
        let provider = Arc::clone(&self.provider.read().unwrap_or_else(PoisonError::into_inner));
        provider()
    }
}

impl Default for IdentitySlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults_to_absent() {
        assert_eq!(IdentitySlot::new().resolve(), None);
    }

    #[test]
    fn test_provider_is_called_on_every_resolve() {
        let slot = IdentitySlot::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        slot.bind(move || {
            let n = c.fetch_add(1, Ordering::SeqCst) as i64;
            Some(Identity::from(n))
        });

        assert_eq!(slot.resolve(), Some(Identity::Number(0.0)));
        assert_eq!(slot.resolve(), Some(Identity::Number(1.0)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Identity::from("u1").to_string(), "u1");
        assert_eq!(Identity::from(42_i64).to_string(), "42");
        assert_eq!(Identity::from(1.5).to_string(), "1.5");
    }
}
