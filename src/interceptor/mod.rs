//! Interceptors: one per category of page event.
//!
//! Each interceptor hooks into the page once, at tracker installation, and
//! forwards a [`Payload`](crate::record::Payload) to the envelope builder
//! whenever its event fires. None of them change what the page observes.

pub mod ajax;
pub mod dom;
pub mod error;
pub mod hash;
pub mod history;

use crate::envelope::EnvelopeBuilder;
use crate::page::Page;
use std::fmt;
use std::sync::Arc;

/// Attribute whose value identifies a clickable element in `dom.click` records.
pub const TRACKER_ATTRIBUTE: &str = "data-tracker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterceptorKind {
    History,
    Hash,
    Dom,
    JsError,
    Ajax,
}

impl InterceptorKind {
    /// Installation order.
    pub const ALL: [InterceptorKind; 5] = [
        InterceptorKind::Hash,
        InterceptorKind::History,
        InterceptorKind::Dom,
        InterceptorKind::JsError,
        InterceptorKind::Ajax,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InterceptorKind::History => "history",
            InterceptorKind::Hash => "hash",
            InterceptorKind::Dom => "dom",
            InterceptorKind::JsError => "error",
            InterceptorKind::Ajax => "ajax",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Hook this interceptor into `page`.
    pub(crate) fn install(self, page: &Page, envelope: &Arc<EnvelopeBuilder>) {
        match self {
            InterceptorKind::History => history::install(page, envelope),
            InterceptorKind::Hash => hash::install(page, envelope),
            InterceptorKind::Dom => dom::install(page, envelope),
            InterceptorKind::JsError => error::install(page, envelope),
            InterceptorKind::Ajax => ajax::install(page, envelope),
        }
        tracing::debug!(interceptor = self.name(), "Interceptor installed");
    }
}

impl fmt::Display for InterceptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
