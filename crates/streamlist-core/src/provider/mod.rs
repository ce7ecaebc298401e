// ── Backend providers ──
//
// One provider per backend. A provider maps a (listing, filter, token)
// request onto its client, normalizes the response into `Item`s and reports
// the continuation token and more-pages flag in the backend's own style.
// Providers are stateless and shared across sessions.

mod graph;
mod legacy;
mod rest;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::model::{Item, ListingFilter, ListingKind};

pub use graph::GraphProvider;
pub use legacy::LegacyProvider;
pub use rest::RestProvider;

/// The three catalog backends.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Rest,
    Graph,
    Legacy,
}

impl Backend {
    pub fn pagination(self) -> PaginationStyle {
        match self {
            Self::Rest => PaginationStyle::TrailingCursor,
            Self::Graph | Self::Legacy => PaginationStyle::FlaggedCursor,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// How a backend signals that more pages exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStyle {
    /// A non-blank trailing cursor is the only signal.
    TrailingCursor,
    /// An explicit flag, independent of cursor presence.
    FlaggedCursor,
}

/// One normalized provider response.
#[derive(Debug, Clone, Default)]
pub struct ProviderPage {
    pub items: Vec<Item>,
    pub next_token: Option<String>,
    pub more_pages: bool,
}

impl ProviderPage {
    /// Trailing-cursor page: more pages exactly when the token is non-blank.
    pub fn trailing(items: Vec<Item>, token: Option<String>) -> Self {
        let next_token = streamlist_api::defaults::cursor(token);
        Self {
            more_pages: next_token.is_some(),
            items,
            next_token,
        }
    }

    /// Flagged page: the flag is kept as reported.
    pub fn flagged(items: Vec<Item>, token: Option<String>, more_pages: bool) -> Self {
        Self {
            items,
            next_token: streamlist_api::defaults::cursor(token),
            more_pages,
        }
    }

    /// A complete, single-page result.
    pub fn single(items: Vec<Item>) -> Self {
        Self {
            items,
            next_token: None,
            more_pages: false,
        }
    }
}

/// Rough class of a provider failure, for logs. Every class is handled the
/// same way: the engine moves on to the next provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureClass {
    /// Timeout, connection failure or rate limit.
    Transient,
    /// Token rejected by the backend.
    AuthExpired,
    NotFound,
    #[default]
    Other,
}

impl From<&streamlist_api::Error> for FailureClass {
    fn from(err: &streamlist_api::Error) -> Self {
        if err.is_transient() {
            Self::Transient
        } else if err.is_auth_expired() {
            Self::AuthExpired
        } else if err.is_not_found() {
            Self::NotFound
        } else {
            Self::Other
        }
    }
}

/// Any failure of a provider attempt. The engine logs it and moves on.
#[derive(Debug, Error)]
#[error("{backend} provider failed: {reason}")]
pub struct ProviderFailure {
    pub backend: Backend,
    pub reason: String,
    pub class: FailureClass,
}

impl ProviderFailure {
    pub fn new(backend: Backend, reason: impl fmt::Display) -> Self {
        Self {
            backend,
            reason: reason.to_string(),
            class: FailureClass::Other,
        }
    }

    pub fn unsupported(backend: Backend, kind: ListingKind) -> Self {
        Self::new(backend, format!("{kind} is not supported"))
    }

    /// Adapter for `map_err` on client calls.
    pub fn api(backend: Backend) -> impl Fn(streamlist_api::Error) -> Self {
        move |err| Self {
            class: FailureClass::from(&err),
            ..Self::new(backend, err)
        }
    }
}

/// A listing source backed by one backend.
#[async_trait]
pub trait Provider: Send + Sync {
    fn backend(&self) -> Backend;

    /// Name used in logs.
    fn name(&self) -> &str {
        self.backend().as_str()
    }

    /// Whether this provider can serve `kind` with `filter` at all.
    fn supports(&self, kind: ListingKind, filter: &ListingFilter) -> bool;

    /// Whether pages of `kind` need a secondary enrichment pass.
    fn needs_enrichment(&self, _kind: ListingKind) -> bool {
        false
    }

    /// Fetch one page. `token = None` asks for the first page.
    async fn fetch_page(
        &self,
        kind: ListingKind,
        filter: &ListingFilter,
        page_size: u32,
        token: Option<&str>,
    ) -> Result<ProviderPage, ProviderFailure>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_round_trip() {
        assert_eq!("REST".parse::<Backend>().unwrap(), Backend::Rest);
        assert_eq!(Backend::Legacy.to_string(), "legacy");
        assert_eq!(Backend::Graph.as_str(), "graph");
    }

    #[test]
    fn trailing_page_derives_flag_from_token() {
        assert!(ProviderPage::trailing(Vec::new(), Some("c".into())).more_pages);
        let blank = ProviderPage::trailing(Vec::new(), Some(" ".into()));
        assert!(!blank.more_pages);
        assert_eq!(blank.next_token, None);
    }

    #[test]
    fn api_failures_are_classified() {
        let classify = ProviderFailure::api(Backend::Rest);

        let limited = classify(streamlist_api::Error::RateLimited {
            retry_after_secs: 3,
        });
        let expired = classify(streamlist_api::Error::Authentication {
            message: "invalid oauth token".into(),
        });
        let missing = classify(streamlist_api::Error::Rest {
            status: 404,
            message: "Not Found".into(),
        });
        let invalid = classify(streamlist_api::Error::Graph {
            messages: vec!["bad".into()],
        });

        assert_eq!(limited.class, FailureClass::Transient);
        assert_eq!(expired.class, FailureClass::AuthExpired);
        assert_eq!(missing.class, FailureClass::NotFound);
        assert_eq!(invalid.class, FailureClass::Other);
        assert_eq!(limited.class.to_string(), "transient");
        assert_eq!(ProviderFailure::new(Backend::Graph, "x").class, FailureClass::Other);
    }

    #[test]
    fn flagged_page_keeps_flag_with_blank_token() {
        let page = ProviderPage::flagged(Vec::new(), Some(String::new()), true);
        assert!(page.more_pages);
        assert_eq!(page.next_token, None);
    }
}
