//! Provider-abstracted paging engine for a unified media catalog.
//!
//! Listings (streams, videos, clips, channels, tags) can be served by three
//! backends with different pagination rules and capabilities. This crate
//! hides which one answered:
//!
//! - **[`Catalog`]**: builds the backend clients from a [`CatalogConfig`],
//!   derives a [`ProviderPlan`] per listing and vends [`Session`]s.
//!
//! - **[`PagingEngine`]**: walks the plan on the first load, binds to the
//!   first provider that succeeds and pages through it with a
//!   [`CursorState`]. Failures are absorbed; callers only ever see a [`Page`].
//!
//! - **[`MergeSource`]**: followed listings combine the remote account
//!   listing with locally followed channels from a [`LocalStore`].
//!
//! - **[`ProfileEnricher`]**: batched secondary profile lookups for
//!   providers whose items arrive without profile data.
//!
//! - **[`TagCache`]**: process-wide tag catalogs, written through to the store.

pub mod catalog;
pub mod config;
pub mod convert;
pub mod cursor;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod merge;
pub mod model;
pub mod plan;
pub mod provider;
pub mod store;
pub mod tags;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use catalog::{Catalog, CatalogParts, Session};
pub use config::{Account, BackendEndpoint, CatalogConfig};
pub use cursor::CursorState;
pub use engine::PagingEngine;
pub use enrich::{Enricher, ProfileEnricher, ProfileSource};
pub use error::CoreError;
pub use merge::{MergeSource, StatusMap, StatusResolver};
pub use plan::{AuthState, EligibilityContext, PlanEntry, ProviderPlan, Requirement};
pub use provider::{
    Backend, FailureClass, GraphProvider, LegacyProvider, PaginationStyle, Provider,
    ProviderFailure, ProviderPage, RestProvider,
};
pub use store::{LocalFollow, LocalStore, MemoryStore, StoreError};
pub use tags::{Fetched, TagCache};

pub use model::{
    Channel, ChannelRef, Clip, ClipPeriod, GameRef, Item, ListingFilter, ListingKind, LiveStatus,
    Page, Stream, Tag, TagCatalog, Video, VideoKind, VideoSort,
};
