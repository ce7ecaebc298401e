// ── Unified catalog model ──
//
// Canonical shapes every provider maps into. Items are built once by a
// provider's conversion step and only enrichment or merging touch them
// afterwards.

pub mod channel;
pub mod item;
pub mod listing;
pub mod media;
pub mod tag;

// ── Re-exports ──────────────────────────────────────────────────────

pub use channel::{Channel, ChannelRef, LiveStatus};
pub use item::{Item, Page};
pub use listing::{ClipPeriod, ListingFilter, ListingKind, VideoSort};
pub use media::{Clip, GameRef, Stream, Video, VideoKind};
pub use tag::{Tag, TagCatalog};
