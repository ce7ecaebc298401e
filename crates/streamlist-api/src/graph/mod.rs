// Typed query-graph API client modules
//
// Strongly typed client for the query-graph endpoint. Listings come back as
// connections (`edges[].cursor` + `pageInfo.hasNextPage`); the next-page flag
// is explicit and decoupled from cursor presence.

pub mod client;
mod queries;
pub mod types;

pub use client::{ClipPeriod, GraphClient, Selector, TagKind, VideoSort};
pub use types::Connection;
