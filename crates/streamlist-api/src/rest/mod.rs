// REST API client modules
//
// Typed client for the REST catalog API. Every list endpoint returns the
// `{ data: [...], pagination: { cursor } }` page shape; a missing or blank
// cursor marks the last page.

pub mod client;
pub mod types;

pub use client::{ClipQuery, RestClient, StreamQuery, VideoQuery};
pub use types::Page;
