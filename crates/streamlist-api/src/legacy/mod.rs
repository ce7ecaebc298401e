// Legacy query-graph API client modules
//
// The legacy endpoint takes named operations with loosely-typed variables and
// returns `{ data, errors }` where field presence and numeric encoding vary
// between deployments. Listings carry the cursor on the last edge (or as a
// top-level `cursor`) and only sometimes a `pageInfo.hasNextPage` flag.

pub mod client;
mod listings;
pub mod models;
mod tags;

pub use client::LegacyClient;
pub use models::LegacyPage;
