// streamlist-api: Async clients for the three catalog backends (REST, Graph, Legacy)

pub mod defaults;
pub mod error;
pub mod graph;
pub mod legacy;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use graph::GraphClient;
pub use legacy::LegacyClient;
pub use rest::RestClient;
pub use transport::{TlsMode, TransportConfig};
