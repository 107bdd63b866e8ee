// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod http;
#[cfg(feature = "cli")]
pub mod terminal;

pub use http::HttpScanClient;
