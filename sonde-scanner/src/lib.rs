pub mod crawler;
pub mod endpoint;
pub mod error;
pub mod graphql;
pub mod probe;

pub use crawler::Crawler;
pub use endpoint::{
    AuthHint, AuthKind, Checks, CrawlStats, DiscoveryResult, Endpoint, EndpointKind, EndpointSet, Source,
};
pub use error::ScanError;
pub use graphql::introspect;
pub use probe::{Headers, HttpProbe, ProbeResponse, bearer_headers};
