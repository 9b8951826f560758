pub mod config;
pub mod discover;
pub mod error;
pub mod parsers;
pub mod report;
pub mod schema;
pub mod slo;
pub mod weights;

pub use config::DiscoveryConfig;
pub use discover::DiscoveryEngine;
pub use error::CoreError;
pub use parsers::DocumentFormat;
pub use report::{DiscoveryReport, ReportFormat};
pub use schema::{SchemaContext, schema_to_stub};
pub use slo::{SloBaseline, SloProber};
pub use weights::{assign_weights, weigh_result};
