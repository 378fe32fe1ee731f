//! Procurement requirement review: field extraction, directivity risk
//! detection and completeness scoring over category rule data.

pub mod extract;
pub mod model;
pub mod review;
pub mod risk;
pub mod rules;
pub mod util;

pub use extract::FieldExtractor;
pub use model::{ComplianceReport, ReviewReport};
pub use review::Reviewer;
pub use risk::RiskDetector;
pub use rules::{BundledProvider, DirectoryProvider, RuleEngine, SchemaProvider};
