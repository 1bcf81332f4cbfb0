//! STR genotyping and paternity comparison from capillary electrophoresis
//! instrument files.
//!
//! The pipeline is a chain of pure, synchronous stages over immutable
//! inputs: container bytes → per-dye traces → detected peaks → sized and
//! designated alleles → quality-assessed genotype profile → (across two or
//! three profiles) a paternity comparison. Configuration is loaded once and
//! shared read-only; batch runs fan out one worker per file.

pub use abif_format;

pub mod allele;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod genotype;
pub mod paternity;
pub mod peak;
pub mod pipeline;
pub mod quality;
pub mod sizing;
pub mod trace;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::AnalysisConfig;
pub use error::Error;
pub use genotype::GenotypeProfile;
pub use paternity::{compare, ComparisonResult, Conclusion};
pub use pipeline::Analyzer;
