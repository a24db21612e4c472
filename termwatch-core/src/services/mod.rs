// src/services/mod.rs

pub mod analyzer;
pub mod audit;
pub mod catalog_cache; // builds the shared catalog once per process
pub mod extract;       // file bytes -> RawText, one extractor per document kind
pub mod sources;       // where keyword lists come from

pub use analyzer::{Analyzer, FileVerdict};
pub use audit::Auditor;
pub use catalog_cache::CatalogCache;
