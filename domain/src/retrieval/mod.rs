//! Retrieval domain
//!
//! Everything about retrieved evidence that does not need a retriever:
//! chunk value objects, keyword extraction, fuzzy term matching, the
//! quality gate and the query refiner.

pub mod chunk;
pub mod fuzzy;
pub mod keywords;
pub mod quality;
pub mod refine;

pub use chunk::{Metadata, MetadataFilter, MetadataValue, RetrievedChunk, SuppliedChunk};
pub use keywords::{broaden_keywords, extract_keywords, filter_tokens};
pub use quality::{QualityDecision, QualityPolicy, QualityVerdict};
pub use refine::{QueryRefiner, Refinement, RefinementStrategy};
