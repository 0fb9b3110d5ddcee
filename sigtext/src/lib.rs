//! Significant text aggregation
//!
//! Finds the terms that are unusually frequent in a foreground sample of
//! documents compared to a background corpus, re-analyzing stored source text
//! and optionally discounting near-duplicate passages.

pub mod aggregations;
pub mod analysis;
pub mod background;
pub mod config;
pub mod dedup;
pub mod error;
pub mod scoring;
pub mod source;

pub use aggregations::{
    AggregationWarning, FinalizedBucket, SignificantTerm, SignificantTextAggregator,
    SignificantTextBucket, SignificantTextResult,
};
pub use background::{BackgroundFrequencies, CachedBackground, InMemoryBackground, IndexBackground};
pub use config::SignificantTextConfig;
pub use error::{Error, Result};
pub use scoring::SignificanceHeuristic;
