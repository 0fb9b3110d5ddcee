mod accumulator;
mod include_exclude;
mod significant_text;
pub mod types;

pub use accumulator::{TermAccumulator, TermSnapshot};
pub use include_exclude::{TermFilter, TermPattern};
pub use significant_text::{
    FinalizedBucket, SignificantTextAggregator, SignificantTextBucket,
};
pub use types::{
    AggregationWarning, CollectionStats, DocumentOutcome, SignificantTerm,
    SignificantTextResult,
};
