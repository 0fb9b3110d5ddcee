//! Significance heuristics
//!
//! Each heuristic compares a term's foreground (subset) frequency with its
//! background (superset) frequency. Higher scores are more significant; the
//! driver drops anything that is not strictly positive.

mod heuristic;

pub use heuristic::{SignificanceHeuristic, TermFrequencies};
