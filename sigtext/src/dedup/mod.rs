//! Near-duplicate suppression keyed on token shingles
//!
//! A candidate document is rejected outright when too many of its shingles
//! were already admitted; otherwise it is admitted, minus the tokens covered
//! by shingles the bucket has seen before.

mod detector;
mod shingle;

pub use detector::{Admission, DedupSettings, DuplicateDetector, Verdict};
pub use shingle::{fingerprint, shingles, Shingle};
