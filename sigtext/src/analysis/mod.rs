//! Re-analysis of stored text
//!
//! Resolves analyzers by name (or from an index field) and turns one textual
//! value into positioned terms for the duplicate detector and accumulator.

mod registry;
mod stream;

pub use registry::{AnalyzerRegistry, DEFAULT_STOP_ANALYZER};
pub use stream::{AnalyzedToken, TokenStreamAdapter};
