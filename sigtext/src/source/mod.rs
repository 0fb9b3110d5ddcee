//! Typed access to stored source payloads
//!
//! The driver never walks a generic document tree itself; it asks a
//! [`StoredSource`] for the string values under a path and reacts to the three
//! possible answers: absent, values, or a type mismatch.

mod json;
mod store;

pub use json::JsonSource;
pub use store::{IndexSourceStore, MemorySourceStore, SourceStore};

/// Values found under one source path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValues<'a> {
    /// Path does not exist (or only holds nulls).
    Absent,
    /// One entry per string; arrays yield one entry per element.
    Values(Vec<&'a str>),
    /// Path exists but holds something other than strings.
    Mismatch { found: &'static str },
}

/// Read access to one document's stored source.
pub trait StoredSource {
    fn field_values(&self, path: &str) -> FieldValues<'_>;
}

impl<T: StoredSource + ?Sized> StoredSource for &T {
    fn field_values(&self, path: &str) -> FieldValues<'_> {
        (**self).field_values(path)
    }
}
