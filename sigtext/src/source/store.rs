use super::{JsonSource, StoredSource};
use crate::{Error, Result};
use tantivy::schema::{Field, Value};
use tantivy::{DocAddress, Searcher, TantivyDocument};

/// Fetches the stored source of a foreground document.
///
/// `Ok(None)` means the document exists but carries no source; `Err` is a
/// retrieval failure the driver skips and counts.
pub trait SourceStore {
    type Id;
    type Source: StoredSource;

    fn fetch(&self, id: &Self::Id) -> Result<Option<Self::Source>>;
}

/// Raw JSON blobs addressed by insertion order
#[derive(Debug, Default, Clone)]
pub struct MemorySourceStore {
    blobs: Vec<Option<Vec<u8>>>,
}

impl MemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document and return its id.
    pub fn push(&mut self, source: &serde_json::Value) -> usize {
        self.push_raw(source.to_string().into_bytes())
    }

    pub fn push_raw(&mut self, blob: impl Into<Vec<u8>>) -> usize {
        self.blobs.push(Some(blob.into()));
        self.blobs.len() - 1
    }

    /// Store a document without a source payload.
    pub fn push_missing(&mut self) -> usize {
        self.blobs.push(None);
        self.blobs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn ids(&self) -> std::ops::Range<usize> {
        0..self.blobs.len()
    }
}

impl SourceStore for MemorySourceStore {
    type Id = usize;
    type Source = JsonSource;

    fn fetch(&self, id: &usize) -> Result<Option<JsonSource>> {
        match self.blobs.get(*id) {
            None => Err(Error::SourceRetrieval(format!("no document with id {}", id))),
            Some(None) => Ok(None),
            Some(Some(blob)) => JsonSource::from_slice(blob).map(Some),
        }
    }
}

/// Source stored as JSON text (or bytes) in a tantivy stored field
#[derive(Clone)]
pub struct IndexSourceStore {
    searcher: Searcher,
    field: Field,
}

impl IndexSourceStore {
    pub fn new(searcher: Searcher, field: Field) -> Self {
        Self { searcher, field }
    }

    pub fn for_field_name(searcher: Searcher, field_name: &str) -> Result<Self> {
        let field = searcher.schema().get_field(field_name)?;
        Ok(Self::new(searcher, field))
    }
}

impl SourceStore for IndexSourceStore {
    type Id = DocAddress;
    type Source = JsonSource;

    fn fetch(&self, address: &DocAddress) -> Result<Option<JsonSource>> {
        let doc: TantivyDocument = self.searcher.doc(*address)?;
        let Some(value) = doc.get_first(self.field) else {
            return Ok(None);
        };
        if let Some(text) = value.as_str() {
            return JsonSource::parse(text).map(Some);
        }
        if let Some(bytes) = value.as_bytes() {
            return JsonSource::from_slice(bytes).map(Some);
        }
        Err(Error::SourceRetrieval(format!(
            "stored source of {:?} is neither text nor bytes",
            address
        )))
    }
}
