//! Background document frequencies
//!
//! The background is the corpus foreground frequencies are compared against.
//! Sources are shared read-only across buckets, hence `Send + Sync`.

use crate::analysis::TokenStreamAdapter;
use crate::Result;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tantivy::schema::Field;
use tantivy::{Searcher, Term};

pub trait BackgroundFrequencies: Send + Sync {
    /// Background documents containing `term` at least once.
    fn doc_frequency(&self, term: &[u8]) -> Result<u64>;

    /// Total background documents.
    fn corpus_size(&self) -> Result<u64>;
}

impl<T: BackgroundFrequencies + ?Sized> BackgroundFrequencies for &T {
    fn doc_frequency(&self, term: &[u8]) -> Result<u64> {
        (**self).doc_frequency(term)
    }

    fn corpus_size(&self) -> Result<u64> {
        (**self).corpus_size()
    }
}

impl<T: BackgroundFrequencies + ?Sized> BackgroundFrequencies for Arc<T> {
    fn doc_frequency(&self, term: &[u8]) -> Result<u64> {
        (**self).doc_frequency(term)
    }

    fn corpus_size(&self) -> Result<u64> {
        (**self).corpus_size()
    }
}

/// Frequencies read from an indexed field of a tantivy index
#[derive(Clone)]
pub struct IndexBackground {
    searcher: Searcher,
    field: Field,
}

impl IndexBackground {
    pub fn new(searcher: Searcher, field: Field) -> Self {
        Self { searcher, field }
    }

    pub fn for_field_name(searcher: Searcher, field_name: &str) -> Result<Self> {
        let field = searcher.schema().get_field(field_name)?;
        Ok(Self::new(searcher, field))
    }
}

impl BackgroundFrequencies for IndexBackground {
    fn doc_frequency(&self, term: &[u8]) -> Result<u64> {
        // text fields only hold UTF-8 terms
        let Ok(text) = std::str::from_utf8(term) else {
            return Ok(0);
        };
        Ok(self
            .searcher
            .doc_freq(&Term::from_field_text(self.field, text))?)
    }

    fn corpus_size(&self) -> Result<u64> {
        Ok(self.searcher.num_docs())
    }
}

/// Frequencies held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackground {
    corpus_size: u64,
    doc_freqs: FxHashMap<Vec<u8>, u64>,
}

impl InMemoryBackground {
    pub fn new(corpus_size: u64) -> Self {
        Self {
            corpus_size,
            doc_freqs: FxHashMap::default(),
        }
    }

    pub fn with_term(mut self, term: impl Into<Vec<u8>>, doc_freq: u64) -> Self {
        self.doc_freqs.insert(term.into(), doc_freq);
        self
    }

    /// Analyze each text as one background document.
    pub fn from_texts<'a, I>(adapter: &mut TokenStreamAdapter, texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut background = Self::default();
        for text in texts {
            let terms: FxHashSet<Vec<u8>> =
                adapter.analyze(text).into_iter().map(|t| t.term).collect();
            background.add_document(terms);
        }
        background
    }

    pub fn add_document(&mut self, distinct_terms: FxHashSet<Vec<u8>>) {
        self.corpus_size += 1;
        for term in distinct_terms {
            *self.doc_freqs.entry(term).or_insert(0) += 1;
        }
    }
}

impl BackgroundFrequencies for InMemoryBackground {
    fn doc_frequency(&self, term: &[u8]) -> Result<u64> {
        Ok(self.doc_freqs.get(term).copied().unwrap_or(0))
    }

    fn corpus_size(&self) -> Result<u64> {
        Ok(self.corpus_size)
    }
}

/// Memoizes lookups so every bucket sees one consistent answer per term.
pub struct CachedBackground<B> {
    inner: B,
    corpus_size: RwLock<Option<u64>>,
    doc_freqs: RwLock<FxHashMap<Vec<u8>, u64>>,
}

impl<B: BackgroundFrequencies> CachedBackground<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            corpus_size: RwLock::new(None),
            doc_freqs: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn cached_terms(&self) -> usize {
        self.doc_freqs.read().len()
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: BackgroundFrequencies> BackgroundFrequencies for CachedBackground<B> {
    fn doc_frequency(&self, term: &[u8]) -> Result<u64> {
        if let Some(freq) = self.doc_freqs.read().get(term) {
            return Ok(*freq);
        }
        let freq = self.inner.doc_frequency(term)?;
        // first writer wins so concurrent readers agree
        Ok(*self.doc_freqs.write().entry(term.to_vec()).or_insert(freq))
    }

    fn corpus_size(&self) -> Result<u64> {
        if let Some(size) = *self.corpus_size.read() {
            return Ok(size);
        }
        let size = self.inner.corpus_size()?;
        Ok(*self.corpus_size.write().get_or_insert(size))
    }
}
