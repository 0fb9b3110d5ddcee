use rustc_hash::{FxHashMap, FxHashSet};

/// Foreground document frequencies for one bucket
#[derive(Debug, Default)]
pub struct TermAccumulator {
    counts: FxHashMap<Vec<u8>, u64>,
    admitted: u64,
}

impl TermAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one admitted document. A set guarantees at most +1 per term.
    pub fn admit(&mut self, distinct_terms: FxHashSet<Vec<u8>>) {
        self.admitted += 1;
        for term in distinct_terms {
            *self.counts.entry(term).or_insert(0) += 1;
        }
    }

    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    pub fn distinct_terms(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, term: &[u8]) -> u64 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Immutable view of the counts, dropping terms below `min_doc_count`.
    pub fn snapshot(&self, min_doc_count: u64) -> TermSnapshot {
        let mut terms: Vec<(Vec<u8>, u64)> = self
            .counts
            .iter()
            .filter(|&(_, &count)| count >= min_doc_count)
            .map(|(term, &count)| (term.clone(), count))
            .collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        TermSnapshot {
            terms,
            admitted: self.admitted,
        }
    }
}

/// Foreground counts frozen at finalize time, ordered by term bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermSnapshot {
    terms: Vec<(Vec<u8>, u64)>,
    admitted: u64,
}

impl TermSnapshot {
    pub fn terms(&self) -> &[(Vec<u8>, u64)] {
        &self.terms
    }

    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
