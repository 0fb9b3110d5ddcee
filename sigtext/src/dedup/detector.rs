use super::shingle::shingles;
use crate::aggregations::AggregationWarning;
use crate::analysis::AnalyzedToken;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupSettings {
    pub shingle_size: usize,
    /// Reject when more than this fraction of a candidate's shingles were seen.
    pub duplicate_fraction: f64,
    /// Reject when more than this many of a candidate's shingles were seen.
    pub duplicate_absolute: usize,
    pub position_gap_tolerance: usize,
    /// Distinct fingerprints kept before filtering is switched off.
    pub max_shingles: Option<usize>,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            shingle_size: 3,
            duplicate_fraction: 0.6,
            duplicate_absolute: 6,
            position_gap_tolerance: 2,
            max_shingles: None,
        }
    }
}

/// An admitted candidate, ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// Distinct terms not covered by an already-seen shingle.
    pub terms: FxHashSet<Vec<u8>>,
    pub overlap: usize,
    pub total_shingles: usize,
    fingerprints: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Admitted(Admission),
    Duplicate { overlap: usize, total_shingles: usize },
}

impl Verdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Verdict::Admitted(_))
    }
}

/// Per-bucket shingle memory.
///
/// `evaluate` only reads the shingle set, so a verdict for document `i`
/// depends solely on the documents committed before it.
#[derive(Debug)]
pub struct DuplicateDetector {
    settings: DedupSettings,
    seen: FxHashSet<u64>,
    saturated: bool,
    committed: u64,
}

impl DuplicateDetector {
    pub fn new(settings: DedupSettings) -> Self {
        Self {
            settings,
            seen: FxHashSet::default(),
            saturated: false,
            committed: 0,
        }
    }

    pub fn settings(&self) -> &DedupSettings {
        &self.settings
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    pub fn shingle_count(&self) -> usize {
        self.seen.len()
    }

    /// Classify a candidate given as one token chunk per source value.
    ///
    /// Shingles never cross chunk boundaries.
    pub fn evaluate(&self, chunks: &[Vec<AnalyzedToken>]) -> Verdict {
        if self.saturated {
            return Verdict::Admitted(Admission {
                terms: distinct_terms(chunks),
                overlap: 0,
                total_shingles: 0,
                fingerprints: Vec::new(),
            });
        }

        let size = self.settings.shingle_size;
        let mut fingerprints = Vec::new();
        let mut overlap = 0;
        let mut terms = FxHashSet::default();

        for chunk in chunks {
            let mut suppressed = vec![false; chunk.len()];
            for shingle in shingles(chunk, size, self.settings.position_gap_tolerance) {
                if self.seen.contains(&shingle.fingerprint) {
                    overlap += 1;
                    suppressed[shingle.start..shingle.start + size].fill(true);
                }
                fingerprints.push(shingle.fingerprint);
            }
            for (token, hidden) in chunk.iter().zip(&suppressed) {
                if !hidden {
                    terms.insert(token.term.clone());
                }
            }
        }

        let total_shingles = fingerprints.len();
        if self.is_duplicate(overlap, total_shingles) {
            return Verdict::Duplicate {
                overlap,
                total_shingles,
            };
        }

        Verdict::Admitted(Admission {
            terms,
            overlap,
            total_shingles,
            fingerprints,
        })
    }

    fn is_duplicate(&self, overlap: usize, total_shingles: usize) -> bool {
        if total_shingles == 0 {
            return false;
        }
        let fraction = overlap as f64 / total_shingles as f64;
        fraction > self.settings.duplicate_fraction || overlap > self.settings.duplicate_absolute
    }

    /// Fold an admitted candidate's shingles into the bucket.
    ///
    /// Returns a warning the first time the shingle set outgrows its cap;
    /// from then on every candidate is admitted unfiltered.
    pub fn commit(&mut self, admission: &Admission) -> Option<AggregationWarning> {
        self.committed += 1;
        if self.saturated {
            return None;
        }

        self.seen.extend(admission.fingerprints.iter().copied());

        match self.settings.max_shingles {
            Some(cap) if self.seen.len() > cap => {
                self.saturated = true;
                warn!(
                    cap,
                    shingles = self.seen.len(),
                    documents = self.committed,
                    "Shingle set saturated; duplicate filtering disabled for the rest of the bucket"
                );
                metrics::counter!("sigtext_shingle_saturation_total").increment(1);
                Some(AggregationWarning::ShingleSetSaturated {
                    cap,
                    documents_seen: self.committed,
                })
            }
            _ => None,
        }
    }
}

fn distinct_terms(chunks: &[Vec<AnalyzedToken>]) -> FxHashSet<Vec<u8>> {
    chunks
        .iter()
        .flatten()
        .map(|token| token.term.clone())
        .collect()
}
