//! Significant text aggregation driver
//!
//! For every foreground document the driver pulls the stored source, re-analyzes
//! the configured paths, runs the duplicate detector and feeds admitted terms
//! into the accumulator. Finalizing freezes the counts; scoring against a
//! background is then a pure function of that snapshot.

use super::accumulator::{TermAccumulator, TermSnapshot};
use super::include_exclude::TermFilter;
use super::types::{
    AggregationWarning, CollectionStats, DocumentOutcome, SignificantTerm,
    SignificantTextResult,
};
use crate::analysis::{AnalyzedToken, AnalyzerRegistry, TokenStreamAdapter};
use crate::background::BackgroundFrequencies;
use crate::config::SignificantTextConfig;
use crate::dedup::{DuplicateDetector, Verdict};
use crate::scoring::TermFrequencies;
use crate::source::{FieldValues, SourceStore, StoredSource};
use crate::{Error, Result};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::fmt::Debug;
use tantivy::tokenizer::TextAnalyzer;
use tantivy::Index;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Validated configuration plus everything shared by its buckets.
///
/// Safe to share across worker threads; each bucket clones the analyzer.
pub struct SignificantTextAggregator {
    config: SignificantTextConfig,
    source_fields: Vec<String>,
    analyzer: TextAnalyzer,
    term_filter: TermFilter,
}

impl SignificantTextAggregator {
    pub fn new(config: SignificantTextConfig, analyzer: TextAnalyzer) -> Result<Self> {
        config.validate()?;
        let term_filter = TermFilter::new(
            config.include.as_ref(),
            config.exclude.as_ref(),
            &config.exclude_terms,
        )?;
        Ok(Self {
            source_fields: config.effective_source_fields(),
            config,
            analyzer,
            term_filter,
        })
    }

    /// Resolve `config.analyzer` (or `default`) through a registry.
    pub fn from_registry(config: SignificantTextConfig, registry: &AnalyzerRegistry) -> Result<Self> {
        let name = config.analyzer.as_deref().unwrap_or("default");
        let analyzer = registry.resolve(name)?;
        Self::new(config, analyzer)
    }

    /// Use `config.analyzer` if set, otherwise the indexed field's own analyzer.
    pub fn for_index(config: SignificantTextConfig, index: &Index) -> Result<Self> {
        let analyzer = match config.analyzer.as_deref() {
            Some(name) => AnalyzerRegistry::from_index(index).resolve(name)?,
            None => AnalyzerRegistry::resolve_for_field(index, &config.field)?,
        };
        Self::new(config, analyzer)
    }

    pub fn config(&self) -> &SignificantTextConfig {
        &self.config
    }

    /// Open a fresh bucket.
    pub fn bucket(&self) -> SignificantTextBucket<'_> {
        let detector = self
            .config
            .filter_duplicate_text
            .then(|| DuplicateDetector::new(self.config.dedup_settings()));
        SignificantTextBucket {
            aggregator: self,
            adapter: TokenStreamAdapter::new(self.analyzer.clone()),
            detector,
            accumulator: TermAccumulator::new(),
            stats: CollectionStats::default(),
            warnings: Vec::new(),
        }
    }

    /// Run one bucket over `ids` in order and score it.
    ///
    /// Cancellation is checked between documents; a cancelled bucket is
    /// discarded and reported as [`Error::Cancelled`].
    pub fn aggregate<S, B, I>(
        &self,
        ids: I,
        store: &S,
        background: &B,
        cancel: &CancellationToken,
    ) -> Result<SignificantTextResult>
    where
        S: SourceStore,
        S::Id: Debug,
        B: BackgroundFrequencies + ?Sized,
        I: IntoIterator<Item = S::Id>,
    {
        let mut bucket = self.bucket();
        for id in ids {
            if cancel.is_cancelled() {
                info!(
                    field = %self.config.field,
                    processed = bucket.stats.processed(),
                    "Significant text bucket cancelled"
                );
                return Err(Error::Cancelled);
            }
            bucket.collect_document(&id, store)?;
        }
        bucket.finalize().significant_terms(background)
    }
}

/// An open bucket: documents can be collected until `finalize`.
pub struct SignificantTextBucket<'a> {
    aggregator: &'a SignificantTextAggregator,
    adapter: TokenStreamAdapter,
    detector: Option<DuplicateDetector>,
    accumulator: TermAccumulator,
    stats: CollectionStats,
    warnings: Vec<AggregationWarning>,
}

impl<'a> SignificantTextBucket<'a> {
    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    pub fn warnings(&self) -> &[AggregationWarning] {
        &self.warnings
    }

    /// Fetch a document's source from `store` and collect it.
    ///
    /// Retrieval failures are logged and counted, never returned.
    pub fn collect_document<S>(&mut self, id: &S::Id, store: &S) -> Result<DocumentOutcome>
    where
        S: SourceStore,
        S::Id: Debug,
    {
        let outcome = match store.fetch(id) {
            Ok(Some(source)) => return self.collect_source(&source),
            Ok(None) => self.collect_chunks(Vec::new()),
            Err(e) => {
                warn!(doc = ?id, error = %e, "Skipping document: stored source unavailable");
                DocumentOutcome::RetrievalFailed
            }
        };
        self.stats.record(outcome);
        Ok(outcome)
    }

    /// Collect one document from its stored source.
    ///
    /// Fails only when a configured path holds something other than strings.
    pub fn collect_source<S: StoredSource + ?Sized>(&mut self, source: &S) -> Result<DocumentOutcome> {
        let mut chunks: Vec<Vec<AnalyzedToken>> = Vec::new();
        for path in &self.aggregator.source_fields {
            match source.field_values(path) {
                FieldValues::Absent => {}
                FieldValues::Values(values) => {
                    for value in values {
                        let mut tokens = Vec::new();
                        if self.adapter.analyze_into(value, &mut tokens) > 0 {
                            chunks.push(tokens);
                        }
                    }
                }
                FieldValues::Mismatch { found } => {
                    return Err(Error::SourceFieldTypeMismatch {
                        path: path.clone(),
                        found,
                    });
                }
            }
        }

        let outcome = self.collect_chunks(chunks);
        self.stats.record(outcome);
        Ok(outcome)
    }

    fn collect_chunks(&mut self, chunks: Vec<Vec<AnalyzedToken>>) -> DocumentOutcome {
        if chunks.is_empty() {
            if self.aggregator.config.count_empty_documents {
                self.accumulator.admit(FxHashSet::default());
            }
            return DocumentOutcome::Empty;
        }

        let Some(detector) = self.detector.as_mut() else {
            let terms: FxHashSet<Vec<u8>> = chunks
                .into_iter()
                .flatten()
                .map(|token| token.term)
                .collect();
            self.accumulator.admit(terms);
            return DocumentOutcome::Admitted;
        };

        match detector.evaluate(&chunks) {
            Verdict::Duplicate {
                overlap,
                total_shingles,
            } => {
                debug!(overlap, total_shingles, "Rejected near-duplicate document");
                DocumentOutcome::Duplicate
            }
            Verdict::Admitted(admission) => {
                if let Some(warning) = detector.commit(&admission) {
                    self.warnings.push(warning);
                }
                self.accumulator.admit(admission.terms);
                DocumentOutcome::Admitted
            }
        }
    }

    /// Close the bucket. Counts are frozen from here on.
    pub fn finalize(self) -> FinalizedBucket<'a> {
        let snapshot = self.accumulator.snapshot(self.aggregator.config.min_doc_count);
        debug!(
            field = %self.aggregator.config.field,
            admitted = snapshot.admitted(),
            candidates = snapshot.len(),
            distinct_terms = self.accumulator.distinct_terms(),
            "Finalized significant text bucket"
        );
        FinalizedBucket {
            aggregator: self.aggregator,
            snapshot,
            stats: self.stats,
            warnings: self.warnings,
        }
    }
}

/// A closed bucket, scored on demand.
pub struct FinalizedBucket<'a> {
    aggregator: &'a SignificantTextAggregator,
    snapshot: TermSnapshot,
    stats: CollectionStats,
    warnings: Vec<AggregationWarning>,
}

impl<'a> FinalizedBucket<'a> {
    pub fn snapshot(&self) -> &TermSnapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    /// Score every surviving term against `background` and keep the top `size`.
    ///
    /// Pure over the frozen snapshot: repeated calls against the same
    /// background yield identical results.
    pub fn significant_terms<B>(&self, background: &B) -> Result<SignificantTextResult>
    where
        B: BackgroundFrequencies + ?Sized,
    {
        let config = &self.aggregator.config;
        let mut warnings = self.warnings.clone();
        let foreground_size = self.snapshot.admitted();
        let background_size = background.corpus_size()?;

        if background_size == 0 {
            warn!(field = %config.field, "Background corpus is empty; no terms can be scored");
            metrics::counter!("sigtext_empty_background_total").increment(1);
            warnings.push(AggregationWarning::EmptyBackground);
            return Ok(SignificantTextResult {
                terms: Vec::new(),
                foreground_size,
                background_size,
                stats: self.stats.clone(),
                warnings,
            });
        }

        let mut terms = Vec::new();
        for (term, foreground_count) in self.snapshot.terms() {
            if !self.aggregator.term_filter.accepts(term) {
                continue;
            }
            let background_count = background.doc_frequency(term)?;
            if background_count == 0 {
                continue;
            }

            let score = config.scorer.score(&TermFrequencies::new(
                *foreground_count,
                foreground_size,
                background_count,
                background_size,
            ))?;
            if score > 0.0 && score.is_finite() {
                terms.push(SignificantTerm {
                    term: term.clone(),
                    foreground_count: *foreground_count,
                    background_count,
                    score,
                });
            }
        }

        terms.sort_by(rank);
        terms.truncate(config.size);

        info!(
            field = %config.field,
            scorer = %config.scorer,
            admitted = foreground_size,
            duplicates = self.stats.duplicates,
            retrieval_failures = self.stats.retrieval_failures,
            significant = terms.len(),
            "Significant text bucket scored"
        );

        Ok(SignificantTextResult {
            terms,
            foreground_size,
            background_size,
            stats: self.stats.clone(),
            warnings,
        })
    }
}

/// Descending score, then higher foreground count, then term bytes.
fn rank(a: &SignificantTerm, b: &SignificantTerm) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.foreground_count.cmp(&a.foreground_count))
        .then_with(|| a.term.cmp(&b.term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::InMemoryBackground;
    use crate::source::{JsonSource, MemorySourceStore};
    use serde_json::json;

    fn aggregator(config: SignificantTextConfig) -> SignificantTextAggregator {
        SignificantTextAggregator::from_registry(config, &AnalyzerRegistry::default()).unwrap()
    }

    fn term(key: &str, fg: u64, score: f64) -> SignificantTerm {
        SignificantTerm {
            term: key.as_bytes().to_vec(),
            foreground_count: fg,
            background_count: 1,
            score,
        }
    }

    #[test]
    fn test_rank_orders_by_score_then_count_then_term() {
        let mut terms = vec![
            term("b", 3, 1.0),
            term("a", 3, 1.0),
            term("c", 4, 1.0),
            term("d", 1, 2.0),
        ];
        terms.sort_by(rank);
        let keys: Vec<String> = terms.iter().map(|t| t.key().into_owned()).collect();
        assert_eq!(keys, vec!["d", "c", "a", "b"]);
    }

    #[test]
    fn test_unknown_analyzer_fails() {
        let config = SignificantTextConfig::new("text").with_analyzer("klingon");
        let result = SignificantTextAggregator::from_registry(config, &AnalyzerRegistry::default());
        assert!(matches!(result, Err(Error::AnalyzerUnavailable(_))));
    }

    #[test]
    fn test_type_mismatch_reports_path() {
        let agg = aggregator(SignificantTextConfig::new("text").with_source_fields(["title", "count"]));
        let mut bucket = agg.bucket();
        let source = JsonSource::new(json!({"title": "fine", "count": 3}));
        match bucket.collect_source(&source) {
            Err(Error::SourceFieldTypeMismatch { path, found }) => {
                assert_eq!(path, "count");
                assert_eq!(found, "number");
            }
            other => panic!("expected mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_documents_not_counted_by_default() {
        let agg = aggregator(SignificantTextConfig::new("text"));
        let mut bucket = agg.bucket();
        let outcome = bucket.collect_source(&JsonSource::new(json!({"other": "x"}))).unwrap();
        assert_eq!(outcome, DocumentOutcome::Empty);
        assert_eq!(bucket.finalize().snapshot().admitted(), 0);

        let agg = aggregator(SignificantTextConfig::new("text").with_count_empty_documents(true));
        let mut bucket = agg.bucket();
        bucket.collect_source(&JsonSource::new(json!({"text": ""}))).unwrap();
        assert_eq!(bucket.finalize().snapshot().admitted(), 1);
    }

    #[test]
    fn test_retrieval_failure_is_skipped() {
        let mut store = MemorySourceStore::new();
        let good = store.push(&json!({"text": "hello world"}));
        let broken = store.push_raw("{nope");

        let agg = aggregator(SignificantTextConfig::new("text").with_min_doc_count(1));
        let mut bucket = agg.bucket();
        assert_eq!(bucket.collect_document(&good, &store).unwrap(), DocumentOutcome::Admitted);
        assert_eq!(
            bucket.collect_document(&broken, &store).unwrap(),
            DocumentOutcome::RetrievalFailed
        );
        assert_eq!(
            bucket.collect_document(&42, &store).unwrap(),
            DocumentOutcome::RetrievalFailed
        );

        let stats = bucket.stats().clone();
        assert_eq!(stats.admitted, 1);
        assert_eq!(stats.retrieval_failures, 2);
        assert_eq!(bucket.finalize().snapshot().admitted(), 1);
    }

    #[test]
    fn test_empty_background_yields_warning() {
        let agg = aggregator(SignificantTextConfig::new("text").with_min_doc_count(1));
        let mut bucket = agg.bucket();
        for _ in 0..3 {
            bucket.collect_source(&JsonSource::new(json!({"text": "alpha beta"}))).unwrap();
        }
        let finalized = bucket.finalize();

        let background = InMemoryBackground::new(0)
            .with_term("alpha", 1)
            .with_term("beta", 1);
        let result = finalized.significant_terms(&background).unwrap();
        assert!(result.terms.is_empty());
        assert_eq!(result.warnings, vec![AggregationWarning::EmptyBackground]);
        assert_eq!(result.foreground_size, 3);
    }

    #[test]
    fn test_exclude_terms_and_unknown_background_terms() {
        let config = SignificantTextConfig::new("text")
            .with_min_doc_count(1)
            .with_exclude_terms(["alpha"]);
        let agg = aggregator(config);
        let mut bucket = agg.bucket();
        bucket
            .collect_source(&JsonSource::new(json!({"text": "alpha beta gamma"})))
            .unwrap();

        let background = InMemoryBackground::new(100)
            .with_term("alpha", 1)
            .with_term("beta", 1);
        let result = bucket.finalize().significant_terms(&background).unwrap();
        assert_eq!(result.keys(), vec!["beta"]);
    }

    #[test]
    fn test_cancelled_before_first_document() {
        let mut store = MemorySourceStore::new();
        store.push(&json!({"text": "anything"}));
        let agg = aggregator(SignificantTextConfig::new("text"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = agg.aggregate(store.ids(), &store, &InMemoryBackground::new(10), &cancel);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
