//! Configuration for the significant text aggregation
//!
//! Accepts Elasticsearch-style request bodies (snake_case keys) as well as the
//! camelCase option names used by the builder API.

use crate::aggregations::TermPattern;
use crate::dedup::DedupSettings;
use crate::scoring::SignificanceHeuristic;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignificantTextConfig {
    /// Indexed field the query layer and background statistics are keyed on.
    pub field: String,

    /// Stored-source paths to re-analyze. Empty means `[field]`.
    #[serde(default, alias = "sourceFieldNames", alias = "source_field_names")]
    pub source_fields: Vec<String>,

    #[serde(default, alias = "filterDuplicateText")]
    pub filter_duplicate_text: bool,

    #[serde(default = "default_min_doc_count", alias = "minDocCount")]
    pub min_doc_count: u64,

    #[serde(default = "default_size")]
    pub size: usize,

    #[serde(default, alias = "significance_heuristic")]
    pub scorer: SignificanceHeuristic,

    #[serde(default = "default_shingle_size", alias = "shingleSize")]
    pub shingle_size: usize,

    #[serde(default = "default_duplicate_fraction", alias = "duplicateFraction")]
    pub duplicate_fraction: f64,

    #[serde(default = "default_duplicate_absolute", alias = "duplicateAbsolute")]
    pub duplicate_absolute: usize,

    /// Extra position gap (e.g. removed stopwords) still treated as adjacent.
    #[serde(default = "default_position_gap_tolerance", alias = "positionGapTolerance")]
    pub position_gap_tolerance: usize,

    /// Cap on distinct shingle fingerprints. Defaults to `10 * shard_size`.
    #[serde(default, alias = "maxShingles")]
    pub max_shingles: Option<usize>,

    /// Expected foreground size handed down by the sampler.
    #[serde(default = "default_shard_size", alias = "shardSize")]
    pub shard_size: usize,

    /// Analyzer name; when absent the indexed field's analyzer is used.
    #[serde(default)]
    pub analyzer: Option<String>,

    #[serde(default, alias = "countEmptyDocuments")]
    pub count_empty_documents: bool,

    /// Terms never reported, regardless of score.
    #[serde(default, alias = "excludeTerms", alias = "stopwords")]
    pub exclude_terms: Vec<String>,

    #[serde(default)]
    pub include: Option<TermPattern>,

    #[serde(default)]
    pub exclude: Option<TermPattern>,
}

fn default_min_doc_count() -> u64 {
    3
}

fn default_size() -> usize {
    10
}

fn default_shingle_size() -> usize {
    3
}

fn default_duplicate_fraction() -> f64 {
    0.6
}

fn default_duplicate_absolute() -> usize {
    6
}

fn default_position_gap_tolerance() -> usize {
    2
}

fn default_shard_size() -> usize {
    100
}

impl SignificantTextConfig {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            source_fields: Vec::new(),
            filter_duplicate_text: false,
            min_doc_count: default_min_doc_count(),
            size: default_size(),
            scorer: SignificanceHeuristic::default(),
            shingle_size: default_shingle_size(),
            duplicate_fraction: default_duplicate_fraction(),
            duplicate_absolute: default_duplicate_absolute(),
            position_gap_tolerance: default_position_gap_tolerance(),
            max_shingles: None,
            shard_size: default_shard_size(),
            analyzer: None,
            count_empty_documents: false,
            exclude_terms: Vec::new(),
            include: None,
            exclude: None,
        }
    }

    /// Parse an Elasticsearch-style JSON aggregation body.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_source_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter_duplicate_text(mut self, enabled: bool) -> Self {
        self.filter_duplicate_text = enabled;
        self
    }

    pub fn with_min_doc_count(mut self, min_doc_count: u64) -> Self {
        self.min_doc_count = min_doc_count;
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_scorer(mut self, scorer: SignificanceHeuristic) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_shingle_size(mut self, shingle_size: usize) -> Self {
        self.shingle_size = shingle_size;
        self
    }

    pub fn with_duplicate_thresholds(mut self, fraction: f64, absolute: usize) -> Self {
        self.duplicate_fraction = fraction;
        self.duplicate_absolute = absolute;
        self
    }

    pub fn with_max_shingles(mut self, max_shingles: usize) -> Self {
        self.max_shingles = Some(max_shingles);
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn with_exclude_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include(mut self, pattern: TermPattern) -> Self {
        self.include = Some(pattern);
        self
    }

    pub fn with_exclude(mut self, pattern: TermPattern) -> Self {
        self.exclude = Some(pattern);
        self
    }

    pub fn with_count_empty_documents(mut self, enabled: bool) -> Self {
        self.count_empty_documents = enabled;
        self
    }

    /// Source paths in configuration order, falling back to the indexed field.
    pub fn effective_source_fields(&self) -> Vec<String> {
        if self.source_fields.is_empty() {
            vec![self.field.clone()]
        } else {
            self.source_fields.clone()
        }
    }

    pub fn effective_max_shingles(&self) -> usize {
        self.max_shingles
            .unwrap_or_else(|| self.shard_size.saturating_mul(10))
    }

    pub fn dedup_settings(&self) -> DedupSettings {
        DedupSettings {
            shingle_size: self.shingle_size,
            duplicate_fraction: self.duplicate_fraction,
            duplicate_absolute: self.duplicate_absolute,
            position_gap_tolerance: self.position_gap_tolerance,
            max_shingles: Some(self.effective_max_shingles()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.field.trim().is_empty() {
            return Err(Error::Config("field must not be empty".to_string()));
        }
        if self.source_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::Config(
                "source_fields must not contain empty paths".to_string(),
            ));
        }
        if self.shingle_size == 0 {
            return Err(Error::Config("shingle_size must be at least 1".to_string()));
        }
        if !(self.duplicate_fraction > 0.0 && self.duplicate_fraction <= 1.0) {
            return Err(Error::Config(format!(
                "duplicate_fraction must be in (0, 1], got {}",
                self.duplicate_fraction
            )));
        }
        if self.size == 0 {
            return Err(Error::Config("size must be at least 1".to_string()));
        }
        if self.shard_size == 0 {
            return Err(Error::Config("shard_size must be at least 1".to_string()));
        }
        Ok(())
    }
}
