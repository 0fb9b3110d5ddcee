use crate::{Error, Result};
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer,
    TokenizerManager,
};
use tantivy::Index;

/// Analyzer name for the English stop-word variant of `default`
pub const DEFAULT_STOP_ANALYZER: &str = "default_stop";

/// Named analyzers shared by every bucket.
///
/// Lookups clone the analyzer, so each bucket gets its own token stream state
/// while the registry itself stays safe for concurrent reads.
#[derive(Clone)]
pub struct AnalyzerRegistry {
    manager: TokenizerManager,
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        let manager = TokenizerManager::default();
        if let Some(analyzer) = default_stop_analyzer() {
            manager.register(DEFAULT_STOP_ANALYZER, analyzer);
        }
        Self { manager }
    }
}

impl AnalyzerRegistry {
    /// Use the analyzers registered on an existing index.
    pub fn from_index(index: &Index) -> Self {
        Self {
            manager: index.tokenizers().clone(),
        }
    }

    pub fn register(&self, name: &str, analyzer: impl Into<TextAnalyzer>) {
        self.manager.register(name, analyzer.into());
    }

    pub fn resolve(&self, name: &str) -> Result<TextAnalyzer> {
        self.manager
            .get(name)
            .ok_or_else(|| Error::AnalyzerUnavailable(name.to_string()))
    }

    /// Resolve the analyzer the index applies to `field_name`.
    pub fn resolve_for_field(index: &Index, field_name: &str) -> Result<TextAnalyzer> {
        let field = index
            .schema()
            .get_field(field_name)
            .map_err(|_| Error::AnalyzerUnavailable(format!("unknown field '{}'", field_name)))?;
        index
            .tokenizer_for_field(field)
            .map_err(|e| Error::AnalyzerUnavailable(format!("{}: {}", field_name, e)))
    }
}

/// Same pipeline as tantivy's `default` analyzer plus English stop words.
///
/// Stop words leave position gaps, which the shingle builder tolerates.
fn default_stop_analyzer() -> Option<TextAnalyzer> {
    let stop_words = StopWordFilter::new(Language::English)?;
    Some(
        TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(40))
            .filter(LowerCaser)
            .filter(stop_words)
            .build(),
    )
}
