use serde::{Serialize, Serializer};

/// Non-fatal conditions raised while building a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AggregationWarning {
    /// The background reported zero documents; no term could be scored.
    EmptyBackground,
    /// Duplicate filtering stopped after `documents_seen` admitted documents.
    ShingleSetSaturated { cap: usize, documents_seen: u64 },
}

/// What happened to one foreground document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    Admitted,
    Duplicate,
    /// No tokens under any configured source path.
    Empty,
    /// Stored source could not be fetched or parsed.
    RetrievalFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub admitted: u64,
    pub duplicates: u64,
    pub empty: u64,
    pub retrieval_failures: u64,
}

impl CollectionStats {
    pub fn record(&mut self, outcome: DocumentOutcome) {
        let label = match outcome {
            DocumentOutcome::Admitted => {
                self.admitted += 1;
                "admitted"
            }
            DocumentOutcome::Duplicate => {
                self.duplicates += 1;
                "duplicate"
            }
            DocumentOutcome::Empty => {
                self.empty += 1;
                "empty"
            }
            DocumentOutcome::RetrievalFailed => {
                self.retrieval_failures += 1;
                "retrieval_failure"
            }
        };
        metrics::counter!("sigtext_documents_total", "outcome" => label).increment(1);
    }

    pub fn processed(&self) -> u64 {
        self.admitted + self.duplicates + self.empty + self.retrieval_failures
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificantTerm {
    #[serde(rename = "key", serialize_with = "serialize_term")]
    pub term: Vec<u8>,
    #[serde(rename = "doc_count")]
    pub foreground_count: u64,
    #[serde(rename = "bg_count")]
    pub background_count: u64,
    pub score: f64,
}

impl SignificantTerm {
    pub fn key(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.term)
    }
}

fn serialize_term<S: Serializer>(term: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(term))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificantTextResult {
    /// Descending by score, then foreground count, then term bytes.
    #[serde(rename = "buckets")]
    pub terms: Vec<SignificantTerm>,
    /// Admitted foreground documents.
    #[serde(rename = "doc_count")]
    pub foreground_size: u64,
    #[serde(rename = "bg_count")]
    pub background_size: u64,
    pub stats: CollectionStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<AggregationWarning>,
}

impl SignificantTextResult {
    pub fn term(&self, key: &str) -> Option<&SignificantTerm> {
        self.terms.iter().find(|t| t.term == key.as_bytes())
    }

    pub fn keys(&self) -> Vec<String> {
        self.terms.iter().map(|t| t.key().into_owned()).collect()
    }

    pub fn has_warning(&self, warning: &AggregationWarning) -> bool {
        self.warnings.contains(warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_serialization() {
        let result = SignificantTextResult {
            terms: vec![SignificantTerm {
                term: b"even".to_vec(),
                foreground_count: 5,
                background_count: 5,
                score: 1.0,
            }],
            foreground_size: 5,
            background_size: 10,
            stats: CollectionStats {
                admitted: 5,
                ..Default::default()
            },
            warnings: vec![],
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["buckets"][0]["key"], json!("even"));
        assert_eq!(value["buckets"][0]["doc_count"], json!(5));
        assert_eq!(value["buckets"][0]["bg_count"], json!(5));
        assert_eq!(value["doc_count"], json!(5));
        assert!(value.get("warnings").is_none());
        assert_eq!(result.term("even").unwrap().score, 1.0);
        assert!(result.term("odd").is_none());
    }

    #[test]
    fn test_warning_serialization() {
        let warning = AggregationWarning::ShingleSetSaturated {
            cap: 10,
            documents_seen: 3,
        };
        assert_eq!(
            serde_json::to_value(&warning).unwrap(),
            json!({"type": "shingle_set_saturated", "cap": 10, "documents_seen": 3})
        );
    }

    #[test]
    fn test_stats_record() {
        let mut stats = CollectionStats::default();
        stats.record(DocumentOutcome::Admitted);
        stats.record(DocumentOutcome::Duplicate);
        stats.record(DocumentOutcome::RetrievalFailed);
        assert_eq!(stats.admitted, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.retrieval_failures, 1);
        assert_eq!(stats.processed(), 3);
    }
}
