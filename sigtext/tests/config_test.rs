//! Tests for loading aggregation configs

use serde_json::json;
use sigtext::aggregations::TermPattern;
use sigtext::analysis::AnalyzerRegistry;
use sigtext::{Error, SignificanceHeuristic, SignificantTextAggregator, SignificantTextConfig};

#[test]
fn test_elasticsearch_request_body() {
    let config = SignificantTextConfig::from_json(json!({
        "field": "content",
        "filter_duplicate_text": true,
        "min_doc_count": 2,
        "size": 20,
        "shard_size": 50,
        "exclude": ["the", "and"],
        "include": "[a-z]+",
        "scorer": { "chi_square": { "background_is_superset": false } }
    }))
    .unwrap();

    assert_eq!(config.effective_max_shingles(), 500);
    assert_eq!(
        config.exclude,
        Some(TermPattern::Terms(vec!["the".to_string(), "and".to_string()]))
    );
    assert_eq!(
        config.scorer,
        SignificanceHeuristic::ChiSquare {
            include_negatives: false,
            background_is_superset: false,
        }
    );

    let settings = config.dedup_settings();
    assert_eq!(settings.shingle_size, 3);
    assert_eq!(settings.max_shingles, Some(500));
}

#[test]
fn test_yaml_round_trip_through_aggregator() {
    let yaml = r#"
field: body
analyzer: default_stop
source_fields:
  - title
  - body
scorer: jlh
"#;
    let config = SignificantTextConfig::from_yaml(yaml).unwrap();
    let aggregator =
        SignificantTextAggregator::from_registry(config, &AnalyzerRegistry::default()).unwrap();

    assert_eq!(aggregator.config().effective_source_fields(), vec!["title", "body"]);
    assert_eq!(aggregator.config().scorer.name(), "jlh");
}

#[test]
fn test_invalid_config_rejected_by_aggregator() {
    let config = SignificantTextConfig::new("text").with_duplicate_thresholds(0.0, 6);
    let result = SignificantTextAggregator::from_registry(config, &AnalyzerRegistry::default());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_invalid_include_pattern() {
    let config = SignificantTextConfig::new("text")
        .with_include(TermPattern::Regex("(unclosed".to_string()));
    let result = SignificantTextAggregator::from_registry(config, &AnalyzerRegistry::default());
    assert!(matches!(result, Err(Error::Regex(_))));
}

#[test]
fn test_missing_field_rejected() {
    let result = SignificantTextConfig::from_json(json!({ "size": 3 }));
    assert!(matches!(result, Err(Error::Json(_))));
}
