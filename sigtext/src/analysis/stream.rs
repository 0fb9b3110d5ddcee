use tantivy::tokenizer::{TextAnalyzer, Token, TokenStream};

/// A normalized term with the position the analyzer assigned to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedToken {
    pub term: Vec<u8>,
    pub position: usize,
}

impl AnalyzedToken {
    pub fn new(term: impl Into<Vec<u8>>, position: usize) -> Self {
        Self {
            term: term.into(),
            position,
        }
    }
}

/// Re-analyzes one textual value at a time.
///
/// Holds no cross-document state; `analyze_into` reuses the caller's buffer.
#[derive(Clone)]
pub struct TokenStreamAdapter {
    analyzer: TextAnalyzer,
}

impl TokenStreamAdapter {
    pub fn new(analyzer: TextAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Append the tokens of `text` to `out` in document order.
    ///
    /// Returns the number of tokens emitted.
    pub fn analyze_into(&mut self, text: &str, out: &mut Vec<AnalyzedToken>) -> usize {
        let before = out.len();
        let mut stream = self.analyzer.token_stream(text);
        let mut push_token = |token: &Token| {
            out.push(AnalyzedToken {
                term: token.text.as_bytes().to_vec(),
                position: token.position,
            });
        };
        stream.process(&mut push_token);
        out.len() - before
    }

    pub fn analyze(&mut self, text: &str) -> Vec<AnalyzedToken> {
        let mut tokens = Vec::new();
        self.analyze_into(text, &mut tokens);
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalyzerRegistry, DEFAULT_STOP_ANALYZER};

    fn adapter(name: &str) -> TokenStreamAdapter {
        TokenStreamAdapter::new(AnalyzerRegistry::default().resolve(name).unwrap())
    }

    fn terms(tokens: &[AnalyzedToken]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| String::from_utf8_lossy(&t.term).into_owned())
            .collect()
    }

    #[test]
    fn test_default_analyzer_lowercases_and_positions() {
        let tokens = adapter("default").analyze("Common Even separator3");
        assert_eq!(terms(&tokens), vec!["common", "even", "separator3"]);
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_stop_words_leave_position_gaps() {
        let tokens = adapter(DEFAULT_STOP_ANALYZER).analyze("the cat and the hat");
        assert_eq!(terms(&tokens), vec!["cat", "hat"]);
        assert_eq!(tokens[0].position, 1);
        assert_eq!(tokens[1].position, 4);
    }

    #[test]
    fn test_empty_and_punctuation_only_input() {
        let mut adapter = adapter("default");
        assert!(adapter.analyze("").is_empty());
        assert!(adapter.analyze("  ,;: -- ").is_empty());
    }

    #[test]
    fn test_analyze_into_appends() {
        let mut adapter = adapter("default");
        let mut buf = vec![AnalyzedToken::new("x", 0)];
        let emitted = adapter.analyze_into("foo bar", &mut buf);
        assert_eq!(emitted, 2);
        assert_eq!(terms(&buf), vec!["x", "foo", "bar"]);
    }
}
