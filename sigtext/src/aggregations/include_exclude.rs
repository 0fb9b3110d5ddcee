use crate::Result;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// A term filter given either as a regex or as an explicit term list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermPattern {
    /// Must match the whole term.
    Regex(String),
    Terms(Vec<String>),
}

enum Matcher {
    Regex(Regex),
    Terms(FxHashSet<Vec<u8>>),
}

impl Matcher {
    fn compile(pattern: &TermPattern) -> Result<Self> {
        Ok(match pattern {
            TermPattern::Regex(expr) => Matcher::Regex(Regex::new(&format!("^(?:{})$", expr))?),
            TermPattern::Terms(terms) => {
                Matcher::Terms(terms.iter().map(|t| t.as_bytes().to_vec()).collect())
            }
        })
    }

    fn matches(&self, term: &[u8]) -> bool {
        match self {
            Matcher::Regex(regex) => std::str::from_utf8(term)
                .map(|s| regex.is_match(s))
                .unwrap_or(false),
            Matcher::Terms(terms) => terms.contains(term),
        }
    }
}

/// Decides which candidate terms may be scored at all.
///
/// A term passes when it is non-empty, not in the exclusion list, matches
/// `include` (if set) and does not match `exclude` (if set).
#[derive(Default)]
pub struct TermFilter {
    include: Option<Matcher>,
    exclude: Option<Matcher>,
    excluded_terms: FxHashSet<Vec<u8>>,
}

impl TermFilter {
    pub fn new(
        include: Option<&TermPattern>,
        exclude: Option<&TermPattern>,
        excluded_terms: &[String],
    ) -> Result<Self> {
        Ok(Self {
            include: include.map(Matcher::compile).transpose()?,
            exclude: exclude.map(Matcher::compile).transpose()?,
            excluded_terms: excluded_terms
                .iter()
                .map(|t| t.as_bytes().to_vec())
                .collect(),
        })
    }

    pub fn accepts(&self, term: &[u8]) -> bool {
        if term.is_empty() || self.excluded_terms.contains(term) {
            return false;
        }
        if let Some(include) = &self.include {
            if !include.matches(term) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.matches(term) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_accepts_everything_but_empty() {
        let filter = TermFilter::default();
        assert!(filter.accepts(b"anything"));
        assert!(!filter.accepts(b""));
    }

    #[test]
    fn test_exclusion_list() {
        let filter = TermFilter::new(None, None, &["the".to_string()]).unwrap();
        assert!(!filter.accepts(b"the"));
        assert!(filter.accepts(b"then"));
    }

    #[test]
    fn test_regex_must_match_whole_term() {
        let include = TermPattern::Regex("sep.*".to_string());
        let filter = TermFilter::new(Some(&include), None, &[]).unwrap();
        assert!(filter.accepts(b"separator1"));
        assert!(!filter.accepts(b"oddsep"));
    }

    #[test]
    fn test_include_and_exclude_lists() {
        let include = TermPattern::Terms(vec!["a".into(), "b".into(), "c".into()]);
        let exclude = TermPattern::Regex("b|c".to_string());
        let filter = TermFilter::new(Some(&include), Some(&exclude), &[]).unwrap();
        assert!(filter.accepts(b"a"));
        assert!(!filter.accepts(b"b"));
        assert!(!filter.accepts(b"d"));
    }

    #[test]
    fn test_invalid_regex() {
        let include = TermPattern::Regex("(".to_string());
        assert!(TermFilter::new(Some(&include), None, &[]).is_err());
    }
}
