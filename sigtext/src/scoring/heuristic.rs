use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Counts feeding a heuristic for one term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermFrequencies {
    /// Admitted foreground documents containing the term.
    pub subset_freq: u64,
    /// Admitted foreground documents.
    pub subset_size: u64,
    /// Background documents containing the term.
    pub superset_freq: u64,
    /// Background documents.
    pub superset_size: u64,
}

impl TermFrequencies {
    pub fn new(subset_freq: u64, subset_size: u64, superset_freq: u64, superset_size: u64) -> Self {
        Self {
            subset_freq,
            subset_size,
            superset_freq,
            superset_size,
        }
    }
}

/// Closed set of scoring formulas.
///
/// Deserializes from a bare name (`"chi_square"`) or from a single-key map
/// carrying parameters (`{"chi_square": {"include_negatives": true}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "HeuristicRepr")]
pub enum SignificanceHeuristic {
    /// Absolute change in probability times relative change.
    #[default]
    Jlh,
    MutualInformation {
        include_negatives: bool,
        background_is_superset: bool,
    },
    ChiSquare {
        include_negatives: bool,
        background_is_superset: bool,
    },
    /// Google normalized distance.
    Gnd {
        background_is_superset: bool,
    },
    PercentageScore,
}

impl SignificanceHeuristic {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jlh => "jlh",
            Self::MutualInformation { .. } => "mutual_information",
            Self::ChiSquare { .. } => "chi_square",
            Self::Gnd { .. } => "gnd",
            Self::PercentageScore => "percentage_score",
        }
    }

    /// Score one term.
    ///
    /// Fails with [`Error::EmptyBackground`] when the background holds no
    /// documents, since every ratio against it is undefined.
    pub fn score(&self, f: &TermFrequencies) -> Result<f64> {
        if f.superset_size == 0 {
            return Err(Error::EmptyBackground);
        }
        if f.subset_size == 0 {
            return Ok(0.0);
        }

        let score = match *self {
            Self::Jlh => jlh(f),
            Self::MutualInformation {
                include_negatives,
                background_is_superset,
            } => {
                let n = Contingency::new(f, background_is_superset);
                if !include_negatives && n.is_under_represented() {
                    f64::NEG_INFINITY
                } else {
                    mutual_information(&n)
                }
            }
            Self::ChiSquare {
                include_negatives,
                background_is_superset,
            } => {
                let n = Contingency::new(f, background_is_superset);
                if !include_negatives && n.is_under_represented() {
                    f64::NEG_INFINITY
                } else {
                    chi_square(&n)
                }
            }
            Self::Gnd {
                background_is_superset,
            } => gnd(f, background_is_superset),
            Self::PercentageScore => {
                if f.superset_freq == 0 {
                    0.0
                } else {
                    f.subset_freq as f64 / f.superset_freq as f64
                }
            }
        };
        Ok(score)
    }
}

impl fmt::Display for SignificanceHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignificanceHeuristic {
    type Err = Error;

    /// Resolve a heuristic by name with default parameters.
    fn from_str(name: &str) -> Result<Self> {
        match name {
            "jlh" => Ok(Self::Jlh),
            "mutual_information" => Ok(Self::MutualInformation {
                include_negatives: false,
                background_is_superset: true,
            }),
            "chi_square" => Ok(Self::ChiSquare {
                include_negatives: false,
                background_is_superset: true,
            }),
            "gnd" => Ok(Self::Gnd {
                background_is_superset: true,
            }),
            "percentage_score" | "percentage" => Ok(Self::PercentageScore),
            other => Err(Error::Config(format!("unknown scorer '{}'", other))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HeuristicRepr {
    Name(String),
    WithParams(BTreeMap<String, HeuristicParams>),
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct HeuristicParams {
    include_negatives: Option<bool>,
    background_is_superset: Option<bool>,
}

impl TryFrom<HeuristicRepr> for SignificanceHeuristic {
    type Error = Error;

    fn try_from(repr: HeuristicRepr) -> Result<Self> {
        let (name, params) = match repr {
            HeuristicRepr::Name(name) => (name, HeuristicParams::default()),
            HeuristicRepr::WithParams(map) => {
                if map.len() != 1 {
                    return Err(Error::Config(format!(
                        "scorer must name exactly one heuristic, got {}",
                        map.len()
                    )));
                }
                map.into_iter()
                    .next()
                    .ok_or_else(|| Error::Config("empty scorer".to_string()))?
            }
        };

        let mut heuristic: Self = name.parse()?;
        match &mut heuristic {
            Self::MutualInformation {
                include_negatives,
                background_is_superset,
            }
            | Self::ChiSquare {
                include_negatives,
                background_is_superset,
            } => {
                if let Some(value) = params.include_negatives {
                    *include_negatives = value;
                }
                if let Some(value) = params.background_is_superset {
                    *background_is_superset = value;
                }
            }
            Self::Gnd {
                background_is_superset,
            } => {
                if let Some(value) = params.background_is_superset {
                    *background_is_superset = value;
                }
            }
            Self::Jlh | Self::PercentageScore => {}
        }
        Ok(heuristic)
    }
}

fn jlh(f: &TermFrequencies) -> f64 {
    if f.superset_freq == 0 {
        return 0.0;
    }
    let subset_probability = f.subset_freq as f64 / f.subset_size as f64;
    let superset_probability = f.superset_freq as f64 / f.superset_size as f64;

    let absolute_change = subset_probability - superset_probability;
    if absolute_change <= 0.0 {
        return 0.0;
    }
    let relative_change = subset_probability / superset_probability;
    absolute_change * relative_change
}

/// 2x2 contingency table of term presence against foreground membership.
///
/// First index: term present (1) / absent (0); second: in foreground (1) / not (0).
struct Contingency {
    n00: f64,
    n01: f64,
    n10: f64,
    n11: f64,
    n0_: f64,
    n1_: f64,
    n_0: f64,
    n_1: f64,
    n: f64,
}

impl Contingency {
    fn new(f: &TermFrequencies, background_is_superset: bool) -> Self {
        let subset_freq = f.subset_freq as f64;
        let subset_size = f.subset_size as f64;
        let superset_freq = f.superset_freq as f64;
        let superset_size = f.superset_size as f64;

        if background_is_superset {
            // Foreground documents are part of the background; source fields that
            // differ from the indexed field can push fg above bg, so clamp.
            let n10 = (superset_freq - subset_freq).max(0.0);
            let n_0 = (superset_size - subset_size).max(0.0);
            let n00 = (n_0 - n10).max(0.0);
            let n11 = subset_freq;
            let n01 = subset_size - subset_freq;
            Self {
                n00,
                n01,
                n10,
                n11,
                n0_: n00 + n01,
                n1_: n10 + n11,
                n_0,
                n_1: subset_size,
                n: n_0 + subset_size,
            }
        } else {
            let n00 = superset_size - superset_freq;
            let n01 = subset_size - subset_freq;
            Self {
                n00,
                n01,
                n10: superset_freq,
                n11: subset_freq,
                n0_: n00 + n01,
                n1_: superset_freq + subset_freq,
                n_0: superset_size,
                n_1: subset_size,
                n: superset_size + subset_size,
            }
        }
    }

    fn is_under_represented(&self) -> bool {
        if self.n_0 == 0.0 {
            return false;
        }
        self.n11 / self.n_1 < self.n10 / self.n_0
    }
}

fn mutual_information(n: &Contingency) -> f64 {
    mi_term(n.n00, n.n0_, n.n_0, n.n)
        + mi_term(n.n01, n.n0_, n.n_1, n.n)
        + mi_term(n.n10, n.n1_, n.n_0, n.n)
        + mi_term(n.n11, n.n1_, n.n_1, n.n)
}

fn mi_term(nxy: f64, nx_: f64, n_y: f64, n: f64) -> f64 {
    let numerator = n * nxy;
    let denominator = nx_ * n_y;
    let factor = nxy / n;
    if numerator < 1e-7 || denominator < 1e-7 || factor < 1e-7 {
        return 0.0;
    }
    factor * (numerator / denominator).log2()
}

fn chi_square(n: &Contingency) -> f64 {
    let denominator =
        (n.n11 + n.n01) * (n.n11 + n.n10) * (n.n10 + n.n00) * (n.n01 + n.n00);
    if denominator == 0.0 {
        return 0.0;
    }
    let cross = n.n11 * n.n00 - n.n10 * n.n01;
    n.n * cross * cross / denominator
}

fn gnd(f: &TermFrequencies, background_is_superset: bool) -> f64 {
    let (fx, fy, fxy, n) = if background_is_superset {
        (f.superset_freq, f.subset_size, f.subset_freq, f.superset_size)
    } else {
        (
            f.superset_freq + f.subset_freq,
            f.subset_size,
            f.subset_freq,
            f.superset_size + f.subset_size,
        )
    };
    if fx == 0 || fy == 0 || fxy == 0 {
        return 0.0;
    }

    let (log_fx, log_fy, log_fxy, log_n) = (
        (fx as f64).ln(),
        (fy as f64).ln(),
        (fxy as f64).ln(),
        (n as f64).ln(),
    );
    let denominator = log_n - log_fx.min(log_fy);
    if denominator <= 0.0 {
        return 0.0;
    }
    let distance = (log_fx.max(log_fy) - log_fxy) / denominator;
    // small distance means strongly related; invert so higher is better
    (-distance).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mi() -> SignificanceHeuristic {
        "mutual_information".parse().unwrap()
    }

    fn chi() -> SignificanceHeuristic {
        "chi_square".parse().unwrap()
    }

    #[test]
    fn test_jlh_matches_formula() {
        let f = TermFrequencies::new(5, 5, 5, 10);
        let score = SignificanceHeuristic::Jlh.score(&f).unwrap();
        assert!((score - 1.0).abs() < 1e-12);

        let f = TermFrequencies::new(3, 10, 10, 1000);
        let expected = (0.3 - 0.01) * (0.3 / 0.01);
        let score = SignificanceHeuristic::Jlh.score(&f).unwrap();
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_jlh_not_over_represented_scores_zero() {
        // as common in the foreground as in the background
        let f = TermFrequencies::new(5, 5, 10, 10);
        assert_eq!(SignificanceHeuristic::Jlh.score(&f).unwrap(), 0.0);
        let f = TermFrequencies::new(1, 10, 50, 100);
        assert_eq!(SignificanceHeuristic::Jlh.score(&f).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_background_is_an_error() {
        let f = TermFrequencies::new(3, 3, 0, 0);
        for heuristic in [SignificanceHeuristic::Jlh, mi(), chi(), SignificanceHeuristic::PercentageScore] {
            assert!(matches!(heuristic.score(&f), Err(Error::EmptyBackground)));
        }
    }

    #[test]
    fn test_empty_foreground_scores_zero() {
        let f = TermFrequencies::new(0, 0, 3, 10);
        assert_eq!(SignificanceHeuristic::Jlh.score(&f).unwrap(), 0.0);
    }

    #[test]
    fn test_percentage_score() {
        let f = TermFrequencies::new(2, 10, 8, 100);
        let score = SignificanceHeuristic::PercentageScore.score(&f).unwrap();
        assert!((score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_mutual_information_prefers_over_represented() {
        let strong = mi().score(&TermFrequencies::new(9, 10, 10, 1000)).unwrap();
        let weak = mi().score(&TermFrequencies::new(2, 10, 100, 1000)).unwrap();
        assert!(strong > weak);
        assert!(strong > 0.0);
    }

    #[test]
    fn test_negatives_excluded_by_default() {
        let under = TermFrequencies::new(1, 100, 500, 1000);
        assert_eq!(mi().score(&under).unwrap(), f64::NEG_INFINITY);
        assert_eq!(chi().score(&under).unwrap(), f64::NEG_INFINITY);

        let with_negatives = SignificanceHeuristic::ChiSquare {
            include_negatives: true,
            background_is_superset: true,
        };
        assert!(with_negatives.score(&under).unwrap().is_finite());
    }

    #[test]
    fn test_chi_square_independent_term_scores_zero() {
        // same rate inside and outside the foreground
        let f = TermFrequencies::new(10, 100, 100, 1000);
        let score = chi().score(&f).unwrap();
        assert!(score.abs() < 1e-9);
    }

    #[test]
    fn test_gnd_ranks_tighter_association_higher() {
        let gnd: SignificanceHeuristic = "gnd".parse().unwrap();
        let tight = gnd.score(&TermFrequencies::new(10, 10, 10, 1000)).unwrap();
        let loose = gnd.score(&TermFrequencies::new(2, 10, 300, 1000)).unwrap();
        assert!(tight > loose);
        assert!((tight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("jlh".parse::<SignificanceHeuristic>().unwrap(), SignificanceHeuristic::Jlh);
        assert_eq!(mi().name(), "mutual_information");
        assert_eq!(SignificanceHeuristic::PercentageScore.to_string(), "percentage_score");
        assert!(matches!(
            "bm25".parse::<SignificanceHeuristic>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_foreground_exceeding_background_does_not_panic() {
        let f = TermFrequencies::new(8, 10, 3, 5);
        for heuristic in [SignificanceHeuristic::Jlh, mi(), chi(), "gnd".parse().unwrap()] {
            assert!(!heuristic.score(&f).unwrap().is_nan());
        }
    }

    #[test]
    fn test_deserialize_name_or_params() {
        let parsed: SignificanceHeuristic = serde_json::from_str(r#""gnd""#).unwrap();
        assert_eq!(parsed, "gnd".parse().unwrap());

        let parsed: SignificanceHeuristic =
            serde_json::from_str(r#"{"chi_square": {"include_negatives": true}}"#).unwrap();
        assert_eq!(
            parsed,
            SignificanceHeuristic::ChiSquare {
                include_negatives: true,
                background_is_superset: true,
            }
        );

        assert!(serde_json::from_str::<SignificanceHeuristic>(r#"{"jlh": {}, "gnd": {}}"#).is_err());
        assert!(serde_json::from_str::<SignificanceHeuristic>(r#"{"gnd": {"bogus": 1}}"#).is_err());
    }
}
