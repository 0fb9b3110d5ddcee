use crate::analysis::AnalyzedToken;
use xxhash_rust::xxh3::Xxh3;

/// A window of consecutive tokens, reduced to its fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shingle {
    pub fingerprint: u64,
    /// Index of the first token in the chunk the shingle was built from.
    pub start: usize,
}

/// Fixed 64-bit hash over the ordered token bytes.
///
/// Each token is length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn fingerprint(tokens: &[AnalyzedToken]) -> u64 {
    let mut hasher = Xxh3::new();
    for token in tokens {
        hasher.update(&(token.term.len() as u32).to_le_bytes());
        hasher.update(&token.term);
    }
    hasher.digest()
}

/// Sliding shingles of `size` tokens over one chunk, step 1.
///
/// A window never spans a position jump larger than `1 + gap_tolerance`;
/// such a jump starts a new run.
pub fn shingles(tokens: &[AnalyzedToken], size: usize, gap_tolerance: usize) -> Vec<Shingle> {
    let mut out = Vec::new();
    if size == 0 || tokens.len() < size {
        return out;
    }

    let max_step = 1 + gap_tolerance;
    let mut run_start = 0;
    for i in 0..tokens.len() {
        if i > 0 && tokens[i].position.saturating_sub(tokens[i - 1].position) > max_step {
            run_start = i;
        }
        if i + 1 - run_start >= size {
            let start = i + 1 - size;
            out.push(Shingle {
                fingerprint: fingerprint(&tokens[start..=i]),
                start,
            });
        }
    }
    out
}
