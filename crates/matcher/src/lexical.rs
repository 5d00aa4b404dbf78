use rapidfuzz::distance::indel;

/// Word-order-insensitive string similarity on a 0-100 scale.
pub trait LexicalScorer: Send + Sync {
    fn token_sort_ratio(&self, a: &str, b: &str) -> f64;
}

/// Sorts whitespace tokens on both sides, then takes the normalized InDel similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortRatio;

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

impl LexicalScorer for TokenSortRatio {
    fn token_sort_ratio(&self, a: &str, b: &str) -> f64 {
        let a = sorted_tokens(a);
        let b = sorted_tokens(b);
        (indel::normalized_similarity(a.chars(), b.chars()) * 100.0).clamp(0.0, 100.0)
    }
}
