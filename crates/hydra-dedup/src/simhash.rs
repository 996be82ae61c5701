//! Text normalization and the 64-bit SimHash fingerprint construction.

use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("valid regex"));
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("valid regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Covers the common emoji/pictograph/symbol ranges. Not exhaustive of every
/// Unicode emoji codepoint, but enough to detect "emoji-only residue".
static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\u{1F300}-\u{1FAFF}\u{2600}-\u{27BF}\u{1F1E6}-\u{1F1FF}\u{2190}-\u{21FF}\u{2B00}-\u{2BFF}\u{FE0F}]",
    )
    .expect("valid regex")
});

/// Lowercase, collapse whitespace, strip URLs and `@mentions`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_urls = URL_RE.replace_all(&lowered, " ");
    let no_mentions = MENTION_RE.replace_all(&no_urls, " ");
    WHITESPACE_RE.replace_all(&no_mentions, " ").trim().to_string()
}

/// Character count of `text` once emoji codepoints are removed. Used by the
/// "emoji-only residue" edge case.
pub fn emoji_stripped_len(text: &str) -> usize {
    EMOJI_RE.replace_all(text, "").chars().count()
}

/// Tokenize normalized text. CJK characters (no word-boundary whitespace)
/// are emitted one-per-token; Latin/digit runs are emitted as whole words.
pub fn tokenize(normalized: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for ch in normalized.chars() {
        if ch.is_whitespace() {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            continue;
        }
        if is_cjk(ch) {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            tokens.push(ch.to_string());
        } else if ch.is_alphanumeric() {
            word.push(ch);
        } else if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

fn is_cjk(ch: char) -> bool {
    let c = ch as u32;
    (0x4E00..=0x9FFF).contains(&c) // CJK Unified Ideographs
        || (0x3400..=0x4DBF).contains(&c) // CJK Extension A
        || (0x3040..=0x30FF).contains(&c) // Hiragana/Katakana
}

/// unigrams + 2-grams + 3-grams over the token stream, each gram joined with
/// a single space so adjacent-but-distinct tokens hash differently than a
/// concatenated run.
pub fn ngrams(tokens: &[String]) -> Vec<String> {
    let mut grams = Vec::with_capacity(tokens.len() * 3);
    for w in tokens {
        grams.push(w.clone());
    }
    for pair in tokens.windows(2) {
        grams.push(format!("{} {}", pair[0], pair[1]));
    }
    for triple in tokens.windows(3) {
        grams.push(format!("{} {} {}", triple[0], triple[1], triple[2]));
    }
    grams
}

/// MD5 of `token`, truncated to the first 8 bytes and read as a big-endian u64.
pub fn md5_u64(token: &str) -> u64 {
    let digest = Md5::digest(token.as_bytes());
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[0..8]);
    u64::from_be_bytes(buf)
}

/// Hex MD5 of `text`, used as the exact-match fast path.
pub fn exact_hash(text: &str) -> String {
    hex::encode(Md5::digest(text.as_bytes()))
}

/// Compute the 64-bit SimHash fingerprint of `text`.
///
/// Identical inputs always produce identical fingerprints.
pub fn simhash(text: &str) -> u64 {
    let normalized = normalize(text);
    let tokens = tokenize(&normalized);
    let grams = ngrams(&tokens);

    let mut acc = [0i64; 64];
    for gram in &grams {
        let h = md5_u64(gram);
        for (i, slot) in acc.iter_mut().enumerate() {
            if (h >> i) & 1 == 1 {
                *slot += 1;
            } else {
                *slot -= 1;
            }
        }
    }

    let mut fingerprint: u64 = 0;
    for (i, &v) in acc.iter().enumerate() {
        if v > 0 {
            fingerprint |= 1 << i;
        }
    }
    fingerprint
}

/// Hamming distance between two fingerprints (number of differing bits).
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Similarity in `[0, 1]`, `1 - distance/64`.
pub fn similarity(a: u64, b: u64) -> f64 {
    1.0 - (hamming_distance(a, b) as f64 / 64.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_produce_identical_fingerprints() {
        let a = simhash("BTC breaks 100k on spot volume surge");
        let b = simhash("BTC breaks 100k on spot volume surge");
        assert_eq!(a, b);
    }

    #[test]
    fn similar_texts_have_high_similarity() {
        let a = simhash("BTC breaks 100k on spot volume surge, huge day for bulls");
        let b = simhash("BTC breaks 100k on spot volume surge, a huge day for the bulls");
        assert!(similarity(a, b) > 0.8, "similarity too low: {}", similarity(a, b));
    }

    #[test]
    fn unrelated_texts_have_lower_similarity() {
        let a = simhash("BTC breaks 100k on spot volume surge");
        let b = simhash("Good morning everyone, hope you have a wonderful day at the park");
        assert!(similarity(a, b) < 0.8);
    }

    #[test]
    fn similarity_matches_hamming_formula() {
        let a: u64 = 0;
        let b: u64 = 0b1111;
        assert_eq!(hamming_distance(a, b), 4);
        assert!((similarity(a, b) - (1.0 - 4.0 / 64.0)).abs() < 1e-9);
    }

    #[test]
    fn normalize_strips_urls_and_mentions_and_case() {
        let n = normalize("Check THIS https://example.com/x now @trader123!");
        assert!(!n.contains("http"));
        assert!(!n.contains('@'));
        assert_eq!(n, n.to_lowercase());
    }

    #[test]
    fn emoji_only_text_has_short_residue() {
        let text = "😀😀😀😀😀😀😀😀😀😀😀😀😀😀😀😀😀😀😀😀😀";
        assert!(text.chars().count() >= 20);
        assert!(emoji_stripped_len(text) < 10);
    }

    #[test]
    fn tokenize_splits_cjk_per_character_and_latin_as_words() {
        let tokens = tokenize("btc 突破 100k");
        assert!(tokens.contains(&"btc".to_string()));
        assert!(tokens.contains(&"突".to_string()));
        assert!(tokens.contains(&"破".to_string()));
        assert!(tokens.contains(&"100k".to_string()));
    }
}
