use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\w+").unwrap())
}

/// Splits document text into lowercase words, keyed by word, with the word
/// offsets at which each occurs.
///
/// Offsets count every word in the text, so two words are adjacent in the
/// document exactly when their offsets differ by one.
pub fn tokenize_positions(text: &str) -> BTreeMap<String, Vec<u32>> {
    let mut positions: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for (offset, word) in word_regex().find_iter(&text.to_lowercase()).enumerate() {
        positions
            .entry(word.as_str().to_string())
            .or_default()
            .push(offset as u32);
    }
    positions
}
