use std::collections::HashSet;

use icu_normalizer::ComposingNormalizerBorrowed;

/// Lowercase, keep letters/digits/whitespace, collapse runs of whitespace.
/// Underscore counts as punctuation here.
fn normalize(text: &str) -> String {
    let nfc = ComposingNormalizerBorrowed::new_nfc();
    let composed = nfc.normalize(text);
    let kept: String = composed
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Percentage of target words that show up anywhere in the input.
///
/// Target words are counted with repetition, input words are a set, and
/// order is ignored. This is a presence check, not an alignment.
pub fn match_score(target: &str, input: &str) -> u8 {
    if target.is_empty() || input.is_empty() {
        return 0;
    }

    let target = normalize(target);
    let input = normalize(input);
    let target_words: Vec<&str> = target.split(' ').filter(|w| !w.is_empty()).collect();
    if target_words.is_empty() {
        return 0;
    }
    let input_words: HashSet<&str> = input.split(' ').filter(|w| !w.is_empty()).collect();

    let matched = target_words
        .iter()
        .filter(|w| input_words.contains(*w))
        .count();
    percent(matched, target_words.len())
}

/// Keystroke efficiency: target length over keystrokes spent, as a percent.
/// A run with no rejected keystrokes scores 100.
pub fn efficiency_score(target_len: usize, keystrokes: u32) -> u8 {
    if keystrokes == 0 {
        return 0;
    }
    percent(target_len, keystrokes as usize)
}

/// Rounded words per minute, or `None` when no time has passed.
pub fn words_per_minute(words: usize, elapsed_ms: i64) -> Option<u32> {
    if elapsed_ms <= 0 {
        return None;
    }
    let minutes = elapsed_ms as f64 / 60_000.0;
    Some((words as f64 / minutes).round().min(u32::MAX as f64) as u32)
}

fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_score_partial_overlap() {
        assert_eq!(match_score("the quick brown fox", "quick fox jumped"), 50);
    }

    #[test]
    fn test_match_score_ignores_case_and_punctuation() {
        assert_eq!(
            match_score("Red leather, yellow leather.", "red LEATHER yellow leather"),
            100
        );
    }

    #[test]
    fn test_match_score_ignores_order() {
        assert_eq!(match_score("one two three", "three two one"), 100);
    }

    #[test]
    fn test_match_score_counts_target_repetition() {
        // "leather" appears twice in the target; one mention in input covers both
        assert_eq!(match_score("red leather yellow leather", "leather"), 50);
    }

    #[test]
    fn test_match_score_empty_inputs() {
        assert_eq!(match_score("", "anything"), 0);
        assert_eq!(match_score("anything", ""), 0);
    }

    #[test]
    fn test_match_score_punctuation_only_target() {
        assert_eq!(match_score("?!...", "?!..."), 0);
    }

    #[test]
    fn test_match_score_underscore_is_stripped() {
        assert_eq!(match_score("snake_case", "snakecase"), 100);
    }

    #[test]
    fn test_match_score_composed_and_decomposed_agree() {
        assert_eq!(match_score("caf\u{e9}", "cafe\u{301}"), 100);
    }

    #[test]
    fn test_match_score_bounded() {
        let s = match_score("a a a", "a b c d e f");
        assert_eq!(s, 100);
    }

    #[test]
    fn test_efficiency_perfect_run() {
        assert_eq!(efficiency_score(3, 3), 100);
    }

    #[test]
    fn test_efficiency_one_rejected_key() {
        assert_eq!(efficiency_score(3, 4), 75);
    }

    #[test]
    fn test_efficiency_clamped() {
        assert_eq!(efficiency_score(10, 2), 100);
        assert_eq!(efficiency_score(3, 0), 0);
        assert_eq!(efficiency_score(1, 1000), 0);
    }

    #[test]
    fn test_words_per_minute() {
        assert_eq!(words_per_minute(10, 60_000), Some(10));
        assert_eq!(words_per_minute(3, 200), Some(900));
        assert_eq!(words_per_minute(3, 0), None);
    }
}
