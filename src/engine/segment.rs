use std::sync::LazyLock;

use regex::Regex;

// A run of non-terminal characters closed by terminal punctuation and an
// optional quote, or a trailing run with no terminal punctuation at all.
static SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^.!?]+[.!?]+["']?|[^.!?]+$"#).expect("sentence pattern is valid")
});

/// Split text into trimmed, non-empty sentences in source order. Text that
/// yields nothing comes back unchanged as a single sentence.
pub fn segment(text: &str) -> Vec<String> {
    let sentences: Vec<String> = SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if sentences.is_empty() {
        vec![text.to_string()]
    } else {
        sentences
    }
}

pub fn word_count(sentence: &str) -> usize {
    sentence.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_terminal_punctuation() {
        let s = segment("First one. Second one! Third one?");
        assert_eq!(s, vec!["First one.", "Second one!", "Third one?"]);
    }

    #[test]
    fn test_keeps_trailing_quote_and_repeated_marks() {
        let s = segment("He said \"stop.\" Then what?! Nothing...");
        assert_eq!(s, vec!["He said \"stop.\"", "Then what?!", "Nothing..."]);
    }

    #[test]
    fn test_trailing_fragment_without_punctuation() {
        let s = segment("Done here. and then some");
        assert_eq!(s, vec!["Done here.", "and then some"]);
    }

    #[test]
    fn test_no_punctuation_is_single_unit() {
        assert_eq!(segment("just words"), vec!["just words"]);
    }

    #[test]
    fn test_only_punctuation_returns_original() {
        assert_eq!(segment("..."), vec!["..."]);
    }

    #[test]
    fn test_whitespace_only_returns_original() {
        assert_eq!(segment("   "), vec!["   "]);
    }

    #[test]
    fn test_newlines_inside_paragraphs() {
        let s = segment("Line one\ncontinues. Next paragraph.\n\nLast.");
        assert_eq!(s, vec!["Line one\ncontinues.", "Next paragraph.", "Last."]);
    }

    #[test]
    fn test_segment_is_idempotent_over_join() {
        let samples = [
            "A. B! C?",
            "One two three. Four five six! Seven 'eight.' nine",
            "Hello world... How are you?\n\nFine!",
            "  leading space. trailing space.  ",
        ];
        for text in samples {
            let first = segment(text);
            let again = segment(&first.join(" "));
            assert_eq!(first, again, "not idempotent for {text:?}");
        }
    }

    #[test]
    fn test_word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("one  two\tthree\nfour"), 4);
        assert_eq!(word_count(""), 0);
    }
}
