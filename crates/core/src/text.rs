//! Language-aware text measurement shared by the sentence combiner (C5) and
//! the progressive summarizer (C11).
//!
//! Resolves spec §9's open question: "character-based" source languages are
//! `{ja, zh, ko}` consistently, both for word counting and for the summary
//! threshold multiplier.

use unicode_segmentation::UnicodeSegmentation;

/// ISO-639-1 codes treated as character-based (CJK) for counting purposes.
const CHAR_BASED_LANGUAGES: &[&str] = &["ja", "zh", "ko"];

/// True if `language` should be measured in characters rather than
/// whitespace-delimited words.
pub fn is_char_based(language: &str) -> bool {
    CHAR_BASED_LANGUAGES.contains(&language)
}

/// Count "words" in `text` for `language`, per spec §4.11:
/// - character-based languages: strip whitespace/common punctuation, count
///   remaining codepoints.
/// - otherwise: split on whitespace runs, count non-empty tokens.
pub fn word_count(text: &str, language: &str) -> usize {
    if is_char_based(language) {
        text.chars()
            .filter(|c| !c.is_whitespace() && !is_common_punctuation(*c))
            .count()
    } else {
        text.unicode_words().count()
    }
}

fn is_common_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | '!' | '?' | ';' | ':' | '、' | '。' | '，' | '！' | '？' | '「' | '」' | '"' | '\''
    )
}

/// Strong sentence terminators (spec §4.5 rule 1), Latin + CJK.
const STRONG_TERMINATORS: &[char] = &['.', '!', '?', '。', '．', '！', '？'];
const CLOSERS: &[char] = &['"', '\'', ')', '\u{2019}', '\u{201d}', '」'];

/// True if `text` ends with a strong sentence terminator, optionally
/// followed by a closing quote/paren.
pub fn ends_with_strong_terminator(text: &str) -> bool {
    let trimmed = text.trim_end();
    let mut chars = trimmed.chars().rev();
    let Some(mut c) = chars.next() else {
        return false;
    };
    while CLOSERS.contains(&c) {
        match chars.next() {
            Some(next) => c = next,
            None => return false,
        }
    }
    STRONG_TERMINATORS.contains(&c)
}

/// Incomplete-end heuristic (spec §4.5): trailing conjunctions/particles that
/// suppress rule 1 even when the text happens to contain a terminator
/// earlier on.
const INCOMPLETE_SUFFIXES: &[&str] = &[
    ",", "、", " and", " or", " but", "は", "が", "を", "に", "で", "と", "の",
];

pub fn ends_incomplete(text: &str) -> bool {
    let trimmed = text.trim_end();
    INCOMPLETE_SUFFIXES
        .iter()
        .any(|suffix| trimmed.ends_with(suffix))
}

/// Join segment texts with a single space, trimming, as required by the
/// sentence combiner and paragraph builder's `raw_text`/`source_text` fields.
pub fn join_normalized<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse doubled punctuation and trim, for `Paragraph::cleaned_text`.
pub fn clean_paragraph_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last: Option<char> = None;
    for c in raw.trim().chars() {
        let doubled_punct = matches!(c, '.' | ',' | '!' | '?') && last == Some(c);
        if !doubled_punct {
            out.push(c);
        }
        last = Some(c);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_english_words() {
        assert_eq!(word_count("Hello everyone, welcome.", "en"), 3);
    }

    #[test]
    fn counts_japanese_characters() {
        let text = "a".repeat(0); // placeholder to keep rustfmt happy
        let _ = text;
        assert_eq!(word_count("こんにちは", "ja"), 5);
        assert_eq!(word_count("こんにちは。", "ja"), 5);
    }

    #[test]
    fn detects_strong_terminator() {
        assert!(ends_with_strong_terminator("welcome to the lecture."));
        assert!(ends_with_strong_terminator("is that so?\""));
        assert!(!ends_with_strong_terminator("and then,"));
    }

    #[test]
    fn detects_incomplete_end() {
        assert!(ends_incomplete("hello there,"));
        assert!(ends_incomplete("this is は"));
        assert!(!ends_incomplete("this is complete."));
    }

    #[test]
    fn joins_and_cleans() {
        assert_eq!(join_normalized(["Hello", " world. "]), "Hello world.");
        assert_eq!(clean_paragraph_text("Hi..  there!!  now"), "Hi. there! now");
    }
}
