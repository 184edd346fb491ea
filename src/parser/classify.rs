use std::sync::LazyLock;

use regex::Regex;

// Kanji, hiragana, katakana. Same ranges the OCR output actually contains.
static JAPANESE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[一-龯ぁ-んァ-ン]").unwrap());
// Conjugation-form and part-of-speech prefixes that open a grammar pattern.
static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(V|N|A|普通形|Nの|Vる|Vます|Vた)").unwrap());

/// Placeholder markers (plus signs, tildes) that only appear inside pattern
/// headings, never inside example sentences.
const PATTERN_MARKERS: [char; 4] = ['+', '＋', '〜', '~'];

/// Decide whether a trimmed line starts a new grammar entry.
///
/// Headings are short pattern lines like `普通形＋みたいだ`; everything else
/// (example sentences, translations, OCR noise) continues the current entry.
/// `max_chars` is the length cutoff for the short-Japanese-line rule
/// (default 60, see `ParseOptions`).
pub fn is_heading(line: &str, max_chars: usize) -> bool {
    if line.is_empty() {
        return false;
    }

    if line.contains(&PATTERN_MARKERS[..]) {
        return true;
    }

    if line.chars().count() < max_chars && JAPANESE_RE.is_match(line) {
        return true;
    }

    PREFIX_RE.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 60;

    #[test]
    fn empty_is_not_heading() {
        assert!(!is_heading("", MAX));
    }

    #[test]
    fn plus_marker() {
        assert!(is_heading("パターン＋A", MAX));
        assert!(is_heading("V-plain + ように", MAX));
    }

    #[test]
    fn tilde_marker() {
        assert!(is_heading("〜ばかりでなく", MAX));
        assert!(is_heading("~te form", MAX));
    }

    #[test]
    fn short_japanese_line() {
        assert!(is_heading("普通形 B", MAX));
        assert!(is_heading("食べる", MAX));
        assert!(is_heading("カタカナ", MAX));
    }

    #[test]
    fn long_japanese_line_is_body() {
        // An example sentence at or past the cutoff is a continuation line.
        let sentence = "これはとても長い例文です。".repeat(6);
        assert!(sentence.chars().count() >= MAX);
        assert!(!is_heading(&sentence, MAX));
    }

    #[test]
    fn conjugation_prefixes() {
        assert!(is_heading("Vた form usage", MAX));
        assert!(is_heading("Nの possessive", MAX));
        // Bare part-of-speech markers count too.
        assert!(is_heading("V dictionary form", MAX));
    }

    #[test]
    fn plain_text_is_body() {
        assert!(!is_heading("just some text", MAX));
        assert!(!is_heading("example one", MAX));
        assert!(!is_heading("--- PAGE: img_001.jpg ---", MAX));
    }

    #[test]
    fn never_panics_on_odd_unicode() {
        for s in ["\u{0}", "�", "🙂🙂🙂", "ひ", "a\u{301}"] {
            let _ = is_heading(s, MAX);
        }
    }
}
