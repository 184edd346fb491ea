use serde::{Deserialize, Serialize};

use super::classify::is_heading;
use super::ParseOptions;

/// Pattern assigned when continuation lines appear before any heading.
pub const UNKNOWN_PATTERN: &str = "UNKNOWN";

/// One classified unit of OCR output: a heading-like pattern line plus the
/// body lines that followed it. Blank strings in `lines` are separator
/// markers kept from the source; `text` is the non-blank lines joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub pattern: String,
    pub lines: Vec<String>,
    pub id: usize,
    pub text: String,
}

/// An entry being accumulated during the scan, before ids are assigned.
#[derive(Debug)]
struct Draft {
    pattern: String,
    lines: Vec<String>,
}

impl Draft {
    fn has_body(&self) -> bool {
        self.lines.iter().any(|l| !l.trim().is_empty())
    }
}

/// Split a flat ordered line sequence into entries with one forward scan.
///
/// A heading closes the current entry (which is kept only if it has at least
/// one non-blank body line) and opens the next. The final entry is always
/// kept, so a trailing heading with no body survives. Trivial entries — an
/// UNKNOWN or very short pattern with almost no body — are folded into their
/// predecessor afterwards.
pub fn extract_entries(all_lines: &[String], opts: &ParseOptions) -> Vec<Entry> {
    let mut drafts: Vec<Draft> = Vec::new();
    let mut current: Option<Draft> = None;

    for raw in all_lines {
        let ln = raw.trim();

        if ln.is_empty() {
            // Blank lines are soft separators inside the current body.
            if let Some(cur) = current.as_mut() {
                cur.lines.push(String::new());
            }
            continue;
        }

        if is_heading(ln, opts.heading_max_chars) {
            if let Some(cur) = current.take() {
                if cur.has_body() {
                    drafts.push(cur);
                }
            }
            current = Some(Draft {
                pattern: ln.to_string(),
                lines: Vec::new(),
            });
        } else {
            match current.as_mut() {
                Some(cur) => cur.lines.push(ln.to_string()),
                None => {
                    current = Some(Draft {
                        pattern: UNKNOWN_PATTERN.to_string(),
                        lines: vec![ln.to_string()],
                    });
                }
            }
        }
    }

    // The last entry is kept even with an empty body; its pattern is never
    // empty at this point.
    if let Some(cur) = current {
        if !cur.pattern.is_empty() || !cur.lines.is_empty() {
            drafts.push(cur);
        }
    }

    let merged = merge_trivial(drafts, opts);

    merged
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let text = d
                .lines
                .iter()
                .filter(|l| !l.trim().is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join("\n");
            Entry {
                pattern: d.pattern,
                lines: d.lines,
                id: i + 1,
                text,
            }
        })
        .collect()
}

/// Fold entries with an unusable pattern and almost no body into the
/// previous kept entry. The very first entry is always kept as-is.
fn merge_trivial(drafts: Vec<Draft>, opts: &ParseOptions) -> Vec<Draft> {
    let mut merged: Vec<Draft> = Vec::new();
    for d in drafts {
        let trivial = (d.pattern == UNKNOWN_PATTERN
            || d.pattern.chars().count() < opts.merge_min_pattern_chars)
            && d.lines.len() < opts.merge_max_body_lines;

        match merged.last_mut() {
            Some(prev) if trivial => {
                prev.lines.push(String::new());
                prev.lines.extend(d.lines);
            }
            _ => merged.push(d),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn parse(items: &[&str]) -> Vec<Entry> {
        extract_entries(&lines(items), &ParseOptions::default())
    }

    #[test]
    fn two_headings_split_two_entries() {
        let entries = parse(&["パターン＋A", "example one", "", "普通形 B", "example two"]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pattern, "パターン＋A");
        assert_eq!(entries[0].text, "example one");
        assert_eq!(entries[1].pattern, "普通形 B");
        assert_eq!(entries[1].text, "example two");
    }

    #[test]
    fn lone_continuation_becomes_unknown() {
        let entries = parse(&["just some text"]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pattern, UNKNOWN_PATTERN);
        assert_eq!(entries[0].text, "just some text");
    }

    #[test]
    fn heading_without_body_dropped_midstream() {
        // "あ" opens an entry that never gets a body, so the next heading
        // discards it.
        let entries = parse(&["パターン＋A", "body", "あ", "普通形＋B", "more"]);
        let patterns: Vec<&str> = entries.iter().map(|e| e.pattern.as_str()).collect();
        assert!(!patterns.contains(&"あ"));
        assert_eq!(patterns, vec!["パターン＋A", "普通形＋B"]);
    }

    #[test]
    fn trailing_heading_only_entry_survives() {
        let entries = parse(&["パターン＋A", "body", "普通形＋B"]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].pattern, "普通形＋B");
        assert!(entries[1].text.is_empty());
    }

    #[test]
    fn short_second_entry_merges_into_first() {
        // Second entry: 1-char pattern, single body line -> folded back.
        let entries = parse(&["パターン＋A", "example one", "ひ", "stray"]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pattern, "パターン＋A");
        assert!(entries[0].lines.contains(&"stray".to_string()));
        assert_eq!(entries[0].text, "example one\nstray");
    }

    #[test]
    fn short_first_entry_is_kept() {
        // Merge only applies from the second entry onward.
        let entries = parse(&["ひ", "body line"]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pattern, "ひ");
    }

    #[test]
    fn substantial_entry_not_merged() {
        // Short pattern but three body lines: stays standalone.
        let entries = parse(&["パターン＋A", "one", "ひと", "a", "b", "c"]);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].pattern, "ひと");
    }

    #[test]
    fn ids_are_contiguous_from_one() {
        let entries = parse(&[
            "パターン＋A", "x", "パターン＋B", "y", "パターン＋C", "z",
        ]);
        let ids: Vec<usize> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn continuation_lines_are_reconstructed_in_order() {
        let input = &[
            "パターン＋A", "alpha", "beta", "", "パターン＋B", "gamma", "delta",
        ];
        let entries = parse(input);
        let body: Vec<String> = entries
            .iter()
            .flat_map(|e| e.lines.iter())
            .filter(|l| !l.trim().is_empty())
            .cloned()
            .collect();
        assert_eq!(body, vec!["alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn empty_input_yields_no_entries() {
        let entries = parse(&[]);
        assert!(entries.is_empty());
    }

    #[test]
    fn blank_only_input_yields_no_entries() {
        let entries = parse(&["", "  ", ""]);
        assert!(entries.is_empty());
    }
}
