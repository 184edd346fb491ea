use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Compound patterns arrive joined with slashes or commas (half- and
// full-width): "〜わけだ／〜わけです".
static VARIANT_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[／/、,]\s*").unwrap());

/// Input shape: grammar lessons as produced by the earlier pipeline steps.
#[derive(Debug, Deserialize)]
pub struct GrammarDoc {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub lessons: Vec<GrammarLesson>,
}

#[derive(Debug, Deserialize)]
pub struct GrammarLesson {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub grammar: Vec<GrammarPoint>,
}

#[derive(Debug, Deserialize)]
pub struct GrammarPoint {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Example sentence split into the Japanese sentence and its translation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamplePair {
    pub jp: String,
    pub vi: String,
}

/// One flashcard in the vocabulary-lesson shape the web app renders.
#[derive(Debug, Clone, Serialize)]
pub struct VocabCard {
    pub id: String,
    pub kanji: String,
    pub hiragana: String,
    pub romaji: String,
    pub meaning: String,
    pub vietnamese: String,
    pub pos: String,
    pub level: String,
    pub lesson: Value,
    pub examples: Vec<ExamplePair>,
    pub example: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardLesson {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub vocabulary: Vec<VocabCard>,
    #[serde(rename = "totalVocabulary")]
    pub total_vocabulary: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefinedEntry {
    pub id: String,
    pub pattern: String,
    pub meaning: String,
    pub examples: Vec<ExamplePair>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefinedDoc {
    pub entries: Vec<RefinedEntry>,
}

/// Convert grammar lessons into flashcard lessons, one card per pattern
/// variant, plus a refined flat entry list.
pub fn convert(doc: &GrammarDoc) -> (Vec<CardLesson>, RefinedDoc) {
    let level = doc.level.clone().unwrap_or_else(|| "N3".to_string());
    let mut lessons_out = Vec::new();
    let mut refined = Vec::new();

    for lesson in &doc.lessons {
        let lesson_id = id_text(&lesson.id);
        let mut cards = Vec::new();

        for point in &lesson.grammar {
            let example = point
                .examples
                .first()
                .map(|e| convert_example(e))
                .unwrap_or_else(|| ExamplePair {
                    jp: String::new(),
                    vi: String::new(),
                });

            for (i, variant) in split_variants(&point.pattern).into_iter().enumerate() {
                let card_id = format!("grammar-{}-{}-{}", lesson_id, id_text(&point.id), i + 1);

                cards.push(VocabCard {
                    id: card_id.clone(),
                    kanji: variant.clone(),
                    hiragana: String::new(),
                    romaji: String::new(),
                    meaning: point.meaning.clone(),
                    vietnamese: point.meaning.clone(),
                    pos: "grammar".to_string(),
                    level: level.clone(),
                    lesson: lesson.id.clone(),
                    examples: vec![example.clone()],
                    example: format!("{} — {}", example.jp, example.vi),
                });

                refined.push(RefinedEntry {
                    id: card_id,
                    pattern: variant,
                    meaning: point.meaning.clone(),
                    examples: vec![example.clone()],
                });
            }
        }

        let total_vocabulary = cards.len();
        lessons_out.push(CardLesson {
            id: format!("grammar-lesson-{}", lesson_id),
            title: lesson.title.clone(),
            description: lesson.description.clone(),
            vocabulary: cards,
            total_vocabulary,
        });
    }

    (lessons_out, RefinedDoc { entries: refined })
}

/// Split a compound pattern into its variants, dropping empty fragments.
pub fn split_variants(pattern: &str) -> Vec<String> {
    VARIANT_SPLIT_RE
        .split(pattern)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

/// Examples come as "JP。 — VI"; anything without the dash keeps an empty
/// translation.
pub fn convert_example(example: &str) -> ExamplePair {
    match example.split_once('—') {
        Some((jp, vi)) => ExamplePair {
            jp: jp.trim().to_string(),
            vi: vi.trim().to_string(),
        },
        None => ExamplePair {
            jp: example.to_string(),
            vi: String::new(),
        },
    }
}

/// Ids in the source files are sometimes numbers, sometimes strings.
fn id_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
