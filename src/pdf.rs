use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

const PREVIEW_CHARS: usize = 1000;

/// One raw vocabulary line lifted from the PDF, kept unprocessed for the
/// web app to refine later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabLine {
    pub text: String,
    pub processed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabLesson {
    pub title: String,
    pub vocabulary: Vec<VocabLine>,
}

/// Output record for the vocabulary PDF extraction job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabExtract {
    pub title: String,
    pub source_file: String,
    pub extracted_at: String,
    pub lessons: Vec<VocabLesson>,
    pub total_lessons: usize,
    pub raw_text_preview: String,
}

pub fn extract_text(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("failed to extract text from {}", path.display()))
}

/// Split extracted PDF text into lessons.
///
/// A line mentioning `lesson`, `bài`, or `第` opens a new lesson; lines with
/// Japanese characters under the current lesson become vocabulary candidates.
/// Lines before the first lesson header are discarded, as are lessons that
/// collected no vocabulary.
pub fn structure_vocabulary(text: &str, source_file: &str) -> VocabExtract {
    let mut lessons: Vec<VocabLesson> = Vec::new();
    let mut current: Option<VocabLesson> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if is_lesson_header(line) {
            if let Some(lesson) = current.take() {
                if !lesson.vocabulary.is_empty() {
                    lessons.push(lesson);
                }
            }
            current = Some(VocabLesson {
                title: line.to_string(),
                vocabulary: Vec::new(),
            });
        } else if let Some(lesson) = current.as_mut() {
            if has_japanese(line) {
                lesson.vocabulary.push(VocabLine {
                    text: line.to_string(),
                    processed: false,
                });
            }
        }
    }

    if let Some(lesson) = current {
        if !lesson.vocabulary.is_empty() {
            lessons.push(lesson);
        }
    }

    let total_lessons = lessons.len();
    VocabExtract {
        title: "Tổng Hợp Từ Vựng N3".to_string(),
        source_file: source_file.to_string(),
        extracted_at: chrono::Local::now().format("%Y-%m-%d").to_string(),
        lessons,
        total_lessons,
        raw_text_preview: preview(text),
    }
}

fn is_lesson_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("lesson") || lower.contains("bài") || line.contains('第')
}

/// Hiragana block onward; covers kana and kanji but not Latin or digits.
fn has_japanese(line: &str) -> bool {
    line.chars().any(|c| c >= '\u{3040}')
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
