use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use super::entries::Entry;

/// A fixed-size window of consecutive entries, used by the web app for
/// display pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_id: usize,
    pub title: String,
    pub entries: Vec<Entry>,
}

/// Partition entries into non-overlapping windows of `per_lesson`, in order.
/// The last lesson may be shorter. `per_lesson` must be at least 1.
pub fn group_into_lessons(entries: Vec<Entry>, per_lesson: usize) -> Result<Vec<Lesson>> {
    ensure!(per_lesson > 0, "per_lesson must be at least 1, got 0");

    Ok(entries
        .chunks(per_lesson)
        .enumerate()
        .map(|(i, chunk)| Lesson {
            lesson_id: i + 1,
            title: format!("Lesson {}", i + 1),
            entries: chunk.to_vec(),
        })
        .collect())
}
