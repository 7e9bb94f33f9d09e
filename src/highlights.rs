//! Historical highlight records and their file-backed store.
//!
//! A highlight is one student's committed selection, persisted for the
//! population-level heatmap. Records are immutable once written; the
//! aggregator consumes them read-only.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::select::Point;

/// Raw drag corners of a persisted selection. Stored un-normalized, exactly
/// as dragged; consumers normalize before doing geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionArea {
    pub start: Point,
    pub end: Point,
}

/// One student's historical selection on a page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentHighlight {
    pub id: String,
    pub student_id: String,
    pub page_number: u32,
    pub selection: SelectionArea,
    #[serde(default)]
    pub question: String,
    pub timestamp: DateTime<Utc>,
}

impl StudentHighlight {
    /// False when the geometry carries NaN/infinite coordinates; such
    /// records are skipped during aggregation.
    #[must_use]
    pub fn has_valid_geometry(&self) -> bool {
        [
            self.selection.start.x,
            self.selection.start.y,
            self.selection.end.x,
            self.selection.end.y,
        ]
        .iter()
        .all(|c| c.is_finite())
    }
}

/// Decode a JSON array of highlights, skipping records that fail to parse
/// instead of aborting the load.
pub fn decode_highlights(content: &str) -> Result<Vec<StudentHighlight>> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_str(content).context("highlights file is not a JSON array")?;

    let mut highlights = Vec::with_capacity(raw.len());
    for (idx, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<StudentHighlight>(value) {
            Ok(h) => highlights.push(h),
            Err(e) => warn!("skipping malformed highlight record #{idx}: {e}"),
        }
    }
    Ok(highlights)
}

/// Load highlights from a JSON file. Missing file means an empty set.
pub fn load_highlights_file(path: &Path) -> Result<Vec<StudentHighlight>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read highlights from {path:?}"))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    decode_highlights(&content)
}

/// File-backed store of a document's highlight population.
pub struct HighlightStore {
    highlights: Vec<StudentHighlight>,
    file_path: Option<PathBuf>,
}

impl HighlightStore {
    /// In-memory store that never touches disk.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            highlights: Vec::new(),
            file_path: None,
        }
    }

    /// Store backed by `dir/doc_<md5 of document name>.json`.
    pub fn for_document(document_name: &str, dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create highlights directory {dir:?}"))?;
        }
        let digest = md5::compute(document_name.as_bytes());
        let file_path = dir.join(format!("doc_{digest:x}.json"));
        let highlights = load_highlights_file(&file_path)?;
        Ok(Self {
            highlights,
            file_path: Some(file_path),
        })
    }

    /// Append a highlight and persist the full set.
    pub fn add(&mut self, highlight: StudentHighlight) -> Result<()> {
        self.highlights.push(highlight);
        self.save()
    }

    #[must_use]
    pub fn highlights(&self) -> &[StudentHighlight] {
        &self.highlights
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let content =
            serde_json::to_string_pretty(&self.highlights).context("failed to serialize highlights")?;
        fs::write(path, content).with_context(|| format!("failed to write highlights to {path:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn highlight(id: &str, page: u32) -> StudentHighlight {
        StudentHighlight {
            id: id.to_string(),
            student_id: "student_1".to_string(),
            page_number: page,
            selection: SelectionArea {
                start: Point::new(10.0, 20.0),
                end: Point::new(110.0, 60.0),
            },
            question: String::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn add_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let mut store = HighlightStore::for_document("physics.pdf", dir.path()).unwrap();
        store.add(highlight("h1", 1)).unwrap();
        store.add(highlight("h2", 3)).unwrap();

        let reloaded = HighlightStore::for_document("physics.pdf", dir.path()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.highlights()[0].id, "h1");
    }

    #[test]
    fn different_documents_use_different_files() {
        let dir = TempDir::new().unwrap();
        let mut a = HighlightStore::for_document("a.pdf", dir.path()).unwrap();
        a.add(highlight("h1", 1)).unwrap();

        let b = HighlightStore::for_document("b.pdf", dir.path()).unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let content = r#"[
            {"id":"ok","studentId":"s","pageNumber":1,
             "selection":{"start":{"x":1.0,"y":2.0},"end":{"x":30.0,"y":40.0}},
             "question":"","timestamp":"2025-01-05T12:00:00Z"},
            {"id":"missing-geometry","studentId":"s","pageNumber":2,
             "timestamp":"2025-01-05T12:00:00Z"}
        ]"#;
        let highlights = decode_highlights(content).unwrap();
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].id, "ok");
    }

    #[test]
    fn non_array_content_is_an_error() {
        assert!(decode_highlights("{\"not\":\"an array\"}").is_err());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let highlights = load_highlights_file(&dir.path().join("nope.json")).unwrap();
        assert!(highlights.is_empty());
    }

    #[test]
    fn ephemeral_store_never_writes() {
        let mut store = HighlightStore::ephemeral();
        store.add(highlight("h1", 1)).unwrap();
        assert_eq!(store.len(), 1);
    }
}
