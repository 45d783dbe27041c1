//! Segment records and the list that owns them.
//!
//! Segments are loaded from a JSON array. Edits only live in memory; nothing
//! is written back.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tags::{strip_tags, visible_len};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read segments from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid segment data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate segment id {0}")]
    DuplicateId(u32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    #[default]
    Draft,
    Translated,
    Editing,
    Approved,
}

impl SegmentStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Translated => "translated",
            Self::Editing => "editing",
            Self::Approved => "approved",
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, Self::Translated | Self::Approved)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    #[serde(rename = "TB")]
    Termbase,
    #[serde(rename = "TM")]
    TranslationMemory,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmMatch {
    pub id: String,
    pub source: String,
    pub target: String,
    pub match_percentage: u8,
    #[serde(rename = "type")]
    pub kind: MatchKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub text: String,
    pub confidence: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Error,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    Reviewer,
    AiQa,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub category: IssueCategory,
    pub message: String,
    pub severity: Severity,
    /// Reviewer feedback labels.
    #[serde(default)]
    pub badges: Vec<String>,
    /// Offending text flagged by automated QA.
    #[serde(default)]
    pub quoted_text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub message: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentData {
    pub id: u32,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub suggested_text: Option<String>,
    #[serde(default)]
    pub status: SegmentStatus,
    #[serde(default)]
    pub has_warning: bool,
    #[serde(default)]
    pub ai_suggestion: Option<AiSuggestion>,
    #[serde(default)]
    pub tm_matches: Vec<TmMatch>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl SegmentData {
    pub fn new(id: u32, source: &str, target: &str) -> Self {
        Self {
            id,
            source: source.to_string(),
            target: target.to_string(),
            suggested_text: None,
            status: SegmentStatus::Draft,
            has_warning: false,
            ai_suggestion: None,
            tm_matches: Vec::new(),
            issues: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggested_text: &str) -> Self {
        self.suggested_text = Some(suggested_text.to_string());
        self
    }

    /// Visible characters of the source, tags excluded.
    pub fn source_len(&self) -> usize {
        visible_len(&self.source)
    }

    /// Visible characters of the target, tags excluded.
    pub fn target_len(&self) -> usize {
        visible_len(&self.target)
    }

    pub fn target_exceeds_source(&self) -> bool {
        self.target_len() > self.source_len()
    }

    pub fn source_words(&self) -> usize {
        strip_tags(&self.source).split_whitespace().count()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub translated: usize,
    pub total: usize,
}

/// Ordered segments plus the id of the one being edited.
#[derive(Debug, Default)]
pub struct SegmentList {
    segments: Vec<SegmentData>,
    active: Option<u32>,
}

impl SegmentList {
    /// Builds a list whose first segment is active.
    pub fn new(segments: Vec<SegmentData>) -> Result<Self, LoadError> {
        for (idx, segment) in segments.iter().enumerate() {
            if segments[..idx].iter().any(|other| other.id == segment.id) {
                return Err(LoadError::DuplicateId(segment.id));
            }
        }
        let active = segments.first().map(|segment| segment.id);
        Ok(Self { segments, active })
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let segments: Vec<SegmentData> = serde_json::from_str(json)?;
        Self::new(segments)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let list = Self::from_json(&json)?;
        if list.is_empty() {
            warn!("no segments found in {}", path.display());
        }
        debug!("loaded {} segments from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn segments(&self) -> &[SegmentData] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&SegmentData> {
        self.segments.iter().find(|segment| segment.id == id)
    }

    pub fn active_id(&self) -> Option<u32> {
        self.active
    }

    pub fn active_index(&self) -> Option<usize> {
        let id = self.active?;
        self.index_of(id)
    }

    pub fn active(&self) -> Option<&SegmentData> {
        self.get(self.active?)
    }

    pub fn activate(&mut self, id: u32) -> bool {
        if self.active == Some(id) || self.index_of(id).is_none() {
            return false;
        }
        debug!("activating segment {id}");
        self.active = Some(id);
        true
    }

    pub fn activate_next(&mut self) -> bool {
        let next = match self.active_index() {
            Some(idx) => idx + 1,
            None => 0,
        };
        match self.segments.get(next) {
            Some(segment) => {
                let id = segment.id;
                self.activate(id)
            }
            None => false,
        }
    }

    pub fn activate_previous(&mut self) -> bool {
        let Some(idx) = self.active_index() else {
            return false;
        };
        if idx == 0 {
            return false;
        }
        let id = self.segments[idx - 1].id;
        self.activate(id)
    }

    /// Stores a new target. Any edit moves the segment back to `Editing`.
    pub fn apply_edit(&mut self, id: u32, target: &str) -> bool {
        let Some(segment) = self.segments.iter_mut().find(|segment| segment.id == id) else {
            return false;
        };
        segment.target = target.to_string();
        segment.status = SegmentStatus::Editing;
        true
    }

    /// Source words of finished segments against all source words.
    pub fn progress(&self) -> Progress {
        self.segments
            .iter()
            .fold(Progress::default(), |mut progress, segment| {
                let words = segment.source_words();
                progress.total += words;
                if segment.status.is_done() {
                    progress.translated += words;
                }
                progress
            })
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        self.segments.iter().position(|segment| segment.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {
            "id": 1,
            "source": "Press [k]Ctrl+S[/k] to save.",
            "target": "Drücken Sie [k]Strg+S[/k]",
            "suggestedText": "Drücken Sie [k]Strg+S[/k] zum Speichern.",
            "status": "translated",
            "tmMatches": [
                { "id": "tm1", "source": "Save", "target": "Speichern", "matchPercentage": 98, "type": "TM" }
            ],
            "issues": [
                {
                    "id": "i1", "type": "warning", "category": "ai-qa",
                    "message": "Missing period", "severity": "low",
                    "quotedText": "Strg+S"
                }
            ]
        },
        { "id": 2, "source": "Open the [b]File[/b] menu", "target": "", "status": "draft" },
        { "id": 3, "source": "Done", "target": "Fertig", "status": "approved", "hasWarning": true }
    ]"#;

    #[test]
    fn parses_camel_case_fields() {
        let list = SegmentList::from_json(SAMPLE).expect("sample parses");
        assert_eq!(list.len(), 3);
        let first = &list.segments()[0];
        assert_eq!(first.status, SegmentStatus::Translated);
        assert_eq!(
            first.suggested_text.as_deref(),
            Some("Drücken Sie [k]Strg+S[/k] zum Speichern.")
        );
        assert_eq!(first.tm_matches[0].match_percentage, 98);
        assert_eq!(first.tm_matches[0].kind, MatchKind::TranslationMemory);
        assert_eq!(first.issues[0].category, IssueCategory::AiQa);
        assert_eq!(first.issues[0].quoted_text.as_deref(), Some("Strg+S"));
        assert!(first.issues[0].badges.is_empty());
        assert!(list.segments()[2].has_warning);
    }

    #[test]
    fn first_segment_starts_active() {
        let list = SegmentList::from_json(SAMPLE).expect("sample parses");
        assert_eq!(list.active_id(), Some(1));
        assert_eq!(list.active_index(), Some(0));
    }

    #[test]
    fn navigation_stops_at_the_ends() {
        let mut list = SegmentList::from_json(SAMPLE).expect("sample parses");
        assert!(!list.activate_previous());
        assert!(list.activate_next());
        assert!(list.activate_next());
        assert_eq!(list.active_id(), Some(3));
        assert!(!list.activate_next());
        assert!(list.activate_previous());
        assert_eq!(list.active_id(), Some(2));
    }

    #[test]
    fn activate_rejects_unknown_and_current_ids() {
        let mut list = SegmentList::from_json(SAMPLE).expect("sample parses");
        assert!(!list.activate(1));
        assert!(!list.activate(42));
        assert!(list.activate(3));
        assert_eq!(list.active().map(|segment| segment.id), Some(3));
    }

    #[test]
    fn edit_marks_segment_as_editing() {
        let mut list = SegmentList::from_json(SAMPLE).expect("sample parses");
        assert!(list.apply_edit(3, "Erledigt"));
        let segment = list.get(3).expect("segment 3");
        assert_eq!(segment.target, "Erledigt");
        assert_eq!(segment.status, SegmentStatus::Editing);
        assert!(!list.apply_edit(99, "x"));
    }

    #[test]
    fn char_counts_ignore_tags() {
        let segment = SegmentData::new(7, "Press [k]Esc[/k]", "Drücken Sie [k]Esc[/k]");
        assert_eq!(segment.source_len(), 9);
        assert_eq!(segment.target_len(), 15);
        assert!(segment.target_exceeds_source());
    }

    #[test]
    fn progress_counts_finished_source_words() {
        let mut list = SegmentList::from_json(SAMPLE).expect("sample parses");
        assert_eq!(list.progress(), Progress { translated: 5, total: 9 });

        list.apply_edit(1, "changed");
        assert_eq!(list.progress(), Progress { translated: 1, total: 9 });
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let segments = vec![SegmentData::new(1, "a", ""), SegmentData::new(1, "b", "")];
        assert!(matches!(
            SegmentList::new(segments),
            Err(LoadError::DuplicateId(1))
        ));
    }

    #[test]
    fn load_reads_file_and_reports_errors() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write sample");
        let list = SegmentList::load(file.path()).expect("load sample");
        assert_eq!(list.len(), 3);

        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            SegmentList::load(&missing),
            Err(LoadError::Io { .. })
        ));

        assert!(matches!(
            SegmentList::from_json("{ not json"),
            Err(LoadError::Parse(_))
        ));
    }
}
