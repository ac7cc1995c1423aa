//! Persisted document schema (version 1).
//!
//! The persisted document is the exchange format with the persistence
//! collaborator: `{ "version": 1, "timeline": { tracks, zoom, scrollX,
//! snapEnabled } }`. It is read and written wholesale.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::timeline::Timeline;
use crate::MIN_CLIP_MS;

/// Schema version written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

/// Top-level persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Schema version.
    pub version: u32,

    /// Document content.
    pub timeline: Timeline,
}

impl Default for ProjectDocument {
    fn default() -> Self {
        Self::new(Timeline::default())
    }
}

impl ProjectDocument {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            version: SCHEMA_VERSION,
            timeline,
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: ProjectDocument = serde_json::from_str(json)?;
        document.check_version()
    }

    /// Parse a document from an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, DocumentError> {
        let document: ProjectDocument = serde_json::from_value(value)?;
        document.check_version()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref().to_path_buf();
        let json = std::fs::read_to_string(&path).map_err(|e| DocumentError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let document: ProjectDocument =
            serde_json::from_str(&json).map_err(|e| DocumentError::ParseError {
                path: path.clone(),
                source: e,
            })?;
        tracing::debug!(path = %path.display(), tracks = document.timeline.tracks.len(), "Loaded document");
        document.check_version()
    }

    /// Save the document to disk, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DocumentError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| DocumentError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        std::fs::write(&path, json).map_err(|e| DocumentError::IoError { path, source: e })
    }

    fn check_version(mut self) -> Result<Self, DocumentError> {
        if self.version != SCHEMA_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: self.version,
            });
        }
        self.timeline.normalize_back_references();
        Ok(self)
    }

    /// Report invariant violations. An empty list means the document is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];
        let mut track_ids = HashSet::new();
        let mut clip_ids = HashSet::new();

        for track in &self.timeline.tracks {
            if !track_ids.insert(track.id.as_str()) {
                errors.push(format!("Duplicate track id: {}", track.id));
            }

            for clip in &track.clips {
                if !clip_ids.insert(clip.id.as_str()) {
                    errors.push(format!("Duplicate clip id: {}", clip.id));
                }
                if clip.start_time < 0.0 {
                    errors.push(format!(
                        "Clip {} starts before zero ({})",
                        clip.id, clip.start_time
                    ));
                }
                if clip.length() < MIN_CLIP_MS {
                    errors.push(format!(
                        "Clip {} is shorter than {MIN_CLIP_MS}ms ({}ms)",
                        clip.id,
                        clip.length()
                    ));
                }
                if clip.trim_start < 0.0 || clip.trim_end < 0.0 {
                    errors.push(format!("Clip {} has a negative trim", clip.id));
                }
                if !track.kind.accepts(clip.kind) {
                    errors.push(format!(
                        "Clip {} of type {} cannot live on {} track {}",
                        clip.id, clip.kind, track.kind, track.id
                    ));
                }
            }

            let ordered = track.clips_by_time();
            for pair in ordered.windows(2) {
                if pair[0].end_time > pair[1].start_time {
                    errors.push(format!(
                        "Clips {} and {} overlap on track {}",
                        pair[0].id, pair[1].id, track.id
                    ));
                }
            }
        }

        errors
    }
}

/// Errors that can occur when reading or writing documents.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported document version {found} (expected {SCHEMA_VERSION})")]
    UnsupportedVersion { found: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Clip;
    use crate::kind::{ClipKind, TrackKind};
    use crate::track::Track;

    fn document_with(clips: Vec<Clip>, kind: TrackKind) -> ProjectDocument {
        let mut track = Track::new("t1", "Track", kind);
        track.clips = clips;
        ProjectDocument::new(Timeline {
            tracks: vec![track],
            ..Timeline::default()
        })
    }

    #[test]
    fn test_document_roundtrip_restores_back_references() {
        let doc = document_with(
            vec![Clip::new("c1", "a", ClipKind::Video, 0.0, 1000.0)],
            TrackKind::Video,
        );
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"version\": 1"));
        let parsed = ProjectDocument::from_json(&json).unwrap();
        assert_eq!(parsed.timeline.tracks[0].clips[0].track_id, "t1");
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let raw = r#"{ "version": 2, "timeline": { "tracks": [], "zoom": 1, "scrollX": 0, "snapEnabled": true } }"#;
        let err = ProjectDocument::from_json(raw).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion { found: 2 }));
    }

    #[test]
    fn test_validate_reports_overlap_and_length() {
        let doc = document_with(
            vec![
                Clip::new("c1", "a", ClipKind::Video, 0.0, 1000.0),
                Clip::new("c2", "a", ClipKind::Video, 900.0, 950.0),
            ],
            TrackKind::Video,
        );
        let errors = doc.validate();
        assert!(errors.iter().any(|e| e.contains("overlap")));
        assert!(errors.iter().any(|e| e.contains("shorter than")));
    }

    #[test]
    fn test_validate_reports_kind_mismatch_and_duplicates() {
        let doc = document_with(
            vec![
                Clip::new("c1", "a", ClipKind::Audio, 0.0, 1000.0),
                Clip::new("c1", "a", ClipKind::Audio, 2000.0, 3000.0),
            ],
            TrackKind::Video,
        );
        let errors = doc.validate();
        assert!(errors.iter().any(|e| e.contains("cannot live on video track")));
        assert!(errors.iter().any(|e| e.contains("Duplicate clip id: c1")));
    }

    #[test]
    fn test_valid_document_has_no_errors() {
        let doc = document_with(
            vec![
                Clip::new("c1", "a", ClipKind::Video, 0.0, 1000.0),
                Clip::new("c2", "a", ClipKind::Video, 1000.0, 2000.0),
            ],
            TrackKind::Video,
        );
        assert!(doc.validate().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("splice_test_document");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("project.json");

        let doc = document_with(
            vec![Clip::new("c1", "a", ClipKind::Sticker, 0.0, 500.0)],
            TrackKind::Sticker,
        );
        doc.save(&path).unwrap();
        let loaded = ProjectDocument::load(&path).unwrap();
        assert_eq!(loaded, doc_with_refs(doc));

        std::fs::remove_dir_all(&dir).ok();
    }

    fn doc_with_refs(mut doc: ProjectDocument) -> ProjectDocument {
        doc.timeline.normalize_back_references();
        doc
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ProjectDocument::load("/nonexistent/splice/doc.json").unwrap_err();
        assert!(matches!(err, DocumentError::IoError { .. }));
    }

    #[test]
    fn test_fixture_document_is_valid() {
        use std::path::PathBuf;

        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("fixtures")
            .join("sample-document")
            .join("project.json");

        let doc = ProjectDocument::load(path).unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.timeline.tracks.len(), 4);
        assert!(doc.validate().is_empty(), "{:?}", doc.validate());
        assert_eq!(doc.timeline.duration(), 12_000.0);
    }
}
