//! Timeline content and read-only queries.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::ids::IdGenerator;
use crate::track::Track;
use crate::Millis;

/// The persistable content of a document.
///
/// This is exactly what undo/redo snapshots: playback position, selection
/// and other transient editor state live elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default = "default_snap_enabled")]
    pub snap_enabled: bool,
}

fn default_zoom() -> f64 {
    1.0
}

fn default_snap_enabled() -> bool {
    true
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            tracks: vec![],
            zoom: default_zoom(),
            scroll_x: 0.0,
            snap_enabled: default_snap_enabled(),
        }
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn track_mut(&mut self, track_id: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }

    /// Locate a clip anywhere in the document.
    pub fn find_clip(&self, clip_id: &str) -> Option<(&Track, &Clip)> {
        self.tracks
            .iter()
            .find_map(|t| t.clip(clip_id).map(|c| (t, c)))
    }

    pub fn clip(&self, track_id: &str, clip_id: &str) -> Option<&Clip> {
        self.track(track_id)?.clip(clip_id)
    }

    /// The clip on `track_id` covering `time`, if any.
    pub fn clip_at(&self, track_id: &str, time: Millis) -> Option<&Clip> {
        self.track(track_id)?
            .clips
            .iter()
            .find(|c| c.contains_time(time))
    }

    /// Timeline length: the latest clip end over all tracks.
    pub fn duration(&self) -> Millis {
        self.tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .map(|c| c.end_time)
            .fold(0.0, f64::max)
    }

    /// Clips on `track_id` intersecting `range`, skipping `exclude_id`.
    pub fn clips_overlapping(
        &self,
        track_id: &str,
        range: Range<Millis>,
        exclude_id: Option<&str>,
    ) -> Vec<&Clip> {
        let Some(track) = self.track(track_id) else {
            return vec![];
        };
        track
            .clips
            .iter()
            .filter(|c| Some(c.id.as_str()) != exclude_id)
            .filter(|c| c.overlaps(range.start, range.end))
            .collect()
    }

    pub fn contains_clip_id(&self, clip_id: &str) -> bool {
        self.find_clip(clip_id).is_some()
    }

    pub fn contains_track_id(&self, track_id: &str) -> bool {
        self.track(track_id).is_some()
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    /// Re-stamp every clip's `track_id` from its placement.
    pub fn normalize_back_references(&mut self) {
        for track in &mut self.tracks {
            for clip in &mut track.clips {
                if clip.track_id != track.id {
                    clip.track_id.clone_from(&track.id);
                }
            }
        }
    }
}

/// A live document: timeline content plus the id generator scoped to it.
#[derive(Debug, Clone, Default)]
pub struct TimelineDocument {
    timeline: Timeline,
    ids: IdGenerator,
}

impl TimelineDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing content, fixing up clip back-references.
    pub fn from_timeline(mut timeline: Timeline) -> Self {
        timeline.normalize_back_references();
        Self {
            timeline,
            ids: IdGenerator::new(),
        }
    }

    /// Use a specific id generator (deterministic ids in tests).
    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Mutable access for the edit engine. Other callers should go through
    /// the engine so invariants hold.
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    /// Swap in new content wholesale (undo/redo, document load).
    pub fn replace_timeline(&mut self, mut timeline: Timeline) {
        timeline.normalize_back_references();
        self.timeline = timeline;
    }

    pub fn next_clip_id(&mut self) -> String {
        let timeline = &self.timeline;
        self.ids.next_clip_id(|id| timeline.contains_clip_id(id))
    }

    pub fn next_track_id(&mut self) -> String {
        let timeline = &self.timeline;
        self.ids.next_track_id(|id| timeline.contains_track_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{ClipKind, TrackKind};

    fn sample() -> Timeline {
        let mut video = Track::new("v1", "Video 1", TrackKind::Video);
        video
            .clips
            .push(Clip::new("c1", "a1", ClipKind::Video, 0.0, 1000.0));
        video
            .clips
            .push(Clip::new("c2", "a2", ClipKind::Video, 1500.0, 4000.0));
        let mut audio = Track::new("a1", "Audio 1", TrackKind::Audio);
        audio
            .clips
            .push(Clip::new("c3", "a3", ClipKind::Audio, 500.0, 6000.0));
        Timeline {
            tracks: vec![video, audio],
            ..Timeline::default()
        }
    }

    #[test]
    fn test_clip_at() {
        let timeline = sample();
        assert_eq!(timeline.clip_at("v1", 999.0).map(|c| c.id.as_str()), Some("c1"));
        assert!(timeline.clip_at("v1", 1000.0).is_none());
        assert_eq!(timeline.clip_at("v1", 1500.0).map(|c| c.id.as_str()), Some("c2"));
        assert!(timeline.clip_at("missing", 0.0).is_none());
    }

    #[test]
    fn test_duration() {
        assert_eq!(sample().duration(), 6000.0);
        assert_eq!(Timeline::new().duration(), 0.0);
    }

    #[test]
    fn test_clips_overlapping_excludes_id() {
        let timeline = sample();
        let hits: Vec<&str> = timeline
            .clips_overlapping("v1", 900.0..1600.0, None)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(hits, vec!["c1", "c2"]);

        let hits = timeline.clips_overlapping("v1", 900.0..1600.0, Some("c1"));
        assert_eq!(hits.len(), 1);
        assert!(timeline
            .clips_overlapping("v1", 1000.0..1500.0, None)
            .is_empty());
    }

    #[test]
    fn test_find_clip_and_back_references() {
        let mut timeline = sample();
        assert_eq!(timeline.find_clip("c3").map(|(t, _)| t.id.as_str()), Some("a1"));
        timeline.normalize_back_references();
        assert!(timeline
            .tracks
            .iter()
            .all(|t| t.clips.iter().all(|c| c.track_id == t.id)));
    }

    #[test]
    fn test_document_ids_are_unique() {
        let mut doc = TimelineDocument::from_timeline(sample()).with_ids(IdGenerator::with_tag("t"));
        let a = doc.next_clip_id();
        let b = doc.next_clip_id();
        assert_ne!(a, b);
        assert!(!doc.timeline().contains_clip_id(&a));
    }

    #[test]
    fn test_timeline_snapshot_fields() {
        let json = serde_json::to_value(Timeline::default()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 4);
        for key in ["tracks", "zoom", "scrollX", "snapEnabled"] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }
}
