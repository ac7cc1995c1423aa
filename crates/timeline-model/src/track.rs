//! Track types: ordered lanes of clips.

use serde::{Deserialize, Serialize};

use crate::clip::Clip;
use crate::kind::TrackKind;
use crate::Millis;

/// A lane of clips of compatible kinds.
///
/// `clips` keeps insertion order, not time order; use [`Track::clips_by_time`]
/// when time order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_settings: Option<TrackAudioSettings>,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

fn default_visible() -> bool {
    true
}

/// Mix settings of an audible track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackAudioSettings {
    pub volume: f64,
    /// -1.0 (left) to 1.0 (right).
    pub pan: f64,
}

impl Default for TrackAudioSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pan: 0.0,
        }
    }
}

impl Track {
    /// Create an empty track with kind-dependent defaults.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            muted: false,
            locked: false,
            visible: true,
            height: kind.default_height(),
            audio_settings: kind.is_audible().then(TrackAudioSettings::default),
            clips: vec![],
        }
    }

    pub fn clip(&self, clip_id: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    pub fn clip_mut(&mut self, clip_id: &str) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == clip_id)
    }

    pub fn clip_index(&self, clip_id: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.id == clip_id)
    }

    /// Clips sorted by start time.
    pub fn clips_by_time(&self) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.clips.iter().collect();
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        clips
    }

    /// End of the last clip on this track.
    pub fn end_time(&self) -> Millis {
        self.clips.iter().map(|c| c.end_time).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ClipKind;

    #[test]
    fn test_new_track_defaults() {
        let video = Track::new("t1", "Video 1", TrackKind::Video);
        assert!(video.visible);
        assert!(!video.muted);
        assert_eq!(video.height, 64.0);
        assert!(video.audio_settings.is_some());

        let subs = Track::new("t2", "Subtitle 1", TrackKind::Subtitle);
        assert!(subs.audio_settings.is_none());
    }

    #[test]
    fn test_clips_by_time_and_end() {
        let mut track = Track::new("t1", "Video 1", TrackKind::Video);
        track
            .clips
            .push(Clip::new("b", "a", ClipKind::Video, 3000.0, 4000.0));
        track
            .clips
            .push(Clip::new("a", "a", ClipKind::Video, 0.0, 1000.0));
        let ids: Vec<&str> = track.clips_by_time().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(track.end_time(), 4000.0);
        assert_eq!(track.clip_index("a"), Some(1));
    }

    #[test]
    fn test_track_json_shape() {
        let track = Track::new("t1", "Music 1", TrackKind::Music);
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["type"], "music");
        assert_eq!(json["audioSettings"]["volume"], 1.0);
        assert_eq!(json["clips"], serde_json::json!([]));
    }
}
