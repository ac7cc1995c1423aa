//! Track and clip kinds and the placement compatibility matrix.

use serde::{Deserialize, Serialize};

/// Lane type of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Music,
    Sfx,
    Subtitle,
    Sticker,
    Text,
}

/// Media type of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    Video,
    Image,
    Audio,
    Text,
    Subtitle,
    Sticker,
}

impl TrackKind {
    pub const ALL: [TrackKind; 7] = [
        TrackKind::Video,
        TrackKind::Audio,
        TrackKind::Music,
        TrackKind::Sfx,
        TrackKind::Subtitle,
        TrackKind::Sticker,
        TrackKind::Text,
    ];

    /// Wire/persisted name (`"video"`, `"sfx"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Music => "music",
            TrackKind::Sfx => "sfx",
            TrackKind::Subtitle => "subtitle",
            TrackKind::Sticker => "sticker",
            TrackKind::Text => "text",
        }
    }

    /// Display label used for default track names.
    pub fn label(&self) -> &'static str {
        match self {
            TrackKind::Video => "Video",
            TrackKind::Audio => "Audio",
            TrackKind::Music => "Music",
            TrackKind::Sfx => "Sfx",
            TrackKind::Subtitle => "Subtitle",
            TrackKind::Sticker => "Sticker",
            TrackKind::Text => "Text",
        }
    }

    /// Default lane height in pixels for a new track.
    pub fn default_height(&self) -> f64 {
        match self {
            TrackKind::Video => 64.0,
            TrackKind::Audio | TrackKind::Music => 48.0,
            TrackKind::Sfx => 40.0,
            TrackKind::Subtitle | TrackKind::Sticker | TrackKind::Text => 36.0,
        }
    }

    /// Whether tracks of this kind carry audio mix settings.
    pub fn is_audible(&self) -> bool {
        matches!(
            self,
            TrackKind::Video | TrackKind::Audio | TrackKind::Music | TrackKind::Sfx
        )
    }

    /// Whether a clip of `clip` kind may be placed on this track.
    pub fn accepts(&self, clip: ClipKind) -> bool {
        clip.allowed_tracks().contains(self)
    }
}

impl ClipKind {
    /// Track kinds this clip kind may live on.
    pub fn allowed_tracks(&self) -> &'static [TrackKind] {
        match self {
            ClipKind::Video | ClipKind::Image => &[TrackKind::Video],
            ClipKind::Audio => &[TrackKind::Audio, TrackKind::Music, TrackKind::Sfx],
            ClipKind::Text => &[TrackKind::Text, TrackKind::Video],
            ClipKind::Subtitle => &[TrackKind::Subtitle, TrackKind::Text],
            ClipKind::Sticker => &[TrackKind::Sticker, TrackKind::Video],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClipKind::Video => "video",
            ClipKind::Image => "image",
            ClipKind::Audio => "audio",
            ClipKind::Text => "text",
            ClipKind::Subtitle => "subtitle",
            ClipKind::Sticker => "sticker",
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for ClipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
