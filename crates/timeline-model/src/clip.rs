//! Clip types: timed references to media assets placed on a track.

use serde::{Deserialize, Deserializer, Serialize};

use crate::keyframe::Keyframes;
use crate::kind::ClipKind;
use crate::Millis;

/// A clip on a track.
///
/// `startTime`/`endTime` place the clip on the timeline; `trimStart` and
/// `trimEnd` say how much of the source (`duration`) is cut from each end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,

    pub asset_id: String,

    /// Owning track. Derived from placement; never persisted.
    #[serde(default, skip_serializing)]
    pub track_id: String,

    pub start_time: Millis,
    pub end_time: Millis,

    #[serde(default)]
    pub trim_start: Millis,
    #[serde(default)]
    pub trim_end: Millis,

    /// Full length of the source media.
    #[serde(rename = "duration")]
    pub source_duration: Millis,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ClipKind,

    #[serde(default = "default_volume")]
    pub volume: f64,

    #[serde(default)]
    pub filters: ClipFilters,

    #[serde(default)]
    pub fade_in_ms: Millis,
    #[serde(default)]
    pub fade_out_ms: Millis,

    // Transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_in: Option<Transition>,

    // Text styling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_animation_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_animation_out: Option<String>,

    #[serde(default, skip_serializing_if = "Keyframes::is_empty")]
    pub keyframes: Keyframes,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pip_border: Option<PipBorder>,

    // Crop, as fractions of the source frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_right: Option<f64>,
}

fn default_volume() -> f64 {
    1.0
}

/// Effect stack and playback speed of a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipFilters {
    pub effects: Vec<Effect>,
    pub speed: f64,
}

impl Default for ClipFilters {
    fn default() -> Self {
        Self {
            effects: vec![],
            speed: 1.0,
        }
    }
}

/// One entry of a clip's effect stack (`blur`, `brightness`, `sepia`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: String,
    pub value: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Transition played at the head of a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    #[serde(rename = "type")]
    pub kind: String,
    pub duration_ms: Millis,
}

/// Picture-in-picture border.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipBorder {
    pub width: f64,
    pub color: String,
}

impl Clip {
    /// Create a clip with default styling.
    pub fn new(
        id: impl Into<String>,
        asset_id: impl Into<String>,
        kind: ClipKind,
        start_time: Millis,
        end_time: Millis,
    ) -> Self {
        Self {
            id: id.into(),
            asset_id: asset_id.into(),
            track_id: String::new(),
            start_time,
            end_time,
            trim_start: 0.0,
            trim_end: 0.0,
            source_duration: end_time - start_time,
            name: String::new(),
            kind,
            volume: default_volume(),
            filters: ClipFilters::default(),
            fade_in_ms: 0.0,
            fade_out_ms: 0.0,
            position_x: None,
            position_y: None,
            scale_x: None,
            scale_y: None,
            rotation: None,
            transition_in: None,
            text_content: None,
            font_size: None,
            font_family: None,
            font_color: None,
            font_weight: None,
            text_align: None,
            background_color: None,
            background_opacity: None,
            text_animation_in: None,
            text_animation_out: None,
            keyframes: Keyframes::new(),
            pip_border: None,
            crop_top: None,
            crop_bottom: None,
            crop_left: None,
            crop_right: None,
        }
    }

    /// Length on the timeline.
    pub fn length(&self) -> Millis {
        self.end_time - self.start_time
    }

    /// Whether `time` falls in `[startTime, endTime)`.
    pub fn contains_time(&self, time: Millis) -> bool {
        time >= self.start_time && time < self.end_time
    }

    /// Whether this clip intersects the half-open range `[start, end)`.
    pub fn overlaps(&self, start: Millis, end: Millis) -> bool {
        self.start_time < end && self.end_time > start
    }
}

/// Caller-supplied description of a clip to insert.
///
/// Missing ids are generated by the document; missing filters and fades
/// take their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSpec {
    pub id: Option<String>,
    pub asset_id: String,
    pub kind: ClipKind,
    pub name: Option<String>,
    pub start_time: Millis,
    pub end_time: Millis,
    pub trim_start: Millis,
    pub trim_end: Millis,
    /// Source length; defaults to the placed length plus trims.
    pub source_duration: Option<Millis>,
    pub volume: Option<f64>,
    pub filters: Option<ClipFilters>,
    pub fade_in_ms: Option<Millis>,
    pub fade_out_ms: Option<Millis>,
    /// Further styling applied on top of the defaults.
    pub details: ClipPatch,
}

impl ClipSpec {
    pub fn new(
        asset_id: impl Into<String>,
        kind: ClipKind,
        start_time: Millis,
        end_time: Millis,
    ) -> Self {
        Self {
            id: None,
            asset_id: asset_id.into(),
            kind,
            name: None,
            start_time,
            end_time,
            trim_start: 0.0,
            trim_end: 0.0,
            source_duration: None,
            volume: None,
            filters: None,
            fade_in_ms: None,
            fade_out_ms: None,
            details: ClipPatch::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_trim(mut self, trim_start: Millis, trim_end: Millis) -> Self {
        self.trim_start = trim_start;
        self.trim_end = trim_end;
        self
    }

    pub fn with_source_duration(mut self, duration: Millis) -> Self {
        self.source_duration = Some(duration);
        self
    }

    pub fn with_details(mut self, details: ClipPatch) -> Self {
        self.details = details;
        self
    }

    /// Materialize the clip with its final id and owning track.
    pub fn into_clip(self, id: String, track_id: &str) -> Clip {
        let source_duration = self
            .source_duration
            .unwrap_or(self.end_time - self.start_time + self.trim_start + self.trim_end);

        let mut clip = Clip::new(
            id,
            self.asset_id,
            self.kind,
            self.start_time,
            self.end_time,
        );
        clip.track_id = track_id.to_string();
        clip.trim_start = self.trim_start;
        clip.trim_end = self.trim_end;
        clip.source_duration = source_duration;
        clip.name = self.name.unwrap_or_default();
        if let Some(volume) = self.volume {
            clip.volume = volume;
        }
        clip.filters = self.filters.unwrap_or_default();
        clip.fade_in_ms = self.fade_in_ms.unwrap_or(0.0);
        clip.fade_out_ms = self.fade_out_ms.unwrap_or(0.0);
        self.details.apply_to(&mut clip);
        clip
    }
}

impl From<Clip> for ClipSpec {
    /// Describe an existing clip exactly, id included (remote replay).
    fn from(clip: Clip) -> Self {
        let details = ClipPatch {
            position_x: clip.position_x,
            position_y: clip.position_y,
            scale_x: clip.scale_x,
            scale_y: clip.scale_y,
            rotation: clip.rotation,
            transition_in: Some(clip.transition_in),
            text_content: clip.text_content,
            font_size: clip.font_size,
            font_family: clip.font_family,
            font_color: clip.font_color,
            font_weight: clip.font_weight,
            text_align: clip.text_align,
            background_color: clip.background_color,
            background_opacity: clip.background_opacity,
            text_animation_in: clip.text_animation_in,
            text_animation_out: clip.text_animation_out,
            keyframes: Some(clip.keyframes),
            pip_border: clip.pip_border,
            crop_top: clip.crop_top,
            crop_bottom: clip.crop_bottom,
            crop_left: clip.crop_left,
            crop_right: clip.crop_right,
            ..ClipPatch::default()
        };
        Self {
            id: Some(clip.id),
            asset_id: clip.asset_id,
            kind: clip.kind,
            name: Some(clip.name),
            start_time: clip.start_time,
            end_time: clip.end_time,
            trim_start: clip.trim_start,
            trim_end: clip.trim_end,
            source_duration: Some(clip.source_duration),
            volume: Some(clip.volume),
            filters: Some(clip.filters),
            fade_in_ms: Some(clip.fade_in_ms),
            fade_out_ms: Some(clip.fade_out_ms),
            details,
        }
    }
}

/// Partial clip update, shallow-merged field by field.
///
/// Absent fields are left alone. `transitionIn: null` clears the transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClipPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<Millis>,
    #[serde(rename = "duration", skip_serializing_if = "Option::is_none")]
    pub source_duration: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<ClipFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_in_ms: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_out_ms: Option<Millis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub transition_in: Option<Option<Transition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_animation_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_animation_out: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyframes: Option<Keyframes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pip_border: Option<PipBorder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_top: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_bottom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_right: Option<f64>,
}

/// Distinguish an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ClipPatch {
    /// Patch carrying a clip's placement and trim fields.
    pub fn bounds_of(clip: &Clip) -> Self {
        Self {
            start_time: Some(clip.start_time),
            end_time: Some(clip.end_time),
            trim_start: Some(clip.trim_start),
            trim_end: Some(clip.trim_end),
            ..Self::default()
        }
    }

    /// Patch carrying a clip's full keyframe map.
    pub fn keyframes_of(clip: &Clip) -> Self {
        Self {
            keyframes: Some(clip.keyframes.clone()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Shallow-merge this patch into `clip`.
    pub fn apply_to(&self, clip: &mut Clip) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                target.clone_from(value);
            }
        }

        set(&mut clip.asset_id, &self.asset_id);
        set(&mut clip.start_time, &self.start_time);
        set(&mut clip.end_time, &self.end_time);
        set(&mut clip.trim_start, &self.trim_start);
        set(&mut clip.trim_end, &self.trim_end);
        set(&mut clip.source_duration, &self.source_duration);
        set(&mut clip.name, &self.name);
        set(&mut clip.volume, &self.volume);
        set(&mut clip.filters, &self.filters);
        set(&mut clip.fade_in_ms, &self.fade_in_ms);
        set(&mut clip.fade_out_ms, &self.fade_out_ms);
        set_opt(&mut clip.position_x, &self.position_x);
        set_opt(&mut clip.position_y, &self.position_y);
        set_opt(&mut clip.scale_x, &self.scale_x);
        set_opt(&mut clip.scale_y, &self.scale_y);
        set_opt(&mut clip.rotation, &self.rotation);
        if let Some(transition) = &self.transition_in {
            clip.transition_in.clone_from(transition);
        }
        set_opt(&mut clip.text_content, &self.text_content);
        set_opt(&mut clip.font_size, &self.font_size);
        set_opt(&mut clip.font_family, &self.font_family);
        set_opt(&mut clip.font_color, &self.font_color);
        set_opt(&mut clip.font_weight, &self.font_weight);
        set_opt(&mut clip.text_align, &self.text_align);
        set_opt(&mut clip.background_color, &self.background_color);
        set_opt(&mut clip.background_opacity, &self.background_opacity);
        set_opt(&mut clip.text_animation_in, &self.text_animation_in);
        set_opt(&mut clip.text_animation_out, &self.text_animation_out);
        set(&mut clip.keyframes, &self.keyframes);
        set_opt(&mut clip.pip_border, &self.pip_border);
        set_opt(&mut clip.crop_top, &self.crop_top);
        set_opt(&mut clip.crop_bottom, &self.crop_bottom);
        set_opt(&mut clip.crop_left, &self.crop_left);
        set_opt(&mut clip.crop_right, &self.crop_right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_overlap_is_half_open() {
        let clip = Clip::new("c1", "a1", ClipKind::Video, 1000.0, 2000.0);
        assert!(clip.overlaps(1500.0, 2500.0));
        assert!(!clip.overlaps(2000.0, 3000.0));
        assert!(!clip.overlaps(0.0, 1000.0));
        assert!(clip.contains_time(1000.0));
        assert!(!clip.contains_time(2000.0));
    }

    #[test]
    fn test_clip_spec_fills_defaults() {
        let clip = ClipSpec::new("asset-1", ClipKind::Video, 0.0, 3000.0)
            .with_trim(500.0, 0.0)
            .into_clip("clip-1".to_string(), "track-1");
        assert_eq!(clip.track_id, "track-1");
        assert_eq!(clip.source_duration, 3500.0);
        assert_eq!(clip.filters, ClipFilters::default());
        assert_eq!(clip.filters.speed, 1.0);
        assert_eq!(clip.fade_in_ms, 0.0);
        assert_eq!(clip.volume, 1.0);
    }

    #[test]
    fn test_clip_json_uses_persisted_names() {
        let mut clip = Clip::new("c1", "a1", ClipKind::Audio, 0.0, 1000.0);
        clip.track_id = "t1".to_string();
        let json = serde_json::to_value(&clip).unwrap();
        assert_eq!(json["assetId"], "a1");
        assert_eq!(json["type"], "audio");
        assert_eq!(json["duration"], 1000.0);
        assert_eq!(json["fadeInMs"], 0.0);
        assert!(json.get("trackId").is_none());
        assert!(json.get("positionX").is_none());
        assert!(json.get("keyframes").is_none());
    }

    #[test]
    fn test_clip_parses_minimal_smart_edit_shape() {
        let raw = r#"{
            "id": "c9",
            "assetId": "17",
            "startTime": 0,
            "endTime": 2500,
            "trimStart": 1200,
            "trimEnd": 0,
            "duration": 9000,
            "name": "Beat 1",
            "type": "video",
            "transitionIn": { "type": "fade", "durationMs": 300 }
        }"#;
        let clip: Clip = serde_json::from_str(raw).unwrap();
        assert_eq!(clip.trim_start, 1200.0);
        assert_eq!(clip.volume, 1.0);
        assert_eq!(clip.filters.speed, 1.0);
        assert_eq!(
            clip.transition_in,
            Some(Transition {
                kind: "fade".to_string(),
                duration_ms: 300.0
            })
        );
    }

    #[test]
    fn test_patch_shallow_merge() {
        let mut clip = Clip::new("c1", "a1", ClipKind::Video, 0.0, 1000.0);
        clip.rotation = Some(45.0);
        let patch = ClipPatch {
            volume: Some(0.5),
            position_x: Some(10.0),
            ..ClipPatch::default()
        };
        patch.apply_to(&mut clip);
        assert_eq!(clip.volume, 0.5);
        assert_eq!(clip.position_x, Some(10.0));
        assert_eq!(clip.rotation, Some(45.0));
        assert_eq!(clip.end_time, 1000.0);
    }

    #[test]
    fn test_patch_null_transition_clears() {
        let mut clip = Clip::new("c1", "a1", ClipKind::Video, 0.0, 1000.0);
        clip.transition_in = Some(Transition {
            kind: "wipe".to_string(),
            duration_ms: 200.0,
        });

        let untouched: ClipPatch = serde_json::from_str(r#"{ "volume": 0.2 }"#).unwrap();
        assert_eq!(untouched.transition_in, None);
        untouched.apply_to(&mut clip);
        assert!(clip.transition_in.is_some());

        let clearing: ClipPatch = serde_json::from_str(r#"{ "transitionIn": null }"#).unwrap();
        assert_eq!(clearing.transition_in, Some(None));
        clearing.apply_to(&mut clip);
        assert!(clip.transition_in.is_none());
    }

    #[test]
    fn test_spec_from_clip_is_lossless() {
        let mut clip = Clip::new("c1", "a1", ClipKind::Text, 500.0, 2500.0);
        clip.trim_start = 40.0;
        clip.source_duration = 9000.0;
        clip.text_content = Some("Hello".to_string());
        clip.font_size = Some(48.0);
        clip.crop_left = Some(0.1);
        clip.keyframes.set_keyframe(
            crate::keyframe::AnimatableProperty::TextRevealProgress,
            0.0,
            0.0,
            crate::keyframe::Easing::Linear,
        );

        let rebuilt = ClipSpec::from(clip.clone()).into_clip("c1".to_string(), "");
        assert_eq!(rebuilt, clip);
    }

    #[test]
    fn test_bounds_patch_serializes_only_bounds() {
        let clip = Clip::new("c1", "a1", ClipKind::Video, 100.0, 900.0);
        let json = serde_json::to_value(ClipPatch::bounds_of(&clip)).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["startTime"], 100.0);
        assert_eq!(obj["trimEnd"], 0.0);
    }
}
