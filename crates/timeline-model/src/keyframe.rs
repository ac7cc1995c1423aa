//! Keyframe/animation store.
//!
//! Each clip carries a map from [`AnimatableProperty`] to a time-sorted list
//! of [`Keyframe`]s. Keyframe times are relative to the clip's `startTime`.
//! Outside the span covered by a property's keyframes the property rests at
//! its default value; inside, values interpolate by the left keyframe's
//! easing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Millis;

/// Two keyframe times closer than this are the same time.
pub const TIME_EPSILON: Millis = 1e-6;

/// A property that can be animated over a clip's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimatableProperty {
    PositionX,
    PositionY,
    ScaleX,
    ScaleY,
    Rotation,
    Opacity,
    Volume,
    Blur,
    TextRevealProgress,
}

impl AnimatableProperty {
    /// Value the property rests at when no animation covers the time.
    pub fn default_value(&self) -> f64 {
        match self {
            AnimatableProperty::PositionX
            | AnimatableProperty::PositionY
            | AnimatableProperty::Rotation
            | AnimatableProperty::Blur => 0.0,
            AnimatableProperty::ScaleX
            | AnimatableProperty::ScaleY
            | AnimatableProperty::Opacity
            | AnimatableProperty::Volume
            | AnimatableProperty::TextRevealProgress => 1.0,
        }
    }
}

/// Easing applied from a keyframe to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Keep the left value until the next keyframe.
    Hold,
}

impl Easing {
    /// Map normalized segment progress `t` in `[0, 1]` through the curve.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::Hold => 0.0,
        }
    }
}

/// A single `(time, value, easing)` sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Milliseconds from the clip start.
    pub time: Millis,
    pub value: f64,
    #[serde(default)]
    pub easing: Easing,
}

/// Per-property keyframe tracks of one clip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keyframes(BTreeMap<AnimatableProperty, Vec<Keyframe>>);

impl Keyframes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keyframes of one property, sorted by time.
    pub fn track(&self, property: AnimatableProperty) -> &[Keyframe] {
        self.0.get(&property).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Properties that currently have at least one keyframe.
    pub fn properties(&self) -> impl Iterator<Item = AnimatableProperty> + '_ {
        self.0.keys().copied()
    }

    /// Insert a keyframe, replacing any existing one at the same time.
    pub fn set_keyframe(
        &mut self,
        property: AnimatableProperty,
        time: Millis,
        value: f64,
        easing: Easing,
    ) {
        let keyframe = Keyframe {
            time,
            value,
            easing,
        };
        let track = self.0.entry(property).or_default();
        match track.iter().position(|k| k.time >= time - TIME_EPSILON) {
            Some(idx) if (track[idx].time - time).abs() < TIME_EPSILON => track[idx] = keyframe,
            Some(idx) => track.insert(idx, keyframe),
            None => track.push(keyframe),
        }
    }

    /// Remove the keyframe at `time`. Returns whether one was removed.
    ///
    /// A property left without keyframes is dropped entirely.
    pub fn remove_keyframe(&mut self, property: AnimatableProperty, time: Millis) -> bool {
        let Some(track) = self.0.get_mut(&property) else {
            return false;
        };
        let before = track.len();
        track.retain(|k| (k.time - time).abs() >= TIME_EPSILON);
        let removed = track.len() != before;
        if track.is_empty() {
            self.0.remove(&property);
        }
        removed
    }

    /// Drop a property's whole animation. Returns whether it existed.
    pub fn remove_track(&mut self, property: AnimatableProperty) -> bool {
        self.0.remove(&property).is_some()
    }

    /// Animated value of `property` at clip-relative `time`.
    pub fn value_at(&self, property: AnimatableProperty, time: Millis) -> f64 {
        evaluate(self.track(property), time).unwrap_or_else(|| property.default_value())
    }
}

/// Evaluate a sorted keyframe list; `None` when `time` is outside its span.
fn evaluate(track: &[Keyframe], time: Millis) -> Option<f64> {
    let first = track.first()?;
    let last = track.last()?;
    if time < first.time - TIME_EPSILON || time > last.time + TIME_EPSILON {
        return None;
    }

    for pair in track.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if time <= a.time + TIME_EPSILON {
            return Some(a.value);
        }
        if time < b.time - TIME_EPSILON {
            let span = b.time - a.time;
            let t = if span <= 0.0 { 0.0 } else { (time - a.time) / span };
            return Some(a.value + (b.value - a.value) * a.easing.apply(t));
        }
    }

    Some(last.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(keyframes: &Keyframes, property: AnimatableProperty) -> Vec<Millis> {
        keyframes.track(property).iter().map(|k| k.time).collect()
    }

    #[test]
    fn test_set_keyframe_keeps_sorted_order() {
        let mut kf = Keyframes::new();
        kf.set_keyframe(AnimatableProperty::Opacity, 500.0, 1.0, Easing::Linear);
        kf.set_keyframe(AnimatableProperty::Opacity, 0.0, 0.0, Easing::Linear);
        kf.set_keyframe(AnimatableProperty::Opacity, 250.0, 0.5, Easing::Linear);
        assert_eq!(
            times(&kf, AnimatableProperty::Opacity),
            vec![0.0, 250.0, 500.0]
        );
    }

    #[test]
    fn test_set_keyframe_replaces_same_time() {
        let mut kf = Keyframes::new();
        kf.set_keyframe(AnimatableProperty::ScaleX, 100.0, 1.0, Easing::Linear);
        kf.set_keyframe(AnimatableProperty::ScaleX, 100.0, 2.0, Easing::EaseIn);
        let track = kf.track(AnimatableProperty::ScaleX);
        assert_eq!(track.len(), 1);
        assert_eq!(track[0].value, 2.0);
        assert_eq!(track[0].easing, Easing::EaseIn);
    }

    #[test]
    fn test_remove_keyframe_drops_empty_property() {
        let mut kf = Keyframes::new();
        kf.set_keyframe(AnimatableProperty::Rotation, 0.0, 0.0, Easing::Linear);
        assert!(kf.remove_keyframe(AnimatableProperty::Rotation, 0.0));
        assert!(kf.is_empty());
        assert!(!kf.remove_keyframe(AnimatableProperty::Rotation, 0.0));
    }

    #[test]
    fn test_remove_track() {
        let mut kf = Keyframes::new();
        kf.set_keyframe(AnimatableProperty::PositionX, 0.0, -100.0, Easing::EaseOut);
        kf.set_keyframe(AnimatableProperty::PositionX, 400.0, 0.0, Easing::Linear);
        kf.set_keyframe(AnimatableProperty::Opacity, 0.0, 0.0, Easing::Linear);
        assert!(kf.remove_track(AnimatableProperty::PositionX));
        assert!(kf.track(AnimatableProperty::PositionX).is_empty());
        assert_eq!(kf.track(AnimatableProperty::Opacity).len(), 1);
    }

    #[test]
    fn test_value_at_rests_at_default_outside_animation() {
        let mut kf = Keyframes::new();
        kf.set_keyframe(AnimatableProperty::Opacity, 1000.0, 0.0, Easing::Linear);
        kf.set_keyframe(AnimatableProperty::Opacity, 2000.0, 0.5, Easing::Linear);
        assert_eq!(kf.value_at(AnimatableProperty::Opacity, 500.0), 1.0);
        assert_eq!(kf.value_at(AnimatableProperty::Opacity, 2500.0), 1.0);
        assert_eq!(kf.value_at(AnimatableProperty::ScaleY, 0.0), 1.0);
        assert_eq!(kf.value_at(AnimatableProperty::PositionY, 0.0), 0.0);
    }

    #[test]
    fn test_value_at_interpolates() {
        let mut kf = Keyframes::new();
        kf.set_keyframe(AnimatableProperty::PositionX, 0.0, 0.0, Easing::Linear);
        kf.set_keyframe(AnimatableProperty::PositionX, 1000.0, 100.0, Easing::Linear);
        assert!((kf.value_at(AnimatableProperty::PositionX, 250.0) - 25.0).abs() < 1e-9);
        assert_eq!(kf.value_at(AnimatableProperty::PositionX, 1000.0), 100.0);

        kf.set_keyframe(AnimatableProperty::PositionX, 0.0, 0.0, Easing::Hold);
        assert_eq!(kf.value_at(AnimatableProperty::PositionX, 999.0), 0.0);

        kf.set_keyframe(AnimatableProperty::PositionX, 0.0, 0.0, Easing::EaseIn);
        assert!((kf.value_at(AnimatableProperty::PositionX, 500.0) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            assert!(easing.apply(0.0).abs() < 1e-12);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12);
        }
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_keyframes_json_shape() {
        let mut kf = Keyframes::new();
        kf.set_keyframe(AnimatableProperty::TextRevealProgress, 0.0, 0.0, Easing::EaseOut);
        let json = serde_json::to_value(&kf).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "textRevealProgress": [ { "time": 0.0, "value": 0.0, "easing": "easeOut" } ]
            })
        );
        let parsed: Keyframes = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, kf);
    }
}
