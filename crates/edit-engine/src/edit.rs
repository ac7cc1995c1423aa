//! Edit operations over a [`TimelineDocument`].
//!
//! Every function here is total: an invalid request (unknown id, overlap on
//! move, split point outside the clip, incompatible kinds) leaves the
//! document untouched and reports that nothing was applied. Rejections are
//! logged at `debug` and never surface as errors.
//!
//! `add_clip` and `trim_clip` deliberately do not check overlap with
//! neighbouring clips; callers pick free positions and stop drags at
//! neighbour boundaries.

use splice_model::{
    AnimatableProperty, ClipPatch, ClipSpec, Easing, Millis, TimelineDocument, Track, TrackKind,
    MIN_CLIP_MS,
};

/// Which edge of a clip a trim moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimSide {
    Start,
    End,
}

/// Append a track. Returns its id.
///
/// `id` is honoured when free (remote replay); otherwise one is generated.
/// Without a `name` the track is called `"<Kind> <n+1>"` where `n` counts
/// existing tracks of that kind.
pub fn add_track(
    doc: &mut TimelineDocument,
    kind: TrackKind,
    name: Option<&str>,
    id: Option<&str>,
) -> Option<String> {
    let id = match id {
        Some(id) if doc.timeline().contains_track_id(id) => {
            tracing::debug!(track_id = id, "add_track rejected: duplicate id");
            return None;
        }
        Some(id) => id.to_string(),
        None => doc.next_track_id(),
    };

    let name = match name {
        Some(name) => name.to_string(),
        None => {
            let existing = doc
                .timeline()
                .tracks
                .iter()
                .filter(|t| t.kind == kind)
                .count();
            format!("{} {}", kind.label(), existing + 1)
        }
    };

    tracing::debug!(track_id = %id, kind = %kind, "Track added");
    doc.timeline_mut()
        .tracks
        .push(Track::new(id.clone(), name, kind));
    Some(id)
}

/// Insert a clip described by `spec`. Returns its id.
pub fn add_clip(doc: &mut TimelineDocument, track_id: &str, spec: ClipSpec) -> Option<String> {
    let Some(track) = doc.timeline().track(track_id) else {
        tracing::debug!(track_id, "add_clip rejected: unknown track");
        return None;
    };
    if !track.kind.accepts(spec.kind) {
        tracing::debug!(
            track_id,
            clip_kind = %spec.kind,
            track_kind = %track.kind,
            "add_clip rejected: incompatible kind"
        );
        return None;
    }

    let id = match spec.id.clone() {
        Some(id) if doc.timeline().contains_clip_id(&id) => {
            tracing::debug!(clip_id = %id, "add_clip rejected: duplicate id");
            return None;
        }
        Some(id) => id,
        None => doc.next_clip_id(),
    };

    let clip = spec.into_clip(id.clone(), track_id);
    let track = doc.timeline_mut().track_mut(track_id)?;
    track.clips.push(clip);
    tracing::debug!(track_id, clip_id = %id, "Clip added");
    Some(id)
}

/// Delete a clip.
pub fn remove_clip(doc: &mut TimelineDocument, track_id: &str, clip_id: &str) -> bool {
    let Some(track) = doc.timeline_mut().track_mut(track_id) else {
        tracing::debug!(track_id, "remove_clip rejected: unknown track");
        return false;
    };
    let Some(index) = track.clip_index(clip_id) else {
        tracing::debug!(track_id, clip_id, "remove_clip rejected: unknown clip");
        return false;
    };
    track.clips.remove(index);
    true
}

/// Move a clip to `new_start` on `to_track`, possibly the same track.
///
/// The start is floored at zero and the length preserved. The move is
/// rejected if the target interval intersects any other clip on the target
/// track, or if the target track does not accept the clip's kind.
pub fn move_clip(
    doc: &mut TimelineDocument,
    from_track: &str,
    to_track: &str,
    clip_id: &str,
    new_start: Millis,
) -> bool {
    let timeline = doc.timeline();
    let Some(clip) = timeline.clip(from_track, clip_id) else {
        tracing::debug!(from_track, clip_id, "move_clip rejected: unknown clip");
        return false;
    };
    let Some(target) = timeline.track(to_track) else {
        tracing::debug!(to_track, "move_clip rejected: unknown target track");
        return false;
    };
    if !target.kind.accepts(clip.kind) {
        tracing::debug!(
            clip_id,
            clip_kind = %clip.kind,
            track_kind = %target.kind,
            "move_clip rejected: incompatible kind"
        );
        return false;
    }

    let proposed_start = new_start.max(0.0);
    let proposed_end = proposed_start + clip.length();
    let blocked = !timeline
        .clips_overlapping(to_track, proposed_start..proposed_end, Some(clip_id))
        .is_empty();
    if blocked {
        tracing::debug!(
            clip_id,
            to_track,
            proposed_start,
            proposed_end,
            "move_clip rejected: overlap"
        );
        return false;
    }

    let timeline = doc.timeline_mut();
    let Some(source) = timeline.track_mut(from_track) else {
        return false;
    };
    let Some(index) = source.clip_index(clip_id) else {
        return false;
    };
    let mut moved = source.clips.remove(index);
    moved.start_time = proposed_start;
    moved.end_time = proposed_end;
    moved.track_id = to_track.to_string();

    match timeline.track_mut(to_track) {
        Some(target) => target.clips.push(moved),
        None => return false,
    }
    true
}

/// Move one edge of a clip, keeping at least [`MIN_CLIP_MS`] of length.
///
/// Trimming the start shifts `trimStart` by the same amount; trimming the end
/// recomputes `trimEnd` from the source duration. Both floor at zero.
pub fn trim_clip(
    doc: &mut TimelineDocument,
    track_id: &str,
    clip_id: &str,
    side: TrimSide,
    new_time: Millis,
) -> bool {
    let Some(clip) = doc
        .timeline_mut()
        .track_mut(track_id)
        .and_then(|t| t.clip_mut(clip_id))
    else {
        tracing::debug!(track_id, clip_id, "trim_clip rejected: unknown clip");
        return false;
    };

    match side {
        TrimSide::Start => {
            let clamped = new_time.min(clip.end_time - MIN_CLIP_MS).max(0.0);
            let delta = clamped - clip.start_time;
            clip.start_time = clamped;
            clip.trim_start = (clip.trim_start + delta).max(0.0);
        }
        TrimSide::End => {
            let clamped = new_time.max(clip.start_time + MIN_CLIP_MS);
            clip.end_time = clamped;
            clip.trim_end = (clip.source_duration
                - (clamped - clip.start_time + clip.trim_start))
                .max(0.0);
        }
    }
    true
}

/// Cut a clip in two at `split_time`. Returns the `(left, right)` ids.
///
/// No-op unless the split point lies strictly inside the clip. The original
/// id is retired. `ids` supplies both new ids during replay; ids that are
/// missing, taken or equal are replaced with generated ones.
pub fn split_clip(
    doc: &mut TimelineDocument,
    track_id: &str,
    clip_id: &str,
    split_time: Millis,
    ids: Option<(String, String)>,
) -> Option<(String, String)> {
    let Some(original) = doc.timeline().clip(track_id, clip_id).cloned() else {
        tracing::debug!(track_id, clip_id, "split_clip rejected: unknown clip");
        return None;
    };
    if !(original.start_time < split_time && split_time < original.end_time) {
        tracing::debug!(
            clip_id,
            split_time,
            start = original.start_time,
            end = original.end_time,
            "split_clip rejected: split point outside clip"
        );
        return None;
    }

    let (left_id, right_id) = match ids {
        Some((left, right))
            if left != right
                && !doc.timeline().contains_clip_id(&left)
                && !doc.timeline().contains_clip_id(&right) =>
        {
            (left, right)
        }
        _ => (doc.next_clip_id(), doc.next_clip_id()),
    };

    let offset = split_time - original.start_time;

    let mut left = original.clone();
    left.id.clone_from(&left_id);
    left.end_time = split_time;
    left.trim_end = original.trim_end + (original.end_time - split_time);

    let mut right = original;
    right.id.clone_from(&right_id);
    right.start_time = split_time;
    right.trim_start += offset;

    let track = doc.timeline_mut().track_mut(track_id)?;
    let index = track.clip_index(clip_id)?;
    track.clips[index] = left;
    track.clips.insert(index + 1, right);
    tracing::debug!(clip_id, %left_id, %right_id, split_time, "Clip split");
    Some((left_id, right_id))
}

/// Shallow-merge `patch` into a clip. No cross-field validation.
pub fn update_clip(
    doc: &mut TimelineDocument,
    track_id: &str,
    clip_id: &str,
    patch: &ClipPatch,
) -> bool {
    let Some(clip) = doc
        .timeline_mut()
        .track_mut(track_id)
        .and_then(|t| t.clip_mut(clip_id))
    else {
        tracing::debug!(track_id, clip_id, "update_clip rejected: unknown clip");
        return false;
    };
    patch.apply_to(clip);
    true
}

/// Insert or replace one keyframe on a clip.
pub fn set_clip_keyframe(
    doc: &mut TimelineDocument,
    track_id: &str,
    clip_id: &str,
    property: AnimatableProperty,
    time: Millis,
    value: f64,
    easing: Easing,
) -> bool {
    let Some(clip) = doc
        .timeline_mut()
        .track_mut(track_id)
        .and_then(|t| t.clip_mut(clip_id))
    else {
        tracing::debug!(track_id, clip_id, "set_clip_keyframe rejected: unknown clip");
        return false;
    };
    clip.keyframes.set_keyframe(property, time, value, easing);
    true
}

/// Delete the keyframe at `time`.
pub fn remove_clip_keyframe(
    doc: &mut TimelineDocument,
    track_id: &str,
    clip_id: &str,
    property: AnimatableProperty,
    time: Millis,
) -> bool {
    doc.timeline_mut()
        .track_mut(track_id)
        .and_then(|t| t.clip_mut(clip_id))
        .is_some_and(|clip| clip.keyframes.remove_keyframe(property, time))
}

/// Drop a property's whole animation from a clip.
pub fn remove_clip_keyframe_track(
    doc: &mut TimelineDocument,
    track_id: &str,
    clip_id: &str,
    property: AnimatableProperty,
) -> bool {
    doc.timeline_mut()
        .track_mut(track_id)
        .and_then(|t| t.clip_mut(clip_id))
        .is_some_and(|clip| clip.keyframes.remove_track(property))
}

/// Delete a track together with its clips.
pub fn remove_track(doc: &mut TimelineDocument, track_id: &str) -> bool {
    let tracks = &mut doc.timeline_mut().tracks;
    let Some(index) = tracks.iter().position(|t| t.id == track_id) else {
        tracing::debug!(track_id, "remove_track rejected: unknown track");
        return false;
    };
    let removed = tracks.remove(index);
    tracing::debug!(track_id, clips = removed.clips.len(), "Track removed");
    true
}

pub fn toggle_track_mute(doc: &mut TimelineDocument, track_id: &str) -> bool {
    toggle_flag(doc, track_id, |t| &mut t.muted)
}

pub fn toggle_track_lock(doc: &mut TimelineDocument, track_id: &str) -> bool {
    toggle_flag(doc, track_id, |t| &mut t.locked)
}

pub fn toggle_track_visibility(doc: &mut TimelineDocument, track_id: &str) -> bool {
    toggle_flag(doc, track_id, |t| &mut t.visible)
}

fn toggle_flag(
    doc: &mut TimelineDocument,
    track_id: &str,
    flag: impl FnOnce(&mut Track) -> &mut bool,
) -> bool {
    match doc.timeline_mut().track_mut(track_id) {
        Some(track) => {
            let value = flag(track);
            *value = !*value;
            true
        }
        None => {
            tracing::debug!(track_id, "toggle rejected: unknown track");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_model::{Clip, ClipKind, IdGenerator, Timeline};

    fn doc() -> TimelineDocument {
        let mut video = Track::new("v1", "Video 1", TrackKind::Video);
        let mut clip = Clip::new("c1", "asset", ClipKind::Video, 0.0, 6000.0);
        clip.source_duration = 6000.0;
        video.clips.push(clip);
        video
            .clips
            .push(Clip::new("c2", "asset", ClipKind::Video, 8000.0, 10000.0));
        let audio = Track::new("a1", "Audio 1", TrackKind::Audio);
        TimelineDocument::from_timeline(Timeline {
            tracks: vec![video, audio],
            ..Timeline::default()
        })
        .with_ids(IdGenerator::with_tag("t"))
    }

    #[test]
    fn test_add_track_default_name_and_height() {
        let mut doc = doc();
        let id = add_track(&mut doc, TrackKind::Video, None, None).unwrap();
        let track = doc.timeline().track(&id).unwrap();
        assert_eq!(track.name, "Video 2");
        assert_eq!(track.height, 64.0);

        let id = add_track(&mut doc, TrackKind::Sfx, None, Some("fx")).unwrap();
        assert_eq!(id, "fx");
        assert_eq!(doc.timeline().track("fx").unwrap().name, "Sfx 1");
        assert!(add_track(&mut doc, TrackKind::Sfx, None, Some("fx")).is_none());
    }

    #[test]
    fn test_add_clip_generates_id_and_defaults() {
        let mut doc = doc();
        let id = add_clip(
            &mut doc,
            "a1",
            ClipSpec::new("song", ClipKind::Audio, 0.0, 3000.0),
        )
        .unwrap();
        let clip = doc.timeline().clip("a1", &id).unwrap();
        assert!(id.starts_with("clip-t-"));
        assert_eq!(clip.track_id, "a1");
        assert_eq!(clip.filters.speed, 1.0);
        assert_eq!(clip.fade_out_ms, 0.0);
    }

    #[test]
    fn test_add_clip_rejects_kind_and_duplicate() {
        let mut doc = doc();
        let before = doc.timeline().clone();
        assert!(add_clip(&mut doc, "a1", ClipSpec::new("x", ClipKind::Video, 0.0, 500.0)).is_none());
        assert!(add_clip(
            &mut doc,
            "v1",
            ClipSpec::new("x", ClipKind::Image, 0.0, 500.0).with_id("c1")
        )
        .is_none());
        assert!(add_clip(&mut doc, "nope", ClipSpec::new("x", ClipKind::Video, 0.0, 500.0)).is_none());
        assert_eq!(doc.timeline(), &before);
    }

    #[test]
    fn test_add_clip_does_not_check_overlap() {
        let mut doc = doc();
        let added = add_clip(
            &mut doc,
            "v1",
            ClipSpec::new("x", ClipKind::Image, 1000.0, 2000.0),
        );
        assert!(added.is_some());
        assert_eq!(doc.timeline().track("v1").unwrap().clips.len(), 3);
    }

    #[test]
    fn test_move_clip_same_track() {
        let mut doc = doc();
        assert!(move_clip(&mut doc, "v1", "v1", "c2", 12000.0));
        let clip = doc.timeline().clip("v1", "c2").unwrap();
        assert_eq!((clip.start_time, clip.end_time), (12000.0, 14000.0));
    }

    #[test]
    fn test_move_clip_rejects_overlap() {
        let mut doc = doc();
        let before = doc.timeline().clone();
        assert!(!move_clip(&mut doc, "v1", "v1", "c2", 5000.0));
        assert_eq!(doc.timeline(), &before);
    }

    #[test]
    fn test_move_clip_floors_at_zero_and_abuts() {
        let mut doc = doc();
        assert!(move_clip(&mut doc, "v1", "v1", "c2", 6000.0));
        assert!(!move_clip(&mut doc, "v1", "v1", "c2", -50.0));

        let mut doc = self::doc();
        assert!(remove_clip(&mut doc, "v1", "c1"));
        assert!(move_clip(&mut doc, "v1", "v1", "c2", -50.0));
        assert_eq!(doc.timeline().clip("v1", "c2").unwrap().start_time, 0.0);
    }

    #[test]
    fn test_move_clip_cross_track_checks_kind() {
        let mut doc = doc();
        assert!(!move_clip(&mut doc, "v1", "a1", "c2", 0.0));

        add_track(&mut doc, TrackKind::Video, None, Some("v2"));
        assert!(move_clip(&mut doc, "v1", "v2", "c2", 100.0));
        assert!(doc.timeline().clip("v1", "c2").is_none());
        let moved = doc.timeline().clip("v2", "c2").unwrap();
        assert_eq!(moved.track_id, "v2");
        assert_eq!(moved.start_time, 100.0);
    }

    #[test]
    fn test_trim_start() {
        let mut doc = doc();
        assert!(trim_clip(&mut doc, "v1", "c2", TrimSide::Start, 8500.0));
        let clip = doc.timeline().clip("v1", "c2").unwrap();
        assert_eq!(clip.start_time, 8500.0);
        assert_eq!(clip.trim_start, 500.0);

        trim_clip(&mut doc, "v1", "c2", TrimSide::Start, 9990.0);
        let clip = doc.timeline().clip("v1", "c2").unwrap();
        assert_eq!(clip.start_time, 9900.0);
        assert_eq!(clip.length(), MIN_CLIP_MS);
    }

    #[test]
    fn test_trim_start_extending_left_floors_trim() {
        let mut doc = doc();
        trim_clip(&mut doc, "v1", "c2", TrimSide::Start, 7000.0);
        let clip = doc.timeline().clip("v1", "c2").unwrap();
        assert_eq!(clip.start_time, 7000.0);
        assert_eq!(clip.trim_start, 0.0);
    }

    #[test]
    fn test_trim_end() {
        let mut doc = doc();
        assert!(trim_clip(&mut doc, "v1", "c1", TrimSide::End, 4000.0));
        let clip = doc.timeline().clip("v1", "c1").unwrap();
        assert_eq!(clip.end_time, 4000.0);
        assert_eq!(clip.trim_end, 2000.0);

        trim_clip(&mut doc, "v1", "c1", TrimSide::End, -10.0);
        let clip = doc.timeline().clip("v1", "c1").unwrap();
        assert_eq!(clip.end_time, 100.0);
    }

    #[test]
    fn test_split_continuity() {
        let mut doc = doc();
        let (left_id, right_id) = split_clip(&mut doc, "v1", "c1", 3000.0, None).unwrap();
        assert_ne!(left_id, right_id);
        assert_ne!(left_id, "c1");
        assert_ne!(right_id, "c1");
        assert!(!doc.timeline().contains_clip_id("c1"));

        let left = doc.timeline().clip("v1", &left_id).unwrap();
        let right = doc.timeline().clip("v1", &right_id).unwrap();
        assert_eq!((left.start_time, left.end_time), (0.0, 3000.0));
        assert_eq!((right.start_time, right.end_time), (3000.0, 6000.0));
        assert_eq!(right.trim_start, 3000.0);
        assert_eq!(left.trim_end, 3000.0);
        assert_eq!(right.trim_start - left.trim_start, 3000.0 - left.start_time);
    }

    #[test]
    fn test_split_outside_is_noop() {
        let mut doc = doc();
        let before = doc.timeline().clone();
        assert!(split_clip(&mut doc, "v1", "c1", 0.0, None).is_none());
        assert!(split_clip(&mut doc, "v1", "c1", 6000.0, None).is_none());
        assert_eq!(doc.timeline(), &before);
    }

    #[test]
    fn test_split_uses_supplied_ids() {
        let mut doc = doc();
        let ids = split_clip(
            &mut doc,
            "v1",
            "c1",
            1000.0,
            Some(("L".to_string(), "R".to_string())),
        )
        .unwrap();
        assert_eq!(ids, ("L".to_string(), "R".to_string()));

        let ids = split_clip(
            &mut doc,
            "v1",
            "R",
            2000.0,
            Some(("L".to_string(), "R2".to_string())),
        )
        .unwrap();
        assert_ne!(ids.0, "L");
    }

    #[test]
    fn test_split_halves_inherit_keyframes() {
        let mut doc = doc();
        set_clip_keyframe(&mut doc, "v1", "c1", AnimatableProperty::Opacity, 5000.0, 0.25, Easing::Linear);
        let expected = doc.timeline().clip("v1", "c1").unwrap().keyframes.clone();

        let (left_id, right_id) = split_clip(&mut doc, "v1", "c1", 3000.0, None).unwrap();
        let left = doc.timeline().clip("v1", &left_id).unwrap();
        let right = doc.timeline().clip("v1", &right_id).unwrap();
        assert_eq!(left.keyframes, expected);
        assert_eq!(right.keyframes, expected);
        assert_eq!(right.keyframes.track(AnimatableProperty::Opacity)[0].time, 5000.0);
    }

    #[test]
    fn test_update_clip_and_keyframes() {
        let mut doc = doc();
        let patch = ClipPatch {
            rotation: Some(90.0),
            ..ClipPatch::default()
        };
        assert!(update_clip(&mut doc, "v1", "c1", &patch));
        assert!(!update_clip(&mut doc, "v1", "missing", &patch));
        assert_eq!(doc.timeline().clip("v1", "c1").unwrap().rotation, Some(90.0));

        assert!(set_clip_keyframe(&mut doc, "v1", "c1", AnimatableProperty::Blur, 0.0, 4.0, Easing::Hold));
        assert!(remove_clip_keyframe(&mut doc, "v1", "c1", AnimatableProperty::Blur, 0.0));
        assert!(!remove_clip_keyframe(&mut doc, "v1", "c1", AnimatableProperty::Blur, 0.0));
        assert!(!remove_clip_keyframe_track(&mut doc, "v1", "c1", AnimatableProperty::Blur));
    }

    #[test]
    fn test_track_flags_and_removal() {
        let mut doc = doc();
        assert!(toggle_track_mute(&mut doc, "a1"));
        assert!(toggle_track_lock(&mut doc, "a1"));
        assert!(toggle_track_visibility(&mut doc, "a1"));
        let track = doc.timeline().track("a1").unwrap();
        assert!(track.muted && track.locked && !track.visible);

        assert!(remove_track(&mut doc, "v1"));
        assert!(!doc.timeline().contains_clip_id("c1"));
        assert!(!remove_track(&mut doc, "v1"));
        assert!(!toggle_track_mute(&mut doc, "v1"));
    }
}
