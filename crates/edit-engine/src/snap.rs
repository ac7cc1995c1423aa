//! Magnetic snapping for clip drags and trim handles.
//!
//! Candidate points come from the timeline origin, the playhead, and the
//! edges of every clip other than the one being manipulated. A fixed pixel
//! threshold is converted to milliseconds with the current zoom, and the
//! closest point inside that threshold wins. Ties go to the first candidate
//! in collection order (origin, playhead, then clip edges in track order).

use splice_model::{Millis, Timeline};

/// Snap radius in screen pixels.
pub const SNAP_THRESHOLD_PX: f64 = 8.0;

/// Where a snap point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapSource {
    Origin,
    Playhead,
    ClipStart,
    ClipEnd,
}

/// A time a dragged edge may lock onto.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapPoint {
    pub time: Millis,
    pub source: SnapSource,
    /// Owning clip for clip edges.
    pub clip_id: Option<String>,
}

impl SnapPoint {
    fn new(time: Millis, source: SnapSource, clip_id: Option<&str>) -> Self {
        Self {
            time,
            source,
            clip_id: clip_id.map(str::to_string),
        }
    }
}

/// Outcome of a snap query.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// Resulting time. For [`snap_move`] this is the clip's new start.
    pub time: Millis,
    /// The point snapped to, shown as the snap indicator. `None` when
    /// nothing was in range.
    pub point: Option<SnapPoint>,
}

impl SnapResult {
    pub fn snapped(&self) -> bool {
        self.point.is_some()
    }
}

/// Convert a pixel threshold to milliseconds at `px_per_ms` zoom.
pub fn threshold_ms(threshold_px: f64, px_per_ms: f64) -> Millis {
    if px_per_ms > 0.0 && px_per_ms.is_finite() {
        threshold_px / px_per_ms
    } else {
        0.0
    }
}

/// Gather snap candidates in attribution order, skipping `exclude_clip`.
pub fn collect_snap_points(
    timeline: &Timeline,
    playhead: Millis,
    exclude_clip: Option<&str>,
) -> Vec<SnapPoint> {
    let mut points = vec![
        SnapPoint::new(0.0, SnapSource::Origin, None),
        SnapPoint::new(playhead, SnapSource::Playhead, None),
    ];
    for track in &timeline.tracks {
        for clip in &track.clips {
            if Some(clip.id.as_str()) == exclude_clip {
                continue;
            }
            points.push(SnapPoint::new(
                clip.start_time,
                SnapSource::ClipStart,
                Some(&clip.id),
            ));
            points.push(SnapPoint::new(clip.end_time, SnapSource::ClipEnd, Some(&clip.id)));
        }
    }
    points
}

/// Closest point to `time` within `threshold`, first found on ties.
fn nearest<'a>(
    time: Millis,
    points: impl IntoIterator<Item = &'a SnapPoint>,
    threshold: Millis,
) -> Option<(Millis, &'a SnapPoint)> {
    let mut best: Option<(Millis, &'a SnapPoint)> = None;
    for point in points {
        let distance = (time - point.time).abs();
        if distance > threshold {
            continue;
        }
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, point));
        }
    }
    best
}

/// Snap a single edge (trim handle, playhead scrub).
///
/// Falls back to `time` rounded to whole milliseconds with no indicator.
pub fn find_snap_target(time: Millis, points: &[SnapPoint], threshold: Millis) -> SnapResult {
    match nearest(time, points, threshold) {
        Some((_, point)) => SnapResult {
            time: point.time,
            point: Some(point.clone()),
        },
        None => SnapResult {
            time: time.round(),
            point: None,
        },
    }
}

/// Snap a dragged clip of `length` whose start would land on `start`.
///
/// Both the leading and trailing edge are tried; whichever lands closer to
/// its snap point decides the new start. The leading edge wins ties.
/// Trailing-edge points closer to zero than `length` are ignored, since the
/// clip cannot start before the origin.
pub fn snap_move(
    start: Millis,
    length: Millis,
    points: &[SnapPoint],
    threshold: Millis,
) -> SnapResult {
    let leading = nearest(start, points, threshold);
    let reachable = points.iter().filter(|p| p.time >= length);
    let trailing = nearest(start + length, reachable, threshold);

    let use_trailing = match (leading, trailing) {
        (Some((lead, _)), Some((trail, _))) => trail < lead,
        (None, Some(_)) => true,
        _ => false,
    };

    if use_trailing {
        if let Some((_, point)) = trailing {
            return SnapResult {
                time: point.time - length,
                point: Some(point.clone()),
            };
        }
    }
    match leading {
        Some((_, point)) => SnapResult {
            time: point.time,
            point: Some(point.clone()),
        },
        None => SnapResult {
            time: start.round(),
            point: None,
        },
    }
}
