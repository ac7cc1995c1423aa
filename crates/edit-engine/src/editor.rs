//! The editor facade.
//!
//! [`Editor`] owns one live document, the transient session state around it
//! and its undo history. All content changes go through
//! [`Editor::execute`], which applies a command, records history, and
//! reports the operations a collaborator should see.
//!
//! Commands carry an [`Origin`]. Commands replayed from a peer are applied
//! and recorded exactly like local ones, but never produce a broadcast, so
//! remote edits cannot echo back onto the network.

use splice_common::config::EditorDefaults;
use splice_model::{
    AnimatableProperty, ClipPatch, ClipSpec, Easing, Millis, ProjectDocument, Timeline,
    TimelineDocument, TrackKind,
};

use crate::edit::{self, TrimSide};
use crate::history::{History, DEFAULT_CAPACITY};
use crate::ops::{AddClipOp, AddTrackOp, Operation, SplitClipOp, TrackRef};
use crate::snap::{self, SnapPoint, SNAP_THRESHOLD_PX};

/// Collaborator identity as assigned by the relay.
pub type PeerId = u64;

/// Who asked for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote(PeerId),
}

impl Origin {
    pub fn is_remote(&self) -> bool {
        matches!(self, Origin::Remote(_))
    }
}

/// Result of [`Editor::execute`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub applied: bool,
    /// Operations to send to collaborators. Always empty for remote origin.
    pub broadcast: Vec<Operation>,
}

impl Outcome {
    pub fn rejected() -> Self {
        Self::default()
    }

    fn applied(broadcast: Vec<Operation>) -> Self {
        Self {
            applied: true,
            broadcast,
        }
    }

    fn applied_if(applied: bool, broadcast: impl FnOnce() -> Vec<Operation>) -> Self {
        if applied {
            Self::applied(broadcast())
        } else {
            Self::rejected()
        }
    }
}

/// Non-content editor state. Never part of undo history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorSession {
    pub playhead: Millis,
    pub playing: bool,
    /// Selected clip ids in selection order.
    pub selection: Vec<String>,
    /// Point the last snap query locked onto, for drawing the guide line.
    pub snap_indicator: Option<SnapPoint>,
}

/// A content-changing request.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    AddTrack {
        kind: TrackKind,
        name: Option<String>,
        id: Option<String>,
    },
    RemoveTrack {
        track_id: String,
    },
    ToggleTrackMute {
        track_id: String,
    },
    ToggleTrackLock {
        track_id: String,
    },
    ToggleTrackVisibility {
        track_id: String,
    },
    AddClip {
        track_id: String,
        spec: ClipSpec,
    },
    RemoveClip {
        track_id: String,
        clip_id: String,
    },
    MoveClip {
        from_track_id: String,
        to_track_id: String,
        clip_id: String,
        new_start: Millis,
    },
    TrimClip {
        track_id: String,
        clip_id: String,
        side: TrimSide,
        new_time: Millis,
    },
    SplitClip {
        track_id: String,
        clip_id: String,
        split_time: Millis,
        ids: Option<(String, String)>,
    },
    UpdateClip {
        track_id: String,
        clip_id: String,
        patch: ClipPatch,
    },
    SetKeyframe {
        track_id: String,
        clip_id: String,
        property: AnimatableProperty,
        time: Millis,
        value: f64,
        easing: Easing,
    },
    RemoveKeyframe {
        track_id: String,
        clip_id: String,
        property: AnimatableProperty,
        time: Millis,
    },
    RemoveKeyframeTrack {
        track_id: String,
        clip_id: String,
        property: AnimatableProperty,
    },
    RemoveSelectedClips,
    UpdateSelectedClips {
        patch: ClipPatch,
    },
}

impl EditCommand {
    /// History label.
    pub fn label(&self) -> &'static str {
        match self {
            EditCommand::AddTrack { .. } => "Add track",
            EditCommand::RemoveTrack { .. } => "Remove track",
            EditCommand::ToggleTrackMute { .. } => "Toggle mute",
            EditCommand::ToggleTrackLock { .. } => "Toggle lock",
            EditCommand::ToggleTrackVisibility { .. } => "Toggle visibility",
            EditCommand::AddClip { .. } => "Add clip",
            EditCommand::RemoveClip { .. } => "Remove clip",
            EditCommand::MoveClip { .. } => "Move clip",
            EditCommand::TrimClip { .. } => "Trim clip",
            EditCommand::SplitClip { .. } => "Split clip",
            EditCommand::UpdateClip { .. } => "Update clip",
            EditCommand::SetKeyframe { .. } => "Set keyframe",
            EditCommand::RemoveKeyframe { .. } => "Remove keyframe",
            EditCommand::RemoveKeyframeTrack { .. } => "Remove animation",
            EditCommand::RemoveSelectedClips => "Remove selected clips",
            EditCommand::UpdateSelectedClips { .. } => "Update selected clips",
        }
    }
}

impl From<Operation> for EditCommand {
    fn from(op: Operation) -> Self {
        match op {
            Operation::AddClip(op) => EditCommand::AddClip {
                track_id: op.track_id,
                spec: ClipSpec::from(op.clip),
            },
            Operation::RemoveClip(op) => EditCommand::RemoveClip {
                track_id: op.track_id,
                clip_id: op.clip_id,
            },
            Operation::UpdateClip(op) => EditCommand::UpdateClip {
                track_id: op.track_id,
                clip_id: op.clip_id,
                patch: op.updates,
            },
            Operation::MoveClip(op) => EditCommand::MoveClip {
                from_track_id: op.from_track_id,
                to_track_id: op.to_track_id,
                clip_id: op.clip_id,
                new_start: op.new_start_time,
            },
            Operation::SplitClip(op) => EditCommand::SplitClip {
                track_id: op.track_id,
                clip_id: op.clip_id,
                split_time: op.split_time,
                ids: op.left_id.zip(op.right_id),
            },
            Operation::AddTrack(op) => EditCommand::AddTrack {
                kind: op.kind,
                name: op.name,
                id: op.track_id,
            },
            Operation::RemoveTrack(op) => EditCommand::RemoveTrack {
                track_id: op.track_id,
            },
            Operation::ToggleTrackMute(op) => EditCommand::ToggleTrackMute {
                track_id: op.track_id,
            },
        }
    }
}

/// One live document with its session state and history.
#[derive(Debug, Clone)]
pub struct Editor {
    document: TimelineDocument,
    session: EditorSession,
    history: History,
    snap_threshold_px: f64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(TimelineDocument::new())
    }
}

impl Editor {
    pub fn new(document: TimelineDocument) -> Self {
        let history = History::new(document.timeline().clone(), DEFAULT_CAPACITY);
        Self {
            document,
            session: EditorSession::default(),
            history,
            snap_threshold_px: SNAP_THRESHOLD_PX,
        }
    }

    /// Editor using configured history depth and snap radius.
    pub fn with_defaults(document: TimelineDocument, defaults: &EditorDefaults) -> Self {
        let history = History::new(document.timeline().clone(), defaults.history_capacity);
        Self {
            document,
            session: EditorSession::default(),
            history,
            snap_threshold_px: defaults.snap_threshold_px,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        self.document.timeline()
    }

    pub fn document(&self) -> &TimelineDocument {
        &self.document
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The persisted form of the live content.
    pub fn to_project(&self) -> ProjectDocument {
        ProjectDocument::new(self.timeline().clone())
    }

    /// Apply a command and record the resulting state.
    pub fn execute(&mut self, command: EditCommand, origin: Origin) -> Outcome {
        let label = command.label();
        let mut outcome = self.apply(command);

        if outcome.applied {
            self.prune_selection();
            self.history
                .record(label, self.document.timeline().clone());
        }
        if origin.is_remote() {
            outcome.broadcast.clear();
        }

        tracing::debug!(
            command = label,
            ?origin,
            applied = outcome.applied,
            broadcast = outcome.broadcast.len(),
            "Command executed"
        );
        outcome
    }

    /// Replay a peer's operation.
    pub fn apply_remote(&mut self, op: Operation, peer: PeerId) -> Outcome {
        self.execute(op.into(), Origin::Remote(peer))
    }

    fn apply(&mut self, command: EditCommand) -> Outcome {
        let doc = &mut self.document;
        match command {
            EditCommand::AddTrack { kind, name, id } => {
                let added = edit::add_track(doc, kind, name.as_deref(), id.as_deref());
                match added {
                    Some(track_id) => Outcome::applied(vec![Operation::AddTrack(AddTrackOp {
                        kind,
                        name,
                        track_id: Some(track_id),
                    })]),
                    None => Outcome::rejected(),
                }
            }
            EditCommand::RemoveTrack { track_id } => {
                let applied = edit::remove_track(doc, &track_id);
                Outcome::applied_if(applied, || {
                    vec![Operation::RemoveTrack(TrackRef { track_id })]
                })
            }
            EditCommand::ToggleTrackMute { track_id } => {
                let applied = edit::toggle_track_mute(doc, &track_id);
                Outcome::applied_if(applied, || {
                    vec![Operation::ToggleTrackMute(TrackRef { track_id })]
                })
            }
            EditCommand::ToggleTrackLock { track_id } => {
                Outcome::applied_if(edit::toggle_track_lock(doc, &track_id), Vec::new)
            }
            EditCommand::ToggleTrackVisibility { track_id } => {
                Outcome::applied_if(edit::toggle_track_visibility(doc, &track_id), Vec::new)
            }
            EditCommand::AddClip { track_id, spec } => {
                let Some(clip_id) = edit::add_clip(doc, &track_id, spec) else {
                    return Outcome::rejected();
                };
                match doc.timeline().clip(&track_id, &clip_id) {
                    Some(clip) => Outcome::applied(vec![Operation::AddClip(AddClipOp {
                        track_id,
                        clip: clip.clone(),
                    })]),
                    None => Outcome::rejected(),
                }
            }
            EditCommand::RemoveClip { track_id, clip_id } => {
                let applied = edit::remove_clip(doc, &track_id, &clip_id);
                Outcome::applied_if(applied, || {
                    vec![Operation::remove_clip(&track_id, &clip_id)]
                })
            }
            EditCommand::MoveClip {
                from_track_id,
                to_track_id,
                clip_id,
                new_start,
            } => {
                let applied =
                    edit::move_clip(doc, &from_track_id, &to_track_id, &clip_id, new_start);
                Outcome::applied_if(applied, || {
                    vec![Operation::move_clip(
                        &from_track_id,
                        &to_track_id,
                        &clip_id,
                        new_start,
                    )]
                })
            }
            EditCommand::TrimClip {
                track_id,
                clip_id,
                side,
                new_time,
            } => {
                if !edit::trim_clip(doc, &track_id, &clip_id, side, new_time) {
                    return Outcome::rejected();
                }
                Self::resulting_update(doc, &track_id, &clip_id, ClipPatch::bounds_of)
            }
            EditCommand::SplitClip {
                track_id,
                clip_id,
                split_time,
                ids,
            } => match edit::split_clip(doc, &track_id, &clip_id, split_time, ids) {
                Some((left_id, right_id)) => Outcome::applied(vec![Operation::SplitClip(
                    SplitClipOp {
                        track_id,
                        clip_id,
                        split_time,
                        left_id: Some(left_id),
                        right_id: Some(right_id),
                    },
                )]),
                None => Outcome::rejected(),
            },
            EditCommand::UpdateClip {
                track_id,
                clip_id,
                patch,
            } => {
                let applied = edit::update_clip(doc, &track_id, &clip_id, &patch);
                Outcome::applied_if(applied, || {
                    vec![Operation::update_clip(&track_id, &clip_id, patch)]
                })
            }
            EditCommand::SetKeyframe {
                track_id,
                clip_id,
                property,
                time,
                value,
                easing,
            } => {
                if !edit::set_clip_keyframe(doc, &track_id, &clip_id, property, time, value, easing)
                {
                    return Outcome::rejected();
                }
                Self::resulting_update(doc, &track_id, &clip_id, ClipPatch::keyframes_of)
            }
            EditCommand::RemoveKeyframe {
                track_id,
                clip_id,
                property,
                time,
            } => {
                if !edit::remove_clip_keyframe(doc, &track_id, &clip_id, property, time) {
                    return Outcome::rejected();
                }
                Self::resulting_update(doc, &track_id, &clip_id, ClipPatch::keyframes_of)
            }
            EditCommand::RemoveKeyframeTrack {
                track_id,
                clip_id,
                property,
            } => {
                if !edit::remove_clip_keyframe_track(doc, &track_id, &clip_id, property) {
                    return Outcome::rejected();
                }
                Self::resulting_update(doc, &track_id, &clip_id, ClipPatch::keyframes_of)
            }
            EditCommand::RemoveSelectedClips => {
                let mut broadcast = vec![];
                for clip_id in &self.session.selection {
                    let Some(track_id) = Self::owning_track(doc, clip_id) else {
                        continue;
                    };
                    if edit::remove_clip(doc, &track_id, clip_id) {
                        broadcast.push(Operation::remove_clip(&track_id, clip_id));
                    }
                }
                if !broadcast.is_empty() {
                    self.session.selection.clear();
                }
                Outcome::applied_if(!broadcast.is_empty(), || broadcast)
            }
            EditCommand::UpdateSelectedClips { patch } => {
                let mut broadcast = vec![];
                for clip_id in &self.session.selection {
                    let Some(track_id) = Self::owning_track(doc, clip_id) else {
                        continue;
                    };
                    if edit::update_clip(doc, &track_id, clip_id, &patch) {
                        broadcast.push(Operation::update_clip(&track_id, clip_id, patch.clone()));
                    }
                }
                Outcome::applied_if(!broadcast.is_empty(), || broadcast)
            }
        }
    }

    fn owning_track(doc: &TimelineDocument, clip_id: &str) -> Option<String> {
        doc.timeline()
            .find_clip(clip_id)
            .map(|(track, _)| track.id.clone())
    }

    /// Broadcast the post-edit state of a clip as an `update_clip`.
    fn resulting_update(
        doc: &TimelineDocument,
        track_id: &str,
        clip_id: &str,
        fields: fn(&splice_model::Clip) -> ClipPatch,
    ) -> Outcome {
        match doc.timeline().clip(track_id, clip_id) {
            Some(clip) => Outcome::applied(vec![Operation::update_clip(
                track_id,
                clip_id,
                fields(clip),
            )]),
            None => Outcome::rejected(),
        }
    }

    // Transactions

    /// Fold subsequent commands into one history entry.
    pub fn begin_transaction(&mut self, label: &str) {
        self.history.begin_transaction(label);
    }

    pub fn commit_transaction(&mut self) -> bool {
        self.history
            .commit_transaction(self.document.timeline().clone())
    }

    // History

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous snapshot. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        if self.history.in_transaction() {
            self.commit_transaction();
        }
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    /// Reapply the next snapshot. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        if self.history.in_transaction() {
            self.commit_transaction();
        }
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    fn restore(&mut self, snapshot: Timeline) {
        self.document.replace_timeline(snapshot);
        self.prune_selection();
        self.session.snap_indicator = None;
    }

    /// Open a different document. History starts over and the session
    /// is cleared.
    pub fn load_document(&mut self, timeline: Timeline) {
        self.document.replace_timeline(timeline);
        self.history.reset(self.document.timeline().clone());
        self.session = EditorSession::default();
        tracing::info!(
            tracks = self.timeline().tracks.len(),
            clips = self.timeline().clip_count(),
            "Document loaded"
        );
    }

    /// Replace content with an authoritative copy from a peer. Recorded as
    /// one undoable step.
    pub fn replace_content(&mut self, timeline: Timeline) -> bool {
        self.document.replace_timeline(timeline);
        self.prune_selection();
        self.history
            .record("Sync", self.document.timeline().clone())
    }

    // View settings: part of the snapshot but not undo steps of their own.
    // Each change is folded into the current history entry.

    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom > 0.0 && zoom.is_finite() {
            self.document.timeline_mut().zoom = zoom;
            self.history.amend_view(self.document.timeline());
        }
    }

    pub fn set_scroll_x(&mut self, scroll_x: f64) {
        self.document.timeline_mut().scroll_x = scroll_x.max(0.0);
        self.history.amend_view(self.document.timeline());
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.document.timeline_mut().snap_enabled = enabled;
        self.history.amend_view(self.document.timeline());
        if !enabled {
            self.session.snap_indicator = None;
        }
    }

    // Session

    pub fn set_playhead(&mut self, time: Millis) {
        self.session.playhead = time.max(0.0);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.session.playing = playing;
    }

    pub fn selection(&self) -> &[String] {
        &self.session.selection
    }

    /// Select a clip, replacing the selection unless `additive`.
    /// Returns whether the selection changed.
    pub fn select_clip(&mut self, clip_id: &str, additive: bool) -> bool {
        if !self.timeline().contains_clip_id(clip_id) {
            return false;
        }
        let before = self.session.selection.clone();
        if !additive {
            self.session.selection.clear();
        }
        if !self.session.selection.iter().any(|id| id == clip_id) {
            self.session.selection.push(clip_id.to_string());
        }
        self.session.selection != before
    }

    pub fn deselect_clip(&mut self, clip_id: &str) -> bool {
        let before = self.session.selection.len();
        self.session.selection.retain(|id| id != clip_id);
        self.session.selection.len() != before
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = !self.session.selection.is_empty();
        self.session.selection.clear();
        changed
    }

    fn prune_selection(&mut self) {
        let timeline = self.document.timeline();
        self.session
            .selection
            .retain(|id| timeline.contains_clip_id(id));
    }

    // Snapping

    /// Snapped start for dragging `clip_id` so it starts at `proposed_start`.
    ///
    /// Updates the snap indicator. With snapping disabled the proposal is
    /// returned unchanged.
    pub fn snap_move_target(&mut self, clip_id: &str, proposed_start: Millis, px_per_ms: f64) -> Millis {
        let timeline = self.document.timeline();
        let Some((_, clip)) = timeline.find_clip(clip_id) else {
            self.session.snap_indicator = None;
            return proposed_start;
        };
        if !timeline.snap_enabled {
            self.session.snap_indicator = None;
            return proposed_start;
        }

        let points = snap::collect_snap_points(timeline, self.session.playhead, Some(clip_id));
        let threshold = snap::threshold_ms(self.snap_threshold_px, px_per_ms);
        let result = snap::snap_move(proposed_start, clip.length(), &points, threshold);
        self.session.snap_indicator = result.point;
        result.time
    }

    /// Snapped time for a trim handle of `clip_id` dragged to `time`.
    pub fn snap_trim_target(&mut self, clip_id: &str, time: Millis, px_per_ms: f64) -> Millis {
        let timeline = self.document.timeline();
        if !timeline.snap_enabled {
            self.session.snap_indicator = None;
            return time;
        }

        let points = snap::collect_snap_points(timeline, self.session.playhead, Some(clip_id));
        let threshold = snap::threshold_ms(self.snap_threshold_px, px_per_ms);
        let result = snap::find_snap_target(time, &points, threshold);
        self.session.snap_indicator = result.point;
        result.time
    }

    pub fn clear_snap_indicator(&mut self) {
        self.session.snap_indicator = None;
    }
}
