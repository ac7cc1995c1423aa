//! The collaborative editor.
//!
//! [`CollabEditor`] wraps an [`Editor`] and wires it to a sync session:
//! local commands go out as `operation` frames, inbound `remote_op` frames
//! are replayed with remote origin and therefore never echo back.

use std::collections::BTreeMap;

use tokio::sync::mpsc::UnboundedReceiver;

use splice_engine::{EditCommand, Editor, Operation, Origin, PeerId};
use splice_model::{Millis, ProjectDocument};

use crate::connection::ConnectionState;
use crate::presence::PresenceRegistry;
use crate::protocol::{ClientMessage, JobUpdate, ServerMessage};
use crate::session::{SessionEvent, SyncHandle};

pub struct CollabEditor {
    editor: Editor,
    sync: SyncHandle,
    presence: PresenceRegistry,
    connection: ConnectionState,
    /// Bumped on every local content change.
    revision: u64,
    /// Revision carried by the auto-save in flight.
    saving: Option<u64>,
    saved_revision: u64,
    saved_version: Option<u64>,
    jobs: BTreeMap<String, JobUpdate>,
}

impl CollabEditor {
    pub fn new(editor: Editor, sync: SyncHandle) -> Self {
        Self {
            editor,
            sync,
            presence: PresenceRegistry::new(),
            connection: ConnectionState::Disconnected,
            revision: 0,
            saving: None,
            saved_revision: 0,
            saved_version: None,
            jobs: BTreeMap::new(),
        }
    }

    /// Our own id in the room, so presence and relayed frames about us are
    /// ignored.
    pub fn with_local_user(mut self, user_id: PeerId) -> Self {
        self.presence.set_local_user(user_id);
        self
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Local content changes not yet acknowledged by an auto-save.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Server version of the last acknowledged auto-save.
    pub fn saved_version(&self) -> Option<u64> {
        self.saved_version
    }

    /// Latest status for each background job, keyed by job id.
    pub fn jobs(&self) -> &BTreeMap<String, JobUpdate> {
        &self.jobs
    }

    // Local editing

    /// Apply a local command and broadcast what it changed.
    pub fn execute(&mut self, command: EditCommand) -> bool {
        let selection = self.editor.selection().to_vec();
        let outcome = self.editor.execute(command, Origin::Local);
        if outcome.applied {
            self.revision += 1;
        }
        for op in &outcome.broadcast {
            self.broadcast(op);
        }
        self.send_selection_if_changed(&selection);
        outcome.applied
    }

    pub fn begin_transaction(&mut self, label: &str) {
        self.editor.begin_transaction(label);
    }

    pub fn commit_transaction(&mut self) -> bool {
        self.editor.commit_transaction()
    }

    /// Undo locally and push the whole document to peers.
    pub fn undo(&mut self) -> bool {
        let selection = self.editor.selection().to_vec();
        if !self.editor.undo() {
            return false;
        }
        self.after_history_move(&selection);
        true
    }

    pub fn redo(&mut self) -> bool {
        let selection = self.editor.selection().to_vec();
        if !self.editor.redo() {
            return false;
        }
        self.after_history_move(&selection);
        true
    }

    fn after_history_move(&mut self, selection: &[String]) {
        self.revision += 1;
        if let Some(project_data) = self.project_data() {
            self.sync.send(ClientMessage::ProjectUpdate { project_data });
        }
        self.send_selection_if_changed(selection);
    }

    pub fn select_clip(&mut self, clip_id: &str, additive: bool) -> bool {
        let changed = self.editor.select_clip(clip_id, additive);
        if changed {
            self.send_selection();
        }
        changed
    }

    pub fn deselect_clip(&mut self, clip_id: &str) -> bool {
        let changed = self.editor.deselect_clip(clip_id);
        if changed {
            self.send_selection();
        }
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.editor.clear_selection();
        if changed {
            self.send_selection();
        }
        changed
    }

    /// Move the playhead. Peers see it at most every throttle interval.
    pub fn set_playhead(&mut self, time: Millis) {
        self.editor.set_playhead(time);
        self.sync.cursor(self.editor.session().playhead);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.editor.set_playing(playing);
    }

    /// Send the document for persistence if anything changed since the
    /// last acknowledged save. Returns whether a save was sent.
    pub fn auto_save(&mut self) -> bool {
        if !self.is_dirty() || !self.connection.is_open() {
            return false;
        }
        let Some(project_data) = self.project_data() else {
            return false;
        };
        if self.sync.send(ClientMessage::AutoSave { project_data }) {
            self.saving = Some(self.revision);
            true
        } else {
            false
        }
    }

    pub fn disconnect(&self) {
        self.sync.disconnect();
    }

    fn project_data(&self) -> Option<serde_json::Value> {
        match serde_json::to_value(self.editor.to_project()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize document");
                None
            }
        }
    }

    fn broadcast(&self, op: &Operation) {
        match ClientMessage::operation(op) {
            Ok(message) => {
                self.sync.send(message);
            }
            Err(e) => tracing::warn!(error = %e, op_type = op.op_type(), "Dropping operation"),
        }
    }

    fn send_selection(&self) {
        self.sync.send(ClientMessage::Selection {
            selected_clip_ids: self.editor.selection().to_vec(),
        });
    }

    fn send_selection_if_changed(&self, before: &[String]) {
        if self.editor.selection() != before {
            self.send_selection();
        }
    }

    // Inbound

    /// Apply everything the session has delivered so far. Returns how many
    /// events were handled.
    pub fn drain(&mut self, events: &mut UnboundedReceiver<SessionEvent>) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged { state, gave_up } => {
                self.connection = state;
                if state == ConnectionState::Disconnected {
                    self.presence.clear();
                    self.saving = None;
                    if gave_up {
                        tracing::error!("Collaboration offline: reconnect attempts exhausted");
                    }
                }
            }
            SessionEvent::Message(message) => self.handle_message(message),
        }
    }

    pub fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::RemoteOp {
                user_id,
                op_type,
                payload,
            } => self.apply_remote(user_id, &op_type, payload),
            ServerMessage::ProjectSync { project_data } => {
                match ProjectDocument::from_value(project_data) {
                    Ok(project) => {
                        let selection = self.editor.selection().to_vec();
                        self.editor.replace_content(project.timeline);
                        self.send_selection_if_changed(&selection);
                    }
                    Err(e) => tracing::warn!(error = %e, "Ignoring unreadable project_sync"),
                }
            }
            ServerMessage::AutoSaveAck { success, version } => {
                let saved = self.saving.take();
                if success {
                    if let Some(revision) = saved {
                        self.saved_revision = revision;
                    }
                    self.saved_version = Some(version);
                    tracing::debug!(version, dirty = self.is_dirty(), "Auto-save acknowledged");
                } else {
                    tracing::warn!("Auto-save rejected");
                }
            }
            ServerMessage::Presence { users } => self.presence.replace_roster(users),
            ServerMessage::UserJoined(meta) => {
                self.presence.join(meta);
            }
            ServerMessage::UserLeft { user_id } => {
                self.presence.leave(user_id);
            }
            ServerMessage::SelectionUpdate {
                user_id,
                selected_clip_ids,
            } => {
                self.presence.update_selection(user_id, selected_clip_ids);
            }
            ServerMessage::CursorUpdate {
                user_id,
                current_time,
            } => {
                self.presence.update_playhead(user_id, current_time);
            }
            ServerMessage::JobProgress { payload } | ServerMessage::JobStatus { payload } => {
                let key = match &payload.job_id {
                    serde_json::Value::String(id) => id.clone(),
                    other => other.to_string(),
                };
                self.jobs.insert(key, payload);
            }
            ServerMessage::HeartbeatAck => tracing::trace!("Heartbeat acknowledged"),
            ServerMessage::Error { detail } => tracing::warn!(%detail, "Relay reported an error"),
            ServerMessage::Unknown => {}
        }
    }

    fn apply_remote(&mut self, user_id: PeerId, op_type: &str, payload: serde_json::Value) {
        if Some(user_id) == self.presence.local_user() {
            return;
        }
        let op = match Operation::from_parts(op_type, payload) {
            Ok(op) => op,
            Err(e) => {
                tracing::warn!(error = %e, user_id, "Dropping remote operation");
                return;
            }
        };
        let selection = self.editor.selection().to_vec();
        let outcome = self.editor.apply_remote(op, user_id);
        if !outcome.applied {
            tracing::debug!(user_id, op_type, "Remote operation rejected locally");
        }
        self.send_selection_if_changed(&selection);
    }
}
