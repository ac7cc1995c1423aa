//! In-process project room.
//!
//! [`RelayHub`] behaves like the project websocket endpoint: presence on
//! join, relaying of operations, selection and cursor frames to everyone
//! else, heartbeat and auto-save acknowledgements. It keeps the whole room
//! in memory and is meant for tests and offline demos.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use splice_common::error::{SpliceError, SpliceResult};
use splice_engine::PeerId;

use crate::protocol::{JobUpdate, ServerMessage, UserMeta};
use crate::transport::{Channel, Connector};

/// Cycled through as users join.
pub const USER_COLORS: [&str; 10] = [
    "#3b82f6", "#ef4444", "#22c55e", "#f59e0b", "#a855f7", "#ec4899", "#06b6d4", "#f97316",
    "#6366f1", "#14b8a6",
];

type ConnId = u64;

struct Member {
    meta: UserMeta,
    outbox: mpsc::UnboundedSender<String>,
}

struct Room {
    members: BTreeMap<ConnId, Member>,
    next_conn: ConnId,
    color_counter: usize,
    accepting: bool,
    version: u64,
    saved: Option<Value>,
    /// Frame types received, by sender.
    log: Vec<(PeerId, String)>,
}

impl Default for Room {
    fn default() -> Self {
        Self {
            members: BTreeMap::new(),
            next_conn: 0,
            color_counter: 0,
            accepting: true,
            version: 0,
            saved: None,
            log: Vec::new(),
        }
    }
}

impl Room {
    fn next_color(&mut self) -> String {
        let color = USER_COLORS[self.color_counter % USER_COLORS.len()];
        self.color_counter += 1;
        color.to_string()
    }

    fn send_to(&mut self, conn: ConnId, message: &ServerMessage) {
        let Ok(frame) = message.encode() else {
            return;
        };
        let gone = self
            .members
            .get(&conn)
            .is_some_and(|member| member.outbox.send(frame).is_err());
        if gone {
            self.members.remove(&conn);
        }
    }

    fn broadcast(&mut self, message: &ServerMessage, exclude: Option<ConnId>) {
        let Ok(frame) = message.encode() else {
            return;
        };
        let dead: Vec<ConnId> = self
            .members
            .iter()
            .filter(|(conn, _)| Some(**conn) != exclude)
            .filter(|(_, member)| member.outbox.send(frame.clone()).is_err())
            .map(|(conn, _)| *conn)
            .collect();
        for conn in dead {
            self.members.remove(&conn);
        }
    }

    fn users(&self) -> Vec<UserMeta> {
        self.members.values().map(|m| m.meta.clone()).collect()
    }

    fn leave(&mut self, conn: ConnId) {
        if let Some(member) = self.members.remove(&conn) {
            let user_id = member.meta.user_id;
            tracing::debug!(user_id, "Relay member left");
            self.broadcast(&ServerMessage::UserLeft { user_id }, None);
        }
    }

    fn handle(&mut self, conn: ConnId, frame: &str) -> SpliceResult<()> {
        let user_id = self
            .members
            .get(&conn)
            .map(|m| m.meta.user_id)
            .ok_or_else(|| SpliceError::transport("connection dropped"))?;

        let Ok(msg) = serde_json::from_str::<Value>(frame) else {
            self.send_to(conn, &error("Invalid JSON"));
            return Ok(());
        };
        let kind = msg.get("type").and_then(Value::as_str).unwrap_or_default();
        self.log.push((user_id, kind.to_string()));

        match kind {
            "auto_save" => match msg.get("project_data") {
                Some(data) if !data.is_null() => {
                    self.version += 1;
                    self.saved = Some(data.clone());
                    let ack = ServerMessage::AutoSaveAck {
                        success: true,
                        version: self.version,
                    };
                    self.send_to(conn, &ack);
                }
                _ => self.send_to(conn, &error("Missing project_data in auto_save message")),
            },
            "project_update" => match msg.get("project_data") {
                Some(data) if !data.is_null() => {
                    let sync = ServerMessage::ProjectSync {
                        project_data: data.clone(),
                    };
                    self.broadcast(&sync, Some(conn));
                }
                _ => self.send_to(conn, &error("Missing project_data in project_update message")),
            },
            "operation" => {
                let op = ServerMessage::RemoteOp {
                    user_id,
                    op_type: string_field(&msg, "op_type"),
                    payload: msg.get("payload").cloned().unwrap_or(Value::Null),
                };
                self.broadcast(&op, Some(conn));
            }
            "selection" => {
                let selected_clip_ids = msg
                    .get("selectedClipIds")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                let update = ServerMessage::SelectionUpdate {
                    user_id,
                    selected_clip_ids,
                };
                self.broadcast(&update, Some(conn));
            }
            "cursor" => {
                let update = ServerMessage::CursorUpdate {
                    user_id,
                    current_time: msg.get("currentTime").and_then(Value::as_f64).unwrap_or(0.0),
                };
                self.broadcast(&update, Some(conn));
            }
            "heartbeat" => self.send_to(conn, &ServerMessage::HeartbeatAck),
            other => self.send_to(conn, &error(&format!("Unknown message type: {other}"))),
        }
        Ok(())
    }
}

fn error(detail: &str) -> ServerMessage {
    ServerMessage::Error {
        detail: detail.to_string(),
    }
}

fn string_field(msg: &Value, key: &str) -> String {
    msg.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Shared handle to one room.
#[derive(Clone, Default)]
pub struct RelayHub {
    room: Arc<Mutex<Room>>,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn room(&self) -> MutexGuard<'_, Room> {
        self.room.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connector that joins this room as the given user.
    pub fn connector(&self, user_id: PeerId, username: &str) -> Arc<RelayConnector> {
        Arc::new(RelayConnector {
            hub: self.clone(),
            user_id,
            username: username.to_string(),
        })
    }

    /// Refuse (or accept again) new connections.
    pub fn set_accepting(&self, accepting: bool) {
        self.room().accepting = accepting;
    }

    /// Cut every connection of `user_id` as if the network failed.
    pub fn drop_connection(&self, user_id: PeerId) {
        let mut room = self.room();
        let conns: Vec<ConnId> = room
            .members
            .iter()
            .filter(|(_, m)| m.meta.user_id == user_id)
            .map(|(conn, _)| *conn)
            .collect();
        for conn in conns {
            room.leave(conn);
        }
    }

    /// Push a job status update to everyone in the room.
    pub fn publish_job_status(&self, payload: JobUpdate) {
        self.room()
            .broadcast(&ServerMessage::JobStatus { payload }, None);
    }

    pub fn member_count(&self) -> usize {
        self.room().members.len()
    }

    pub fn users(&self) -> Vec<UserMeta> {
        self.room().users()
    }

    /// Version of the last auto-saved document. 0 if never saved.
    pub fn version(&self) -> u64 {
        self.room().version
    }

    pub fn saved_project(&self) -> Option<Value> {
        self.room().saved.clone()
    }

    /// Types of the frames `user_id` has sent, in arrival order.
    pub fn frames_from(&self, user_id: PeerId) -> Vec<String> {
        self.room()
            .log
            .iter()
            .filter(|(from, _)| *from == user_id)
            .map(|(_, kind)| kind.clone())
            .collect()
    }

    fn join(&self, user_id: PeerId, username: &str) -> SpliceResult<RelayChannel> {
        let mut room = self.room();
        if !room.accepting {
            return Err(SpliceError::transport("relay refused connection"));
        }

        let conn = room.next_conn;
        room.next_conn += 1;
        let meta = UserMeta {
            user_id,
            username: username.to_string(),
            color: room.next_color(),
        };
        let (outbox, inbox) = mpsc::unbounded_channel();
        room.members.insert(
            conn,
            Member {
                meta: meta.clone(),
                outbox,
            },
        );

        let users = room.users();
        room.send_to(conn, &ServerMessage::Presence { users });
        room.broadcast(&ServerMessage::UserJoined(meta), Some(conn));
        tracing::debug!(user_id, conn, "Relay member joined");

        Ok(RelayChannel {
            hub: self.clone(),
            conn,
            inbox,
        })
    }
}

pub struct RelayConnector {
    hub: RelayHub,
    user_id: PeerId,
    username: String,
}

#[async_trait]
impl Connector for RelayConnector {
    async fn connect(&self) -> SpliceResult<Box<dyn Channel>> {
        let channel = self.hub.join(self.user_id, &self.username)?;
        Ok(Box::new(channel))
    }
}

struct RelayChannel {
    hub: RelayHub,
    conn: ConnId,
    inbox: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl Channel for RelayChannel {
    async fn send(&mut self, frame: String) -> SpliceResult<()> {
        self.hub.room().handle(self.conn, &frame)
    }

    async fn recv(&mut self) -> Option<SpliceResult<String>> {
        self.inbox.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.hub.room().leave(self.conn);
        self.inbox.close();
    }
}

impl Drop for RelayChannel {
    fn drop(&mut self) {
        self.hub.room().leave(self.conn);
    }
}
