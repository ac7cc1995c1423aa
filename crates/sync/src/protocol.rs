//! Wire protocol for the project room.
//!
//! Every frame is a JSON object with a `type` discriminator. Field names
//! follow what the relay speaks: snake_case for ids and document payloads,
//! camelCase for the presence fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use splice_common::error::{SpliceError, SpliceResult};
use splice_engine::{Operation, PeerId};
use splice_model::Millis;

/// Frames this client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Heartbeat,
    ProjectUpdate {
        project_data: Value,
    },
    AutoSave {
        project_data: Value,
    },
    Operation {
        op_type: String,
        payload: Value,
    },
    Selection {
        #[serde(rename = "selectedClipIds")]
        selected_clip_ids: Vec<String>,
    },
    Cursor {
        #[serde(rename = "currentTime")]
        current_time: Millis,
    },
}

impl ClientMessage {
    /// Wrap an edit operation for broadcast.
    pub fn operation(op: &Operation) -> SpliceResult<Self> {
        let (op_type, payload) = op
            .to_parts()
            .map_err(|e| SpliceError::protocol(e.to_string()))?;
        Ok(Self::Operation {
            op_type: op_type.to_string(),
            payload,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::ProjectUpdate { .. } => "project_update",
            Self::AutoSave { .. } => "auto_save",
            Self::Operation { .. } => "operation",
            Self::Selection { .. } => "selection",
            Self::Cursor { .. } => "cursor",
        }
    }

    pub fn encode(&self) -> SpliceResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Progress report for a background job (render, transcription, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    pub job_id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A collaborator as announced by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMeta {
    pub user_id: PeerId,
    pub username: String,
    pub color: String,
}

/// Frames the relay sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    JobProgress {
        payload: JobUpdate,
    },
    JobStatus {
        payload: JobUpdate,
    },
    ProjectSync {
        project_data: Value,
    },
    AutoSaveAck {
        success: bool,
        #[serde(default)]
        version: u64,
    },
    UserJoined(UserMeta),
    UserLeft {
        user_id: PeerId,
    },
    Presence {
        users: Vec<UserMeta>,
    },
    RemoteOp {
        user_id: PeerId,
        op_type: String,
        payload: Value,
    },
    SelectionUpdate {
        user_id: PeerId,
        #[serde(rename = "selectedClipIds")]
        selected_clip_ids: Vec<String>,
    },
    CursorUpdate {
        user_id: PeerId,
        #[serde(rename = "currentTime")]
        current_time: Millis,
    },
    HeartbeatAck,
    Error {
        detail: String,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    pub fn encode(&self) -> SpliceResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parse one inbound frame.
///
/// Frames without a string `type`, with an unrecognised `type`, or with a
/// malformed body are protocol errors. Callers drop them.
pub fn decode(text: &str) -> SpliceResult<ServerMessage> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SpliceError::protocol("frame has no type"))?
        .to_string();

    match serde_json::from_value(value) {
        Ok(ServerMessage::Unknown) => Err(SpliceError::protocol(format!(
            "Unknown message type: {kind}"
        ))),
        Ok(message) => Ok(message),
        Err(e) => Err(SpliceError::protocol(format!("malformed {kind}: {e}"))),
    }
}
