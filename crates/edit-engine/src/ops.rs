//! Replayable operation descriptors.
//!
//! An [`Operation`] is the unit of replication: the minimal payload needed
//! to re-run one edit function on another client. On the wire it travels
//! as `{ "op_type": "move_clip", "payload": { ... } }` with camelCase
//! payload fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use splice_model::{Clip, ClipPatch, Millis, TrackKind};

/// Every `op_type` this crate understands.
pub const OP_TYPES: [&str; 8] = [
    "add_clip",
    "remove_clip",
    "update_clip",
    "move_clip",
    "split_clip",
    "add_track",
    "remove_track",
    "toggle_track_mute",
];

/// A replayable document mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op_type", content = "payload", rename_all = "snake_case")]
pub enum Operation {
    AddClip(AddClipOp),
    RemoveClip(ClipRef),
    UpdateClip(UpdateClipOp),
    MoveClip(MoveClipOp),
    SplitClip(SplitClipOp),
    AddTrack(AddTrackOp),
    RemoveTrack(TrackRef),
    ToggleTrackMute(TrackRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddClipOp {
    pub track_id: String,
    pub clip: Clip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipRef {
    pub track_id: String,
    pub clip_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClipOp {
    pub track_id: String,
    pub clip_id: String,
    pub updates: ClipPatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveClipOp {
    pub from_track_id: String,
    pub to_track_id: String,
    pub clip_id: String,
    pub new_start_time: Millis,
}

/// Split payload. The resulting ids ride along so every replica names the
/// halves identically; peers that omit them get locally generated ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitClipOp {
    pub track_id: String,
    pub clip_id: String,
    pub split_time: Millis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackOp {
    #[serde(rename = "type")]
    pub kind: TrackKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRef {
    pub track_id: String,
}

/// Errors decoding an operation received from a peer.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("Unknown operation type: {0}")]
    UnknownType(String),

    #[error("Invalid payload for {op_type}: {source}")]
    InvalidPayload {
        op_type: String,
        source: serde_json::Error,
    },
}

impl Operation {
    /// Wire name of this operation.
    pub fn op_type(&self) -> &'static str {
        match self {
            Operation::AddClip(_) => "add_clip",
            Operation::RemoveClip(_) => "remove_clip",
            Operation::UpdateClip(_) => "update_clip",
            Operation::MoveClip(_) => "move_clip",
            Operation::SplitClip(_) => "split_clip",
            Operation::AddTrack(_) => "add_track",
            Operation::RemoveTrack(_) => "remove_track",
            Operation::ToggleTrackMute(_) => "toggle_track_mute",
        }
    }

    /// Rebuild an operation from its wire parts.
    pub fn from_parts(op_type: &str, payload: Value) -> Result<Self, OperationError> {
        if !OP_TYPES.contains(&op_type) {
            return Err(OperationError::UnknownType(op_type.to_string()));
        }
        let tagged = serde_json::json!({ "op_type": op_type, "payload": payload });
        serde_json::from_value(tagged).map_err(|e| OperationError::InvalidPayload {
            op_type: op_type.to_string(),
            source: e,
        })
    }

    /// Split into `(op_type, payload)` for the wire.
    pub fn to_parts(&self) -> Result<(&'static str, Value), OperationError> {
        let mut tagged = serde_json::to_value(self).map_err(|e| OperationError::InvalidPayload {
            op_type: self.op_type().to_string(),
            source: e,
        })?;
        let payload = tagged
            .get_mut("payload")
            .map(Value::take)
            .unwrap_or(Value::Null);
        Ok((self.op_type(), payload))
    }

    pub fn move_clip(from: &str, to: &str, clip_id: &str, new_start_time: Millis) -> Self {
        Operation::MoveClip(MoveClipOp {
            from_track_id: from.to_string(),
            to_track_id: to.to_string(),
            clip_id: clip_id.to_string(),
            new_start_time,
        })
    }

    pub fn update_clip(track_id: &str, clip_id: &str, updates: ClipPatch) -> Self {
        Operation::UpdateClip(UpdateClipOp {
            track_id: track_id.to_string(),
            clip_id: clip_id.to_string(),
            updates,
        })
    }

    pub fn remove_clip(track_id: &str, clip_id: &str) -> Self {
        Operation::RemoveClip(ClipRef {
            track_id: track_id.to_string(),
            clip_id: clip_id.to_string(),
        })
    }
}
