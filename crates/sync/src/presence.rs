//! Who else is in the room, and what they are looking at.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use splice_engine::PeerId;
use splice_model::Millis;

use crate::protocol::UserMeta;

/// A remote collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Collaborator {
    pub user_id: PeerId,
    pub username: String,
    /// CSS colour assigned by the relay.
    pub color: String,
    pub selection: Vec<String>,
    pub playhead: Option<Millis>,
    pub joined_at: DateTime<Utc>,
}

impl Collaborator {
    fn from_meta(meta: UserMeta) -> Self {
        Self {
            user_id: meta.user_id,
            username: meta.username,
            color: meta.color,
            selection: Vec::new(),
            playhead: None,
            joined_at: Utc::now(),
        }
    }
}

/// Collaborators keyed by user id. The local user is never listed.
#[derive(Debug, Default, Clone)]
pub struct PresenceRegistry {
    collaborators: BTreeMap<PeerId, Collaborator>,
    local_user: Option<PeerId>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude this id from the roster.
    pub fn set_local_user(&mut self, user_id: PeerId) {
        self.local_user = Some(user_id);
        self.collaborators.remove(&user_id);
    }

    pub fn local_user(&self) -> Option<PeerId> {
        self.local_user
    }

    /// Replace the roster with a full `presence` listing. Known users keep
    /// their selection, playhead and join time.
    pub fn replace_roster(&mut self, users: Vec<UserMeta>) {
        let mut previous = std::mem::take(&mut self.collaborators);
        for meta in users {
            if Some(meta.user_id) == self.local_user {
                continue;
            }
            let entry = match previous.remove(&meta.user_id) {
                Some(mut existing) => {
                    existing.username = meta.username;
                    existing.color = meta.color;
                    existing
                }
                None => Collaborator::from_meta(meta),
            };
            self.collaborators.insert(entry.user_id, entry);
        }
    }

    /// Returns `false` if the user was already present (their metadata is
    /// refreshed) or is the local user.
    pub fn join(&mut self, meta: UserMeta) -> bool {
        if Some(meta.user_id) == self.local_user {
            return false;
        }
        if let Some(existing) = self.collaborators.get_mut(&meta.user_id) {
            existing.username = meta.username;
            existing.color = meta.color;
            return false;
        }
        tracing::info!(user_id = meta.user_id, username = %meta.username, "Collaborator joined");
        self.collaborators
            .insert(meta.user_id, Collaborator::from_meta(meta));
        true
    }

    pub fn leave(&mut self, user_id: PeerId) -> Option<Collaborator> {
        let left = self.collaborators.remove(&user_id);
        if left.is_some() {
            tracing::info!(user_id, "Collaborator left");
        }
        left
    }

    /// Updates for users we have not been told about are ignored.
    pub fn update_selection(&mut self, user_id: PeerId, selection: Vec<String>) -> bool {
        match self.collaborators.get_mut(&user_id) {
            Some(c) => {
                c.selection = selection;
                true
            }
            None => false,
        }
    }

    pub fn update_playhead(&mut self, user_id: PeerId, time: Millis) -> bool {
        match self.collaborators.get_mut(&user_id) {
            Some(c) => {
                c.playhead = Some(time);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, user_id: PeerId) -> Option<&Collaborator> {
        self.collaborators.get(&user_id)
    }

    /// Collaborators ordered by user id.
    pub fn collaborators(&self) -> impl Iterator<Item = &Collaborator> {
        self.collaborators.values()
    }

    /// Users whose selection includes `clip_id`, for drawing remote
    /// selection outlines.
    pub fn selecting(&self, clip_id: &str) -> Vec<&Collaborator> {
        self.collaborators
            .values()
            .filter(|c| c.selection.iter().any(|id| id == clip_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.collaborators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collaborators.is_empty()
    }

    pub fn clear(&mut self) {
        self.collaborators.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: PeerId, name: &str) -> UserMeta {
        UserMeta {
            user_id: id,
            username: name.into(),
            color: "#22c55e".into(),
        }
    }

    #[test]
    fn test_join_and_leave() {
        let mut presence = PresenceRegistry::new();
        assert!(presence.join(meta(2, "bo")));
        assert!(!presence.join(meta(2, "bo")));
        assert_eq!(presence.len(), 1);

        assert_eq!(presence.leave(2).unwrap().username, "bo");
        assert!(presence.leave(2).is_none());
        assert!(presence.is_empty());
    }

    #[test]
    fn test_local_user_is_never_listed() {
        let mut presence = PresenceRegistry::new();
        presence.set_local_user(1);
        assert!(!presence.join(meta(1, "me")));
        presence.replace_roster(vec![meta(1, "me"), meta(3, "cy")]);
        let ids: Vec<_> = presence.collaborators().map(|c| c.user_id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_roster_keeps_known_state() {
        let mut presence = PresenceRegistry::new();
        presence.join(meta(2, "bo"));
        presence.update_playhead(2, 900.0);
        let joined_at = presence.get(2).unwrap().joined_at;

        presence.replace_roster(vec![meta(2, "bo2"), meta(4, "di")]);
        let bo = presence.get(2).unwrap();
        assert_eq!(bo.username, "bo2");
        assert_eq!(bo.playhead, Some(900.0));
        assert_eq!(bo.joined_at, joined_at);
        assert!(presence.get(4).unwrap().playhead.is_none());
    }

    #[test]
    fn test_updates_for_unknown_users_are_ignored() {
        let mut presence = PresenceRegistry::new();
        assert!(!presence.update_selection(9, vec!["c1".into()]));
        assert!(!presence.update_playhead(9, 10.0));

        presence.join(meta(9, "ed"));
        assert!(presence.update_selection(9, vec!["c1".into()]));
        assert_eq!(presence.selecting("c1").len(), 1);
        assert!(presence.selecting("c2").is_empty());
    }
}
