//! Id generation scoped to one document instance.

/// Generates clip and track ids unique within its document.
///
/// Ids look like `clip-<tag>-<n>`. The tag is random per generator so two
/// clients editing the same document do not mint colliding ids.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    tag: String,
    next: u64,
}

impl IdGenerator {
    /// Generator with a random tag.
    pub fn new() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self::with_tag(&uuid[..8])
    }

    /// Generator with a fixed tag (for tests and deterministic replays).
    pub fn with_tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            next: 1,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Next clip id for which `taken` is false.
    pub fn next_clip_id(&mut self, taken: impl Fn(&str) -> bool) -> String {
        self.next_id("clip", taken)
    }

    /// Next track id for which `taken` is false.
    pub fn next_track_id(&mut self, taken: impl Fn(&str) -> bool) -> String {
        self.next_id("track", taken)
    }

    fn next_id(&mut self, prefix: &str, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = format!("{prefix}-{}-{}", self.tag, self.next);
            self.next += 1;
            if !taken(&id) {
                return id;
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
