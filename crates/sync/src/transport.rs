//! Transport seam.
//!
//! The session speaks text frames over a [`Channel`] obtained from a
//! [`Connector`]. A websocket client implements these two traits in the
//! browser shell; tests use the in-process relay in [`crate::loopback`].

use async_trait::async_trait;

use splice_common::error::SpliceResult;

/// Opens channels to the project room.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> SpliceResult<Box<dyn Channel>>;
}

/// One open, bidirectional text channel.
#[async_trait]
pub trait Channel: Send {
    async fn send(&mut self, frame: String) -> SpliceResult<()>;

    /// Next inbound frame. `None` once the remote end has closed.
    ///
    /// Must be cancel-safe: the session polls it inside `select!`.
    async fn recv(&mut self) -> Option<SpliceResult<String>>;

    async fn close(&mut self);
}
