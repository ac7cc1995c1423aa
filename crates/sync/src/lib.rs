//! Splice Collaboration Sync
//!
//! Keeps several editors on the same project in step through a relay.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐  SyncHandle   ┌─────────────────┐  Channel  ┌───────┐
//! │     CollabEditor     │ ────────────▶ │   SyncSession   │ ◀───────▶ │ relay │
//! │ Editor + Presence    │ ◀──────────── │ (tokio task)    │           └───────┘
//! └──────────────────────┘ SessionEvent  └─────────────────┘
//! ```
//!
//! The editor side is synchronous and owns the document. The session task
//! owns the connection: heartbeats, reconnect backoff and the cursor
//! throttle. Conflicts resolve as last-applied-wins.

pub mod client;
pub mod connection;
pub mod loopback;
pub mod presence;
pub mod protocol;
pub mod session;
pub mod transport;

pub use client::CollabEditor;
pub use connection::{ConnectionMachine, ConnectionState};
pub use loopback::{RelayConnector, RelayHub};
pub use presence::{Collaborator, PresenceRegistry};
pub use protocol::{ClientMessage, JobUpdate, ServerMessage, UserMeta};
pub use session::{SessionEvent, SyncHandle, SyncSession};
pub use transport::{Channel, Connector};
