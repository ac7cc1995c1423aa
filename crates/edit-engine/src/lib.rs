//! Splice Edit Engine
//!
//! Everything that changes a timeline goes through this crate:
//! - **Edit:** Total edit functions that keep positional and kind invariants
//! - **Operations:** Replayable descriptors exchanged with collaborators
//! - **Snap:** Magnetic snapping of dragged clips and trim handles
//! - **History:** Bounded snapshot undo/redo
//! - **Editor:** The facade tying a document, its session state and history
//!
//! This crate is pure computation. No I/O, no clocks, no async.

pub mod edit;
pub mod editor;
pub mod history;
pub mod ops;
pub mod snap;

pub use edit::TrimSide;
pub use editor::{EditCommand, Editor, EditorSession, Origin, Outcome, PeerId};
pub use history::History;
pub use ops::{Operation, OperationError};
pub use snap::{SnapPoint, SnapResult, SnapSource};
