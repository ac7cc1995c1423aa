//! Splice Timeline Model
//!
//! Defines the core data contracts for Splice documents:
//! - **Kinds:** Track and clip types and which clips may live on which tracks
//! - **Clips/Tracks:** Timed media references and the lanes that hold them
//! - **Keyframes:** Per-property time/value animation tracks
//! - **Timeline:** The content of a document plus read-only queries
//! - **Document:** The persisted schema (version 1) with load/save/validate
//!
//! All times are milliseconds. Nothing in this crate enforces positional
//! invariants on mutation; that is the edit engine's job.

pub mod clip;
pub mod document;
pub mod ids;
pub mod keyframe;
pub mod kind;
pub mod timeline;
pub mod track;

pub use clip::*;
pub use document::*;
pub use ids::*;
pub use keyframe::*;
pub use kind::*;
pub use timeline::*;
pub use track::*;

/// Milliseconds on the timeline.
pub type Millis = f64;

/// Shortest clip the engine will produce.
pub const MIN_CLIP_MS: Millis = 100.0;
