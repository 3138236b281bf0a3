//! Needle-based incremental merge engine for Needlework.
//!
//! Generated files carry anchor markers ("needles"). Collaborators register
//! content against anchor names in an [`AnchorRegistry`]; the [`MergeEngine`]
//! then inserts that content above each marker and applies literal or
//! pattern rewrites, as a pure transform over text snapshots. [`merge_file`]
//! binds the engine to a [`TextStore`].

pub mod engine;
pub mod errors;
pub mod file;
pub mod needle;
pub mod registry;
pub mod store;

pub use engine::{MergeEngine, MergeOp};
pub use errors::{MergeError, Result};
pub use file::{MergeOutcome, MergedFile, MissingFile, merge_file};
pub use needle::{NeedleFormat, insert_before_needle, inserted_block};
pub use registry::{AnchorRegistry, AnchorRule, TextTransform};
pub use store::{DiskStore, MemoryStore, TextStore, write_bytes_atomic};
