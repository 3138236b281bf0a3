use std::path::Path;

use tracing::debug;

use crate::engine::{MergeEngine, MergeOp};
use crate::errors::{MergeError, Result};
use crate::registry::AnchorRegistry;
use crate::store::TextStore;

/// What to do when the target file does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingFile {
    /// Report `ResourceNotFound`.
    Fail,
    /// Start from the given text (usually freshly rendered content).
    Create(String),
}

/// How a merge changed the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Result of merging one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedFile {
    pub outcome: MergeOutcome,
    pub text: String,
}

/// Read, merge, and write back one file.
///
/// The whole text is transformed in memory before anything is written, and
/// nothing is written when the merge leaves the text unchanged.
pub fn merge_file<S>(
    engine: &MergeEngine,
    store: &mut S,
    path: &Path,
    ops: &[MergeOp],
    registry: &AnchorRegistry,
    missing: MissingFile,
) -> Result<MergedFile>
where
    S: TextStore + ?Sized,
{
    let (base, created) = match store.read(path)? {
        Some(text) => (text, false),
        None => match missing {
            MissingFile::Fail => return Err(MergeError::ResourceNotFound(path.to_path_buf())),
            MissingFile::Create(initial) => (initial, true),
        },
    };

    let merged = engine.apply(&base, ops, registry)?;

    let outcome = if created {
        MergeOutcome::Created
    } else if merged != base {
        MergeOutcome::Updated
    } else {
        MergeOutcome::Unchanged
    };

    if outcome != MergeOutcome::Unchanged {
        store.write(path, &merged)?;
    }
    debug!(path = %path.display(), outcome = ?outcome, "file merged");

    Ok(MergedFile {
        outcome,
        text: merged,
    })
}
