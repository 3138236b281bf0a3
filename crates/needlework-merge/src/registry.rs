use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::needle::{NeedleFormat, inserted_block};

/// Whole-text rewrite; `None` means the rule could not produce text.
pub type TextTransform = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Content contributed at an anchor.
#[derive(Clone)]
pub enum AnchorRule {
    /// Literal text placed above the anchor marker.
    Insert(String),
    /// Rewrite of the current file text, applied when the anchor is merged.
    Edit(TextTransform),
}

impl AnchorRule {
    pub fn edit<F>(transform: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        AnchorRule::Edit(Arc::new(transform))
    }
}

impl fmt::Debug for AnchorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorRule::Insert(text) => f.debug_tuple("Insert").field(text).finish(),
            AnchorRule::Edit(_) => f.write_str("Edit(..)"),
        }
    }
}

/// Append-only accumulator of anchor contributions for one run.
///
/// Registrations under the same name compose in registration order; nothing
/// is ever replaced. The registry is an ordinary value threaded through the
/// run, so separate runs never share state.
#[derive(Debug, Clone, Default)]
pub struct AnchorRegistry {
    anchors: BTreeMap<String, Vec<AnchorRule>>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, anchor: impl Into<String>, rule: AnchorRule) {
        self.anchors.entry(anchor.into()).or_default().push(rule);
    }

    pub fn register_text(&mut self, anchor: impl Into<String>, text: impl Into<String>) {
        self.register(anchor, AnchorRule::Insert(text.into()));
    }

    /// Contributions for an anchor, first-registered first.
    pub fn rules(&self, anchor: &str) -> &[AnchorRule] {
        self.anchors
            .get(anchor)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn anchors(&self) -> impl Iterator<Item = &str> {
        self.anchors.keys().map(String::as_str)
    }

    /// Total number of contributions across all anchors.
    pub fn len(&self) -> usize {
        self.anchors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy without literal insertions whose text already appears in `text`.
    ///
    /// Content is compared in the form it takes once inserted above the
    /// anchor's marker, re-indented to the marker line. The merge engine never
    /// de-duplicates; callers re-running against a previously merged file use
    /// this to avoid inserting the same entry twice.
    pub fn without_present(&self, text: &str, needles: &NeedleFormat) -> AnchorRegistry {
        let anchors = self
            .anchors
            .iter()
            .map(|(name, rules)| {
                let marker = needles.marker(name);
                let kept = rules
                    .iter()
                    .filter(|rule| match rule {
                        AnchorRule::Insert(content) => !is_present(text, &marker, content),
                        AnchorRule::Edit(_) => true,
                    })
                    .cloned()
                    .collect();
                (name.clone(), kept)
            })
            .collect();
        AnchorRegistry { anchors }
    }
}

fn is_present(text: &str, marker: &str, content: &str) -> bool {
    match inserted_block(text, marker, content) {
        Some(block) => text.contains(&block),
        None => text.contains(content),
    }
}
