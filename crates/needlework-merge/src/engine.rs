use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::errors::{MergeError, Result};
use crate::needle::{NeedleFormat, insert_before_needle};
use crate::registry::{AnchorRegistry, AnchorRule, TextTransform};

/// One step of a merge, applied to the output of the previous step.
#[derive(Clone)]
pub enum MergeOp {
    /// Apply every contribution registered under the anchor name.
    Anchor(String),
    /// Replace all non-overlapping occurrences of a literal substring.
    Replace { from: String, to: String },
    /// Replace all matches of a pattern, expanding `$1`/`${name}` captures.
    Rewrite { pattern: Regex, replacement: String },
    /// Arbitrary rewrite of the whole text.
    Transform(TextTransform),
}

impl MergeOp {
    pub fn anchor(name: impl Into<String>) -> Self {
        MergeOp::Anchor(name.into())
    }

    pub fn replace(from: impl Into<String>, to: impl Into<String>) -> Self {
        MergeOp::Replace {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Compile a pattern rewrite; an invalid pattern is a malformed rule.
    pub fn rewrite(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|err| MergeError::MalformedRule(format!("invalid pattern: {err}")))?;
        Ok(MergeOp::Rewrite {
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn transform<F>(transform: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        MergeOp::Transform(Arc::new(transform))
    }
}

impl fmt::Debug for MergeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeOp::Anchor(name) => f.debug_tuple("Anchor").field(name).finish(),
            MergeOp::Replace { from, to } => f
                .debug_struct("Replace")
                .field("from", from)
                .field("to", to)
                .finish(),
            MergeOp::Rewrite {
                pattern,
                replacement,
            } => f
                .debug_struct("Rewrite")
                .field("pattern", &pattern.as_str())
                .field("replacement", replacement)
                .finish(),
            MergeOp::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Pure text merge: anchor insertions and rewrites over an in-memory snapshot.
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    needles: NeedleFormat,
}

impl MergeEngine {
    pub fn new(needles: NeedleFormat) -> Self {
        Self { needles }
    }

    pub fn needles(&self) -> &NeedleFormat {
        &self.needles
    }

    /// Apply `ops` in order, each seeing the previous step's output.
    ///
    /// Unmatched markers and patterns leave the text unchanged. Only
    /// internally inconsistent rules fail.
    pub fn apply(&self, text: &str, ops: &[MergeOp], registry: &AnchorRegistry) -> Result<String> {
        let mut current = text.to_string();
        for op in ops {
            current = self.apply_op(current, op, registry)?;
        }
        Ok(current)
    }

    fn apply_op(&self, text: String, op: &MergeOp, registry: &AnchorRegistry) -> Result<String> {
        match op {
            MergeOp::Anchor(name) => self.apply_anchor(text, name, registry),
            MergeOp::Replace { from, to } => {
                if from.is_empty() {
                    return Err(MergeError::MalformedRule(
                        "literal replacement with an empty pattern".to_string(),
                    ));
                }
                Ok(text.replace(from.as_str(), to))
            }
            MergeOp::Rewrite {
                pattern,
                replacement,
            } => Ok(pattern
                .replace_all(&text, replacement.as_str())
                .into_owned()),
            MergeOp::Transform(transform) => run_transform(transform, &text, "transform"),
        }
    }

    fn apply_anchor(&self, text: String, name: &str, registry: &AnchorRegistry) -> Result<String> {
        if name.trim().is_empty() {
            return Err(MergeError::MalformedRule("anchor name is blank".to_string()));
        }

        let marker = self.needles.marker(name);
        if !text.contains(&marker) {
            debug!(anchor = %name, "marker not found, skipping");
            return Ok(text);
        }

        let mut current = text;
        for rule in registry.rules(name) {
            current = match rule {
                AnchorRule::Insert(content) => {
                    insert_before_needle(&current, &marker, content).unwrap_or(current)
                }
                AnchorRule::Edit(transform) => run_transform(transform, &current, name)?,
            };
        }
        Ok(current)
    }
}

fn run_transform(transform: &TextTransform, text: &str, origin: &str) -> Result<String> {
    transform(text)
        .ok_or_else(|| MergeError::MalformedRule(format!("{origin} produced no text")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_expands_capture_groups() {
        let engine = MergeEngine::default();
        let ops = vec![
            MergeOp::replace("web.rest.TestUtil", "TestUtil"),
            MergeOp::rewrite(r"setId\((.+)\)", "id = $1").expect("valid pattern"),
        ];
        let text = "import web.rest.TestUtil;\ndto.setId(1L);\nother.setId(2L);\n";
        let merged = engine
            .apply(text, &ops, &AnchorRegistry::new())
            .expect("apply");
        assert_eq!(merged, "import TestUtil;\ndto.id = 1L;\nother.id = 2L;\n");
    }

    #[test]
    fn invalid_pattern_is_malformed() {
        let err = MergeOp::rewrite("(unclosed", "x").expect_err("invalid pattern");
        assert!(err.is_malformed_rule());
    }

    #[test]
    fn transform_without_output_is_malformed() {
        let engine = MergeEngine::default();
        let ops = vec![MergeOp::transform(|_| None)];
        let err = engine
            .apply("text", &ops, &AnchorRegistry::new())
            .expect_err("transform failure");
        assert!(err.is_malformed_rule());
    }

    #[test]
    fn edit_rule_runs_only_when_marker_present() {
        let engine = MergeEngine::new(NeedleFormat::new("ANCHOR:"));
        let mut registry = AnchorRegistry::new();
        registry.register("footer", AnchorRule::edit(|text| Some(text.to_uppercase())));

        let ops = vec![MergeOp::anchor("footer")];
        let untouched = engine.apply("no marker", &ops, &registry).expect("apply");
        assert_eq!(untouched, "no marker");

        let edited = engine
            .apply("x # ANCHOR:footer", &ops, &registry)
            .expect("apply");
        assert_eq!(edited, "X # ANCHOR:FOOTER");
    }

    #[test]
    fn empty_literal_pattern_is_malformed() {
        let engine = MergeEngine::default();
        let err = engine
            .apply("abc", &[MergeOp::replace("", "x")], &AnchorRegistry::new())
            .expect_err("empty pattern");
        assert!(err.is_malformed_rule());
    }
}
