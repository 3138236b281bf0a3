use needlework_core::DEFAULT_NEEDLE_PREFIX;
use tracing::warn;

/// Lexical form of anchor markers ("needles") inside templates.
///
/// A marker is the prefix followed by the anchor name, e.g.
/// `needlework-needle-hibernate-cache-add-entry`. Templates embed it once per
/// file inside whatever comment syntax the file type uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedleFormat {
    prefix: String,
}

impl NeedleFormat {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Marker text for an anchor name.
    pub fn marker(&self, anchor: &str) -> String {
        format!("{}{}", self.prefix, anchor)
    }
}

impl Default for NeedleFormat {
    fn default() -> Self {
        Self::new(DEFAULT_NEEDLE_PREFIX)
    }
}

/// Insert `content` on its own lines directly above the line holding `marker`.
///
/// Inserted lines take the indentation of the marker line, and the marker is
/// left in place so later runs can insert again. Returns `None` when the
/// marker is absent. Only the first occurrence is used.
pub fn insert_before_needle(text: &str, marker: &str, content: &str) -> Option<String> {
    let position = text.find(marker)?;

    if text[position + marker.len()..].contains(marker) {
        warn!(marker = %marker, "marker occurs more than once, using the first");
    }

    if content.is_empty() {
        return Some(text.to_string());
    }

    let (line_start, indent) = marker_line(text, position);
    let block = indent_block(content, indent);

    let mut merged = String::with_capacity(text.len() + block.len());
    merged.push_str(&text[..line_start]);
    merged.push_str(&block);
    merged.push_str(&text[line_start..]);
    Some(merged)
}

/// `content` exactly as [`insert_before_needle`] would place it above `marker`.
pub fn inserted_block(text: &str, marker: &str, content: &str) -> Option<String> {
    let position = text.find(marker)?;
    let (_, indent) = marker_line(text, position);
    Some(indent_block(content, indent))
}

/// Start offset and leading whitespace of the line containing `position`.
fn marker_line(text: &str, position: usize) -> (usize, &str) {
    let line_start = text[..position].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let line = &text[line_start..position];
    let indent_len = line.len() - line.trim_start().len();
    (line_start, &line[..indent_len])
}

fn indent_block(content: &str, indent: &str) -> String {
    let mut block = String::with_capacity(content.len() + indent.len() * 4);
    for content_line in content.lines() {
        if !content_line.is_empty() {
            block.push_str(indent);
        }
        block.push_str(content_line);
        block.push('\n');
    }
    block
}
