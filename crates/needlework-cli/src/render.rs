use std::path::PathBuf;

use regex::Regex;

use needlework_generate::{RenderContext, RenderError, TemplateRenderer};

const PLACEHOLDER: &str = r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}";

/// Renders templates stored as plain files under a directory.
///
/// `{{ key }}` is replaced with the scalar context value of `key`; everything
/// else, including anchor markers, is copied verbatim.
#[derive(Debug, Clone)]
pub struct TemplateDirRenderer {
    root: PathBuf,
    placeholder: Regex,
}

impl TemplateDirRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let placeholder =
            Regex::new(PLACEHOLDER).map_err(|err| RenderError::new(PLACEHOLDER, err.to_string()))?;
        Ok(Self {
            root: root.into(),
            placeholder,
        })
    }

    /// Template ids from `templates` that have no file under the root.
    pub fn missing_templates<'a>(
        &self,
        templates: impl IntoIterator<Item = &'a str>,
    ) -> Vec<&'a str> {
        templates
            .into_iter()
            .filter(|template| !self.root.join(template).is_file())
            .collect()
    }

    fn substitute(
        &self,
        template: &str,
        source: &str,
        context: &RenderContext,
    ) -> Result<String, RenderError> {
        let mut rendered = String::with_capacity(source.len());
        let mut last = 0;

        for captures in self.placeholder.captures_iter(source) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let value = context.text(key.as_str()).ok_or_else(|| {
                RenderError::new(template, format!("unknown placeholder '{}'", key.as_str()))
            })?;
            rendered.push_str(&source[last..whole.start()]);
            rendered.push_str(&value);
            last = whole.end();
        }
        rendered.push_str(&source[last..]);

        Ok(rendered)
    }
}

impl TemplateRenderer for TemplateDirRenderer {
    fn render(&self, template: &str, context: &RenderContext) -> Result<String, RenderError> {
        let path = self.root.join(template);
        let source = std::fs::read_to_string(&path)
            .map_err(|err| RenderError::new(template, format!("{}: {err}", path.display())))?;
        self.substitute(template, &source, context)
    }
}
