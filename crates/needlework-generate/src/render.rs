use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use needlework_core::{Application, Entity};
use needlework_metadata::DerivedEntityMetadata;

/// Failure reported by a template renderer.
#[derive(Debug, Error)]
#[error("failed to render '{template}': {message}")]
pub struct RenderError {
    pub template: String,
    pub message: String,
}

impl RenderError {
    pub fn new(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            message: message.into(),
        }
    }
}

/// Template rendering boundary: "render template T with context C".
///
/// The driver never interprets template syntax.
pub trait TemplateRenderer {
    fn render(&self, template: &str, context: &RenderContext) -> Result<String, RenderError>;
}

impl<F> TemplateRenderer for F
where
    F: Fn(&str, &RenderContext) -> Result<String, RenderError>,
{
    fn render(&self, template: &str, context: &RenderContext) -> Result<String, RenderError> {
        self(template, context)
    }
}

/// Flat key/value context handed to templates.
///
/// Later layers shadow earlier ones: application values, then the raw entity
/// declaration, then its derived metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext {
    values: Map<String, Value>,
}

impl RenderContext {
    pub fn for_application(application: &Application) -> Result<Self, serde_json::Error> {
        let mut context = Self::default();
        context.extend(application)?;
        context.insert("package_folder", application.package_folder());
        Ok(context)
    }

    pub fn for_entity(
        application: &Application,
        entity: &Entity,
        metadata: &DerivedEntityMetadata,
    ) -> Result<Self, serde_json::Error> {
        let mut context = Self::for_application(application)?;
        context.extend(entity)?;
        context.extend(metadata)?;
        context.insert(
            "authentication_type",
            serde_json::to_value(entity.effective_authentication(application))?,
        );
        context.insert("persist_class", entity.persist_class());
        context.insert("dto_class", entity.dto_class());
        context.insert("dto_mapstruct", entity.uses_dto_mapstruct());
        Ok(context)
    }

    /// Merge the top-level fields of a serializable struct.
    pub fn extend<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        if let Value::Object(fields) = serde_json::to_value(value)? {
            self.values.extend(fields);
        }
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Scalar value as text; objects, arrays and nulls have no text form.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Bool(value) => Some(value.to_string()),
            Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Expand `{key}` placeholders of a target path pattern.
    pub fn expand_path(&self, pattern: &str) -> Result<PathBuf, RenderError> {
        let mut expanded = String::with_capacity(pattern.len());
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            expanded.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                RenderError::new(pattern, "unterminated placeholder in target path")
            })?;
            let key = &after[..close];
            let value = self.text(key).ok_or_else(|| {
                RenderError::new(pattern, format!("unknown path placeholder '{key}'"))
            })?;
            expanded.push_str(&value);
            rest = &after[close + 1..];
        }
        expanded.push_str(rest);

        Ok(PathBuf::from(expanded))
    }
}
