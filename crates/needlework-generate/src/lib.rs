//! Generation driver for needlework.
//!
//! Derives entity metadata, renders the template catalog through a
//! caller-supplied renderer and merges anchor contributions (cache
//! directives, test rewrites) into the target tree without clobbering
//! content that is already there.

pub mod catalog;
pub mod engine;
pub mod errors;
pub mod model;
pub mod render;
pub mod rewrites;

pub use catalog::{FileCondition, FileTemplate, TemplateCatalog};
pub use engine::{GenerationEngine, GenerationResult};
pub use errors::GenerationError;
pub use model::{FileAction, FileReport, GenerateOptions, GenerationIssue, GenerationReport};
pub use render::{RenderContext, RenderError, TemplateRenderer};
pub use rewrites::{FileRewrite, dto_test_rewrites};
