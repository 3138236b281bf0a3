//! Core contracts and helpers for Needlework.
//!
//! This crate defines the entity model consumed by a scaffolding run, the
//! generator configuration, the shared error taxonomy, and model-consistency
//! checks used by the derivation and generation crates.

pub mod config;
pub mod error;
pub mod model;
pub mod types;
pub mod validation;

pub use config::{
    CACHE_EXPIRE_AFTER_WRITE, CACHE_MAXIMUM_SIZE, DEFAULT_NEEDLE_PREFIX, GeneratorConfig,
};
pub use error::{Error, Result};
pub use model::{
    Application, BUILT_IN_USER, Entity, EntityModel, PrimaryKey, Relationship, class_name, instance_name,
};
pub use types::{
    AuthenticationType, DataAccess, DtoMode, PaginationMode, RelationshipKind, ServiceMode,
};
pub use validation::{IssueSeverity, ValidationIssue, ValidationReport, validate_model};

/// Current contract version for entity model documents.
pub const MODEL_VERSION: &str = "0.1";
