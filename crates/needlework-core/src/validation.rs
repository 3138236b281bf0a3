use std::collections::BTreeSet;

use crate::model::{BUILT_IN_USER, EntityModel, instance_name};

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }
}

/// Check the entity model for inconsistencies.
///
/// Derivation never fails on these; the report only tells callers which
/// entities will be scaffolded with best-effort defaults:
/// - duplicate entity names (error)
/// - entities without a declared primary key (warning)
/// - relationships to unknown entities other than the built-in user (warning)
/// - more than one identifying relationship; the first one wins (warning)
pub fn validate_model(model: &EntityModel) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut known = BTreeSet::new();

    for (index, entity) in model.entities.iter().enumerate() {
        if !known.insert(entity.entity_instance()) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "duplicate_entity",
                format!("/entities/{index}/name"),
                format!("duplicate entity name: {}", entity.name),
                None,
            ));
        }
    }

    for (index, entity) in model.entities.iter().enumerate() {
        let path = format!("/entities/{index}");

        if entity.primary_key.is_none() {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "missing_primary_key",
                format!("{path}/primary_key"),
                format!("entity {} declares no primary key", entity.name),
                Some("declare primary_key.type so the key type can be derived".to_string()),
            ));
        }

        let mut identifying = 0_usize;
        for (rel_index, relationship) in entity.relationships.iter().enumerate() {
            let target = instance_name(&relationship.other_entity_name);
            if target != BUILT_IN_USER && !known.contains(&target) {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "unknown_relationship_target",
                    format!("{path}/relationships/{rel_index}/other_entity_name"),
                    format!(
                        "relationship {}.{} references unknown entity {}",
                        entity.name, relationship.relationship_name, relationship.other_entity_name
                    ),
                    None,
                ));
            }

            if relationship.identifying {
                identifying += 1;
                if identifying > 1 {
                    report.push_warning(ValidationIssue::new(
                        IssueSeverity::Warning,
                        "multiple_identifying_relationships",
                        format!("{path}/relationships/{rel_index}/identifying"),
                        format!(
                            "entity {} has more than one identifying relationship; {} is ignored",
                            entity.name, relationship.relationship_name
                        ),
                        Some("keep a single identifying relationship per entity".to_string()),
                    ));
                }
            }
        }
    }

    report
}
