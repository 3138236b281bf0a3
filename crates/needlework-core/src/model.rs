use convert_case::{Case, Casing};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{
    AuthenticationType, DataAccess, DtoMode, PaginationMode, RelationshipKind, ServiceMode,
};

/// Name of the entity every application ships with.
pub const BUILT_IN_USER: &str = "user";

/// Top-level input for a scaffolding run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct EntityModel {
    pub application: Application,
    /// Entities in declaration order.
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl EntityModel {
    /// Find an entity by name, ignoring the difference between class and
    /// instance spelling (`InvoiceLine` vs `invoiceLine`).
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        let wanted = instance_name(name);
        self.entities
            .iter()
            .find(|entity| entity.entity_instance() == wanted)
    }
}

/// Application-wide settings shared by every entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Application {
    pub base_name: String,
    /// Java package of the generated code (e.g. `com.app`).
    pub package_name: String,
    #[serde(default)]
    pub authentication_type: AuthenticationType,
    #[serde(default = "default_src_main_resources")]
    pub src_main_resources: String,
    #[serde(default = "default_src_test_java")]
    pub src_test_java: String,
}

impl Application {
    /// Package name as a relative folder (`com.app` -> `com/app`).
    pub fn package_folder(&self) -> String {
        self.package_name.replace('.', "/")
    }
}

fn default_src_main_resources() -> String {
    "src/main/resources/".to_string()
}

fn default_src_test_java() -> String {
    "src/test/java/".to_string()
}

/// Declared primary key of an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct PrimaryKey {
    pub name: String,
    /// Scalar type of the key (e.g. `Long`, `UUID`, `String`).
    #[serde(rename = "type")]
    pub key_type: String,
}

/// One data-model concept to scaffold.
///
/// Only primary declarations live here; derived attributes are computed by
/// `needlework-metadata` and kept alongside, never merged back in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Falls back to the configured default when absent.
    #[serde(default)]
    pub data_access: Option<DataAccess>,
    #[serde(default)]
    pub service: ServiceMode,
    #[serde(default)]
    pub pagination: PaginationMode,
    #[serde(default)]
    pub dto: DtoMode,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub built_in: bool,
    #[serde(default)]
    pub skip_server: bool,
    /// Overrides the application's authentication mode for this entity.
    #[serde(default)]
    pub authentication_type: Option<AuthenticationType>,
}

impl Entity {
    /// Minimal entity with defaults for every optional declaration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            relationships: Vec::new(),
            data_access: None,
            service: ServiceMode::default(),
            pagination: PaginationMode::default(),
            dto: DtoMode::default(),
            embedded: false,
            built_in: false,
            skip_server: false,
            authentication_type: None,
        }
    }

    pub fn entity_class(&self) -> String {
        class_name(&self.name)
    }

    pub fn entity_instance(&self) -> String {
        instance_name(&self.name)
    }

    pub fn persist_class(&self) -> String {
        self.entity_class()
    }

    pub fn dto_class(&self) -> String {
        format!("{}DTO", self.entity_class())
    }

    pub fn uses_dto_mapstruct(&self) -> bool {
        self.dto == DtoMode::Mapstruct
    }

    /// Entities that are neither built-in nor excluded from server generation.
    pub fn is_generated(&self) -> bool {
        !self.built_in && !self.skip_server
    }

    pub fn effective_authentication(&self, application: &Application) -> AuthenticationType {
        self.authentication_type
            .unwrap_or(application.authentication_type)
    }
}

/// Directed association from the owning entity to another entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Relationship {
    pub relationship_name: String,
    #[serde(default)]
    pub relationship_name_plural: Option<String>,
    /// Target entity, referenced by name.
    pub other_entity_name: String,
    pub relationship_type: RelationshipKind,
    /// The target forms part of, or overrides, the owner's primary key.
    #[serde(default, alias = "id")]
    pub identifying: bool,
    /// Explicit collection flag; derived from the kind when absent.
    #[serde(default)]
    pub collection: Option<bool>,
}

impl Relationship {
    pub fn new(
        relationship_name: impl Into<String>,
        other_entity_name: impl Into<String>,
        relationship_type: RelationshipKind,
    ) -> Self {
        Self {
            relationship_name: relationship_name.into(),
            relationship_name_plural: None,
            other_entity_name: other_entity_name.into(),
            relationship_type,
            identifying: false,
            collection: None,
        }
    }

    pub fn identifying(mut self) -> Self {
        self.identifying = true;
        self
    }

    pub fn is_collection(&self) -> bool {
        self.collection
            .unwrap_or_else(|| self.relationship_type.is_collection())
    }

    pub fn targets(&self, entity_name: &str) -> bool {
        instance_name(&self.other_entity_name) == instance_name(entity_name)
    }

    /// Field name used for collection-valued accessors.
    pub fn field_name_plural(&self) -> String {
        self.relationship_name_plural
            .clone()
            .unwrap_or_else(|| pluralize(&instance_name(&self.relationship_name)))
    }
}

/// Class-style spelling of an entity name.
///
/// Declared camel or Pascal names only get their first letter upper-cased, so
/// acronyms survive (`SKU`, `IBANRecord`). Separator-style names
/// (`invoice_line`) are converted word by word.
pub fn class_name(name: &str) -> String {
    if has_separators(name) {
        name.to_case(Case::Pascal)
    } else {
        map_first(name, char::to_ascii_uppercase)
    }
}

/// Instance-style spelling of an entity name (`InvoiceLine` -> `invoiceLine`).
pub fn instance_name(name: &str) -> String {
    if has_separators(name) {
        name.to_case(Case::Camel)
    } else {
        map_first(name, char::to_ascii_lowercase)
    }
}

fn has_separators(name: &str) -> bool {
    name.contains(['_', '-', ' '])
}

fn map_first(name: &str, map: fn(&char) -> char) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => std::iter::once(map(&first)).chain(chars).collect(),
        None => String::new(),
    }
}

fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_ascii_lowercase();
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last().map(|c| c.to_ascii_lowercase());
        if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u') | None) {
            return format!("{stem}ies");
        }
    }
    format!("{word}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_follows_class_and_instance_conventions() {
        let entity = Entity::new("invoice_line");
        assert_eq!(entity.entity_class(), "InvoiceLine");
        assert_eq!(entity.entity_instance(), "invoiceLine");
        assert_eq!(entity.dto_class(), "InvoiceLineDTO");
    }

    #[test]
    fn declared_casing_is_kept_apart_from_the_first_letter() {
        let sku = Entity::new("SKU");
        assert_eq!(sku.entity_class(), "SKU");
        assert_eq!(sku.entity_instance(), "sKU");
        assert_eq!(sku.dto_class(), "SKUDTO");

        let iban = Entity::new("IBANRecord");
        assert_eq!(iban.entity_class(), "IBANRecord");
        assert_eq!(iban.entity_instance(), "iBANRecord");

        let lower = Entity::new("invoiceLine");
        assert_eq!(lower.entity_class(), "InvoiceLine");
        assert_eq!(class_name(""), "");
    }

    #[test]
    fn lookup_keeps_acronym_spellings_distinct() {
        let model = EntityModel {
            application: Application {
                base_name: "app".to_string(),
                package_name: "com.app".to_string(),
                authentication_type: AuthenticationType::Jwt,
                src_main_resources: default_src_main_resources(),
                src_test_java: default_src_test_java(),
            },
            entities: vec![Entity::new("SKU"), Entity::new("Sku")],
        };
        assert_eq!(model.entity("SKU").map(|entity| entity.name.as_str()), Some("SKU"));
        assert_eq!(model.entity("sku").map(|entity| entity.name.as_str()), Some("Sku"));
    }

    #[test]
    fn collection_flag_defaults_to_relationship_kind() {
        let lines = Relationship::new("line", "InvoiceLine", RelationshipKind::OneToMany);
        let owner = Relationship::new("owner", "user", RelationshipKind::ManyToOne);
        assert!(lines.is_collection());
        assert!(!owner.is_collection());

        let mut forced = owner.clone();
        forced.collection = Some(true);
        assert!(forced.is_collection());
    }

    #[test]
    fn plural_field_names() {
        let line = Relationship::new("line", "InvoiceLine", RelationshipKind::OneToMany);
        let category = Relationship::new("category", "Category", RelationshipKind::ManyToMany);
        let address = Relationship::new("address", "Address", RelationshipKind::OneToMany);
        let day = Relationship::new("day", "Day", RelationshipKind::OneToMany);
        assert_eq!(line.field_name_plural(), "lines");
        assert_eq!(category.field_name_plural(), "categories");
        assert_eq!(address.field_name_plural(), "addresses");
        assert_eq!(day.field_name_plural(), "days");
    }

    #[test]
    fn lookup_ignores_class_versus_instance_spelling() {
        let model = EntityModel {
            application: Application {
                base_name: "app".to_string(),
                package_name: "com.app".to_string(),
                authentication_type: AuthenticationType::Jwt,
                src_main_resources: default_src_main_resources(),
                src_test_java: default_src_test_java(),
            },
            entities: vec![Entity::new("InvoiceLine")],
        };
        assert!(model.entity("invoiceLine").is_some());
        assert!(model.entity("Invoice").is_none());
        assert_eq!(model.application.package_folder(), "com/app");
    }
}
