use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use needlework_core::{
    Application, AuthenticationType, BUILT_IN_USER, DataAccess, Entity, EntityModel,
    GeneratorConfig, PaginationMode, Relationship, RelationshipKind, ServiceMode, instance_name,
};

/// Conversion method exposed by every generated mapper.
pub const TO_DTO_METHOD: &str = "toDto";

/// Key type forced on entities identified by a federated user.
const FEDERATED_USER_KEY_TYPE: &str = "String";

/// Attributes computed from a single entity declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pass1Metadata {
    pub entity_name: String,
    pub entity_class: String,
    pub entity_instance: String,
    pub data_access: DataAccess,
    pub uses_service: bool,
    pub has_service_implementation: bool,
    pub uses_repository: bool,
    pub pagination_enabled: bool,
    pub data_access_object: String,
    pub mapper: String,
    pub entity_to_dto_method_reference: String,
    pub entity_to_dto_method_invocation: String,
    pub service_class_name: String,
    /// Carried so pass 2 can answer cross-entity questions from this snapshot.
    pub embedded: bool,
}

/// Attributes computed from an entity's relationships and their targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pass2Metadata {
    pub maps_id_relationship: Option<Relationship>,
    pub uses_maps_id: bool,
    /// `None` when the entity declares no primary key.
    pub primary_key_type: Option<String>,
    pub has_owning_many_to_many_field: bool,
    pub has_embedded_field: bool,
}

/// Everything derived for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedEntityMetadata {
    #[serde(flatten)]
    pub pass1: Pass1Metadata,
    #[serde(flatten)]
    pub pass2: Pass2Metadata,
}

/// Compute pass-1 attributes. Reads nothing but the entity and configuration.
pub fn derive_pass1(entity: &Entity, config: &GeneratorConfig) -> Pass1Metadata {
    let entity_class = entity.entity_class();
    let entity_instance = entity.entity_instance();
    let data_access = entity.data_access.unwrap_or(config.default_data_access);

    let uses_service = entity.service != ServiceMode::None;
    let has_service_implementation = entity.service == ServiceMode::Implementation;
    let uses_repository = data_access == DataAccess::Repository;
    let pagination_enabled = entity.pagination != PaginationMode::None;

    let data_access_object = if uses_repository {
        format!("{entity_instance}Repository")
    } else {
        entity_class.clone()
    };
    let mapper = format!("{entity_instance}Mapper");
    let service_class_name = if has_service_implementation {
        format!("{entity_class}ServiceImpl")
    } else {
        format!("{entity_class}Service")
    };

    Pass1Metadata {
        entity_name: entity.name.clone(),
        entity_to_dto_method_reference: format!("{mapper}::{TO_DTO_METHOD}"),
        entity_to_dto_method_invocation: format!("{mapper}.{TO_DTO_METHOD}"),
        entity_class,
        entity_instance,
        data_access,
        uses_service,
        has_service_implementation,
        uses_repository,
        pagination_enabled,
        data_access_object,
        mapper,
        service_class_name,
        embedded: entity.embedded,
    }
}

/// Frozen pass-1 snapshot of every entity in a model.
///
/// This is the only input pass 2 accepts, so no relationship is resolved
/// before every entity has its pass-1 attributes.
#[derive(Debug, Clone)]
pub struct Pass1Result<'m> {
    model: &'m EntityModel,
    entries: Vec<Pass1Metadata>,
    index: BTreeMap<String, usize>,
}

impl<'m> Pass1Result<'m> {
    /// Run pass 1 over all entities in declaration order.
    pub fn run(model: &'m EntityModel, config: &GeneratorConfig) -> Self {
        let entries: Vec<Pass1Metadata> = model
            .entities
            .iter()
            .map(|entity| derive_pass1(entity, config))
            .collect();
        let index = build_index(&entries);
        Self {
            model,
            entries,
            index,
        }
    }

    /// Pass-1 attributes by entity name (class or instance spelling).
    pub fn get(&self, name: &str) -> Option<&Pass1Metadata> {
        self.index
            .get(&instance_name(name))
            .and_then(|idx| self.entries.get(*idx))
    }

    pub fn entries(&self) -> &[Pass1Metadata] {
        &self.entries
    }

    /// Run pass 2 over all entities and seal the result.
    pub fn finish(self) -> DerivedModel {
        let application = &self.model.application;
        let entities: Vec<DerivedEntityMetadata> = self
            .model
            .entities
            .iter()
            .zip(self.entries.iter())
            .map(|(entity, pass1)| DerivedEntityMetadata {
                pass1: pass1.clone(),
                pass2: derive_pass2(entity, application, &self),
            })
            .collect();
        let index = build_index(entities.iter().map(|derived| &derived.pass1));
        DerivedModel { entities, index }
    }
}

/// Compute pass-2 attributes for one entity against the pass-1 snapshot.
pub fn derive_pass2(
    entity: &Entity,
    application: &Application,
    pass1: &Pass1Result<'_>,
) -> Pass2Metadata {
    let declared_key_type = entity
        .primary_key
        .as_ref()
        .map(|primary_key| primary_key.key_type.clone());

    // First identifying relationship wins; later ones are ignored.
    let maps_id_relationship = entity
        .relationships
        .iter()
        .find(|relationship| relationship.identifying)
        .cloned();

    let primary_key_type = match &maps_id_relationship {
        Some(relationship)
            if relationship.targets(BUILT_IN_USER)
                && entity.effective_authentication(application)
                    == AuthenticationType::Oauth2 =>
        {
            Some(FEDERATED_USER_KEY_TYPE.to_string())
        }
        _ => declared_key_type,
    };

    let has_owning_many_to_many_field = entity
        .relationships
        .iter()
        .any(|relationship| relationship.relationship_type == RelationshipKind::ManyToMany);

    let has_embedded_field = entity.relationships.iter().any(|relationship| {
        match pass1.get(&relationship.other_entity_name) {
            Some(target) => target.embedded,
            None => {
                debug!(
                    entity = %entity.name,
                    target = %relationship.other_entity_name,
                    "relationship target not in model"
                );
                false
            }
        }
    });

    Pass2Metadata {
        uses_maps_id: maps_id_relationship.is_some(),
        maps_id_relationship,
        primary_key_type,
        has_owning_many_to_many_field,
        has_embedded_field,
    }
}

/// Sealed derivation output, keyed by entity name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedModel {
    entities: Vec<DerivedEntityMetadata>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl DerivedModel {
    /// Derived metadata by entity name (class or instance spelling).
    pub fn get(&self, name: &str) -> Option<&DerivedEntityMetadata> {
        self.index
            .get(&instance_name(name))
            .and_then(|idx| self.entities.get(*idx))
    }

    /// Derived metadata in entity declaration order.
    pub fn entities(&self) -> &[DerivedEntityMetadata] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Derive metadata for every entity of a model.
pub fn derive_model(model: &EntityModel, config: &GeneratorConfig) -> DerivedModel {
    Pass1Result::run(model, config).finish()
}

/// Derive metadata for a standalone entity.
///
/// Relationship targets are unknown here, so none of them counts as embedded.
pub fn derive(
    entity: &Entity,
    application: &Application,
    config: &GeneratorConfig,
) -> DerivedEntityMetadata {
    let pass1 = derive_pass1(entity, config);
    let model = EntityModel {
        application: application.clone(),
        entities: Vec::new(),
    };
    let snapshot = Pass1Result::run(&model, config);
    DerivedEntityMetadata {
        pass2: derive_pass2(entity, application, &snapshot),
        pass1,
    }
}

fn build_index<'a>(entries: impl IntoIterator<Item = &'a Pass1Metadata>) -> BTreeMap<String, usize> {
    let mut index = BTreeMap::new();
    for (position, entry) in entries.into_iter().enumerate() {
        index.entry(entry.entity_instance.clone()).or_insert(position);
    }
    index
}
