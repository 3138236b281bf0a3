use serde::Serialize;

use needlework_core::{EntityModel, GeneratorConfig};

use crate::derive::DerivedModel;

/// Anchor in `application.properties` receiving second-level cache directives.
pub const CACHE_ANCHOR: &str = "hibernate-cache-add-entry";

/// One data-access path participating in the second-level cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    pub entity_name: String,
    /// Plural field name when the path is a collection-valued relationship.
    pub relationship: Option<String>,
    /// Fully-qualified cache region (`com.app.domain.Invoice.lines`).
    pub region: String,
}

impl CacheEntry {
    /// Property lines configuring this region, without a trailing newline.
    pub fn directive(&self, config: &GeneratorConfig) -> String {
        format!(
            "quarkus.hibernate-orm.cache.\"{region}\".expiration.max-idle={expire}\n\
             quarkus.hibernate-orm.cache.\"{region}\".memory.object-count={max}",
            region = self.region,
            expire = config.cache_expire_after_write,
            max = config.cache_maximum_entries,
        )
    }
}

/// Cache entries for every generated entity, in declaration order.
///
/// Each entity contributes its own region followed by one region per
/// collection-valued relationship. Takes the derived model so entries can
/// only be computed once derivation has completed.
pub fn cache_entries(model: &EntityModel, derived: &DerivedModel) -> Vec<CacheEntry> {
    let package = &model.application.package_name;
    let mut entries = Vec::new();

    for entity in model.entities.iter().filter(|entity| entity.is_generated()) {
        let persist_class = derived
            .get(&entity.name)
            .map(|metadata| metadata.pass1.entity_class.clone())
            .unwrap_or_else(|| entity.persist_class());
        let entity_region = format!("{package}.domain.{persist_class}");

        entries.push(CacheEntry {
            entity_name: entity.name.clone(),
            relationship: None,
            region: entity_region.clone(),
        });

        for relationship in entity
            .relationships
            .iter()
            .filter(|relationship| relationship.is_collection())
        {
            let field = relationship.field_name_plural();
            entries.push(CacheEntry {
                entity_name: entity.name.clone(),
                region: format!("{entity_region}.{field}"),
                relationship: Some(field),
            });
        }
    }

    entries
}
