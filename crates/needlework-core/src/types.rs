use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Data-access strategy used by generated persistence code.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataAccess {
    #[default]
    #[serde(alias = "activeRecord")]
    ActiveRecord,
    Repository,
}

/// Service layer generated in front of the data-access object.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    #[default]
    #[serde(alias = "no")]
    None,
    #[serde(alias = "serviceClass", alias = "service_class")]
    Direct,
    #[serde(alias = "serviceImpl", alias = "service_impl")]
    Implementation,
}

/// Pagination style for list endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    #[default]
    #[serde(alias = "no")]
    None,
    Pagination,
    #[serde(alias = "infinite-scroll")]
    InfiniteScroll,
}

/// DTO mapping mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DtoMode {
    #[default]
    #[serde(alias = "no")]
    None,
    Mapstruct,
}

/// Authentication mode of the generated application.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationType {
    #[default]
    Jwt,
    Session,
    Oauth2,
}

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    #[serde(alias = "one_to_one")]
    OneToOne,
    #[serde(alias = "one_to_many")]
    OneToMany,
    #[serde(alias = "many_to_one")]
    ManyToOne,
    #[serde(alias = "many_to_many")]
    ManyToMany,
}

impl RelationshipKind {
    /// Kinds whose owning side holds a collection by default.
    pub fn is_collection(self) -> bool {
        matches!(self, RelationshipKind::OneToMany | RelationshipKind::ManyToMany)
    }
}
