use needlework_core::{
    AuthenticationType, DataAccess, DtoMode, EntityModel, PaginationMode, RelationshipKind,
    ServiceMode,
};

const MODEL: &str = r#"{
  "application": {
    "base_name": "billing",
    "package_name": "com.app",
    "authentication_type": "oauth2"
  },
  "entities": [
    {
      "name": "Invoice",
      "primary_key": { "name": "id", "type": "Long" },
      "service": "serviceImpl",
      "pagination": "infinite-scroll",
      "dto": "mapstruct",
      "relationships": [
        {
          "relationship_name": "owner",
          "other_entity_name": "user",
          "relationship_type": "many-to-one",
          "id": true
        },
        {
          "relationship_name": "line",
          "other_entity_name": "InvoiceLine",
          "relationship_type": "one-to-many"
        }
      ]
    },
    {
      "name": "InvoiceLine",
      "data_access": "repository",
      "embedded": true
    }
  ]
}"#;

#[test]
fn parses_model_with_defaults_and_aliases() {
    let model: EntityModel = serde_json::from_str(MODEL).expect("parse model");

    assert_eq!(
        model.application.authentication_type,
        AuthenticationType::Oauth2
    );
    assert_eq!(model.application.src_main_resources, "src/main/resources/");
    assert_eq!(model.application.src_test_java, "src/test/java/");

    let invoice = &model.entities[0];
    assert_eq!(invoice.service, ServiceMode::Implementation);
    assert_eq!(invoice.pagination, PaginationMode::InfiniteScroll);
    assert_eq!(invoice.dto, DtoMode::Mapstruct);
    assert_eq!(invoice.data_access, None);
    assert_eq!(
        invoice.primary_key.as_ref().map(|pk| pk.key_type.as_str()),
        Some("Long")
    );
    assert!(invoice.relationships[0].identifying);
    assert_eq!(
        invoice.relationships[0].relationship_type,
        RelationshipKind::ManyToOne
    );
    assert!(invoice.relationships[1].is_collection());

    let line = &model.entities[1];
    assert_eq!(line.data_access, Some(DataAccess::Repository));
    assert!(line.embedded);
    assert!(line.relationships.is_empty());
    assert!(line.primary_key.is_none());
}

#[test]
fn serialization_keeps_declaration_order() {
    let model: EntityModel = serde_json::from_str(MODEL).expect("parse model");
    let json = serde_json::to_value(&model).expect("serialize model");
    let reparsed: EntityModel = serde_json::from_value(json).expect("reparse model");

    let names: Vec<&str> = reparsed.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Invoice", "InvoiceLine"]);
    assert_eq!(reparsed, model);
}
