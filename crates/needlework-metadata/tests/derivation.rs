use needlework_core::{
    Application, AuthenticationType, Entity, EntityModel, GeneratorConfig, PrimaryKey,
    Relationship, RelationshipKind,
};
use needlework_metadata::{Pass1Result, cache_entries, derive_model};

fn application(authentication_type: AuthenticationType) -> Application {
    Application {
        base_name: "billing".to_string(),
        package_name: "com.app".to_string(),
        authentication_type,
        src_main_resources: "src/main/resources/".to_string(),
        src_test_java: "src/test/java/".to_string(),
    }
}

fn entity(name: &str, key_type: &str) -> Entity {
    let mut entity = Entity::new(name);
    entity.primary_key = Some(PrimaryKey {
        name: "id".to_string(),
        key_type: key_type.to_string(),
    });
    entity
}

fn owner_of_user() -> Relationship {
    Relationship::new("owner", "user", RelationshipKind::ManyToOne).identifying()
}

#[test]
fn invoice_identified_by_federated_user_gets_string_key() {
    let mut invoice = entity("Invoice", "Long");
    invoice.relationships.push(owner_of_user());
    let model = EntityModel {
        application: application(AuthenticationType::Oauth2),
        entities: vec![invoice],
    };

    let derived = derive_model(&model, &GeneratorConfig::default());
    let metadata = derived.get("Invoice").expect("derived invoice");
    assert_eq!(metadata.pass2.maps_id_relationship, Some(owner_of_user()));
    assert!(metadata.pass2.uses_maps_id);
    assert_eq!(metadata.pass2.primary_key_type.as_deref(), Some("String"));
}

#[test]
fn user_target_keeps_declared_key_outside_oauth2() {
    for mode in [AuthenticationType::Jwt, AuthenticationType::Session] {
        let mut invoice = entity("Invoice", "Long");
        invoice.relationships.push(owner_of_user());
        let model = EntityModel {
            application: application(mode),
            entities: vec![invoice],
        };

        let derived = derive_model(&model, &GeneratorConfig::default());
        let metadata = derived.get("Invoice").expect("derived invoice");
        assert!(metadata.pass2.uses_maps_id);
        assert_eq!(metadata.pass2.primary_key_type.as_deref(), Some("Long"));
    }
}

#[test]
fn entity_level_authentication_overrides_application() {
    let mut invoice = entity("Invoice", "Long");
    invoice.relationships.push(owner_of_user());
    invoice.authentication_type = Some(AuthenticationType::Oauth2);
    let model = EntityModel {
        application: application(AuthenticationType::Jwt),
        entities: vec![invoice],
    };

    let derived = derive_model(&model, &GeneratorConfig::default());
    let metadata = derived.get("Invoice").expect("derived invoice");
    assert_eq!(metadata.pass2.primary_key_type.as_deref(), Some("String"));
}

#[test]
fn identifying_non_user_target_keeps_declared_key_in_every_mode() {
    for mode in [
        AuthenticationType::Jwt,
        AuthenticationType::Session,
        AuthenticationType::Oauth2,
    ] {
        let mut detail = entity("OrderDetail", "UUID");
        detail.relationships.push(
            Relationship::new("order", "Order", RelationshipKind::OneToOne).identifying(),
        );
        let model = EntityModel {
            application: application(mode),
            entities: vec![entity("Order", "Long"), detail],
        };

        let derived = derive_model(&model, &GeneratorConfig::default());
        let metadata = derived.get("OrderDetail").expect("derived detail");
        assert!(metadata.pass2.uses_maps_id);
        assert_eq!(metadata.pass2.primary_key_type.as_deref(), Some("UUID"));
    }
}

#[test]
fn without_identifying_relationship_key_type_is_declared_type() {
    let mut invoice = entity("Invoice", "Long");
    invoice.relationships.push(Relationship::new(
        "owner",
        "user",
        RelationshipKind::ManyToOne,
    ));
    let model = EntityModel {
        application: application(AuthenticationType::Oauth2),
        entities: vec![invoice],
    };

    let derived = derive_model(&model, &GeneratorConfig::default());
    let metadata = derived.get("Invoice").expect("derived invoice");
    assert_eq!(metadata.pass2.maps_id_relationship, None);
    assert!(!metadata.pass2.uses_maps_id);
    assert_eq!(metadata.pass2.primary_key_type.as_deref(), Some("Long"));
}

#[test]
fn first_identifying_relationship_wins() {
    let mut order = entity("Order", "Long");
    order.relationships.push(
        Relationship::new("customer", "Customer", RelationshipKind::ManyToOne).identifying(),
    );
    order.relationships.push(owner_of_user());
    let model = EntityModel {
        application: application(AuthenticationType::Oauth2),
        entities: vec![entity("Customer", "Long"), order],
    };

    let derived = derive_model(&model, &GeneratorConfig::default());
    let metadata = derived.get("Order").expect("derived order");
    let maps_id = metadata
        .pass2
        .maps_id_relationship
        .as_ref()
        .expect("maps id relationship");
    assert_eq!(maps_id.relationship_name, "customer");
    assert_eq!(metadata.pass2.primary_key_type.as_deref(), Some("Long"));
}

#[test]
fn missing_primary_key_propagates_as_absent_type() {
    let mut invoice = Entity::new("Invoice");
    invoice.relationships.push(
        Relationship::new("order", "Order", RelationshipKind::OneToOne).identifying(),
    );
    let model = EntityModel {
        application: application(AuthenticationType::Jwt),
        entities: vec![invoice],
    };

    let derived = derive_model(&model, &GeneratorConfig::default());
    let metadata = derived.get("Invoice").expect("derived invoice");
    assert!(metadata.pass2.uses_maps_id);
    assert_eq!(metadata.pass2.primary_key_type, None);
}

#[test]
fn embedded_and_many_to_many_flags_read_targets() {
    let mut address = entity("Address", "Long");
    address.embedded = true;
    let mut customer = entity("Customer", "Long");
    customer.relationships.push(Relationship::new(
        "address",
        "address",
        RelationshipKind::OneToOne,
    ));
    customer.relationships.push(Relationship::new(
        "tag",
        "Tag",
        RelationshipKind::ManyToMany,
    ));
    // Declared after the owner: pass 1 must already cover it.
    let model = EntityModel {
        application: application(AuthenticationType::Jwt),
        entities: vec![customer, entity("Tag", "Long"), address],
    };

    let derived = derive_model(&model, &GeneratorConfig::default());
    let customer = derived.get("Customer").expect("derived customer");
    assert!(customer.pass2.has_embedded_field);
    assert!(customer.pass2.has_owning_many_to_many_field);

    let tag = derived.get("Tag").expect("derived tag");
    assert!(!tag.pass2.has_embedded_field);
    assert!(!tag.pass2.has_owning_many_to_many_field);
}

#[test]
fn derivation_is_idempotent() {
    let mut invoice = entity("Invoice", "Long");
    invoice.relationships.push(owner_of_user());
    invoice.relationships.push(Relationship::new(
        "line",
        "InvoiceLine",
        RelationshipKind::OneToMany,
    ));
    let model = EntityModel {
        application: application(AuthenticationType::Oauth2),
        entities: vec![invoice, entity("InvoiceLine", "Long")],
    };
    let config = GeneratorConfig::default();

    let first = derive_model(&model, &config);
    let second = derive_model(&model, &config);
    assert_eq!(first, second);

    // Feeding resolved defaults back in changes nothing.
    let mut resolved = model.clone();
    for (entity, metadata) in resolved.entities.iter_mut().zip(first.entities()) {
        entity.data_access = Some(metadata.pass1.data_access);
    }
    assert_eq!(derive_model(&resolved, &config), first);
}

#[test]
fn pass1_snapshot_covers_every_entity_before_pass2() {
    let model = EntityModel {
        application: application(AuthenticationType::Jwt),
        entities: vec![entity("Invoice", "Long"), entity("InvoiceLine", "Long")],
    };
    let snapshot = Pass1Result::run(&model, &GeneratorConfig::default());
    assert_eq!(snapshot.entries().len(), 2);
    assert!(snapshot.get("invoiceLine").is_some());

    let derived = snapshot.finish();
    let names: Vec<&str> = derived
        .entities()
        .iter()
        .map(|metadata| metadata.pass1.entity_name.as_str())
        .collect();
    assert_eq!(names, vec!["Invoice", "InvoiceLine"]);
}

#[test]
fn cache_entries_cover_entities_and_collections_in_order() {
    let mut invoice = entity("Invoice", "Long");
    invoice.relationships.push(owner_of_user());
    invoice.relationships.push(Relationship::new(
        "line",
        "InvoiceLine",
        RelationshipKind::OneToMany,
    ));
    let mut user = entity("User", "String");
    user.built_in = true;
    let mut hidden = entity("Audit", "Long");
    hidden.skip_server = true;
    let model = EntityModel {
        application: application(AuthenticationType::Jwt),
        entities: vec![user, invoice, entity("InvoiceLine", "Long"), hidden],
    };
    let config = GeneratorConfig::default();
    let derived = derive_model(&model, &config);

    let regions: Vec<String> = cache_entries(&model, &derived)
        .into_iter()
        .map(|entry| entry.region)
        .collect();
    assert_eq!(
        regions,
        vec![
            "com.app.domain.Invoice",
            "com.app.domain.Invoice.lines",
            "com.app.domain.InvoiceLine",
        ]
    );

    let entries = cache_entries(&model, &derived);
    assert_eq!(
        entries[1].directive(&config),
        "quarkus.hibernate-orm.cache.\"com.app.domain.Invoice.lines\".expiration.max-idle=3600S\n\
         quarkus.hibernate-orm.cache.\"com.app.domain.Invoice.lines\".memory.object-count=100"
    );
}

#[test]
fn derived_metadata_serializes_flat() {
    let mut invoice = entity("Invoice", "Long");
    invoice.relationships.push(owner_of_user());
    let model = EntityModel {
        application: application(AuthenticationType::Oauth2),
        entities: vec![invoice],
    };

    let derived = derive_model(&model, &GeneratorConfig::default());
    let json = serde_json::to_value(&derived).expect("serialize derived model");
    let invoice = &json["entities"][0];

    assert_eq!(invoice["entity_class"], "Invoice");
    assert_eq!(invoice["mapper"], "invoiceMapper");
    assert_eq!(invoice["primary_key_type"], "String");
    assert_eq!(invoice["uses_maps_id"], true);
    assert_eq!(invoice["maps_id_relationship"]["other_entity_name"], "user");
    assert!(json.get("index").is_none());
}
