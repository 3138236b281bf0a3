use std::path::PathBuf;

use needlework_core::EntityModel;
use needlework_merge::{MergeError, MergeOp};

/// Ad hoc rewrites requested for one existing file.
#[derive(Debug, Clone)]
pub struct FileRewrite {
    pub entity: String,
    pub path: PathBuf,
    pub ops: Vec<MergeOp>,
}

/// Adjust generated DTO and mapper tests to field-style `id` access and the
/// flat `TestUtil` location.
pub fn dto_test_rewrites(model: &EntityModel) -> Result<Vec<FileRewrite>, MergeError> {
    let application = &model.application;
    let test_root = format!(
        "{}{}",
        application.src_test_java,
        application.package_folder()
    );
    let mut rewrites = Vec::new();

    for entity in model
        .entities
        .iter()
        .filter(|entity| entity.is_generated() && entity.uses_dto_mapstruct())
    {
        rewrites.push(FileRewrite {
            entity: entity.name.clone(),
            path: PathBuf::from(format!(
                "{test_root}/service/dto/{}Test.java",
                entity.dto_class()
            )),
            ops: vec![
                MergeOp::replace("web.rest.TestUtil", "TestUtil"),
                MergeOp::replace("getId()", "id"),
                MergeOp::rewrite(r"setId\((.+)\)", "id = $1")?,
            ],
        });

        rewrites.push(FileRewrite {
            entity: entity.name.clone(),
            path: PathBuf::from(format!(
                "{test_root}/service/mapper/{}MapperTest.java",
                entity.entity_class()
            )),
            ops: vec![MergeOp::replace("getId()", "id")],
        });
    }

    Ok(rewrites)
}
