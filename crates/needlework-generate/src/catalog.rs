use serde::{Deserialize, Serialize};

use needlework_core::Entity;
use needlework_metadata::{CACHE_ANCHOR, DerivedEntityMetadata};

/// When a per-entity template applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCondition {
    Always,
    UsesRepository,
    UsesService,
    HasServiceImplementation,
    DtoMapstruct,
}

impl FileCondition {
    pub fn holds(self, entity: &Entity, metadata: &DerivedEntityMetadata) -> bool {
        match self {
            FileCondition::Always => true,
            FileCondition::UsesRepository => metadata.pass1.uses_repository,
            FileCondition::UsesService => metadata.pass1.uses_service,
            FileCondition::HasServiceImplementation => metadata.pass1.has_service_implementation,
            FileCondition::DtoMapstruct => entity.uses_dto_mapstruct(),
        }
    }
}

/// One template and where its output lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTemplate {
    /// Identifier handed to the renderer.
    pub template: String,
    /// Target path pattern with `{key}` placeholders from the render context.
    pub path: String,
    pub condition: FileCondition,
    /// Anchors merged into this file after rendering.
    #[serde(default)]
    pub anchors: Vec<String>,
}

impl FileTemplate {
    pub fn new(template: &str, path: &str, condition: FileCondition) -> Self {
        Self {
            template: template.to_string(),
            path: path.to_string(),
            condition,
            anchors: Vec::new(),
        }
    }

    pub fn with_anchor(mut self, anchor: &str) -> Self {
        self.anchors.push(anchor.to_string());
        self
    }
}

/// Templates rendered once per run and once per generated entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub application: Vec<FileTemplate>,
    pub entity: Vec<FileTemplate>,
}

const MAIN_JAVA: &str = "src/main/java/{package_folder}";
const TEST_JAVA: &str = "{src_test_java}{package_folder}";

impl Default for TemplateCatalog {
    fn default() -> Self {
        use FileCondition::*;

        let main = |suffix: &str| format!("{MAIN_JAVA}/{suffix}");
        let test = |suffix: &str| format!("{TEST_JAVA}/{suffix}");

        Self {
            application: vec![
                FileTemplate::new(
                    "application.properties",
                    "{src_main_resources}application.properties",
                    Always,
                )
                .with_anchor(CACHE_ANCHOR),
            ],
            entity: vec![
                FileTemplate::new("entity/Entity.java", &main("domain/{entity_class}.java"), Always),
                FileTemplate::new(
                    "entity/EntityRepository.java",
                    &main("repository/{entity_class}Repository.java"),
                    UsesRepository,
                ),
                FileTemplate::new(
                    "entity/EntityService.java",
                    &main("service/{entity_class}Service.java"),
                    UsesService,
                ),
                FileTemplate::new(
                    "entity/EntityServiceImpl.java",
                    &main("service/impl/{entity_class}ServiceImpl.java"),
                    HasServiceImplementation,
                ),
                FileTemplate::new(
                    "entity/EntityResource.java",
                    &main("web/rest/{entity_class}Resource.java"),
                    Always,
                ),
                FileTemplate::new(
                    "entity/EntityDTO.java",
                    &main("service/dto/{dto_class}.java"),
                    DtoMapstruct,
                ),
                FileTemplate::new(
                    "entity/EntityMapper.java",
                    &main("service/mapper/{entity_class}Mapper.java"),
                    DtoMapstruct,
                ),
                FileTemplate::new(
                    "entity/EntityDTOTest.java",
                    &test("service/dto/{dto_class}Test.java"),
                    DtoMapstruct,
                ),
                FileTemplate::new(
                    "entity/EntityMapperTest.java",
                    &test("service/mapper/{entity_class}MapperTest.java"),
                    DtoMapstruct,
                ),
            ],
        }
    }
}

impl TemplateCatalog {
    /// Every template identifier the catalog refers to.
    pub fn template_ids(&self) -> impl Iterator<Item = &str> {
        self.application
            .iter()
            .chain(self.entity.iter())
            .map(|file| file.template.as_str())
    }
}
