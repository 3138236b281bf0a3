use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use needlework_core::{EntityModel, Error as CoreError, GeneratorConfig, validate_model};
use needlework_merge::{
    AnchorRegistry, MergeEngine, MergeError, MergeOp, MergeOutcome, MissingFile, NeedleFormat,
    TextStore, merge_file,
};
use needlework_metadata::{CACHE_ANCHOR, DerivedModel, cache_entries, derive_model};

use crate::catalog::{FileTemplate, TemplateCatalog};
use crate::errors::GenerationError;
use crate::model::{FileAction, FileReport, GenerateOptions, GenerationIssue, GenerationReport};
use crate::render::{RenderContext, TemplateRenderer};
use crate::rewrites::{FileRewrite, dto_test_rewrites};

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub report: GenerationReport,
    pub derived: DerivedModel,
    /// Anchor contributions accumulated during the run.
    pub registry: AnchorRegistry,
}

/// Entry point for scaffolding a model into a file tree.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    config: GeneratorConfig,
    options: GenerateOptions,
    catalog: TemplateCatalog,
    merge: MergeEngine,
}

impl GenerationEngine {
    /// Validate the configuration up front; a bad configuration aborts the
    /// run before any file is touched.
    pub fn new(config: GeneratorConfig, options: GenerateOptions) -> Result<Self, GenerationError> {
        config.validate()?;
        let merge = MergeEngine::new(NeedleFormat::new(config.needle_prefix.clone()));
        Ok(Self {
            config,
            options,
            catalog: TemplateCatalog::default(),
            merge,
        })
    }

    pub fn with_catalog(mut self, catalog: TemplateCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Derive metadata, register cache anchors, render and merge every file.
    ///
    /// Per-file failures are recorded as warnings and never stop the run.
    pub fn run<R, S>(
        &self,
        model: &EntityModel,
        renderer: &R,
        store: &mut S,
    ) -> Result<GenerationResult, GenerationError>
    where
        R: TemplateRenderer + ?Sized,
        S: TextStore + ?Sized,
    {
        let start = Instant::now();
        let run_id = self
            .options
            .run_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut report = GenerationReport::new(run_id.clone(), chrono::Utc::now().to_rfc3339());
        report.entities = model.entities.len();

        info!(
            run_id = %run_id,
            entities = report.entities,
            caching = self.config.caching_enabled,
            overwrite = self.options.overwrite,
            "generation started"
        );

        self.check_model(model, &mut report)?;

        let derived = derive_model(model, &self.config);
        let registry = self.register_cache_entries(model, &derived, &mut report);
        let rewrites = dto_test_rewrites(model)?;
        let scope = FileScope {
            registry: &registry,
            rewrites: &rewrites,
        };

        let application = &model.application;
        let context = RenderContext::for_application(application)?;
        for file in &self.catalog.application {
            self.write_file(file, &context, None, renderer, store, &scope, &mut report);
        }

        for entity in model.entities.iter().filter(|entity| entity.is_generated()) {
            let Some(metadata) = derived.get(&entity.name) else {
                continue;
            };
            let context = RenderContext::for_entity(application, entity, metadata)?;
            for file in self
                .catalog
                .entity
                .iter()
                .filter(|file| file.condition.holds(entity, metadata))
            {
                self.write_file(
                    file,
                    &context,
                    Some(&entity.name),
                    renderer,
                    store,
                    &scope,
                    &mut report,
                );
            }
        }

        // Rewrites of files not rendered this run go straight to the store.
        for rewrite in &rewrites {
            if report.file(&display_path(&rewrite.path)).is_none() {
                self.apply_rewrite(rewrite, store, &mut report);
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;

        if let Some(min_files) = self.options.min_files {
            if report.files_produced() < min_files {
                warn!(
                    run_id = %run_id,
                    produced = report.files_produced(),
                    required = min_files,
                    "generation failed"
                );
                return Err(GenerationError::Failed(report));
            }
        }

        info!(
            run_id = %run_id,
            files = report.files.len(),
            produced = report.files_produced(),
            warnings = report.warnings.len(),
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult {
            report,
            derived,
            registry,
        })
    }

    fn check_model(
        &self,
        model: &EntityModel,
        report: &mut GenerationReport,
    ) -> Result<(), GenerationError> {
        let validation = validate_model(model);

        for issue in validation.errors.iter().chain(validation.warnings.iter()) {
            warn!(code = %issue.code, path = %issue.path, message = %issue.message, "model inconsistency");
            report.record_warning(
                GenerationIssue::warning(&issue.code, issue.message.clone())
                    .with_path(issue.path.clone())
                    .with_hint(issue.hint.clone()),
            );
        }

        if self.options.strict && !validation.is_ok() {
            let messages: Vec<&str> = validation
                .errors
                .iter()
                .map(|issue| issue.message.as_str())
                .collect();
            return Err(CoreError::ModelInconsistency(messages.join("; ")).into());
        }

        Ok(())
    }

    fn register_cache_entries(
        &self,
        model: &EntityModel,
        derived: &DerivedModel,
        report: &mut GenerationReport,
    ) -> AnchorRegistry {
        let mut registry = AnchorRegistry::new();
        if !self.config.caching_enabled {
            return registry;
        }

        let mut regions = BTreeSet::new();
        for entry in cache_entries(model, derived) {
            if !regions.insert(entry.region.clone()) {
                continue;
            }
            debug!(region = %entry.region, "cache entry registered");
            registry.register_text(CACHE_ANCHOR, entry.directive(&self.config));
        }
        report.cache_entries = registry.rules(CACHE_ANCHOR).len();
        registry
    }

    #[allow(clippy::too_many_arguments)]
    fn write_file<R, S>(
        &self,
        file: &FileTemplate,
        context: &RenderContext,
        entity: Option<&str>,
        renderer: &R,
        store: &mut S,
        scope: &FileScope<'_>,
        report: &mut GenerationReport,
    ) where
        R: TemplateRenderer + ?Sized,
        S: TextStore + ?Sized,
    {
        let outcome = context
            .expand_path(&file.path)
            .map_err(GenerationError::from)
            .and_then(|path| {
                let produced =
                    self.produce_file(file, &path, context, renderer, store, scope, report);
                produced.map(|(action, text)| (path, action, text))
            });

        match outcome {
            Ok((path, action, text)) => {
                debug!(path = %path.display(), action = ?action, "file written");
                report.record_file(FileReport {
                    path: display_path(&path),
                    template: Some(file.template.clone()),
                    entity: entity.map(str::to_string),
                    action,
                    sha256: Some(sha256_hex(&text)),
                });
            }
            Err(err) => {
                let path = context
                    .expand_path(&file.path)
                    .map(|path| display_path(&path))
                    .unwrap_or_else(|_| file.path.clone());
                warn!(path = %path, error = %err, "file generation failed");
                let mut issue = GenerationIssue::warning(error_code(&err), err.to_string())
                    .with_path(path.clone());
                if let Some(entity) = entity {
                    issue = issue.with_entity(entity);
                }
                report.record_warning(issue);
                report.record_file(FileReport {
                    path,
                    template: Some(file.template.clone()),
                    entity: entity.map(str::to_string),
                    action: FileAction::Failed,
                    sha256: None,
                });
            }
        }
    }

    /// Render (or keep) the base text of a file, merge its anchors and
    /// rewrites into it, then write it once if it differs from disk.
    #[allow(clippy::too_many_arguments)]
    fn produce_file<R, S>(
        &self,
        file: &FileTemplate,
        path: &Path,
        context: &RenderContext,
        renderer: &R,
        store: &mut S,
        scope: &FileScope<'_>,
        report: &mut GenerationReport,
    ) -> Result<(FileAction, String), GenerationError>
    where
        R: TemplateRenderer + ?Sized,
        S: TextStore + ?Sized,
    {
        let existing = store.read(path)?;
        let base = match &existing {
            Some(text) if !self.options.overwrite => text.clone(),
            _ => renderer.render(&file.template, context)?,
        };

        let ops: Vec<MergeOp> = file
            .anchors
            .iter()
            .map(|anchor| MergeOp::anchor(anchor.as_str()))
            .collect();
        // Entries merged on an earlier run are already above the marker.
        let pending = scope.registry.without_present(&base, self.merge.needles());
        let mut merged = self.merge.apply(&base, &ops, &pending)?;

        let target = display_path(path);
        for rewrite in scope
            .rewrites
            .iter()
            .filter(|rewrite| display_path(&rewrite.path) == target)
        {
            match self.merge.apply(&merged, &rewrite.ops, &AnchorRegistry::new()) {
                Ok(text) => merged = text,
                Err(err) => record_rewrite_failure(report, &target, rewrite, &err),
            }
        }

        let action = match existing {
            None => FileAction::Created,
            Some(previous) if previous == merged => FileAction::Unchanged,
            Some(_) => FileAction::Updated,
        };
        if action != FileAction::Unchanged {
            store.write(path, &merged)?;
        }

        Ok((action, merged))
    }

    fn apply_rewrite<S>(&self, rewrite: &FileRewrite, store: &mut S, report: &mut GenerationReport)
    where
        S: TextStore + ?Sized,
    {
        let path = display_path(&rewrite.path);
        let merged = merge_file(
            &self.merge,
            store,
            &rewrite.path,
            &rewrite.ops,
            &AnchorRegistry::new(),
            MissingFile::Fail,
        );

        match merged {
            Ok(merged) => report.record_file(FileReport {
                sha256: Some(sha256_hex(&merged.text)),
                path,
                template: None,
                entity: Some(rewrite.entity.clone()),
                action: action_for(merged.outcome),
            }),
            Err(err) => record_rewrite_failure(report, &path, rewrite, &err),
        }
    }
}

/// Per-run inputs shared by every rendered file.
struct FileScope<'a> {
    registry: &'a AnchorRegistry,
    rewrites: &'a [FileRewrite],
}

fn record_rewrite_failure(
    report: &mut GenerationReport,
    path: &str,
    rewrite: &FileRewrite,
    err: &MergeError,
) {
    warn!(path = %path, error = %err, "rewrite skipped");
    report.record_warning(
        GenerationIssue::warning(merge_error_code(err), err.to_string())
            .with_path(path)
            .with_entity(rewrite.entity.clone()),
    );
}

fn action_for(outcome: MergeOutcome) -> FileAction {
    match outcome {
        MergeOutcome::Created => FileAction::Created,
        MergeOutcome::Updated => FileAction::Updated,
        MergeOutcome::Unchanged => FileAction::Unchanged,
    }
}

fn error_code(err: &GenerationError) -> &'static str {
    match err {
        GenerationError::Merge(err) => merge_error_code(err),
        GenerationError::Render(_) => "render_failed",
        GenerationError::Io(_) => "io_error",
        GenerationError::Json(_) => "context_error",
        _ => "generation_failed",
    }
}

fn merge_error_code(err: &MergeError) -> &'static str {
    match err {
        MergeError::ResourceNotFound(_) => "resource_not_found",
        MergeError::MalformedRule(_) => "malformed_rule",
        MergeError::Io(_) => "io_error",
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
