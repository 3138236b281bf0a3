mod registry;
mod render;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use needlework_core::{EntityModel, Error as CoreError, GeneratorConfig};
use needlework_generate::{GenerateOptions, GenerationEngine, GenerationError, RenderError};
use needlework_merge::DiskStore;
use needlework_metadata::derive_model;
use registry::{RunContext, RunOptions, init_logging, start_run, write_report};
use render::TemplateDirRenderer;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "needlework", version, about = "Needlework scaffolding CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render and merge the template catalog into a target tree.
    Generate(GenerateArgs),
    /// Print derived entity metadata as JSON.
    Derive(DeriveArgs),
    /// Print the JSON Schema of the entity model.
    Schema,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Entity model (JSON).
    #[arg(long)]
    model: PathBuf,
    /// Generator configuration (TOML); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the template catalog.
    #[arg(long)]
    templates: PathBuf,
    /// Root of the generated file tree.
    #[arg(long)]
    target: PathBuf,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Re-render files that already exist.
    #[arg(long, default_value_t = false)]
    overwrite: bool,
    /// Fail when the model has consistency errors.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Fail the run when fewer files are produced.
    #[arg(long)]
    min_files: Option<usize>,
}

#[derive(Args, Debug)]
struct DeriveArgs {
    /// Entity model (JSON).
    #[arg(long)]
    model: PathBuf,
    /// Generator configuration (TOML); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Derive(args) => run_derive(args),
        Command::Schema => run_schema(),
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let GenerateArgs {
        model,
        config,
        templates,
        target,
        run_dir,
        overwrite,
        strict,
        min_files,
    } = args;

    if !templates.is_dir() {
        return Err(CliError::InvalidConfig(format!(
            "template directory not found: {}",
            templates.display()
        )));
    }

    let entity_model = load_model(&model)?;
    let generator_config = load_config(config.as_deref())?;

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        run_dir,
        model,
        templates: templates.clone(),
        target: target.clone(),
        options: RunOptions {
            overwrite,
            strict,
            min_files,
        },
        config: generator_config.clone(),
    };

    let run_paths = start_run(&run_ctx)?;
    init_logging(Some(&run_paths.logs_path))?;

    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        run_dir = %run_paths.root.display(),
        target = %target.display()
    );

    let timer = Instant::now();
    let options = GenerateOptions {
        overwrite,
        strict,
        min_files,
        run_id: Some(run_id.clone()),
    };
    let engine = GenerationEngine::new(generator_config, options)?;
    let renderer = TemplateDirRenderer::new(&templates)?;
    for template in renderer.missing_templates(engine.catalog().template_ids()) {
        tracing::warn!(event = "template_missing", template = %template);
    }
    let mut store = DiskStore::new(&target);

    let report = match engine.run(&entity_model, &renderer, &mut store) {
        Ok(result) => result.report,
        Err(GenerationError::Failed(report)) => {
            write_report(&run_paths, &report)?;
            tracing::info!(event = "run_finished", status = "failed");
            return Err(GenerationError::Failed(report).into());
        }
        Err(err) => return Err(err.into()),
    };

    write_report(&run_paths, &report)?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(
        event = "run_finished",
        status = "success",
        files = report.files.len(),
        warnings = report.warnings.len(),
        duration_ms = duration_ms
    );

    Ok(())
}

fn run_derive(args: DeriveArgs) -> Result<(), CliError> {
    init_logging(None)?;

    let model = load_model(&args.model)?;
    let config = load_config(args.config.as_deref())?;
    let derived = derive_model(&model, &config);

    println!("{}", serde_json::to_string_pretty(&derived)?);
    Ok(())
}

fn run_schema() -> Result<(), CliError> {
    let schema = schemars::schema_for!(EntityModel);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn load_model(path: &Path) -> Result<EntityModel, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig, CliError> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(GeneratorConfig::from_toml_str(&content)?)
        }
        None => Ok(GeneratorConfig::default()),
    }
}
