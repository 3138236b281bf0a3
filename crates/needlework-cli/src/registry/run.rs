use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use needlework_core::{GeneratorConfig, MODEL_VERSION};
use needlework_generate::GenerationReport;

use super::{RegistryError, RegistryResult};

/// Serializable generation options for runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunOptions {
    pub overwrite: bool,
    pub strict: bool,
    pub min_files: Option<usize>,
}

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
    pub model: PathBuf,
    pub templates: PathBuf,
    pub target: PathBuf,
    pub options: RunOptions,
    pub config: GeneratorConfig,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub model_version: String,
    pub model: PathBuf,
    pub templates: PathBuf,
    pub target: PathBuf,
    pub options: RunOptions,
    pub config: GeneratorConfig,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub report_path: PathBuf,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let run_root = ctx
        .run_dir
        .join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&run_root)?;

    let config_path = run_root.join("config.json");
    let logs_path = run_root.join("logs.ndjson");
    let report_path = run_root.join("generation_report.json");

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        model_version: MODEL_VERSION.to_string(),
        model: ctx.model.clone(),
        templates: ctx.templates.clone(),
        target: ctx.target.clone(),
        options: ctx.options.clone(),
        config: ctx.config.clone(),
        git: collect_git_info(),
    };

    write_json(&config_path, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        root: run_root,
        logs_path,
        report_path,
    })
}

pub fn write_report(paths: &RunPaths, report: &GenerationReport) -> RegistryResult<()> {
    write_json(&paths.report_path, report)
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new().create(true).truncate(true).write(true).open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(run_dir: &Path) -> RunContext {
        RunContext {
            run_id: "00000000-0000-4000-8000-000000000001".to_string(),
            started_at: Utc::now(),
            run_dir: run_dir.to_path_buf(),
            model: PathBuf::from("model.json"),
            templates: PathBuf::from("templates"),
            target: PathBuf::from("out"),
            options: RunOptions {
                overwrite: false,
                strict: true,
                min_files: Some(3),
            },
            config: GeneratorConfig::default(),
        }
    }

    #[test]
    fn start_run_lays_out_run_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = start_run(&context(dir.path())).expect("start run");

        let name = paths
            .root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert!(name.ends_with("__run_00000000-0000-4000-8000-000000000001"));
        assert!(paths.logs_path.exists());
        assert!(!paths.report_path.exists());

        let config: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(paths.root.join("config.json")).expect("read config"),
        )
        .expect("parse config");
        assert_eq!(config["model_version"], MODEL_VERSION);
        assert_eq!(config["options"]["min_files"], 3);
        assert_eq!(config["config"]["needle_prefix"], "needlework-needle-");
    }

    #[test]
    fn report_is_written_next_to_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = start_run(&context(dir.path())).expect("start run");
        let report = GenerationReport::new("run".to_string(), Utc::now().to_rfc3339());

        write_report(&paths, &report).expect("write report");

        let written: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(&paths.report_path).expect("read report"),
        )
        .expect("parse report");
        assert_eq!(written["run_id"], "run");
        assert_eq!(written["files"], serde_json::json!([]));
    }
}
