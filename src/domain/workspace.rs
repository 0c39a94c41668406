//! Host and engine paths the workflow operates on.

use crate::domain::algorithm::AlgorithmStore;
use crate::domain::error::LeanboxError;
use crate::ports::config_port::ConfigPort;
use std::path::{Path, PathBuf};

/// Name of the harvested engine log inside every run directory.
pub const RUN_LOG_FILE: &str = "backtest.log";

/// Where things live inside the engine namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLayout {
    /// Root searched for artifacts.
    pub root: String,
    /// Directory algorithm files are copied into.
    pub algorithm_dir: String,
    /// `--algorithm-location` prefix, relative to the launcher's working dir.
    pub location_prefix: String,
    pub log_path: String,
    pub artifact_extensions: Vec<String>,
}

impl Default for EngineLayout {
    fn default() -> Self {
        Self {
            root: "/Lean".to_string(),
            algorithm_dir: "/Lean/Algorithm.Python".to_string(),
            location_prefix: "../../../Algorithm.Python".to_string(),
            log_path: "/Lean/log.txt".to_string(),
            artifact_extensions: vec!["json".into(), "html".into(), "csv".into()],
        }
    }
}

impl EngineLayout {
    pub fn algorithm_destination(&self, file_name: &str) -> String {
        join_engine_path(&self.algorithm_dir, file_name)
    }

    pub fn algorithm_location(&self, file_name: &str) -> String {
        join_engine_path(&self.location_prefix, file_name)
    }
}

fn join_engine_path(dir: &str, file_name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file_name)
}

#[derive(Debug, Clone)]
pub struct Workspace {
    pub algorithms: PathBuf,
    pub results: PathBuf,
    pub generated: PathBuf,
    pub engine: EngineLayout,
    /// Lines of the run log echoed after a backtest.
    pub tail_lines: usize,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            algorithms: PathBuf::from("./algorithms"),
            results: PathBuf::from("./results"),
            generated: PathBuf::from("./generated"),
            engine: EngineLayout::default(),
            tail_lines: 50,
        }
    }
}

impl Workspace {
    /// Build from `[paths]`, `[engine]` and `[display]`, falling back to
    /// defaults for anything unset.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LeanboxError> {
        let defaults = Workspace::default();
        let root = config.get_string_or("engine", "root", &defaults.engine.root);
        let default_log = join_engine_path(&root, "log.txt");

        let engine = EngineLayout {
            algorithm_dir: config.get_string_or(
                "engine",
                "algorithm_dir",
                &defaults.engine.algorithm_dir,
            ),
            location_prefix: config.get_string_or(
                "engine",
                "location_prefix",
                &defaults.engine.location_prefix,
            ),
            log_path: config.get_string_or("engine", "log_path", &default_log),
            artifact_extensions: match config.get_string("engine", "artifact_extensions") {
                Some(raw) => parse_extensions(&raw),
                None => defaults.engine.artifact_extensions,
            },
            root,
        };
        validate_engine_layout(&engine)?;

        let tail_lines = config.get_int("display", "tail_lines", defaults.tail_lines as i64);
        if tail_lines <= 0 {
            return Err(LeanboxError::ConfigInvalid {
                section: "display".into(),
                key: "tail_lines".into(),
                reason: "tail_lines must be positive".into(),
            });
        }

        Ok(Self {
            algorithms: path_or(config, "algorithms", &defaults.algorithms),
            results: path_or(config, "results", &defaults.results),
            generated: path_or(config, "generated", &defaults.generated),
            engine,
            tail_lines: tail_lines as usize,
        })
    }

    pub fn store(&self) -> AlgorithmStore {
        AlgorithmStore::new(&self.algorithms)
    }

    /// Run Record directory for `name`.
    pub fn run_dir(&self, name: &str) -> PathBuf {
        self.results.join(name)
    }
}

fn path_or(config: &dyn ConfigPort, key: &str, default: &Path) -> PathBuf {
    config
        .get_string("paths", key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| default.to_path_buf())
}

/// `"json, .HTML,csv"` -> `["json", "html", "csv"]`.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn validate_engine_layout(layout: &EngineLayout) -> Result<(), LeanboxError> {
    for (key, value) in [
        ("root", &layout.root),
        ("algorithm_dir", &layout.algorithm_dir),
        ("log_path", &layout.log_path),
    ] {
        if !value.starts_with('/') {
            return Err(LeanboxError::ConfigInvalid {
                section: "engine".into(),
                key: key.into(),
                reason: format!("{key} must be an absolute path inside the engine"),
            });
        }
    }
    if layout.artifact_extensions.is_empty() {
        return Err(LeanboxError::ConfigInvalid {
            section: "engine".into(),
            key: "artifact_extensions".into(),
            reason: "at least one extension is required".into(),
        });
    }
    Ok(())
}
