//! Artifact harvesting: best-effort copy of engine output into a run directory.
//!
//! Nothing here escalates a missing or uncopyable file into an error. Every
//! copy is recorded as its own outcome in a [`HarvestReport`].

use crate::domain::error::LeanboxError;
use crate::domain::workspace::{EngineLayout, RUN_LOG_FILE};
use crate::ports::engine_port::EnginePort;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct HarvestFailure {
    pub reason: String,
}

impl From<LeanboxError> for HarvestFailure {
    fn from(err: LeanboxError) -> Self {
        Self {
            reason: err.to_string(),
        }
    }
}

/// One attempted copy out of the engine namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutcome {
    pub source: String,
    pub result: Result<PathBuf, HarvestFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// The engine log, copied to `backtest.log`. Absence is informational.
    pub log: ArtifactOutcome,
    pub artifacts: Vec<ArtifactOutcome>,
    /// Set when the artifact search itself could not run.
    pub search_failure: Option<HarvestFailure>,
}

impl HarvestReport {
    pub fn harvested(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(&self.log)
            .chain(self.artifacts.iter())
            .filter_map(|o| o.result.as_ref().ok().map(PathBuf::as_path))
    }

    pub fn failures(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.artifacts.iter().filter(|o| o.result.is_err())
    }

    pub fn log_harvested(&self) -> bool {
        self.log.result.is_ok()
    }

    pub fn is_complete(&self) -> bool {
        self.search_failure.is_none() && self.failures().next().is_none()
    }
}

/// Copy the engine log and every matching artifact into `run_dir`.
///
/// Only failing to create `run_dir` is an error. Artifacts are copied in
/// sorted source order, so on a basename collision the last path wins and
/// repeated harvests of an unchanged engine produce identical directories.
pub fn harvest(
    engine: &dyn EnginePort,
    layout: &EngineLayout,
    run_dir: &Path,
) -> Result<HarvestReport, LeanboxError> {
    fs::create_dir_all(run_dir)?;

    let log_dst = run_dir.join(RUN_LOG_FILE);
    let log = ArtifactOutcome {
        source: layout.log_path.clone(),
        result: engine
            .copy_out(&layout.log_path, &log_dst)
            .map(|()| log_dst)
            .map_err(HarvestFailure::from),
    };
    if let Err(e) = &log.result {
        tracing::info!(source = %layout.log_path, reason = %e, "engine log not harvested");
    }

    let (mut sources, search_failure) =
        match engine.find_files(&layout.root, &layout.artifact_extensions) {
            Ok(found) => (found, None),
            Err(e) => {
                tracing::warn!(root = %layout.root, error = %e, "artifact search failed");
                (Vec::new(), Some(HarvestFailure::from(e)))
            }
        };
    sources.sort();
    sources.dedup();

    let artifacts = sources
        .into_iter()
        .map(|source| {
            let result = copy_artifact(engine, &source, run_dir);
            if let Err(e) = &result {
                tracing::warn!(%source, reason = %e, "artifact not harvested");
            }
            ArtifactOutcome { source, result }
        })
        .collect();

    Ok(HarvestReport {
        log,
        artifacts,
        search_failure,
    })
}

fn copy_artifact(
    engine: &dyn EnginePort,
    source: &str,
    run_dir: &Path,
) -> Result<PathBuf, HarvestFailure> {
    let name = Path::new(source)
        .file_name()
        .ok_or_else(|| HarvestFailure {
            reason: format!("no file name in {source}"),
        })?;
    let dst = run_dir.join(name);
    engine.copy_out(source, &dst)?;
    Ok(dst)
}
