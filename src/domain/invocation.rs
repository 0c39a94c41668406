//! Engine invocation: inject an algorithm into the engine, run it, harvest.
//!
//! Fail-fast end to end: a missing algorithm, a failed transfer or a non-zero
//! engine exit aborts before anything is written to the results directory.

use crate::domain::algorithm::Algorithm;
use crate::domain::error::LeanboxError;
use crate::domain::harvest::{self, HarvestReport};
use crate::domain::workspace::{EngineLayout, Workspace};
use crate::ports::engine_port::EnginePort;
use std::path::PathBuf;

/// Parameters of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationParams {
    pub type_name: String,
    pub language: String,
    pub location: String,
}

impl InvocationParams {
    pub fn for_algorithm(algorithm: &Algorithm, layout: &EngineLayout) -> Self {
        Self {
            type_name: algorithm.name.clone(),
            language: algorithm.language.engine_name().to_string(),
            location: layout.algorithm_location(&algorithm.file_name()),
        }
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub algorithm: Algorithm,
    pub run_dir: PathBuf,
    pub harvest: HarvestReport,
}

pub fn run_backtest(
    engine: &dyn EnginePort,
    workspace: &Workspace,
    name: &str,
) -> Result<RunOutcome, LeanboxError> {
    let algorithm = workspace.store().locate(name)?;
    let layout = &workspace.engine;

    let destination = layout.algorithm_destination(&algorithm.file_name());
    tracing::info!(algorithm = %algorithm.name, %destination, "transferring algorithm");
    engine.transfer_file(&algorithm.path, &destination)?;

    let params = InvocationParams::for_algorithm(&algorithm, layout);
    tracing::info!(
        type_name = %params.type_name,
        language = %params.language,
        location = %params.location,
        "invoking engine"
    );
    let exit = engine.invoke(&params)?;
    if !exit.success() {
        return Err(LeanboxError::EngineFailed {
            name: algorithm.name.clone(),
            status: exit.to_string(),
        });
    }

    let run_dir = workspace.run_dir(&algorithm.name);
    let harvest = harvest::harvest(engine, layout, &run_dir)?;
    Ok(RunOutcome {
        algorithm,
        run_dir,
        harvest,
    })
}
