//! Domain error types.

/// Top-level error type for leanbox.
#[derive(Debug, thiserror::Error)]
pub enum LeanboxError {
    #[error("no algorithm name given")]
    MissingAlgorithm { available: Vec<String> },

    #[error("algorithm '{name}' not found in {dir}")]
    AlgorithmNotFound {
        name: String,
        dir: String,
        available: Vec<String>,
    },

    #[error("no results for '{name}'; run `leanbox run_backtest {name}` first")]
    ResultsNotFound { name: String },

    #[error("Invalid choice: '{input}'")]
    InvalidChoice { input: String },

    #[error("'{name}' is not a valid strategy name (letters, digits and _ only)")]
    InvalidStrategyName { name: String },

    #[error("unsupported strategy language for {file}")]
    UnsupportedLanguage { file: String },

    #[error("strategy {file} failed validation with {errors} error(s)")]
    StrategyInvalid { file: String, errors: usize },

    #[error("engine runtime '{runtime}' unavailable: {reason}")]
    EngineUnavailable { runtime: String, reason: String },

    #[error("engine command `{command}` failed: {reason}")]
    EngineCommand { command: String, reason: String },

    #[error("engine run for '{name}' failed with {status}")]
    EngineFailed { name: String, status: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LeanboxError {
    /// Algorithm names worth suggesting alongside this error, if any.
    pub fn alternatives(&self) -> Option<&[String]> {
        match self {
            LeanboxError::MissingAlgorithm { available }
            | LeanboxError::AlgorithmNotFound { available, .. } => Some(available.as_slice()),
            _ => None,
        }
    }
}

/// Every failure surfaces as exit status 1; there is no finer taxonomy.
impl From<&LeanboxError> for std::process::ExitCode {
    fn from(_err: &LeanboxError) -> Self {
        std::process::ExitCode::FAILURE
    }
}
