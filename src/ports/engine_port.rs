//! Engine access port trait.
//!
//! The engine is a long-lived process with its own filesystem namespace. The
//! workflow only ever copies files in and out of it, asks it to run an
//! algorithm, and searches it for output files.

use crate::domain::error::LeanboxError;
use crate::domain::invocation::InvocationParams;
use std::fmt;
use std::path::Path;

/// Exit status of one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineExit {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl EngineExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for EngineExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => write!(f, "termination by signal"),
        }
    }
}

pub trait EnginePort {
    /// Copy a host file to `dst` inside the engine namespace.
    fn transfer_file(&self, src: &Path, dst: &str) -> Result<(), LeanboxError>;

    /// Run the engine synchronously. A non-zero exit is reported through
    /// [`EngineExit`]; `Err` means the engine could not be asked at all.
    fn invoke(&self, params: &InvocationParams) -> Result<EngineExit, LeanboxError>;

    /// All files under `root` whose extension is one of `extensions`, in no
    /// particular order.
    fn find_files(&self, root: &str, extensions: &[String]) -> Result<Vec<String>, LeanboxError>;

    /// Copy `src` inside the engine namespace to a host path.
    fn copy_out(&self, src: &str, dst: &Path) -> Result<(), LeanboxError>;
}
