#![allow(dead_code)]

use leanbox::domain::error::LeanboxError;
use leanbox::domain::invocation::InvocationParams;
use leanbox::domain::workspace::Workspace;
use leanbox::ports::engine_port::{EngineExit, EnginePort};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// In-memory engine namespace. Invoking writes `produces` into the namespace
/// and returns `exit_code`.
pub struct FakeEngine {
    pub namespace: RefCell<BTreeMap<String, Vec<u8>>>,
    pub produces: Vec<(String, Vec<u8>)>,
    pub exit_code: Option<i32>,
    /// Paths the search reports but which cannot be copied out.
    pub broken: BTreeSet<String>,
    pub transfers: RefCell<Vec<(PathBuf, String)>>,
    pub invocations: RefCell<Vec<InvocationParams>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            namespace: RefCell::new(BTreeMap::new()),
            produces: Vec::new(),
            exit_code: Some(0),
            broken: BTreeSet::new(),
            transfers: RefCell::new(Vec::new()),
            invocations: RefCell::new(Vec::new()),
        }
    }

    pub fn producing(mut self, path: &str, contents: &str) -> Self {
        self.produces.push((path.to_string(), contents.as_bytes().to_vec()));
        self
    }

    pub fn exiting_with(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn with_broken(mut self, path: &str) -> Self {
        self.broken.insert(path.to_string());
        self
    }

    /// Put `produces` into the namespace as if a run had just finished.
    pub fn materialize(&self) {
        let mut namespace = self.namespace.borrow_mut();
        for (path, contents) in &self.produces {
            namespace.insert(path.clone(), contents.clone());
        }
    }

    pub fn has(&self, path: &str) -> bool {
        self.namespace.borrow().contains_key(path)
    }
}

impl EnginePort for FakeEngine {
    fn transfer_file(&self, src: &Path, dst: &str) -> Result<(), LeanboxError> {
        let bytes = fs::read(src)?;
        self.namespace.borrow_mut().insert(dst.to_string(), bytes);
        self.transfers
            .borrow_mut()
            .push((src.to_path_buf(), dst.to_string()));
        Ok(())
    }

    fn invoke(&self, params: &InvocationParams) -> Result<EngineExit, LeanboxError> {
        self.invocations.borrow_mut().push(params.clone());
        self.materialize();
        Ok(EngineExit {
            code: self.exit_code,
        })
    }

    fn find_files(&self, root: &str, extensions: &[String]) -> Result<Vec<String>, LeanboxError> {
        let matches = |p: &String| {
            p.starts_with(root)
                && extensions
                    .iter()
                    .any(|e| p.to_ascii_lowercase().ends_with(&format!(".{e}")))
        };
        Ok(self
            .namespace
            .borrow()
            .keys()
            .chain(self.broken.iter())
            .filter(|p| matches(p))
            .cloned()
            .collect())
    }

    fn copy_out(&self, src: &str, dst: &Path) -> Result<(), LeanboxError> {
        if self.broken.contains(src) {
            return Err(LeanboxError::EngineCommand {
                command: format!("cp {src}"),
                reason: "permission denied".into(),
            });
        }
        match self.namespace.borrow().get(src) {
            Some(bytes) => Ok(fs::write(dst, bytes)?),
            None => Err(LeanboxError::EngineCommand {
                command: format!("cp {src}"),
                reason: "no such file".into(),
            }),
        }
    }
}

/// A workspace rooted in a temp dir with the two demo algorithms present.
pub fn demo_workspace() -> (TempDir, Workspace) {
    let tmp = TempDir::new().unwrap();
    let workspace = Workspace {
        algorithms: tmp.path().join("algorithms"),
        results: tmp.path().join("results"),
        generated: tmp.path().join("generated"),
        ..Workspace::default()
    };
    fs::create_dir_all(&workspace.algorithms).unwrap();
    for name in ["SimpleBuyAndHold", "DemoMomentumStrategy"] {
        fs::write(
            workspace.algorithms.join(format!("{name}.py")),
            format!(
                "from AlgorithmImports import *\n\n\
                 class {name}(QCAlgorithm):\n    def Initialize(self):\n        pass\n"
            ),
        )
        .unwrap();
    }
    (tmp, workspace)
}

/// Engine log with `n` numbered lines.
pub fn numbered_log(n: usize) -> String {
    (1..=n).map(|i| format!("line {i}\n")).collect()
}

/// Every file in `dir` with its contents, sorted by name.
pub fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<(String, Vec<u8>)> = entries
        .map(|e| e.unwrap())
        .map(|e| {
            (
                e.file_name().to_string_lossy().into_owned(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect();
    files.sort();
    files
}
