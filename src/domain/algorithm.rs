//! Algorithm store: a directory of algorithm source files addressed by name.

use crate::domain::error::LeanboxError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Source language of an algorithm, as the engine names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmLanguage {
    Python,
    CSharp,
}

impl AlgorithmLanguage {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Some(AlgorithmLanguage::Python),
            "cs" => Some(AlgorithmLanguage::CSharp),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AlgorithmLanguage::Python => "py",
            AlgorithmLanguage::CSharp => "cs",
        }
    }

    /// Lower-case name used in generated strategy metadata.
    pub fn key(&self) -> &'static str {
        match self {
            AlgorithmLanguage::Python => "python",
            AlgorithmLanguage::CSharp => "csharp",
        }
    }

    /// Value passed as `--algorithm-language`.
    pub fn engine_name(&self) -> &'static str {
        match self {
            AlgorithmLanguage::Python => "Python",
            AlgorithmLanguage::CSharp => "CSharp",
        }
    }
}

impl FromStr for AlgorithmLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(AlgorithmLanguage::Python),
            "csharp" | "c#" | "cs" => Ok(AlgorithmLanguage::CSharp),
            other => Err(format!("unknown language '{other}' (expected python or csharp)")),
        }
    }
}

impl fmt::Display for AlgorithmLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.engine_name())
    }
}

/// An algorithm source file. The name doubles as the file stem and the
/// engine's type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Algorithm {
    pub name: String,
    pub path: PathBuf,
    pub language: AlgorithmLanguage,
}

impl Algorithm {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.language.extension())
    }
}

#[derive(Debug, Clone)]
pub struct AlgorithmStore {
    dir: PathBuf,
}

impl AlgorithmStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve `<dir>/<name>.py`. Existence is the only check made.
    pub fn locate(&self, name: &str) -> Result<Algorithm, LeanboxError> {
        let language = AlgorithmLanguage::Python;
        if is_plain_name(name) {
            let path = self.dir.join(format!("{name}.{}", language.extension()));
            if path.is_file() {
                return Ok(Algorithm {
                    name: name.to_string(),
                    path,
                    language,
                });
            }
        }
        Err(LeanboxError::AlgorithmNotFound {
            name: name.to_string(),
            dir: self.dir.display().to_string(),
            available: self.list(),
        })
    }

    /// Sorted stems of every `*.py` file in the store. A missing or
    /// unreadable directory lists as empty.
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file() && AlgorithmLanguage::from_path(p) == Some(AlgorithmLanguage::Python)
            })
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }
}

/// A bare file-name component: not empty, not `.`/`..`, no separators.
pub(crate) fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !Path::new(name).is_absolute()
}
