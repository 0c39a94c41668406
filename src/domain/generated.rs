//! Generated strategies: the offline template generator and the listing of
//! what it (or the generation service) has written.

use crate::domain::algorithm::AlgorithmLanguage;
use crate::domain::error::LeanboxError;
use crate::domain::strategy_check::{check_source, CheckReport};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Sidecar `<stem>.json` written next to each generated source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyMeta {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStrategy {
    pub name: String,
    pub path: PathBuf,
    pub language: AlgorithmLanguage,
    pub meta: Option<StrategyMeta>,
}

/// Generated sources in `dir`, sorted by file name. A missing directory
/// means nothing has been generated yet.
pub fn list_generated(dir: &Path) -> Result<Vec<GeneratedStrategy>, LeanboxError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut strategies = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(language) = AlgorithmLanguage::from_path(&path) else {
            continue;
        };
        let stem = path.file_stem().and_then(|s| s.to_str());
        let Some(name) = stem.map(str::to_string) else {
            continue;
        };
        let meta = read_meta(&path.with_extension("json"));
        strategies.push(GeneratedStrategy {
            name,
            path,
            language,
            meta,
        });
    }
    strategies.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(strategies)
}

/// A strategy written by [`generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedStrategy {
    pub source: PathBuf,
    pub meta_path: PathBuf,
    pub check: CheckReport,
}

/// Class names become the engine's type name, so they must be identifiers.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// SMA(20)/SMA(50) crossover on SPY for Python, buy-and-hold SPY for C#.
pub fn render_template(name: &str, description: &str, language: AlgorithmLanguage) -> String {
    let description = description.replace(['\r', '\n'], " ").replace('"', "'");
    match language {
        AlgorithmLanguage::Python => format!(
            r#"from AlgorithmImports import *


class {name}(QCAlgorithm):
    """{description}"""

    def Initialize(self):
        self.SetStartDate(2023, 1, 1)
        self.SetEndDate(2024, 1, 1)
        self.SetCash(100000)
        self.symbol = self.AddEquity("SPY", Resolution.Daily).Symbol
        self.fast = self.SMA(self.symbol, 20, Resolution.Daily)
        self.slow = self.SMA(self.symbol, 50, Resolution.Daily)

    def OnData(self, data):
        if not (self.fast.IsReady and self.slow.IsReady):
            return
        invested = self.Portfolio[self.symbol].Invested
        if self.fast.Current.Value > self.slow.Current.Value:
            if not invested:
                self.SetHoldings(self.symbol, 1.0)
        elif invested:
            self.Liquidate(self.symbol)
"#
        ),
        AlgorithmLanguage::CSharp => format!(
            r#"// {description}

namespace QuantConnect.Algorithm.CSharp
{{
    public class {name} : QCAlgorithm
    {{
        private Symbol _symbol;

        public override void Initialize()
        {{
            SetStartDate(2023, 1, 1);
            SetEndDate(2024, 1, 1);
            SetCash(100000);
            _symbol = AddEquity("SPY", Resolution.Daily).Symbol;
        }}

        public override void OnData(Slice data)
        {{
            if (!Portfolio[_symbol].Invested)
            {{
                SetHoldings(_symbol, 1.0);
            }}
        }}
    }}
}}
"#
        ),
    }
}

/// Render a strategy from the template, check it, and write
/// `<dir>/<name>.<ext>` plus its `<name>.json` sidecar. Nothing is written
/// when the check fails.
pub fn generate(
    dir: &Path,
    name: &str,
    description: &str,
    language: AlgorithmLanguage,
) -> Result<SavedStrategy, LeanboxError> {
    if !is_identifier(name) {
        return Err(LeanboxError::InvalidStrategyName {
            name: name.to_string(),
        });
    }

    let code = render_template(name, description, language);
    let check = check_source(&code, language);
    let source = dir.join(format!("{name}.{}", language.extension()));
    if !check.valid {
        return Err(LeanboxError::StrategyInvalid {
            file: source.display().to_string(),
            errors: check.errors.len(),
        });
    }

    fs::create_dir_all(dir)?;
    fs::write(&source, &code)?;

    let meta = StrategyMeta {
        description: description.to_string(),
        language: language.key().to_string(),
        timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        filename: source.display().to_string(),
    };
    let meta_path = source.with_extension("json");
    let json = serde_json::to_string_pretty(&meta).map_err(std::io::Error::other)?;
    fs::write(&meta_path, json)?;
    tracing::info!(source = %source.display(), "strategy generated");

    Ok(SavedStrategy {
        source,
        meta_path,
        check,
    })
}

fn read_meta(path: &Path) -> Option<StrategyMeta> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(meta) => Some(meta),
        Err(e) => {
            tracing::debug!(
                path = %path.display(),
                error = %e,
                "ignoring unreadable strategy metadata"
            );
            None
        }
    }
}
