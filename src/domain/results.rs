//! Run Records on the host: listing and per-run detail.

use crate::domain::algorithm::is_plain_name;
use crate::domain::error::LeanboxError;
use crate::domain::workspace::RUN_LOG_FILE;
use chrono::{DateTime, Local};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Maximum characters of a run log's last line shown in a listing.
pub const SUMMARY_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub name: String,
    /// Truncated last line of `backtest.log`, if the run has one.
    pub summary: Option<String>,
}

/// The set of Run Records under a results root.
#[derive(Debug, Clone)]
pub struct RunIndex {
    root: PathBuf,
}

impl RunIndex {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// A fresh pass over the runs, sorted by name. Summaries are read lazily
    /// as the iterator advances. A missing root yields nothing.
    pub fn entries(&self) -> RunEntries {
        let mut names: Vec<String> = match fs::read_dir(&self.root) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .filter_map(|e| e.file_name().to_str().map(str::to_string))
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        RunEntries {
            root: self.root.clone(),
            names: names.into_iter(),
        }
    }
}

pub struct RunEntries {
    root: PathBuf,
    names: std::vec::IntoIter<String>,
}

impl Iterator for RunEntries {
    type Item = RunSummary;

    fn next(&mut self) -> Option<RunSummary> {
        let name = self.names.next()?;
        let summary = last_line(&self.root.join(&name).join(RUN_LOG_FILE))
            .map(|line| truncate_chars(&line, SUMMARY_CHARS));
        Some(RunSummary { name, summary })
    }
}

fn last_line(path: &Path) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let mut last = None;
    for line in BufReader::new(file).split(b'\n') {
        let line = line.ok()?;
        last = Some(line);
    }
    last.map(|bytes| {
        String::from_utf8_lossy(&bytes)
            .trim_end_matches('\r')
            .to_string()
    })
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// The last `n` lines of `text`.
pub fn tail_lines(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Log,
    Json,
    Html,
    Csv,
    Other,
}

impl ArtifactKind {
    pub fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("log") | Some("txt") => ArtifactKind::Log,
            Some("json") => ArtifactKind::Json,
            Some("html") | Some("htm") => ArtifactKind::Html,
            Some("csv") => ArtifactKind::Csv,
            _ => ArtifactKind::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    pub kind: ArtifactKind,
}

/// A JSON artifact ready to print: pretty when it parses, raw otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonView {
    Pretty(String),
    Raw(String),
}

impl JsonView {
    pub fn render(raw: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(raw)
            .and_then(|v| serde_json::to_string_pretty(&v))
        {
            Ok(pretty) => JsonView::Pretty(pretty),
            Err(_) => JsonView::Raw(raw.to_string()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            JsonView::Pretty(s) | JsonView::Raw(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSummary {
    pub columns: Vec<String>,
    pub records: usize,
}

impl CsvSummary {
    pub fn read(path: &Path) -> Option<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .ok()?;
        let columns = reader
            .headers()
            .ok()?
            .iter()
            .map(str::to_string)
            .collect();
        let mut records = 0;
        for record in reader.records() {
            record.ok()?;
            records += 1;
        }
        Some(Self { columns, records })
    }
}

/// Everything shown for a single Run Record.
#[derive(Debug, Clone)]
pub struct RunDetail {
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<ArtifactFile>,
    /// Raw bytes of `backtest.log`, printed verbatim.
    pub log: Option<Vec<u8>>,
    pub json: Vec<(String, JsonView)>,
    pub csv: Vec<(String, CsvSummary)>,
}

impl RunDetail {
    pub fn load(results_root: &Path, name: &str) -> Result<Self, LeanboxError> {
        let dir = results_root.join(name);
        if !is_plain_name(name) || !dir.is_dir() {
            return Err(LeanboxError::ResultsNotFound {
                name: name.to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let path = entry.path();
            files.push(ArtifactFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: ArtifactKind::of(&path),
                size: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Local>::from),
                path,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));

        let log = fs::read(dir.join(RUN_LOG_FILE)).ok();

        let mut json = Vec::new();
        let mut csv = Vec::new();
        for file in &files {
            match file.kind {
                ArtifactKind::Json => {
                    if let Ok(bytes) = fs::read(&file.path) {
                        let raw = String::from_utf8_lossy(&bytes);
                        json.push((file.name.clone(), JsonView::render(&raw)));
                    }
                }
                ArtifactKind::Csv => {
                    if let Some(summary) = CsvSummary::read(&file.path) {
                        csv.push((file.name.clone(), summary));
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            name: name.to_string(),
            dir,
            files,
            log,
            json,
            csv,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn run(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (f, contents) in files {
            fs::write(dir.join(f), contents).unwrap();
        }
    }

    #[test]
    fn listing_of_missing_root_is_empty() {
        let index = RunIndex::new("/nonexistent/leanbox/results");
        assert_eq!(index.entries().count(), 0);
    }

    #[test]
    fn listing_is_sorted_with_optional_summaries() {
        let tmp = TempDir::new().unwrap();
        run(tmp.path(), "Zeta", &[(RUN_LOG_FILE, "start\nTotal Return: 12.5%\n")]);
        run(tmp.path(), "Alpha", &[("stats.json", "{}")]);
        fs::write(tmp.path().join("stray.txt"), "not a run").unwrap();

        let entries: Vec<RunSummary> = RunIndex::new(tmp.path()).entries().collect();

        assert_eq!(
            entries,
            vec![
                RunSummary {
                    name: "Alpha".into(),
                    summary: None
                },
                RunSummary {
                    name: "Zeta".into(),
                    summary: Some("Total Return: 12.5%".into())
                },
            ]
        );
    }

    #[test]
    fn listing_is_restartable() {
        let tmp = TempDir::new().unwrap();
        run(tmp.path(), "A", &[]);
        let index = RunIndex::new(tmp.path());
        assert_eq!(index.entries().count(), 1);
        assert_eq!(index.entries().count(), 1);
    }

    #[test]
    fn summary_is_truncated() {
        let tmp = TempDir::new().unwrap();
        let long = "x".repeat(250);
        run(tmp.path(), "Long", &[(RUN_LOG_FILE, &long)]);
        let entry = RunIndex::new(tmp.path()).entries().next().unwrap();
        assert_eq!(entry.summary.unwrap().len(), SUMMARY_CHARS);
    }

    #[test]
    fn tail_returns_last_lines() {
        let text = "a\nb\nc\nd\n";
        assert_eq!(tail_lines(text, 2), vec!["c", "d"]);
        assert_eq!(tail_lines(text, 10), vec!["a", "b", "c", "d"]);
        assert!(tail_lines("", 5).is_empty());
    }

    #[test]
    fn json_view_pretty_prints_or_falls_back() {
        let view = JsonView::render(r#"{"a":1}"#);
        assert_eq!(view, JsonView::Pretty("{\n  \"a\": 1\n}".into()));

        let view = JsonView::render("{not json");
        assert_eq!(view, JsonView::Raw("{not json".into()));
    }

    #[test]
    fn detail_of_missing_run_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = RunDetail::load(tmp.path(), "Nope").unwrap_err();
        assert!(matches!(err, LeanboxError::ResultsNotFound { name } if name == "Nope"));
    }

    #[test]
    fn detail_collects_log_json_and_csv() {
        let tmp = TempDir::new().unwrap();
        run(
            tmp.path(),
            "Algo",
            &[
                (RUN_LOG_FILE, "engine finished\n"),
                ("summary.json", r#"{"sharpe": 1.2}"#),
                ("broken.json", "{"),
                ("orders.csv", "time,symbol,qty\n1,SPY,10\n2,SPY,-10\n"),
                ("report.html", "<html></html>"),
            ],
        );

        let detail = RunDetail::load(tmp.path(), "Algo").unwrap();

        let names: Vec<&str> = detail.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![RUN_LOG_FILE, "broken.json", "orders.csv", "report.html", "summary.json"]
        );
        assert_eq!(detail.log.as_deref(), Some(&b"engine finished\n"[..]));
        assert_eq!(detail.json.len(), 2);
        assert!(matches!(detail.json[0].1, JsonView::Raw(_)));
        assert!(matches!(detail.json[1].1, JsonView::Pretty(_)));
        assert_eq!(detail.csv.len(), 1);
        assert_eq!(detail.csv[0].1.columns, vec!["time", "symbol", "qty"]);
        assert_eq!(detail.csv[0].1.records, 2);
        assert_eq!(detail.files[2].kind, ArtifactKind::Csv);
        assert_eq!(detail.files[0].size, 16);
    }

    #[test]
    fn detail_rejects_names_outside_the_results_root() {
        let tmp = TempDir::new().unwrap();
        let results = tmp.path().join("results");
        run(&results, "Algo", &[]);
        fs::write(tmp.path().join("secret.json"), r#"{"token": "abc"}"#).unwrap();
        let outside = tmp.path().display().to_string();

        for name in ["..", ".", "Algo/..", "../results/Algo", outside.as_str()] {
            let err = RunDetail::load(&results, name).unwrap_err();
            assert!(
                matches!(err, LeanboxError::ResultsNotFound { .. }),
                "{name} should not resolve"
            );
        }
        assert!(RunDetail::load(&results, "Algo").is_ok());
    }

    #[test]
    fn detail_keeps_log_bytes_verbatim() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Algo");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(RUN_LOG_FILE), b"price \xa3100\n").unwrap();

        let detail = RunDetail::load(tmp.path(), "Algo").unwrap();

        assert_eq!(detail.log.as_deref(), Some(&b"price \xa3100\n"[..]));
    }

    #[test]
    fn json_view_keeps_key_order() {
        let raw = r#"{"Total Orders":"1","Average Win":"0%","Sharpe Ratio":"0.5"}"#;
        let view = JsonView::render(raw);
        let text = view.text();
        let orders = text.find("Total Orders").unwrap();
        let win = text.find("Average Win").unwrap();
        let sharpe = text.find("Sharpe Ratio").unwrap();
        assert!(orders < win && win < sharpe);
    }

    #[test]
    fn detail_without_log() {
        let tmp = TempDir::new().unwrap();
        run(tmp.path(), "Quiet", &[("a.html", "<p/>")]);
        let detail = RunDetail::load(tmp.path(), "Quiet").unwrap();
        assert!(detail.log.is_none());
        assert!(detail.json.is_empty());
    }

    proptest! {
        #[test]
        fn summary_never_exceeds_limit(line in ".{0,300}") {
            let truncated = truncate_chars(&line, SUMMARY_CHARS);
            prop_assert!(truncated.chars().count() <= SUMMARY_CHARS);
            prop_assert!(line.starts_with(&truncated));
        }
    }
}
