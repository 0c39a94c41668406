//! Static sanity check for strategy source files.
//!
//! Looks only for the structural markers the engine needs; whether the code
//! actually runs is the engine's business.

use crate::domain::algorithm::AlgorithmLanguage;

const MISSING_ONDATA_PENALTY: u8 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// 0-100; warnings cost points, errors only flip `valid`.
    pub score: u8,
}

impl Default for CheckReport {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            score: 100,
        }
    }
}

impl CheckReport {
    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
        self.valid = false;
    }

    fn warning(&mut self, message: &str, penalty: u8) {
        self.warnings.push(message.to_string());
        self.score = self.score.saturating_sub(penalty);
    }
}

pub fn check_source(code: &str, language: AlgorithmLanguage) -> CheckReport {
    let mut report = CheckReport::default();
    match language {
        AlgorithmLanguage::Python => {
            if !code.contains("AlgorithmImports") && !code.contains("QCAlgorithm") {
                report.error("Missing QuantConnect imports");
            }
            if !code.contains("def Initialize(") {
                report.error("Missing Initialize method");
            }
            if !code.contains("def OnData(") {
                report.warning("Missing OnData method", MISSING_ONDATA_PENALTY);
            }
        }
        AlgorithmLanguage::CSharp => {
            if !code.contains("QCAlgorithm") {
                report.error("Missing QCAlgorithm base class");
            }
            if !code.contains("Initialize()") {
                report.error("Missing Initialize method");
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUY_AND_HOLD: &str = r#"
from AlgorithmImports import *

class SimpleBuyAndHold(QCAlgorithm):
    def Initialize(self):
        self.SetCash(100000)

    def OnData(self, data):
        if not self.Portfolio.Invested:
            self.SetHoldings("SPY", 1.0)
"#;

    #[test]
    fn complete_python_strategy_passes() {
        let report = check_source(BUY_AND_HOLD, AlgorithmLanguage::Python);
        assert_eq!(report, CheckReport::default());
    }

    #[test]
    fn python_without_ondata_is_valid_with_warning() {
        let code = BUY_AND_HOLD.replace("def OnData(", "def on_data(");
        let report = check_source(&code, AlgorithmLanguage::Python);
        assert!(report.valid);
        assert_eq!(report.warnings, vec!["Missing OnData method"]);
        assert_eq!(report.score, 80);
    }

    #[test]
    fn python_without_imports_or_initialize_is_invalid() {
        let report = check_source("print('hello')", AlgorithmLanguage::Python);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec!["Missing QuantConnect imports", "Missing Initialize method"]
        );
    }

    #[test]
    fn csharp_checks_base_class_and_initialize() {
        let good = "public class X : QCAlgorithm { public override void Initialize() {} }";
        assert!(check_source(good, AlgorithmLanguage::CSharp).valid);

        let report = check_source("public class X {}", AlgorithmLanguage::CSharp);
        assert_eq!(
            report.errors,
            vec!["Missing QCAlgorithm base class", "Missing Initialize method"]
        );
    }
}
