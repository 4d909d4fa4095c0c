//! The dataset test suite: every test case of every dataset file, with the
//! learned descriptions compared against the expected ones as multisets.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use textprofile::{Oracle, Program, TokenRegistry};
use tracing::{debug, info, warn};

use crate::dataset::{json_files, load, DatasetFile, TestCaseSpec};
use crate::error::EvalError;
use crate::metrics::count_as_f64;
use crate::report::ReportMetadata;

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    /// The learned descriptions equal the expected ones.
    Passed,
    /// The descriptions differ.
    Failed {
        /// Expected descriptions.
        expected: Vec<String>,
        /// Learned descriptions.
        actual: Vec<String>,
    },
    /// The case carries an ignore reason.
    Ignored {
        /// Why the case is ignored.
        reason: String,
    },
    /// The case could not be run.
    Errored {
        /// What went wrong.
        message: String,
    },
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("ok"),
            Self::Failed { .. } => f.write_str("FAILED"),
            Self::Ignored { .. } => f.write_str("ignored"),
            Self::Errored { .. } => f.write_str("ERROR"),
        }
    }
}

/// Result of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Dataset file.
    pub file: String,
    /// Index of the case within the file.
    pub index: usize,
    /// Summary of the case's data and bound.
    pub info: String,
    /// Learning time.
    pub time_ms: u64,
    /// Outcome.
    pub status: CaseStatus,
}

/// Result of a suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Report metadata.
    pub metadata: ReportMetadata,
    /// Every case run, in file order.
    pub results: Vec<CaseResult>,
    /// Cases that passed.
    pub passed: usize,
    /// Cases that failed.
    pub failed: usize,
    /// Cases that were ignored.
    pub ignored: usize,
    /// Cases or files that could not be run.
    pub errored: usize,
}

impl SuiteReport {
    fn new() -> Self {
        Self {
            metadata: ReportMetadata::default(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            ignored: 0,
            errored: 0,
        }
    }

    fn push(&mut self, result: CaseResult) {
        match result.status {
            CaseStatus::Passed => self.passed += 1,
            CaseStatus::Failed { .. } => self.failed += 1,
            CaseStatus::Ignored { .. } => self.ignored += 1,
            CaseStatus::Errored { .. } => self.errored += 1,
        }
        self.results.push(result);
    }

    /// Returns true if nothing failed or errored.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// Returns true if `a` and `b` hold the same strings with the same
/// multiplicities.
#[must_use]
pub fn same_multiset(a: &[String], b: &[String]) -> bool {
    let mut a: Vec<&String> = a.iter().collect();
    let mut b: Vec<&String> = b.iter().collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

fn case_info(dataset: &DatasetFile, case: &TestCaseSpec) -> String {
    let total: usize = dataset.data.iter().map(|s| s.chars().count()).sum();
    let avg_length = if dataset.data.is_empty() {
        0.0
    } else {
        count_as_f64(total) / count_as_f64(dataset.data.len())
    };
    format!(
        "clusters={},avg_length={avg_length:.2},entries={},auto={}",
        case.description.len(),
        dataset.data.len(),
        case.disjuncts.is_none()
    )
}

fn run_case<O: Oracle>(
    oracle: &mut O,
    registry: &TokenRegistry,
    dataset: &DatasetFile,
    case: &TestCaseSpec,
) -> (CaseStatus, u64) {
    if let Some(reason) = &case.ignore_reason {
        return (
            CaseStatus::Ignored {
                reason: reason.clone(),
            },
            0,
        );
    }

    let constraints = match case.constraints(&dataset.data, registry) {
        Ok(c) => c,
        Err(e) => {
            return (
                CaseStatus::Errored {
                    message: e.to_string(),
                },
                0,
            )
        }
    };

    let start = Instant::now();
    let learned = oracle.learn(&constraints);
    let time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    oracle.clear_cache();

    let status = match learned {
        Ok(program) => {
            let actual = program.as_ref().map(Program::describe).unwrap_or_default();
            if same_multiset(&case.description, &actual) {
                CaseStatus::Passed
            } else {
                CaseStatus::Failed {
                    expected: case.description.clone(),
                    actual,
                }
            }
        }
        Err(e) => CaseStatus::Errored {
            message: e.to_string(),
        },
    };
    (status, time_ms)
}

/// Runs every test case of every `*.json` file directly inside `dirs`.
///
/// A missing directory or unreadable file is counted as errored and the
/// run continues.
///
/// # Errors
///
/// Returns `EvalError::Io` if `out` fails.
pub fn run_suite<O: Oracle>(
    oracle: &mut O,
    registry: &TokenRegistry,
    dirs: &[PathBuf],
    out: &mut impl Write,
) -> Result<SuiteReport, EvalError> {
    let io = |e| EvalError::io("write test results", &e);
    let mut report = SuiteReport::new();

    let mut files = Vec::new();
    for dir in dirs {
        match json_files(dir) {
            Ok(found) => files.extend(found),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping test directory");
                writeln!(out, "test {} ... ERROR ({e})", dir.display()).map_err(io)?;
                report.push(errored(dir, e.to_string()));
            }
        }
    }
    info!(files = files.len(), "running dataset tests");

    for file in &files {
        let dataset = match load(file) {
            Ok(d) => d,
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping dataset file");
                writeln!(out, "test {} ... ERROR ({e})", file.display()).map_err(io)?;
                report.push(errored(file, e.to_string()));
                continue;
            }
        };

        for (index, case) in dataset.results.iter().enumerate() {
            let (status, time_ms) = run_case(oracle, registry, &dataset, case);
            debug!(file = %file.display(), index, %status, time_ms, "test case");
            writeln!(out, "test {}#{index} ... {status} ({time_ms}ms)", file.display()).map_err(io)?;
            match &status {
                CaseStatus::Failed { expected, actual } => {
                    writeln!(out, "    expected: {expected:?}\n    actual:   {actual:?}").map_err(io)?;
                }
                CaseStatus::Errored { message } => {
                    writeln!(out, "    {message}").map_err(io)?;
                }
                CaseStatus::Passed | CaseStatus::Ignored { .. } => {}
            }
            report.push(CaseResult {
                file: file.display().to_string(),
                index,
                info: case_info(&dataset, case),
                time_ms,
                status,
            });
        }
    }

    writeln!(
        out,
        "\ntest result: {}. {} passed; {} failed; {} ignored; {} errored",
        if report.is_success() { "ok" } else { "FAILED" },
        report.passed,
        report.failed,
        report.ignored,
        report.errored
    )
    .map_err(io)?;
    Ok(report)
}

fn errored(path: &Path, message: String) -> CaseResult {
    CaseResult {
        file: path.display().to_string(),
        index: 0,
        info: String::new(),
        time_ms: 0,
        status: CaseStatus::Errored { message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use textprofile::SignatureLearner;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn multiset_ignores_order_not_multiplicity() {
        let a = ["x".to_string(), "y".to_string(), "x".to_string()];
        let b = ["y".to_string(), "x".to_string(), "x".to_string()];
        let c = ["y".to_string(), "x".to_string()];
        assert!(same_multiset(&a, &b));
        assert!(!same_multiset(&a, &c));
    }

    #[test]
    fn suite_reports_every_status() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "dates.json",
            r#"{
                "data": ["2019-01-02", "2020-11-30"],
                "results": [
                    { "disjuncts": 1, "description": ["Digit+ · '-' · Digit+ · '-' · Digit+"] },
                    { "disjuncts": 1, "description": ["Any+"] },
                    { "ignoreReason": "slow", "description": [] },
                    { "customRegexTokens": [{ "name": "<Bad>", "regex": "([", "score": -1 }], "description": [] }
                ]
            }"#,
        );
        write(dir.path(), "broken.json", "{");

        let registry = TokenRegistry::new();
        let mut learner = SignatureLearner::new(&registry);
        let dirs = [dir.path().to_path_buf(), dir.path().join("missing")];
        let mut out = Vec::new();
        let report = run_suite(&mut learner, &registry, &dirs, &mut out).unwrap();

        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.ignored, 1);
        // Bad regex, broken file, missing directory.
        assert_eq!(report.errored, 3);
        assert!(!report.is_success());

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("dates.json#0 ... ok"));
        assert!(text.contains("test result: FAILED. 1 passed; 1 failed; 1 ignored; 3 errored"));
    }

    #[test]
    fn case_info_summarizes_data() {
        let dataset = DatasetFile {
            data: vec!["ab".to_string(), "abcd".to_string()],
            results: Vec::new(),
        };
        let case = TestCaseSpec {
            description: vec!["Lower+".to_string()],
            ..TestCaseSpec::default()
        };
        assert_eq!(
            case_info(&dataset, &case),
            "clusters=1,avg_length=3.00,entries=2,auto=true"
        );
    }
}
