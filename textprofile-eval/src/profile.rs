//! Profiling a dataset file: patterns, coverage and example strings.

use std::fmt;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use textprofile::{Oracle, Program, TokenRegistry, NULL_PATTERN};
use tracing::warn;

use crate::config::ProfileConfig;
use crate::dataset::{load, TestCaseSpec};
use crate::error::EvalError;
use crate::metrics::{Degeneracy, MetricValue};

/// Inputs assigned to one pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCoverage {
    /// Pattern description.
    pub pattern: String,
    /// Inputs whose first matching pattern is this one.
    pub count: usize,
    /// `count` as a percentage of all inputs.
    pub percent: MetricValue,
    /// The first few matching inputs.
    pub examples: Vec<String>,
}

/// Profile learned for one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseProfile {
    /// Disjunct bound of the case; `None` is automatic.
    pub disjuncts: Option<u32>,
    /// Coverage per pattern, in matching order.
    pub patterns: Vec<PatternCoverage>,
    /// Inputs no pattern matched.
    pub unmatched: usize,
    /// Why the case could not be profiled, if it failed.
    pub error: Option<String>,
}

/// Profiles of every test case of a dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    /// The dataset file.
    pub path: String,
    /// Number of strings in the file.
    pub strings: usize,
    /// One profile per test case.
    pub cases: Vec<CaseProfile>,
}

/// Assigns every input to its first matching disjunct.
///
/// Returns the per-disjunct coverage (in the program's order) and the
/// number of unmatched inputs.
#[must_use]
pub fn coverage<P: Program>(
    program: &P,
    inputs: &[String],
    num_examples: usize,
) -> (Vec<PatternCoverage>, usize) {
    let mut patterns: Vec<PatternCoverage> = program
        .describe()
        .into_iter()
        .map(|pattern| PatternCoverage {
            pattern,
            count: 0,
            percent: MetricValue::Defined(0.0),
            examples: Vec::new(),
        })
        .collect();

    let mut unmatched = 0;
    for input in inputs {
        match program
            .matching_disjunct(input)
            .and_then(|i| patterns.get_mut(i))
        {
            Some(entry) => {
                entry.count += 1;
                if entry.examples.len() < num_examples {
                    entry.examples.push(input.clone());
                }
            }
            None => unmatched += 1,
        }
    }

    for entry in &mut patterns {
        entry.percent = MetricValue::count_ratio(entry.count, inputs.len(), Degeneracy::EmptyPool)
            .map(|f| 100.0 * f);
    }
    (patterns, unmatched)
}

/// Learns a profile for every test case of the dataset file at `path` and
/// prints the coverage table to `out`.
///
/// # Errors
///
/// Returns `DataError` if the file cannot be loaded and `EvalError::Io` if
/// `out` fails. A failing test case is reported in its [`CaseProfile`].
pub fn profile_dataset<O>(
    oracle: &mut O,
    registry: &TokenRegistry,
    path: &Path,
    config: &ProfileConfig,
    out: &mut impl Write,
) -> Result<ProfileReport, EvalError>
where
    O: Oracle,
    O::Program: fmt::Display,
{
    let dataset = load(path)?;
    let io = |e| EvalError::io("write profile", &e);

    writeln!(out, "# {} ({} strings)", path.display(), dataset.data.len()).map_err(io)?;
    writeln!(out, "==============================================\n").map_err(io)?;

    let mut cases = Vec::with_capacity(dataset.results.len());
    for case in &dataset.results {
        let bound = case
            .disjuncts
            .map_or_else(|| "<auto>".to_string(), |d| d.to_string());
        writeln!(out, "> Number of patterns allowed = {bound}").map_err(io)?;
        writeln!(out, "----------------------------------------------").map_err(io)?;

        let profile = match profile_case(oracle, registry, case, &dataset.data, config) {
            Ok((profile, program)) => {
                write_coverage(out, &profile).map_err(io)?;
                if config.show_program {
                    let text = program.map_or_else(|| NULL_PATTERN.to_string(), |p| p.to_string());
                    writeln!(out, "Program:\n{text}").map_err(io)?;
                }
                profile
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping test case");
                writeln!(out, "    skipped: {e}").map_err(io)?;
                CaseProfile {
                    disjuncts: case.disjuncts,
                    patterns: Vec::new(),
                    unmatched: dataset.data.len(),
                    error: Some(e.to_string()),
                }
            }
        };
        writeln!(out, "..............................................\n").map_err(io)?;
        cases.push(profile);
    }

    Ok(ProfileReport {
        path: path.display().to_string(),
        strings: dataset.data.len(),
        cases,
    })
}

fn profile_case<O: Oracle>(
    oracle: &mut O,
    registry: &TokenRegistry,
    case: &TestCaseSpec,
    data: &[String],
    config: &ProfileConfig,
) -> Result<(CaseProfile, Option<O::Program>), EvalError> {
    let constraints = case.constraints(data, registry)?;
    let learned = oracle.learn(&constraints);
    oracle.clear_cache();
    let program = learned?;

    let (patterns, unmatched) = match &program {
        Some(p) => coverage(p, data, config.num_examples),
        None => (Vec::new(), data.len()),
    };
    Ok((
        CaseProfile {
            disjuncts: case.disjuncts,
            patterns,
            unmatched,
            error: None,
        },
        program,
    ))
}

fn write_coverage(out: &mut impl Write, profile: &CaseProfile) -> std::io::Result<()> {
    for entry in &profile.patterns {
        writeln!(
            out,
            "    [{:5} | {:6.2} %] ==> {}",
            entry.count, entry.percent, entry.pattern
        )?;
        for example in &entry.examples {
            writeln!(out, "                        @ {example}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use textprofile::{LearnedProgram, SignatureLearner};

    const DATES_AND_WORDS: &str = r#"{
        "data": ["2019-01-02", "2020-11-30", "1999-12-31", "hello", "world"],
        "results": [
            { "disjuncts": 2, "description": [] },
            { "description": [] },
            { "customRegexTokens": [{ "name": "<Bad>", "regex": "([", "score": -1 }], "description": [] }
        ]
    }"#;

    fn learned(examples: &[&str]) -> LearnedProgram {
        let registry = TokenRegistry::new();
        let mut learner = SignatureLearner::new(&registry);
        learner
            .learn(&textprofile::Constraints::new().with_positives(examples.iter().copied()))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn coverage_uses_first_match() {
        let program = learned(&["2019-01-02", "2020-11-30", "hello", "world"]);
        let inputs: Vec<String> = ["1999-12-31", "abc", "12", "xyz"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();

        let (patterns, unmatched) = coverage(&program, &inputs, 1);
        let total: usize = patterns.iter().map(|p| p.count).sum();
        assert_eq!(total + unmatched, inputs.len());
        assert_eq!(unmatched, 1);
        assert!(patterns.iter().all(|p| p.examples.len() <= 1));
        let percent: f64 = patterns.iter().filter_map(|p| p.percent.value()).sum();
        assert!((percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn profile_prints_every_case() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.json");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(DATES_AND_WORDS.as_bytes())
            .unwrap();

        let registry = TokenRegistry::new();
        let mut learner = SignatureLearner::new(&registry);
        let config = ProfileConfig::default().with_show_program(true);
        let mut out = Vec::new();
        let report = profile_dataset(&mut learner, &registry, &path, &config, &mut out).unwrap();

        assert_eq!(report.strings, 5);
        assert_eq!(report.cases.len(), 3);
        let bounded = &report.cases[0];
        assert_eq!(bounded.patterns.len(), 2);
        assert_eq!(bounded.patterns[0].count, 3);
        assert_eq!(bounded.patterns[0].examples, ["2019-01-02"]);
        assert!(report.cases[2].error.is_some());

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("> Number of patterns allowed = 2"));
        assert!(text.contains("> Number of patterns allowed = <auto>"));
        assert!(text.contains("[    3 |  60.00 %] ==> Digit+"));
        assert!(text.contains("Program:\n"));
    }
}
