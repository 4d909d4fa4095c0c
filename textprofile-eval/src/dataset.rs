//! Dataset files and the dataset catalog.
//!
//! # File Format
//!
//! A dataset file holds a column of strings and the test cases run against
//! it:
//!
//! ```json
//! {
//!   "data": ["2019-01-02", "2020-11-30", ""],
//!   "results": [
//!     {
//!       "disjuncts": 1,
//!       "useExtendedTokens": false,
//!       "excludedTokens": ["Alpha"],
//!       "customRegexTokens": [{ "name": "<Year>", "regex": "(19|20)[0-9]{2}", "score": -1 }],
//!       "description": ["Digit+ · '-' · Digit+ · '-' · Digit+"]
//!     }
//!   ]
//! }
//! ```
//!
//! # Catalog
//!
//! Under a root directory, *domain datasets* are every `tests/**/*.json`
//! except `*_cleaned.json` and three datasets that overlap others
//! (`hetero/companies.json`, `hetero/locations.json`, `homo/emails.json`);
//! *clean datasets* are `tests/homo/*.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use textprofile::{
    ClusteringParameters, Constraints, DisjunctsLimit, RegexTokenSpec, TokenError, TokenRegistry,
};

use crate::error::DataError;

/// Domain datasets left out of the catalog, relative to `tests/`.
const EXCLUDED_DOMAIN_DATASETS: &[&str] = &[
    "hetero/companies.json",
    "hetero/locations.json",
    "homo/emails.json",
];

/// A custom regex token declared by a test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRegexToken {
    /// Token name.
    pub name: String,
    /// Regular expression, anchored at the match position.
    #[serde(alias = "regex")]
    pub pattern: String,
    /// Token score.
    pub score: f64,
}

impl From<&CustomRegexToken> for RegexTokenSpec {
    fn from(token: &CustomRegexToken) -> Self {
        Self::new(&token.name, &token.pattern, token.score)
    }
}

/// One test case of a dataset file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseSpec {
    /// Token names removed from the allowed set.
    #[serde(default)]
    pub excluded_tokens: Vec<String>,
    /// Extra regex tokens.
    #[serde(default)]
    pub custom_regex_tokens: Vec<CustomRegexToken>,
    /// Whether the extended atoms are allowed.
    #[serde(default)]
    pub use_extended_tokens: Option<bool>,
    /// Exact number of disjuncts, or automatic when absent.
    #[serde(default)]
    pub disjuncts: Option<u32>,
    /// Reason the case is skipped, if it is.
    #[serde(default)]
    pub ignore_reason: Option<String>,
    /// Expected pattern descriptions, in any order.
    #[serde(default)]
    pub description: Vec<String>,
}

impl TestCaseSpec {
    /// Builds the learning request for this case over `data`: every string as
    /// a positive example, default clustering parameters, the disjunct bound
    /// (if any) and the case's token set.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidRegex` if a custom token does not compile.
    pub fn constraints(
        &self,
        data: &[String],
        registry: &TokenRegistry,
    ) -> Result<Constraints, TokenError> {
        let custom: Vec<RegexTokenSpec> = self.custom_regex_tokens.iter().map(Into::into).collect();
        let tokens = registry.token_set(
            self.use_extended_tokens.unwrap_or(false),
            &self.excluded_tokens,
            &custom,
        )?;
        Ok(Constraints::new()
            .with_positives(data.iter().cloned())
            .with_clustering(ClusteringParameters::default())
            .with_optional_disjuncts(self.disjuncts.map(DisjunctsLimit::exactly))
            .with_allowed_tokens(tokens))
    }
}

/// A dataset file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    /// The column of strings.
    pub data: Vec<String>,
    /// Test cases run against `data`.
    #[serde(default)]
    pub results: Vec<TestCaseSpec>,
}

impl DatasetFile {
    /// The non-empty strings of `data`.
    #[must_use]
    pub fn non_empty_data(&self) -> Vec<String> {
        self.data.iter().filter(|s| !s.is_empty()).cloned().collect()
    }
}

/// Loads a dataset file.
///
/// # Errors
///
/// - `DataError::FileNotFound` if the path doesn't exist
/// - `DataError::ReadFailed` if the file can't be read
/// - `DataError::Malformed` if JSON parsing fails
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use textprofile_eval::dataset::load;
///
/// let dataset = load(Path::new("tests/homo/dates.json")).unwrap();
/// println!("{} strings, {} cases", dataset.data.len(), dataset.results.len());
/// ```
pub fn load(path: &Path) -> Result<DatasetFile, DataError> {
    let path_str = path.display().to_string();
    if !path.exists() {
        return Err(DataError::FileNotFound { path: path_str });
    }

    let contents = std::fs::read_to_string(path).map_err(|e| DataError::ReadFailed {
        path: path_str.clone(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&contents).map_err(|e| DataError::Malformed {
        path: path_str,
        message: e.to_string(),
    })
}

/// Loads the non-empty strings of a dataset file.
///
/// # Errors
///
/// Returns the errors of [`load`], or `DataError::EmptyData` if no
/// non-empty string remains.
pub fn load_non_empty(path: &Path) -> Result<Vec<String>, DataError> {
    let data = load(path)?.non_empty_data();
    if data.is_empty() {
        return Err(DataError::EmptyData {
            path: path.display().to_string(),
        });
    }
    Ok(data)
}

/// The `*.json` files directly inside `dir`, sorted.
///
/// # Errors
///
/// Returns `DataError::InvalidDirectory` if `dir` is not a directory.
pub fn json_files(dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    let mut files = Vec::new();
    collect_json(dir, false, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_json(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<(), DataError> {
    let dir_str = dir.display().to_string();
    if !dir.is_dir() {
        return Err(DataError::InvalidDirectory { path: dir_str });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| DataError::ReadFailed {
        path: dir_str,
        message: e.to_string(),
    })?;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_json(&path, true, out)?;
            }
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            out.push(path);
        }
    }
    Ok(())
}

/// The domain and clean datasets under a root directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetCatalog {
    /// Datasets used for quality estimation.
    pub domain: Vec<PathBuf>,
    /// Datasets used for clustering and similarity estimation.
    pub clean: Vec<PathBuf>,
}

impl DatasetCatalog {
    /// Scans `<root>/tests`.
    ///
    /// # Errors
    ///
    /// Returns `DataError::InvalidDirectory` if `<root>/tests` or
    /// `<root>/tests/homo` is missing.
    pub fn discover(root: &Path) -> Result<Self, DataError> {
        let tests = root.join("tests");
        let excluded: Vec<PathBuf> = EXCLUDED_DOMAIN_DATASETS
            .iter()
            .map(|relative| tests.join(relative))
            .collect();

        let mut domain = Vec::new();
        collect_json(&tests, true, &mut domain)?;
        domain.retain(|path| {
            let cleaned = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_cleaned.json"));
            !cleaned && !excluded.contains(path)
        });
        domain.sort();

        let clean = json_files(&tests.join("homo"))?;
        Ok(Self { domain, clean })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const SAMPLE_DATASET_JSON: &str = r#"{
        "data": ["2019-01-02", "", "2020-11-30"],
        "results": [
            {
                "disjuncts": 1,
                "description": ["Digit+ · '-' · Digit+ · '-' · Digit+"]
            },
            {
                "useExtendedTokens": true,
                "excludedTokens": ["Alpha"],
                "customRegexTokens": [{ "name": "<Year>", "regex": "(19|20)[0-9]{2}", "score": -1 }],
                "ignoreReason": "slow",
                "description": []
            }
        ]
    }"#;

    fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn load_parses_cases() {
        let dir = tempdir().unwrap();
        let path = create_test_file(dir.path(), "dates.json", SAMPLE_DATASET_JSON);

        let dataset = load(&path).unwrap();
        assert_eq!(dataset.data.len(), 3);
        assert_eq!(dataset.results.len(), 2);
        assert_eq!(dataset.results[0].disjuncts, Some(1));
        assert_eq!(dataset.results[1].use_extended_tokens, Some(true));
        assert_eq!(dataset.results[1].custom_regex_tokens[0].pattern, "(19|20)[0-9]{2}");
        assert_eq!(dataset.results[1].ignore_reason.as_deref(), Some("slow"));
    }

    #[test]
    fn load_non_empty_drops_empty_strings() {
        let dir = tempdir().unwrap();
        let path = create_test_file(dir.path(), "dates.json", SAMPLE_DATASET_JSON);
        assert_eq!(load_non_empty(&path).unwrap(), ["2019-01-02", "2020-11-30"]);
    }

    #[test]
    fn load_rejects_missing_and_malformed() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("missing.json")),
            Err(DataError::FileNotFound { .. })
        ));

        let bad = create_test_file(dir.path(), "bad.json", "{ not json");
        assert!(matches!(load(&bad), Err(DataError::Malformed { .. })));

        let empty = create_test_file(dir.path(), "empty.json", r#"{"data": ["", ""]}"#);
        assert!(matches!(load_non_empty(&empty), Err(DataError::EmptyData { .. })));
    }

    #[test]
    fn constraints_follow_case() {
        let dir = tempdir().unwrap();
        let path = create_test_file(dir.path(), "dates.json", SAMPLE_DATASET_JSON);
        let dataset = load(&path).unwrap();
        let registry = TokenRegistry::new();

        let first = dataset.results[0].constraints(&dataset.data, &registry).unwrap();
        assert_eq!(first.positives().len(), 3);
        assert_eq!(first.disjuncts(), Some(DisjunctsLimit::exactly(1)));
        assert_eq!(first.clustering(), Some(ClusteringParameters::default()));

        let second = dataset.results[1].constraints(&dataset.data, &registry).unwrap();
        let tokens = second.allowed_tokens().unwrap();
        assert_eq!(second.disjuncts(), None);
        assert!(tokens.get("Alpha").is_none());
        assert!(tokens.get("<Year>").is_some());
        assert!(tokens.get("<EMail>").is_some());
    }

    #[test]
    fn invalid_custom_regex_is_rejected() {
        let case = TestCaseSpec {
            custom_regex_tokens: vec![CustomRegexToken {
                name: "<Bad>".to_string(),
                pattern: "([".to_string(),
                score: -1.0,
            }],
            ..TestCaseSpec::default()
        };
        let result = case.constraints(&["x".to_string()], &TokenRegistry::new());
        assert!(matches!(result, Err(TokenError::InvalidRegex { .. })));
    }

    #[test]
    fn catalog_applies_exclusions() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for name in [
            "tests/homo/dates.json",
            "tests/homo/emails.json",
            "tests/homo/dates_cleaned.json",
            "tests/hetero/companies.json",
            "tests/hetero/mixed.json",
            "tests/homo.simple/ids.json",
        ] {
            create_test_file(root, name, r#"{"data": ["x"]}"#);
        }
        create_test_file(root, "tests/homo/notes.txt", "ignored");

        let catalog = DatasetCatalog::discover(root).unwrap();
        let domain: Vec<_> = catalog
            .domain
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            domain,
            [
                PathBuf::from("tests/hetero/mixed.json"),
                PathBuf::from("tests/homo/dates.json"),
                PathBuf::from("tests/homo.simple/ids.json"),
            ]
        );
        assert_eq!(catalog.clean.len(), 3);
    }

    #[test]
    fn catalog_requires_tests_directory() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            DatasetCatalog::discover(dir.path()),
            Err(DataError::InvalidDirectory { .. })
        ));
    }
}
