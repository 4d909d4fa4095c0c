//! Immutable token registry and per-request token sets.
//!
//! The registry is built once (default atoms, extended atoms, semantic
//! vocabularies loaded from disk) and then passed by reference to whatever
//! needs to derive an allowed-token set.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::constants::{CASE_EXTENSION, EXTENDED_REGEX_SCORE, NOCASE_EXTENSION};
use crate::error::TokenError;
use crate::token::{same_token, CharClass, CharClassToken, PrefixToken, RegexToken, Token};

/// Shared handle to a token.
pub type TokenRef = Arc<dyn Token>;

const EMAIL_PATTERN: &str = r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+";
const PHONE_PATTERN: &str = r"(\+\d{1,2}\s)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}";
const URL_PATTERN: &str = r"(http://www\.|https://www\.|http://|https://)?[a-z0-9]+([\-\.]{1}[a-z0-9]+)*\.[a-z]{2,5}(:[0-9]{1,5})?(/.*)?";

/// Description of a user-supplied regex token.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegexTokenSpec {
    /// Token name.
    pub name: String,
    /// Regex source, matched at the start of the target.
    pub pattern: String,
    /// Token score.
    pub score: f64,
}

impl RegexTokenSpec {
    /// Describes a regex token.
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            score,
        }
    }

    /// Compiles the pattern into a token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidRegex` if the pattern does not compile.
    pub fn build(&self) -> Result<RegexToken, TokenError> {
        RegexToken::new(&self.name, &self.pattern, self.score)
    }
}

/// An ordered set of tokens with identity-based deduplication.
#[derive(Clone, Default)]
pub struct TokenSet {
    tokens: Vec<TokenRef>,
}

impl TokenSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token unless an identical one (same name and score) is present.
    ///
    /// Returns true if the token was added.
    pub fn insert(&mut self, token: TokenRef) -> bool {
        if self.tokens.iter().any(|t| same_token(t.as_ref(), token.as_ref())) {
            return false;
        }
        self.tokens.push(token);
        true
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the set has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterates the tokens in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TokenRef> {
        self.tokens.iter()
    }

    /// Looks up a token by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TokenRef> {
        self.tokens.iter().find(|t| t.name() == name)
    }

    /// Returns the token names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.name()).collect()
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl FromIterator<TokenRef> for TokenSet {
    fn from_iter<I: IntoIterator<Item = TokenRef>>(iter: I) -> Self {
        let mut set = Self::new();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

impl Extend<TokenRef> for TokenSet {
    fn extend<I: IntoIterator<Item = TokenRef>>(&mut self, iter: I) {
        for token in iter {
            self.insert(token);
        }
    }
}

/// The token universe available to learners.
///
/// # Examples
///
/// ```
/// use textprofile::TokenRegistry;
///
/// let registry = TokenRegistry::new();
/// let defaults = registry.token_set(false, &[], &[]).unwrap();
/// assert!(defaults.get("Digit").is_some());
/// assert!(defaults.get("<EMail>").is_none());
///
/// let extended = registry.token_set(true, &["Digit".to_string()], &[]).unwrap();
/// assert!(extended.get("Digit").is_none());
/// assert!(extended.get("<EMail>").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    defaults: TokenSet,
    extended: TokenSet,
    any: TokenRef,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenRegistry {
    /// Creates a registry with the built-in default and extended atoms.
    #[must_use]
    pub fn new() -> Self {
        let any: TokenRef = Arc::new(CharClassToken::new(CharClass::Any));
        let defaults = CharClass::ALL
            .into_iter()
            .map(|class| {
                if class == CharClass::Any {
                    Arc::clone(&any)
                } else {
                    Arc::new(CharClassToken::new(class)) as TokenRef
                }
            })
            .collect();

        let mut extended = TokenSet::new();
        for (name, pattern) in [
            ("<EMail>", EMAIL_PATTERN),
            ("<PhoneNum>", PHONE_PATTERN),
            ("<URL>", URL_PATTERN),
        ] {
            // Built-in patterns are known to compile.
            if let Ok(token) = RegexToken::new(name, pattern, EXTENDED_REGEX_SCORE) {
                extended.insert(Arc::new(token));
            }
        }

        Self {
            defaults,
            extended,
            any,
        }
    }

    /// Creates a registry and loads semantic atoms from `dir`.
    ///
    /// # Errors
    ///
    /// See [`TokenRegistry::load_semantic_atoms`].
    pub fn with_semantic_atoms(dir: &Path) -> Result<Self, TokenError> {
        let mut registry = Self::new();
        registry.load_semantic_atoms(dir)?;
        Ok(registry)
    }

    /// Loads every `*.nocase` (case-insensitive) and `*.case`
    /// (case-sensitive) vocabulary file under `dir`, recursively, as a
    /// [`PrefixToken`] named after the file stem.
    ///
    /// Returns the number of tokens added.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::ReadFailed` if the directory or a vocabulary file
    /// cannot be read, `TokenError::UnnamedVocabulary` if a file has no
    /// stem, and `TokenError::EmptyVocabulary` if a file has no entries.
    pub fn load_semantic_atoms(&mut self, dir: &Path) -> Result<usize, TokenError> {
        let mut files = Vec::new();
        collect_files(dir, &mut files)?;
        files.sort();

        let mut added = 0;
        for path in files {
            let case_sensitive = match path.extension().and_then(|e| e.to_str()) {
                Some(CASE_EXTENSION) => true,
                Some(NOCASE_EXTENSION) => false,
                _ => continue,
            };
            let token = load_vocabulary(&path, case_sensitive)?;
            debug!(
                name = token.name(),
                entries = token.vocabulary_size(),
                case_sensitive,
                "loaded semantic atom"
            );
            if self.extended.insert(Arc::new(token)) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Adds an extended token.
    #[must_use]
    pub fn with_extended(mut self, token: TokenRef) -> Self {
        self.extended.insert(token);
        self
    }

    /// Returns the default atoms.
    #[must_use]
    pub fn default_atoms(&self) -> &TokenSet {
        &self.defaults
    }

    /// Returns the extended atoms.
    #[must_use]
    pub fn extended_atoms(&self) -> &TokenSet {
        &self.extended
    }

    /// Returns the match-anything fallback token.
    #[must_use]
    pub fn any(&self) -> &TokenRef {
        &self.any
    }

    /// Builds the allowed-token set for one learning request: the default
    /// atoms (plus the extended atoms when requested), minus excluded names,
    /// plus custom regex tokens.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidRegex` if a custom regex does not compile.
    pub fn token_set(
        &self,
        use_extended: bool,
        excluded: &[String],
        custom: &[RegexTokenSpec],
    ) -> Result<TokenSet, TokenError> {
        let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
        let base = self
            .defaults
            .iter()
            .chain(self.extended.iter().filter(|_| use_extended))
            .filter(|t| !excluded.contains(t.name()))
            .cloned();

        let mut set: TokenSet = base.collect();
        for spec in custom {
            set.insert(Arc::new(spec.build()?));
        }
        Ok(set)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<(), TokenError> {
    let entries = std::fs::read_dir(dir).map_err(|e| TokenError::ReadFailed {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;
    for entry in entries {
        let path = entry
            .map_err(|e| TokenError::ReadFailed {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?
            .path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

fn load_vocabulary(path: &Path, case_sensitive: bool) -> Result<PrefixToken, TokenError> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| TokenError::UnnamedVocabulary {
            path: path.display().to_string(),
        })?
        .to_string();
    let contents = std::fs::read_to_string(path).map_err(|e| TokenError::ReadFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let entries: Vec<&str> = contents.lines().filter(|line| !line.is_empty()).collect();
    if entries.is_empty() {
        return Err(TokenError::EmptyVocabulary {
            path: path.display().to_string(),
        });
    }
    Ok(PrefixToken::new(name, entries, case_sensitive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_include_every_class() {
        let registry = TokenRegistry::new();
        assert_eq!(registry.default_atoms().len(), CharClass::ALL.len());
        assert_eq!(registry.any().name(), "Any");
        assert_eq!(registry.extended_atoms().len(), 3);
    }

    #[test]
    fn token_set_excludes_names() {
        let registry = TokenRegistry::new();
        let set = registry
            .token_set(false, &["Upper".to_string(), "Lower".to_string()], &[])
            .unwrap();
        assert!(set.get("Upper").is_none());
        assert!(set.get("Lower").is_none());
        assert!(set.get("Alpha").is_some());
    }

    #[test]
    fn token_set_adds_custom_regex() {
        let registry = TokenRegistry::new();
        let custom = [RegexTokenSpec::new("<Zip>", r"\d{5}", -0.2)];
        let set = registry.token_set(false, &[], &custom).unwrap();
        let zip = set.get("<Zip>").unwrap();
        assert_eq!(zip.prefix_match_length("02139"), 5);
    }

    #[test]
    fn token_set_rejects_bad_custom_regex() {
        let registry = TokenRegistry::new();
        let custom = [RegexTokenSpec::new("<Bad>", "(", -1.0)];
        assert!(registry.token_set(false, &[], &custom).is_err());
    }

    #[test]
    fn token_set_deduplicates_by_identity() {
        let mut set = TokenSet::new();
        assert!(set.insert(Arc::new(CharClassToken::new(CharClass::Digit))));
        assert!(!set.insert(Arc::new(CharClassToken::new(CharClass::Digit))));
        assert!(set.insert(Arc::new(CharClassToken::with_score(CharClass::Digit, -7.0))));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn loads_semantic_atoms_from_directory() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        let nested = dir.join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.join("Month.nocase"), "Jan\nFeb\nMar\n").unwrap();
        std::fs::write(nested.join("State.case"), "CA\nWA\n").unwrap();
        std::fs::write(dir.join("README.txt"), "ignored").unwrap();

        let registry = TokenRegistry::with_semantic_atoms(dir).unwrap();
        let set = registry.token_set(true, &[], &[]).unwrap();

        let month = set.get("Month").unwrap();
        assert_eq!(month.prefix_match_length("jan 1"), 3);
        let state = set.get("State").unwrap();
        assert_eq!(state.prefix_match_length("ca"), 0);
        assert_eq!(state.prefix_match_length("CA"), 2);
        assert!(set.get("README").is_none());
    }

    #[test]
    fn empty_vocabulary_file_is_an_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("Month.nocase"), "Jan\n").unwrap();
        std::fs::write(temp.path().join("Blank.case"), "\n\n").unwrap();

        let err = TokenRegistry::with_semantic_atoms(temp.path()).unwrap_err();
        assert!(matches!(err, TokenError::EmptyVocabulary { ref path } if path.ends_with("Blank.case")));
    }

    #[test]
    fn missing_atoms_directory_is_an_error() {
        let err = TokenRegistry::with_semantic_atoms(Path::new("/nonexistent/atoms")).unwrap_err();
        assert!(matches!(err, TokenError::ReadFailed { .. }));
    }
}
