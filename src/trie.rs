//! Character trie for longest-prefix matching over a fixed vocabulary.

use std::collections::HashMap;

/// Trie keyed by characters, storing the original entry at terminal nodes.
///
/// Keys may be folded before insertion (for example uppercased); the stored
/// entry is the unfolded original, so callers can report what matched.
///
/// Supports:
/// - O(k) insert where k is the key length
/// - O(t) longest-prefix lookup where t is the target length
///
/// # Examples
///
/// ```
/// use textprofile::PrefixTrie;
///
/// let mut trie = PrefixTrie::new();
/// trie.insert("ab".chars(), "ab");
/// trie.insert("abc".chars(), "abc");
///
/// assert_eq!(trie.longest_prefix("abcd".chars()), Some("abc"));
/// assert_eq!(trie.longest_prefix("abd".chars()), Some("ab"));
/// assert_eq!(trie.longest_prefix("b".chars()), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrefixTrie {
    root: Node,
    entries: usize,
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: HashMap<char, Node>,
    entry: Option<String>,
}

impl PrefixTrie {
    /// Creates an empty trie.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct keys stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Returns true if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Inserts `entry` under the given key characters.
    ///
    /// Inserting a key twice keeps the first entry.
    pub fn insert<K>(&mut self, key: K, entry: impl Into<String>)
    where
        K: IntoIterator<Item = char>,
    {
        let mut node = &mut self.root;
        for c in key {
            node = node.children.entry(c).or_default();
        }
        if node.entry.is_none() {
            node.entry = Some(entry.into());
            self.entries += 1;
        }
    }

    /// Returns the entry stored under the longest key that is a prefix of
    /// `target`, or `None` if no stored key is a prefix.
    #[must_use]
    pub fn longest_prefix<T>(&self, target: T) -> Option<&str>
    where
        T: IntoIterator<Item = char>,
    {
        let mut node = &self.root;
        let mut best = node.entry.as_deref();
        for c in target {
            match node.children.get(&c) {
                Some(child) => {
                    node = child;
                    if let Some(entry) = node.entry.as_deref() {
                        best = Some(entry);
                    }
                }
                None => break,
            }
        }
        best
    }

    /// Returns true if exactly this key is stored.
    #[must_use]
    pub fn contains<K>(&self, key: K) -> bool
    where
        K: IntoIterator<Item = char>,
    {
        let mut node = &self.root;
        for c in key {
            match node.children.get(&c) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.entry.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trie_is_empty() {
        let trie = PrefixTrie::new();
        assert!(trie.is_empty());
        assert_eq!(trie.len(), 0);
        assert_eq!(trie.longest_prefix("anything".chars()), None);
    }

    #[test]
    fn longest_prefix_prefers_deeper_entry() {
        let mut trie = PrefixTrie::new();
        trie.insert("ab".chars(), "ab");
        trie.insert("abc".chars(), "abc");

        assert_eq!(trie.longest_prefix("abcd".chars()), Some("abc"));
        assert_eq!(trie.longest_prefix("abc".chars()), Some("abc"));
        assert_eq!(trie.longest_prefix("abx".chars()), Some("ab"));
        assert_eq!(trie.longest_prefix("a".chars()), None);
    }

    #[test]
    fn empty_target_matches_only_empty_key() {
        let mut trie = PrefixTrie::new();
        trie.insert("x".chars(), "x");
        assert_eq!(trie.longest_prefix("".chars()), None);

        trie.insert("".chars(), "");
        assert_eq!(trie.longest_prefix("".chars()), Some(""));
        assert_eq!(trie.longest_prefix("y".chars()), Some(""));
    }

    #[test]
    fn stored_entry_is_unfolded_original() {
        let mut trie = PrefixTrie::new();
        trie.insert("JAN".chars(), "Jan");
        assert_eq!(trie.longest_prefix("JANUARY".chars()), Some("Jan"));
    }

    #[test]
    fn duplicate_insert_keeps_first_entry() {
        let mut trie = PrefixTrie::new();
        trie.insert("MAY".chars(), "May");
        trie.insert("MAY".chars(), "MAY");
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.longest_prefix("MAY".chars()), Some("May"));
    }

    #[test]
    fn contains_is_exact() {
        let mut trie = PrefixTrie::new();
        trie.insert("abc".chars(), "abc");
        assert!(trie.contains("abc".chars()));
        assert!(!trie.contains("ab".chars()));
        assert!(!trie.contains("abcd".chars()));
    }
}
