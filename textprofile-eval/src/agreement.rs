//! Cluster agreement: entropy, mutual information, and normalized mutual
//! information between two partitions of the same strings.
//!
//! Logarithms are natural. Cluster intersections are multiset
//! intersections, so a string occurring twice counts twice.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::metrics::{count_as_f64, Degeneracy, MetricValue};

/// An ordered sequence of clusters of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    clusters: Vec<Vec<String>>,
}

impl Partition {
    /// Creates a partition from clusters.
    #[must_use]
    pub fn new(clusters: Vec<Vec<String>>) -> Self {
        Self { clusters }
    }

    /// Groups `items` by `key`, in order of each key's first appearance.
    ///
    /// # Examples
    ///
    /// ```
    /// use textprofile_eval::Partition;
    ///
    /// let items = ["a1", "b1", "a2"];
    /// let partition = Partition::group_by(items, |s| s.chars().next());
    /// assert_eq!(partition.clusters()[0], ["a1", "a2"]);
    /// assert_eq!(partition.clusters()[1], ["b1"]);
    /// ```
    #[must_use]
    pub fn group_by<I, S, K, F>(items: I, mut key: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        K: Eq + Hash,
        F: FnMut(&str) -> K,
    {
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut clusters: Vec<Vec<String>> = Vec::new();
        for item in items {
            let item = item.into();
            let slot = *index.entry(key(&item)).or_insert_with(|| {
                clusters.push(Vec::new());
                clusters.len() - 1
            });
            clusters[slot].push(item);
        }
        Self { clusters }
    }

    /// Returns the clusters.
    #[must_use]
    pub fn clusters(&self) -> &[Vec<String>] {
        &self.clusters
    }

    /// Number of clusters, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns true if the partition has no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total number of points across clusters.
    #[must_use]
    pub fn total(&self) -> usize {
        self.clusters.iter().map(Vec::len).sum()
    }
}

/// Entropy `H = -Σ p_i ln p_i` with `p_i = |c_i| / N`.
///
/// Empty clusters contribute nothing; an empty partition has entropy 0.
#[must_use]
pub fn entropy(partition: &Partition) -> f64 {
    let total = count_as_f64(partition.total());
    if total == 0.0 {
        return 0.0;
    }
    -partition
        .clusters
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| {
            let p = count_as_f64(c.len()) / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Mutual information `I = (1/N) Σ n_ab ln(N n_ab / (|a| |b|))`.
///
/// `N` is the size of `a`; zero intersections contribute nothing.
#[must_use]
pub fn mutual_information(a: &Partition, b: &Partition) -> f64 {
    let total = count_as_f64(a.total());
    if total == 0.0 {
        return 0.0;
    }

    let counted_b: Vec<HashMap<&str, usize>> = b.clusters.iter().map(|c| counts(c)).collect();
    let mut sum = 0.0;
    for cluster_a in a.clusters.iter().filter(|c| !c.is_empty()) {
        let counted_a = counts(cluster_a);
        for (cluster_b, counted_b) in b.clusters.iter().zip(&counted_b) {
            let shared: usize = counted_a
                .iter()
                .map(|(s, &n)| n.min(counted_b.get(s).copied().unwrap_or(0)))
                .sum();
            if shared == 0 {
                continue;
            }
            let n_ab = count_as_f64(shared);
            let sizes = count_as_f64(cluster_a.len()) * count_as_f64(cluster_b.len());
            sum += n_ab * (total * n_ab / sizes).ln();
        }
    }
    sum / total
}

/// Normalized mutual information `2 I / (H(a) + H(b))`.
///
/// When both partitions have zero entropy the ratio is 0/0 and the result
/// is [`MetricValue::Undefined`] with [`Degeneracy::ZeroEntropy`].
///
/// # Examples
///
/// ```
/// use textprofile_eval::{normalized_mutual_information, MetricValue, Partition};
///
/// let truth = Partition::new(vec![
///     vec!["aaa".into(), "aab".into()],
///     vec!["bba".into(), "bbb".into()],
/// ]);
/// let nmi = normalized_mutual_information(&truth, &truth).value().unwrap();
/// assert!((nmi - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn normalized_mutual_information(a: &Partition, b: &Partition) -> MetricValue {
    let denominator = entropy(a) + entropy(b);
    MetricValue::ratio(
        2.0 * mutual_information(a, b),
        denominator,
        Degeneracy::ZeroEntropy,
    )
}

fn counts(cluster: &[String]) -> HashMap<&str, usize> {
    let mut counted = HashMap::new();
    for s in cluster {
        *counted.entry(s.as_str()).or_insert(0) += 1;
    }
    counted
}
