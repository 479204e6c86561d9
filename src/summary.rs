//! The final per-key result set and its one-line rendering.

use crate::stats::DisplayStats;
use std::fmt;

/// Rounded statistics for every key, sorted by key.
///
/// Renders as `{key1=min/mean/max, key2=min/mean/max}`.
///
/// ```rust
/// use statweave::stats::DisplayStats;
/// use statweave::summary::Summary;
///
/// let summary = Summary::from_sorted(vec![
///   ("Paris".to_string(), DisplayStats { min: 5.5, mean: 5.5, max: 5.5 }),
///   ("Tokyo".to_string(), DisplayStats { min: 10.0, mean: 15.0, max: 20.0 }),
/// ]);
/// assert_eq!(summary.to_string(), "{Paris=5.5/5.5/5.5, Tokyo=10.0/15.0/20.0}");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
  entries: Vec<(String, DisplayStats)>,
}

impl Summary {
  /// Wraps entries that are already sorted by key.
  pub fn from_sorted(entries: Vec<(String, DisplayStats)>) -> Self {
    debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
    Self { entries }
  }

  /// The entries in key order.
  pub fn entries(&self) -> &[(String, DisplayStats)] {
    &self.entries
  }

  /// Looks up the statistics of one key.
  pub fn get(&self, key: &str) -> Option<&DisplayStats> {
    self
      .entries
      .binary_search_by(|(k, _)| k.as_str().cmp(key))
      .ok()
      .map(|i| &self.entries[i].1)
  }

  /// Number of keys.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Whether the input held no valid record.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl fmt::Display for Summary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("{")?;
    for (i, (key, stats)) in self.entries.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }
      write!(f, "{key}={stats}")?;
    }
    f.write_str("}")
  }
}
