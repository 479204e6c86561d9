//! # Running Statistics
//!
//! [`StatAccumulator`] folds the values of one key into `(min, max, sum, count)`.
//! It is owned by exactly one worker and never shared, so it carries no
//! synchronization of its own. [`Rounding`] turns the final numbers into the
//! one-decimal figures that get printed.

use std::fmt;

/// Running `(min, max, sum, count)` for one key.
///
/// An accumulator only exists once a value has been folded, so `count >= 1`
/// and `min <= max` always hold.
#[derive(Debug, Clone, PartialEq)]
pub struct StatAccumulator {
  /// The key these statistics belong to.
  pub key: String,
  /// Smallest value seen.
  pub min: f64,
  /// Largest value seen.
  pub max: f64,
  /// Sum of all values.
  pub sum: f64,
  /// Number of values folded.
  pub count: u64,
}

impl StatAccumulator {
  /// Starts an accumulator from the first value of `key`.
  pub fn new(key: impl Into<String>, value: f64) -> Self {
    Self {
      key: key.into(),
      min: value,
      max: value,
      sum: value,
      count: 1,
    }
  }

  /// Folds one more value in.
  #[inline]
  pub fn fold(&mut self, value: f64) {
    self.min = self.min.min(value);
    self.max = self.max.max(value);
    self.sum += value;
    self.count += 1;
  }

  /// The running mean, `sum / count`.
  pub fn mean(&self) -> f64 {
    self.sum / self.count as f64
  }

  /// The rounded `(min, mean, max)` triple for display.
  pub fn display(&self, rounding: Rounding) -> DisplayStats {
    DisplayStats {
      min: rounding.apply(self.min),
      mean: rounding.apply(self.mean()),
      max: rounding.apply(self.max),
    }
  }
}

/// How values are rounded to one decimal place for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Rounding {
  /// `floor(x * 10 + 0.5) / 10`: nearest tenth, ties toward positive infinity.
  ///
  /// `-2.35` becomes `-2.3` and `2.349999` becomes `2.3`.
  #[default]
  HalfUp,
  /// `ceil(x * 10) / 10`: always toward positive infinity.
  ///
  /// Byte-compatible with the legacy output: any fraction beyond the first
  /// decimal rounds up (`2.31` and `2.349999` both print as `2.4`), and values
  /// in `(-0.1, 0.0)` print as `-0.0`.
  Ceil,
}

impl Rounding {
  /// Rounds `value` to one decimal place.
  pub fn apply(self, value: f64) -> f64 {
    match self {
      Rounding::HalfUp => (value * 10.0 + 0.5).floor() / 10.0,
      Rounding::Ceil => (value * 10.0).ceil() / 10.0,
    }
  }
}

/// The rounded figures printed for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayStats {
  /// Rounded minimum.
  pub min: f64,
  /// Rounded mean.
  pub mean: f64,
  /// Rounded maximum.
  pub max: f64,
}

impl fmt::Display for DisplayStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:.1}/{:.1}/{:.1}", self.min, self.mean, self.max)
  }
}
