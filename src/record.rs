//! A single parsed `key;value` line.

/// The field separator used when none is configured.
pub const DEFAULT_DELIMITER: char = ';';

/// One `(key, raw value)` pair read from the input.
///
/// The value stays unparsed here; numeric parsing happens in the worker that
/// owns the key so a bad value only affects that key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
  /// The key, taken as-is from field 0.
  pub key: String,
  /// The raw value from field 1.
  pub raw_value: String,
}

impl Record {
  /// Creates a record from its two fields.
  pub fn new(key: impl Into<String>, raw_value: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      raw_value: raw_value.into(),
    }
  }

  /// Splits `line` into a record.
  ///
  /// Returns `None` unless the line holds exactly two fields with a non-empty key.
  pub fn parse(line: &str, delimiter: char) -> Option<Self> {
    let (key, value) = line.split_once(delimiter)?;
    if key.is_empty() || value.contains(delimiter) {
      return None;
    }
    Some(Self::new(key, value))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_two_fields() {
    let record = Record::parse("Tokyo;35.6", ';').unwrap();
    assert_eq!(record.key, "Tokyo");
    assert_eq!(record.raw_value, "35.6");
  }

  #[test]
  fn test_parse_keeps_key_verbatim() {
    let record = Record::parse(" São Paulo ;-1.0", ';').unwrap();
    assert_eq!(record.key, " São Paulo ");
    assert_eq!(record.raw_value, "-1.0");
  }

  #[test]
  fn test_parse_rejects_missing_delimiter() {
    assert_eq!(Record::parse("Tokyo 35.6", ';'), None);
  }

  #[test]
  fn test_parse_rejects_extra_fields() {
    assert_eq!(Record::parse("Tokyo;35.6;extra", ';'), None);
  }

  #[test]
  fn test_parse_rejects_empty_key() {
    assert_eq!(Record::parse(";35.6", ';'), None);
  }

  #[test]
  fn test_parse_custom_delimiter() {
    let record = Record::parse("Paris,5.5", ',').unwrap();
    assert_eq!(record, Record::new("Paris", "5.5"));
  }

  #[test]
  fn test_parse_empty_value_is_left_to_the_worker() {
    let record = Record::parse("Paris;", ';').unwrap();
    assert_eq!(record.raw_value, "");
  }
}
