//! Canonical assigned-facility set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Ordered, de-duplicated set of facility ids assigned to a user.
///
/// Blank and whitespace-only ids are dropped on construction. On the wire and
/// in storage it is a plain array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FacilityIds(BTreeSet<String>);

impl FacilityIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the legacy comma-delimited representation.
    pub fn from_delimited(raw: &str) -> Self {
        raw.split(',').collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for FacilityIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

impl From<Vec<String>> for FacilityIds {
    fn from(ids: Vec<String>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<FacilityIds> for Vec<String> {
    fn from(ids: FacilityIds) -> Self {
        ids.0.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimited_parsing_drops_blanks() {
        let ids = FacilityIds::from_delimited("f2, f1,,f2 , ");
        assert_eq!(ids.to_vec(), vec!["f1".to_string(), "f2".to_string()]);
    }

    #[test]
    fn test_empty_delimited_string_is_empty_set() {
        assert!(FacilityIds::from_delimited("").is_empty());
    }

    #[test]
    fn test_serializes_as_string_array() {
        let ids: FacilityIds = ["b", "a"].into_iter().collect();
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"["a","b"]"#);

        let parsed: FacilityIds = serde_json::from_str(r#"["x", "", " x "]"#).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed.contains("x"));
    }
}
