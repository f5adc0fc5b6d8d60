//! Bidirectional mapping between caller-facing field names and remote field
//! identifiers.
//!
//! Entries keep insertion order. Overwriting a name keeps its original
//! position, so the reverse lookup tie-break ("first inserted wins") is stable
//! across `set` calls.

use crate::value::fid_eq;
use crate::FieldId;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Ordered name → identifier table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAliases {
    entries: Vec<(String, FieldId)>,
}

impl FieldAliases {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Map `name` to `fid`, overwriting any previous mapping for `name`.
    pub fn set(&mut self, name: impl Into<String>, fid: impl Into<FieldId>) -> &mut Self {
        let name = name.into();
        let fid = fid.into();

        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = fid,
            None => self.entries.push((name, fid)),
        }

        self
    }

    /// Copy every entry of `other` into this table.
    pub fn extend<I, N, F>(&mut self, other: I) -> &mut Self
    where
        I: IntoIterator<Item = (N, F)>,
        N: Into<String>,
        F: Into<FieldId>,
    {
        for (name, fid) in other {
            self.set(name, fid);
        }
        self
    }

    /// Identifier mapped to `name`.
    pub fn fid(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, fid)| fid.as_str())
    }

    /// First name (in insertion order) mapped to `fid`. An exact identifier
    /// match wins over an integer-equal spelling such as `"06"` for `"6"`.
    pub fn name_of(&self, fid: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, f)| f == fid)
            .or_else(|| self.entries.iter().find(|(_, f)| fid_eq(f, fid)))
            .map(|(name, _)| name.as_str())
    }

    /// Whether `name` has a mapping.
    pub fn contains_name(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Iterate `(name, fid)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, fid)| (name.as_str(), fid.as_str()))
    }

    /// Iterate names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate identifiers in insertion order.
    pub fn fids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, fid)| fid.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, F: Into<FieldId>> FromIterator<(N, F)> for FieldAliases {
    fn from_iter<I: IntoIterator<Item = (N, F)>>(iter: I) -> Self {
        let mut aliases = Self::new();
        aliases.extend(iter);
        aliases
    }
}

impl<'a> IntoIterator for &'a FieldAliases {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

// Serialized as a plain JSON object; order is preserved in both directions.

impl Serialize for FieldAliases {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, fid) in &self.entries {
            map.serialize_entry(name, fid)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldAliases {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AliasVisitor)
    }
}

struct AliasVisitor;

impl<'de> Visitor<'de> for AliasVisitor {
    type Value = FieldAliases;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of field names to field identifiers")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut aliases = FieldAliases::new();
        while let Some((name, fid)) = access.next_entry::<String, FidRepr>()? {
            aliases.set(name, fid.0);
        }
        Ok(aliases)
    }
}

/// Deserialize an identifier written as either a JSON string or a JSON number.
pub(crate) fn deserialize_fid<'de, D>(deserializer: D) -> Result<FieldId, D::Error>
where
    D: Deserializer<'de>,
{
    FidRepr::deserialize(deserializer).map(|fid| fid.0)
}

/// Identifier accepted as either a JSON string or a JSON number.
struct FidRepr(FieldId);

impl<'de> Deserialize<'de> for FidRepr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(FidRepr(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Int(i) => i.to_string(),
            Raw::Float(f) => f.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn set_overwrites_in_place() {
        let mut aliases = FieldAliases::new();
        aliases.set("recordid", "id").set("name", "6").set("email", "7");
        aliases.set("name", "8");

        assert_eq!(aliases.len(), 3);
        assert_eq!(aliases.fid("name"), Some("8"));
        assert_eq!(
            aliases.names().collect::<Vec<_>>(),
            vec!["recordid", "name", "email"]
        );
    }

    #[test]
    fn unmapped_lookups() {
        let aliases: FieldAliases = [("recordid", "id")].into_iter().collect();

        assert_eq!(aliases.fid("missing"), None);
        assert_eq!(aliases.name_of("99"), None);
        assert!(aliases.contains_name("recordid"));
        assert!(!aliases.contains_name("id"));
    }

    #[test]
    fn reverse_lookup_first_inserted_wins() {
        let aliases: FieldAliases = [("first", "6"), ("second", "6"), ("third", "7")]
            .into_iter()
            .collect();

        assert_eq!(aliases.name_of("6"), Some("first"));
        assert_eq!(aliases.name_of("7"), Some("third"));
    }

    #[test]
    fn reverse_lookup_normalizes_leading_zeros() {
        let aliases: FieldAliases = [("name", "6")].into_iter().collect();

        assert_eq!(aliases.name_of("06"), Some("name"));
        assert_eq!(aliases.name_of("6.0"), None);
    }

    #[test]
    fn reverse_lookup_prefers_exact_identifier() {
        let aliases: FieldAliases = [
            ("ten", "10"),
            ("exp", "1e1"),
            ("padded", "010"),
            ("big_a", "9007199254740993"),
        ]
        .into_iter()
        .collect();

        assert_eq!(aliases.name_of("1e1"), Some("exp"));
        assert_eq!(aliases.name_of("010"), Some("padded"));
        assert_eq!(aliases.name_of("0010"), Some("ten"));
        assert_eq!(aliases.name_of("9007199254740992"), None);
    }

    #[test]
    fn serde_preserves_order_and_accepts_numbers() {
        let json = r#"{"recordid":"id","zeta":6,"alpha":"7"}"#;
        let aliases: FieldAliases = serde_json::from_str(json).unwrap();

        assert_eq!(
            aliases.iter().collect::<Vec<_>>(),
            vec![("recordid", "id"), ("zeta", "6"), ("alpha", "7")]
        );
        assert_eq!(
            serde_json::to_string(&aliases).unwrap(),
            r#"{"recordid":"id","zeta":"6","alpha":"7"}"#
        );
    }

    #[test]
    fn rejects_non_map() {
        assert!(serde_json::from_str::<FieldAliases>("[1, 2]").is_err());
        assert!(serde_json::from_str::<FieldAliases>(r#"{"a": [1]}"#).is_err());
    }

    proptest! {
        #[test]
        fn alias_round_trip(name in "[a-z_]{1,12}", fid in "[0-9]{1,4}|[a-z]{1,6}") {
            let mut aliases = FieldAliases::new();
            aliases.set(name.clone(), fid.clone());

            prop_assert_eq!(aliases.fid(&name), Some(fid.as_str()));
            prop_assert_eq!(aliases.name_of(&fid), Some(name.as_str()));
        }

        #[test]
        fn last_set_wins(name in "[a-z]{1,8}", fids in prop::collection::vec("[0-9]{1,3}", 1..8)) {
            let mut aliases = FieldAliases::new();
            for fid in &fids {
                aliases.set(name.clone(), fid.clone());
            }

            prop_assert_eq!(aliases.len(), 1);
            prop_assert_eq!(aliases.fid(&name), fids.last().map(|s| s.as_str()));
        }
    }
}
