//! Natural-key values and content type tags.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content type tag (e.g. `Post`, `blog.Article`).
///
/// Cheap to clone. Never contains `:` (reserved by the item id format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Create a type name, rejecting empty names and names containing `:` or spaces.
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() || name.contains([':', ' ']) {
            return None;
        }
        Some(Self(Arc::from(name)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for TypeName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TypeName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid type name `{s}`")))
    }
}

/// A single natural-key value.
///
/// Equality uses the underlying value, so a UUID parsed from two different
/// strings (`ABC...` vs `abc...`) compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Bool(bool),
    Int(i64),
    Uuid(Uuid),
    Text(String),
}

impl KeyValue {
    /// Create a text value (lower-cased: addresses are case-normalized).
    pub fn text(s: impl AsRef<str>) -> Self {
        Self::Text(s.as_ref().to_lowercase())
    }

    /// Route-facing string form.
    pub fn to_route_value(&self) -> String {
        self.to_string()
    }

    /// Compare against a raw route value the way URL matching does
    /// (ASCII case-insensitive).
    pub fn matches_route_value(&self, raw: &str) -> bool {
        self.to_string().eq_ignore_ascii_case(raw)
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl From<i64> for KeyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for KeyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Uuid> for KeyValue {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_validation() {
        assert!(TypeName::new("Post").is_some());
        assert!(TypeName::new("blog.Article").is_some());
        assert!(TypeName::new("").is_none());
        assert!(TypeName::new("a:b").is_none());
        assert!(TypeName::new("a b").is_none());
    }

    #[test]
    fn test_text_is_lowercased() {
        assert_eq!(KeyValue::text("Hello"), KeyValue::Text("hello".to_string()));
        assert_eq!(KeyValue::from("ABC").to_string(), "abc");
    }

    #[test]
    fn test_uuid_equality_by_value() {
        let a: Uuid = "67E55044-10B1-426F-9247-BB680E5FE0C8".parse().unwrap();
        let b: Uuid = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(KeyValue::Uuid(a), KeyValue::Uuid(b));
        assert_eq!(KeyValue::Uuid(a).to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn test_matches_route_value() {
        assert!(KeyValue::Int(5).matches_route_value("5"));
        assert!(KeyValue::text("index").matches_route_value("Index"));
        assert!(!KeyValue::Bool(true).matches_route_value("false"));
        assert_eq!(KeyValue::Int(-3).to_route_value(), "-3");
    }
}
