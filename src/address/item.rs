//! Address - the natural-key identity of a content item.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::Value as JsonValue;
use smallvec::SmallVec;

use super::schema::{AddressSchema, HasAddressSchema, SchemaError};
use crate::core::{KeyValue, TypeName};

/// One address component with its matching-pass bookkeeping.
#[derive(Debug, Clone)]
struct AddressEntry {
    key: String,
    value: KeyValue,
    matched: bool,
}

/// Ordered `key -> value` map plus content type.
///
/// Keys are lower-cased and kept in schema order. The per-key `matched`
/// flag is scratch state for one route matching pass: clone the address
/// (or call [`Address::reset_matched`]) before testing another template.
///
/// Equality and hashing ignore the `matched` flags.
#[derive(Debug, Clone)]
pub struct Address {
    type_name: TypeName,
    separator: char,
    entries: SmallVec<[AddressEntry; 4]>,
}

impl Address {
    /// Address with no components (types without natural keys).
    pub fn empty(schema: &AddressSchema) -> Self {
        Self {
            type_name: schema.type_name.clone(),
            separator: schema.separator,
            entries: SmallVec::new(),
        }
    }

    /// Build from already-typed values, in schema order.
    ///
    /// Fails if a schema key has no value or a value names an undeclared key.
    pub fn from_key_values<K: AsRef<str>>(
        schema: &AddressSchema,
        values: impl IntoIterator<Item = (K, KeyValue)>,
    ) -> Result<Self, SchemaError> {
        let mut given: Vec<(String, KeyValue)> = Vec::new();
        for (key, value) in values {
            let key = key.as_ref().to_lowercase();
            if !schema.has_key(&key) {
                return Err(SchemaError::UnknownKey {
                    type_name: schema.type_name.clone(),
                    key,
                });
            }
            let value = match value {
                KeyValue::Text(s) => KeyValue::text(s),
                other => other,
            };
            given.push((key, value));
        }

        let mut address = Self::empty(schema);
        for spec in &schema.keys {
            let pos = given
                .iter()
                .position(|(k, _)| *k == spec.name)
                .ok_or_else(|| SchemaError::MissingKey {
                    type_name: schema.type_name.clone(),
                    key: spec.name.clone(),
                })?;
            let (key, value) = given.swap_remove(pos);
            address.entries.push(AddressEntry {
                key,
                value,
                matched: false,
            });
        }
        Ok(address)
    }

    /// Build from raw string values, converting each by its declared format.
    pub fn from_values<K: AsRef<str>, V: AsRef<str>>(
        schema: &AddressSchema,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, SchemaError> {
        let typed = values
            .into_iter()
            .map(|(k, v)| {
                let key = k.as_ref();
                let spec = schema.spec(key).ok_or_else(|| SchemaError::UnknownKey {
                    type_name: schema.type_name.clone(),
                    key: key.to_lowercase(),
                })?;
                Ok((spec.name.clone(), spec.format.parse(&spec.name, v.as_ref())?))
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;
        Self::from_key_values(schema, typed)
    }

    /// Extract natural-key fields off a serializable content object.
    ///
    /// Field names are matched case-insensitively against the schema keys.
    pub fn from_object<T: Serialize + ?Sized>(
        schema: &AddressSchema,
        source: &T,
    ) -> Result<Self, SchemaError> {
        let source_error = |message: String| SchemaError::Source {
            type_name: schema.type_name.clone(),
            message,
        };
        let value = serde_json::to_value(source).map_err(|e| source_error(e.to_string()))?;
        let JsonValue::Object(fields) = value else {
            return Err(source_error("not a struct or map".to_string()));
        };

        let mut address = Self::empty(schema);
        for spec in &schema.keys {
            let field = fields
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&spec.name))
                .map(|(_, v)| v)
                .ok_or_else(|| SchemaError::MissingKey {
                    type_name: schema.type_name.clone(),
                    key: spec.name.clone(),
                })?;
            address.entries.push(AddressEntry {
                key: spec.name.clone(),
                value: spec.format.coerce(&spec.name, field)?,
                matched: false,
            });
        }
        Ok(address)
    }

    /// Extract the address of a content object whose type declares its schema.
    pub fn of<T: HasAddressSchema + Serialize>(item: &T) -> Result<Self, SchemaError> {
        Self::from_object(&T::address_schema(), item)
    }

    /// Parse the path form produced by [`Address::as_path`].
    ///
    /// Returns `None` for malformed input. Only the last component may
    /// contain the separator.
    pub fn parse(schema: &AddressSchema, s: &str) -> Option<Self> {
        if schema.keys.is_empty() {
            return s.is_empty().then(|| Self::empty(schema));
        }

        let parts: Vec<&str> = s.splitn(schema.keys.len(), schema.separator).collect();
        if parts.len() != schema.keys.len() {
            return None;
        }

        let mut address = Self::empty(schema);
        for (spec, part) in schema.keys.iter().zip(parts) {
            let value = spec.format.parse(&spec.name, part).ok()?;
            address.entries.push(AddressEntry {
                key: spec.name.clone(),
                value,
                matched: false,
            });
        }
        Some(address)
    }

    /// Path form: values joined by the schema separator in key order.
    pub fn as_path(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(self.separator);
            }
            out.push_str(&entry.value.to_string());
        }
        out
    }

    #[inline]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn get(&self, key: &str) -> Option<&KeyValue> {
        self.entry(key).map(|e| &e.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    /// Iterate `(key, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyValue)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ========================================================================
    // matching-pass bookkeeping
    // ========================================================================

    /// Mark a key as accounted for by a route variable.
    ///
    /// Returns `false` if the address has no such key.
    pub fn set_matched(&mut self, key: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.key.eq_ignore_ascii_case(key)) {
            Some(entry) => {
                entry.matched = true;
                true
            }
            None => false,
        }
    }

    pub fn is_matched(&self, key: &str) -> bool {
        self.entry(key).is_some_and(|e| e.matched)
    }

    /// True iff every key was matched by some variable of the template under test.
    pub fn is_fully_matched(&self) -> bool {
        self.entries.iter().all(|e| e.matched)
    }

    /// Keys not yet matched in the current pass.
    pub fn unmatched_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.matched)
            .map(|e| e.key.as_str())
    }

    pub fn reset_matched(&mut self) {
        for entry in &mut self.entries {
            entry.matched = false;
        }
    }

    fn entry(&self, key: &str) -> Option<&AddressEntry> {
        self.entries.iter().find(|e| e.key.eq_ignore_ascii_case(key))
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.key == b.key && a.value == b.value)
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        for entry in &self.entries {
            entry.key.hash(state);
            entry.value.hash(state);
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_path())
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 1))?;
        map.serialize_entry("type", &self.type_name)?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::KeyFormat;
    use serde_json::json;

    fn post_schema() -> AddressSchema {
        AddressSchema::new(TypeName::new("Post").unwrap())
            .key("category", KeyFormat::Text)
            .key("slug", KeyFormat::Text)
    }

    #[derive(Serialize)]
    struct Post {
        #[serde(rename = "Category")]
        category: String,
        slug: String,
        body: String,
    }

    impl HasAddressSchema for Post {
        fn address_schema() -> AddressSchema {
            post_schema()
        }
    }

    #[test]
    fn test_from_values_orders_by_schema() {
        let addr = Address::from_values(&post_schema(), [("slug", "Hello"), ("category", "news")])
            .unwrap();
        assert_eq!(addr.keys().collect::<Vec<_>>(), ["category", "slug"]);
        assert_eq!(addr.as_path(), "news/hello");
        assert_eq!(addr.to_string(), "news/hello");
    }

    #[test]
    fn test_from_values_rejects_missing_and_unknown() {
        let err = Address::from_values(&post_schema(), [("slug", "a")]).unwrap_err();
        assert!(matches!(err, SchemaError::MissingKey { ref key, .. } if key == "category"));

        let err = Address::from_values(&post_schema(), [("slug", "a"), ("year", "2024")])
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownKey { ref key, .. } if key == "year"));
    }

    #[test]
    fn test_from_object() {
        let post = Post {
            category: "News".to_string(),
            slug: "hello".to_string(),
            body: "ignored".to_string(),
        };
        let addr = Address::of(&post).unwrap();
        assert_eq!(addr.type_name(), "Post");
        assert_eq!(addr.get("category"), Some(&KeyValue::text("news")));
        assert_eq!(addr.len(), 2);
    }

    #[test]
    fn test_from_object_conversion_error() {
        let schema = AddressSchema::new(TypeName::new("Event").unwrap()).key("year", KeyFormat::Int);
        let err = Address::from_object(&schema, &json!({ "year": "soon" })).unwrap_err();
        assert!(matches!(err, SchemaError::Conversion { format: KeyFormat::Int, .. }));

        let err = Address::from_object(&schema, &json!({ "month": 1 })).unwrap_err();
        assert!(matches!(err, SchemaError::MissingKey { .. }));

        let err = Address::from_object(&schema, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, SchemaError::Source { .. }));
    }

    #[test]
    fn test_parse_round_trip() {
        let schema = post_schema();
        let addr = Address::from_values(&schema, [("category", "news"), ("slug", "hello")]).unwrap();
        assert_eq!(Address::parse(&schema, &addr.as_path()), Some(addr));
    }

    #[test]
    fn test_parse_typed_round_trip() {
        let schema = AddressSchema::new(TypeName::new("Doc").unwrap())
            .key("id", KeyFormat::Uuid)
            .key("rev", KeyFormat::Int)
            .with_separator('~');
        let addr = Address::from_values(
            &schema,
            [("id", "67E55044-10B1-426F-9247-BB680E5FE0C8"), ("rev", "3")],
        )
        .unwrap();
        assert_eq!(addr.as_path(), "67e55044-10b1-426f-9247-bb680e5fe0c8~3");
        assert_eq!(Address::parse(&schema, &addr.as_path()), Some(addr));
    }

    #[test]
    fn test_parse_malformed() {
        let schema = post_schema();
        assert_eq!(Address::parse(&schema, "only-one"), None);
        assert_eq!(Address::parse(&schema, ""), None);

        let empty = AddressSchema::new(TypeName::new("Home").unwrap());
        assert_eq!(Address::parse(&empty, ""), Some(Address::empty(&empty)));
        assert_eq!(Address::parse(&empty, "x"), None);
    }

    #[test]
    fn test_last_component_keeps_separator() {
        let schema = AddressSchema::new(TypeName::new("Doc").unwrap())
            .key("section", KeyFormat::Text)
            .key("path", KeyFormat::Text);
        let addr = Address::parse(&schema, "guide/intro/setup").unwrap();
        assert_eq!(addr.get("path"), Some(&KeyValue::text("intro/setup")));
    }

    #[test]
    fn test_matched_flags() {
        let mut addr =
            Address::from_values(&post_schema(), [("category", "news"), ("slug", "a")]).unwrap();
        assert!(!addr.is_fully_matched());
        assert!(addr.set_matched("Category"));
        assert!(!addr.set_matched("year"));
        assert_eq!(addr.unmatched_keys().collect::<Vec<_>>(), ["slug"]);
        assert!(addr.set_matched("slug"));
        assert!(addr.is_fully_matched());

        addr.reset_matched();
        assert!(!addr.is_matched("slug"));
    }

    #[test]
    fn test_equality_ignores_matched() {
        let a = Address::from_values(&post_schema(), [("category", "news"), ("slug", "a")]).unwrap();
        let mut b = a.clone();
        b.set_matched("slug");
        assert_eq!(a, b);

        use rustc_hash::FxHashSet;
        let mut set = FxHashSet::default();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_empty_address_is_fully_matched() {
        let schema = AddressSchema::new(TypeName::new("Home").unwrap());
        assert!(Address::empty(&schema).is_fully_matched());
    }

    #[test]
    fn test_serialize() {
        let addr = Address::from_values(&post_schema(), [("category", "news"), ("slug", "a")]).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, r#"{"type":"Post","category":"news","slug":"a"}"#);
    }
}
