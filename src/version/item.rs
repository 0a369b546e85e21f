//! ItemVersion - a partial vector of named version coordinates.
//!
//! ```text
//! {locale: en, stage: draft}     fully specified
//! {locale: *,  stage: draft}     `locale` is a wildcard
//! ```
//!
//! Every operation returns a new value; an `ItemVersion` is never mutated
//! after construction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Written in place of a wildcard coordinate value.
pub const WILDCARD: &str = "*";

/// Characters escaped in the text form: the `;`/`=` delimiters, the space
/// that separates a version from the identity it pins, and `%` itself.
const RESERVED: &AsciiSet = &CONTROLS.add(b' ').add(b';').add(b'=').add(b'%');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    #[error("version component `{0}` is not `name=value`")]
    Component(String),

    #[error("empty coordinate name in `{0}`")]
    EmptyName(String),

    #[error("coordinate `{0}` appears more than once")]
    Duplicate(String),

    #[error("invalid percent-encoding in `{0}`")]
    Encoding(String),
}

/// Map of `coordinate -> value`, where `None` is the wildcard.
///
/// Coordinate names are lower-cased. Names and values may hold any text;
/// reserved characters are percent-encoded in the `name=value;...` form. Equality is structural and does not
/// depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemVersion(BTreeMap<String, Option<String>>);

impl ItemVersion {
    /// Version with no coordinates.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs; an empty value is a wildcard.
    pub fn from_pairs<K: AsRef<str>, V: AsRef<str>>(
        pairs: impl IntoIterator<Item = (K, Option<V>)>,
    ) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (normalize_name(k.as_ref()), normalize_value(v)))
                .collect(),
        )
    }

    /// Parse the `name=value;...` form, returning `None` when malformed.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Copy with one coordinate set (`None` sets the wildcard).
    pub fn with(&self, name: &str, value: Option<&str>) -> Self {
        let mut map = self.0.clone();
        map.insert(normalize_name(name), normalize_value(value));
        Self(map)
    }

    /// Copy without the given coordinate.
    pub fn without(&self, name: &str) -> Self {
        let mut map = self.0.clone();
        map.remove(&normalize_name(name));
        Self(map)
    }

    /// `Some(None)` for a wildcard, `None` when the coordinate is absent.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.0.get(&normalize_name(name)).map(|v| v.as_deref())
    }

    /// Concrete value of a coordinate (absent and wildcard both give `None`).
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&normalize_name(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True iff some coordinate is a wildcard.
    pub fn is_partial(&self) -> bool {
        self.0.values().any(Option::is_none)
    }

    // ========================================================================
    // algebra
    // ========================================================================

    /// Restrict to the coordinates named by `mask`.
    ///
    /// A coordinate survives when the mask holds a concrete value for it, or
    /// when both sides hold the wildcard. Absent coordinates never fail.
    pub fn mask(&self, mask: &ItemVersion) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, v)| match mask.0.get(*k) {
                    Some(Some(_)) => true,
                    Some(None) => v.is_none(),
                    None => false,
                })
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Lay `overlay` over this version: its concrete coordinates win,
    /// everything else is kept from `self`.
    pub fn superimpose(&self, overlay: &ItemVersion) -> Self {
        let mut map = self.0.clone();
        for (k, v) in &overlay.0 {
            if v.is_some() {
                map.insert(k.clone(), v.clone());
            }
        }
        Self(map)
    }

    /// True iff every coordinate of `self` matches `other`, where a wildcard
    /// in `other` matches anything.
    pub fn contained_by(&self, other: &ItemVersion) -> bool {
        self.0.iter().all(|(k, v)| match other.0.get(k) {
            Some(None) => true,
            Some(theirs) => theirs == v,
            None => false,
        })
    }

    /// True iff no shared coordinate holds two different concrete values.
    pub fn overlaps(&self, other: &ItemVersion) -> bool {
        self.0.iter().all(|(k, v)| match (v, other.0.get(k)) {
            (Some(mine), Some(Some(theirs))) => mine == theirs,
            _ => true,
        })
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_value<V: AsRef<str>>(value: Option<V>) -> Option<String> {
    value
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty() && v != WILDCARD)
}

impl fmt::Display for ItemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            let value = match v {
                Some(v) => utf8_percent_encode(v, RESERVED).to_string(),
                None => WILDCARD.to_string(),
            };
            write!(f, "{}={value}", utf8_percent_encode(k, RESERVED))?;
        }
        Ok(())
    }
}

impl FromStr for ItemVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut map = BTreeMap::new();
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| VersionParseError::Component(part.to_string()))?;
            let decode = |raw: &str| {
                percent_decode_str(raw)
                    .decode_utf8()
                    .map(|s| s.into_owned())
                    .map_err(|_| VersionParseError::Encoding(part.to_string()))
            };
            let name = normalize_name(&decode(name)?);
            if name.is_empty() {
                return Err(VersionParseError::EmptyName(part.to_string()));
            }
            if map.contains_key(&name) {
                return Err(VersionParseError::Duplicate(name));
            }
            map.insert(name, normalize_value(Some(decode(value)?)));
        }
        Ok(Self(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ItemVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let ver = v("stage=draft;locale=en");
        assert_eq!(ver.to_string(), "locale=en;stage=draft");
        assert_eq!(v(&ver.to_string()), ver);

        let partial = v("locale=*;stage=live");
        assert!(partial.is_partial());
        assert_eq!(partial.get("locale"), Some(None));
        assert_eq!(partial.to_string(), "locale=*;stage=live");

        assert_eq!(v(""), ItemVersion::empty());
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(
            "locale".parse::<ItemVersion>(),
            Err(VersionParseError::Component("locale".to_string()))
        );
        assert!(matches!("=en".parse::<ItemVersion>(), Err(VersionParseError::EmptyName(_))));
        assert!(matches!(
            "a=1;A=2".parse::<ItemVersion>(),
            Err(VersionParseError::Duplicate(_))
        ));
        assert_eq!(ItemVersion::parse("garbage"), None);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = ItemVersion::from_pairs([("locale", Some("en")), ("stage", Some("draft"))]);
        let b = ItemVersion::from_pairs([("stage", Some("draft")), ("Locale", Some("en"))]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_mask() {
        let ver = v("locale=en;stage=draft;variant=b");
        let masked = ver.mask(&v("locale=fr;variant=a;extra=1"));
        assert_eq!(masked, v("locale=en;variant=b"));
    }

    #[test]
    fn test_mask_idempotence() {
        for s in ["locale=en;stage=draft", "locale=*;stage=draft", ""] {
            let ver = v(s);
            assert_eq!(ver.mask(&ver), ver, "mask idempotence failed for {s}");
        }
        assert!(v("locale=en").mask(&ItemVersion::empty()).is_empty());
    }

    #[test]
    fn test_mask_by_wildcard_drops_concrete() {
        let masked = v("locale=en;stage=draft").mask(&v("locale=*;stage=live"));
        assert_eq!(masked, v("stage=draft"));
    }

    #[test]
    fn test_superimpose() {
        let base = v("locale=en;stage=draft");
        assert_eq!(base.superimpose(&v("stage=live")), v("locale=en;stage=live"));
        assert_eq!(base.superimpose(&v("stage=*;variant=b")), v("locale=en;stage=draft;variant=b"));
    }

    #[test]
    fn test_superimpose_identity_and_order() {
        let a = v("locale=en;stage=draft");
        let b = v("stage=live");
        assert_eq!(a.superimpose(&a), a);
        assert_eq!(a.superimpose(&ItemVersion::empty()), a);
        assert_ne!(a.superimpose(&b), b.superimpose(&a));
    }

    #[test]
    fn test_contained_by() {
        let ver = v("locale=en;stage=draft");
        assert!(ver.contained_by(&v("locale=en;stage=draft;variant=a")));
        assert!(ver.contained_by(&v("locale=*;stage=draft")));
        assert!(!ver.contained_by(&v("locale=fr;stage=draft")));
        assert!(!ver.contained_by(&v("locale=en")));
        assert!(ItemVersion::empty().contained_by(&ver));
    }

    #[test]
    fn test_overlaps() {
        assert!(v("locale=en;stage=*").overlaps(&v("stage=draft;variant=a")));
        assert!(!v("locale=en").overlaps(&v("locale=fr")));
    }

    #[test]
    fn test_with_returns_new_instance() {
        let base = v("locale=en");
        let changed = base.with("Stage", Some("live"));
        assert_eq!(base, v("locale=en"));
        assert_eq!(changed.value("stage"), Some("live"));
        assert_eq!(changed.without("locale"), v("stage=live"));
        assert_eq!(base.with("locale", None).get("locale"), Some(None));
    }

    #[test]
    fn test_reserved_characters_round_trip() {
        let ver = ItemVersion::empty()
            .with("locale", Some("en us"))
            .with("tag", Some("a;b=c"))
            .with("odd name", Some("50%"));
        let text = ver.to_string();
        assert_eq!(text, "locale=en%20us;odd%20name=50%25;tag=a%3Bb%3Dc");
        assert!(!text.contains(' '));
        assert_eq!(v(&text), ver);
    }

    #[test]
    fn test_parse_bad_encoding() {
        assert!(matches!(
            "locale=%FF".parse::<ItemVersion>(),
            Err(VersionParseError::Encoding(_))
        ));
    }

    #[test]
    fn test_serde() {
        let ver = v("locale=*;stage=draft");
        let json = serde_json::to_string(&ver).unwrap();
        assert_eq!(json, r#"{"locale":null,"stage":"draft"}"#);
        let back: ItemVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ver);
    }
}
