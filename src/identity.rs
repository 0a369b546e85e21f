//! Composite identities: item ids and versioned forms.
//!
//! String forms:
//!
//! ```text
//! ItemId            <key>:<type>                      42:Post
//! ItemVersionedId   <key>:<type> <version>            42:Post locale=en;stage=draft
//! VersionedAddress  <address-path> <version>          news/hello locale=en
//! ```
//!
//! Parsing never fails loudly: malformed input yields `None`.

use std::fmt;

use serde::Serialize;

use crate::address::{Address, AddressSchema, KeyFormat, TypeRegistry};
use crate::core::{KeyValue, TypeName};
use crate::version::{ItemVersion, VersionContext};

/// Identity of a content item: type plus natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ItemId {
    pub type_name: TypeName,
    pub key: KeyValue,
}

impl ItemId {
    pub fn new(type_name: TypeName, key: impl Into<KeyValue>) -> Self {
        Self {
            type_name,
            key: key.into(),
        }
    }

    /// Parse `<key>:<type>`, reading the key in the type's declared id format.
    pub fn parse(s: &str, types: &TypeRegistry) -> Option<Self> {
        let (_, type_part) = s.rsplit_once(':')?;
        let format = types.get(type_part)?.id_format;
        Self::parse_with(s, format)
    }

    /// Parse `<key>:<type>` with an explicit key format.
    pub fn parse_with(s: &str, format: KeyFormat) -> Option<Self> {
        let (key, type_part) = s.rsplit_once(':')?;
        let type_name = TypeName::new(type_part)?;
        let key = format.parse("id", key).ok()?;
        Some(Self { type_name, key })
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.type_name)
    }
}

/// An item id pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ItemVersionedId {
    pub id: ItemId,
    pub version: ItemVersion,
}

impl ItemVersionedId {
    /// Pin `id` to `version`, or to the context's current version when `None`.
    pub fn new(id: ItemId, version: Option<ItemVersion>, ctx: &VersionContext) -> Self {
        Self {
            id,
            version: ctx.resolve(version),
        }
    }

    pub fn from_parts(id: ItemId, version: ItemVersion) -> Self {
        Self { id, version }
    }

    pub fn parse(s: &str, types: &TypeRegistry) -> Option<Self> {
        let (id, version) = s.rsplit_once(' ')?;
        Some(Self {
            id: ItemId::parse(id, types)?,
            version: ItemVersion::parse(version)?,
        })
    }

    /// Same item, other version coordinates laid over this one's.
    pub fn superimpose(&self, overlay: &ItemVersion) -> Self {
        Self {
            id: self.id.clone(),
            version: self.version.superimpose(overlay),
        }
    }
}

impl fmt::Display for ItemVersionedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// An address pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VersionedAddress {
    pub address: Address,
    pub version: ItemVersion,
}

impl VersionedAddress {
    pub fn new(address: Address, version: Option<ItemVersion>, ctx: &VersionContext) -> Self {
        Self {
            address,
            version: ctx.resolve(version),
        }
    }

    pub fn from_parts(address: Address, version: ItemVersion) -> Self {
        Self { address, version }
    }

    pub fn parse(schema: &AddressSchema, s: &str) -> Option<Self> {
        let (path, version) = s.rsplit_once(' ')?;
        Some(Self {
            address: Address::parse(schema, path)?,
            version: ItemVersion::parse(version)?,
        })
    }

    /// Parse against the schema of a registered type.
    pub fn parse_for(type_name: &str, s: &str, types: &TypeRegistry) -> Option<Self> {
        Self::parse(types.schema(type_name).ok()?, s)
    }
}

impl fmt::Display for VersionedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address.as_path(), self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ContentType;
    use rustc_hash::FxHashSet;

    fn types() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register(
            ContentType::new(
                AddressSchema::new(TypeName::new("blog.Post").unwrap())
                    .key("category", KeyFormat::Text)
                    .key("slug", KeyFormat::Text),
            )
            .id_format(KeyFormat::Uuid),
        );
        reg.register(
            ContentType::new(AddressSchema::new(TypeName::new("Tag").unwrap()))
                .id_format(KeyFormat::Int),
        );
        reg
    }

    const GUID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    #[test]
    fn test_item_id_round_trip() {
        let reg = types();
        let id = ItemId::parse(&format!("{GUID}:blog.Post"), &reg).unwrap();
        assert!(matches!(id.key, KeyValue::Uuid(_)));
        assert_eq!(id.to_string(), format!("{GUID}:blog.Post"));
        assert_eq!(ItemId::parse(&id.to_string(), &reg), Some(id));

        let tag = ItemId::new(TypeName::new("Tag").unwrap(), 7i64);
        assert_eq!(ItemId::parse(&tag.to_string(), &reg), Some(tag));
    }

    #[test]
    fn test_item_id_guid_parsed_twice_is_equal() {
        let reg = types();
        let upper = ItemId::parse(&format!("{}:blog.Post", GUID.to_uppercase()), &reg).unwrap();
        let lower = ItemId::parse(&format!("{GUID}:blog.Post"), &reg).unwrap();
        assert_eq!(upper, lower);

        let mut set = FxHashSet::default();
        set.insert(upper);
        assert!(set.contains(&lower));
    }

    #[test]
    fn test_item_id_malformed() {
        let reg = types();
        assert_eq!(ItemId::parse("no-colon", &reg), None);
        assert_eq!(ItemId::parse("x:Unknown", &reg), None);
        assert_eq!(ItemId::parse("not-a-guid:blog.Post", &reg), None);
        assert_eq!(ItemId::parse_with("abc:", KeyFormat::Text), None);
    }

    #[test]
    fn test_versioned_id_defaults_from_context() {
        let ctx = VersionContext::new("locale=en".parse().unwrap());
        let id = ItemId::new(TypeName::new("Tag").unwrap(), 7i64);
        let vid = ItemVersionedId::new(id.clone(), None, &ctx);
        assert_eq!(vid.version, *ctx.current());

        let explicit = ItemVersionedId::new(id, Some("locale=fr".parse().unwrap()), &ctx);
        assert_eq!(explicit.version.value("locale"), Some("fr"));
    }

    #[test]
    fn test_versioned_id_round_trip() {
        let reg = types();
        let vid = ItemVersionedId::from_parts(
            ItemId::new(TypeName::new("Tag").unwrap(), 7i64),
            "locale=en;stage=draft".parse().unwrap(),
        );
        assert_eq!(vid.to_string(), "7:Tag locale=en;stage=draft");
        assert_eq!(ItemVersionedId::parse(&vid.to_string(), &reg), Some(vid));
        assert_eq!(ItemVersionedId::parse("7:Tag", &reg), None);
    }

    #[test]
    fn test_versioned_address_round_trip() {
        let reg = types();
        let schema = reg.schema("blog.Post").unwrap();
        let address = Address::from_values(schema, [("category", "news"), ("slug", "hello")]).unwrap();
        let va = VersionedAddress::from_parts(address, "stage=live".parse().unwrap());
        assert_eq!(va.to_string(), "news/hello stage=live");
        assert_eq!(VersionedAddress::parse(schema, &va.to_string()), Some(va.clone()));
        assert_eq!(
            VersionedAddress::parse_for("blog.Post", &va.to_string(), &reg),
            Some(va)
        );
    }

    #[test]
    fn test_versioned_forms_with_reserved_version_values() {
        let reg = types();
        let version = ItemVersion::empty()
            .with("locale", Some("en us"))
            .with("stage", Some("a;b=c"));

        let schema = reg.schema("blog.Post").unwrap();
        let address = Address::from_values(schema, [("category", "news"), ("slug", "hello")]).unwrap();
        let va = VersionedAddress::from_parts(address, version.clone());
        assert_eq!(va.to_string(), "news/hello locale=en%20us;stage=a%3Bb%3Dc");
        assert_eq!(VersionedAddress::parse(schema, &va.to_string()), Some(va));

        let vid = ItemVersionedId::from_parts(ItemId::new(TypeName::new("Tag").unwrap(), 7i64), version);
        assert_eq!(ItemVersionedId::parse(&vid.to_string(), &reg), Some(vid));
    }

    #[test]
    fn test_versioned_address_empty_version() {
        let reg = types();
        let schema = reg.schema("blog.Post").unwrap();
        let address = Address::from_values(schema, [("category", "a"), ("slug", "b")]).unwrap();
        let va = VersionedAddress::from_parts(address, ItemVersion::empty());
        assert_eq!(va.to_string(), "a/b ");
        assert_eq!(VersionedAddress::parse(schema, &va.to_string()), Some(va));
    }

    #[test]
    fn test_versioned_address_malformed() {
        let reg = types();
        let schema = reg.schema("blog.Post").unwrap();
        assert_eq!(VersionedAddress::parse(schema, "a/b"), None);
        assert_eq!(VersionedAddress::parse(schema, "a/b locale"), None);
        assert_eq!(VersionedAddress::parse_for("Nope", "a/b x=1", &reg), None);
    }
}
