//! Content type registry.
//!
//! Built once at start-up, read-only afterwards. Replaces runtime type
//! inspection: every content type is declared with its schema, supertype
//! and legal handlers.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::schema::{AddressSchema, KeyFormat, SchemaError};
use crate::core::TypeName;

/// A registered content type.
#[derive(Debug, Clone)]
pub struct ContentType {
    /// Natural-key schema
    pub schema: AddressSchema,
    /// Supertype (routes targeting it also serve this type)
    pub extends: Option<TypeName>,
    /// Legal handler values (lower-cased)
    pub handlers: BTreeSet<String>,
    /// Format of the item id used by `ItemId`
    pub id_format: KeyFormat,
}

impl ContentType {
    pub fn new(schema: AddressSchema) -> Self {
        Self {
            schema,
            extends: None,
            handlers: BTreeSet::new(),
            id_format: KeyFormat::default(),
        }
    }

    pub fn extends(mut self, parent: TypeName) -> Self {
        self.extends = Some(parent);
        self
    }

    pub fn handlers<S: AsRef<str>>(mut self, handlers: impl IntoIterator<Item = S>) -> Self {
        self.handlers = normalize_handlers(handlers);
        self
    }

    pub fn id_format(mut self, format: KeyFormat) -> Self {
        self.id_format = format;
        self
    }

    #[inline]
    pub fn name(&self) -> &TypeName {
        &self.schema.type_name
    }
}

/// Lower-case and deduplicate handler names.
pub fn normalize_handlers<S: AsRef<str>>(handlers: impl IntoIterator<Item = S>) -> BTreeSet<String> {
    handlers
        .into_iter()
        .map(|h| h.as_ref().trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

/// All registered content types, keyed by name.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: FxHashMap<TypeName, ContentType>,
    /// Registration order (for stable listings)
    order: Vec<TypeName>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a content type. Re-registering a name replaces it.
    pub fn register(&mut self, content_type: ContentType) {
        let name = content_type.name().clone();
        if self.types.insert(name.clone(), content_type).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ContentType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn schema(&self, name: &str) -> Result<&AddressSchema, SchemaError> {
        self.get(name)
            .map(|t| &t.schema)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// Registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentType> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Walk from `name` up through its supertypes (`name` first).
    ///
    /// Stops at unknown types and on cycles.
    pub fn ancestry<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let mut seen: Vec<&'a str> = Vec::new();
        let mut next = Some(name);
        std::iter::from_fn(move || {
            let current = next.take()?;
            if seen.contains(&current) {
                return None;
            }
            seen.push(current);
            next = self
                .types
                .get(current)
                .and_then(|t| t.extends.as_ref())
                .map(TypeName::as_str);
            Some(current)
        })
    }

    /// True iff a value of type `from` can be used where `target` is expected.
    pub fn is_assignable(&self, target: &str, from: &str) -> bool {
        self.ancestry(from).any(|t| t == target)
    }

    /// Legal handlers for a type: its own set, else the nearest supertype's.
    pub fn legal_handlers(&self, name: &str) -> BTreeSet<String> {
        self.ancestry(name)
            .filter_map(|t| self.types.get(t))
            .map(|t| &t.handlers)
            .find(|h| !h.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// Supertypes referenced but never registered.
    pub fn dangling_supertypes(&self) -> Vec<(&TypeName, &TypeName)> {
        self.iter()
            .filter_map(|t| t.extends.as_ref().map(|parent| (t.name(), parent)))
            .filter(|(_, parent)| !self.contains(parent.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> ContentType {
        ContentType::new(AddressSchema::new(TypeName::new(name).unwrap()))
    }

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register(ty("Content").handlers(["Index", "edit", ""]));
        reg.register(ty("Post").extends(TypeName::new("Content").unwrap()));
        reg.register(
            ty("Event")
                .extends(TypeName::new("Content").unwrap())
                .handlers(["calendar"]),
        );
        reg
    }

    #[test]
    fn test_assignability() {
        let reg = registry();
        assert!(reg.is_assignable("Content", "Post"));
        assert!(reg.is_assignable("Post", "Post"));
        assert!(!reg.is_assignable("Post", "Content"));
        assert!(!reg.is_assignable("Event", "Post"));
    }

    #[test]
    fn test_legal_handlers_inherit() {
        let reg = registry();
        let post = reg.legal_handlers("Post");
        assert_eq!(post.iter().collect::<Vec<_>>(), ["edit", "index"]);
        let event = reg.legal_handlers("Event");
        assert_eq!(event.iter().collect::<Vec<_>>(), ["calendar"]);
        assert!(reg.legal_handlers("Missing").is_empty());
    }

    #[test]
    fn test_ancestry_stops_on_cycle() {
        let mut reg = TypeRegistry::new();
        reg.register(ty("A").extends(TypeName::new("B").unwrap()));
        reg.register(ty("B").extends(TypeName::new("A").unwrap()));
        assert_eq!(reg.ancestry("A").collect::<Vec<_>>(), ["A", "B"]);
        assert!(!reg.is_assignable("C", "A"));
    }

    #[test]
    fn test_schema_lookup() {
        let reg = registry();
        assert!(reg.schema("Post").is_ok());
        assert_eq!(
            reg.schema("Nope").unwrap_err(),
            SchemaError::UnknownType("Nope".to_string())
        );
    }

    #[test]
    fn test_dangling_supertypes() {
        let mut reg = registry();
        reg.register(ty("Orphan").extends(TypeName::new("Ghost").unwrap()));
        let dangling = reg.dangling_supertypes();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].1, "Ghost");
    }

    #[test]
    fn test_registration_order() {
        let reg = registry();
        let names: Vec<_> = reg.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, ["Content", "Post", "Event"]);
    }
}
