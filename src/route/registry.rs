//! Route template registry.
//!
//! Registration goes through [`RouteRegistryBuilder`] (single-threaded,
//! `&mut self`). [`RouteRegistryBuilder::build`] freezes it into a
//! [`RouteRegistry`] that is only ever read and can be shared across threads.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::template::{RouteTemplate, TemplateError};
use crate::address::{TypeRegistry, normalize_handlers};
use crate::core::TypeName;

/// Route variable naming the handler slot when none is configured.
pub const DEFAULT_HANDLER_KEY: &str = "action";

/// A registered route: template plus target type.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Declared target type (routes also serve its subtypes)
    pub type_name: TypeName,
    pub template: RouteTemplate,
    /// Legal handler values declared on the route (may be empty)
    pub handlers: BTreeSet<String>,
}

impl RouteEntry {
    /// Legal handlers: the route's own set, else the content type's.
    pub fn legal_handlers(&self, types: &TypeRegistry, address_type: &str) -> BTreeSet<String> {
        if self.handlers.is_empty() {
            types.legal_handlers(address_type)
        } else {
            self.handlers.clone()
        }
    }
}

/// Mutable registration phase.
#[derive(Debug)]
pub struct RouteRegistryBuilder {
    handler_key: String,
    entries: Vec<RouteEntry>,
}

impl Default for RouteRegistryBuilder {
    fn default() -> Self {
        Self {
            handler_key: DEFAULT_HANDLER_KEY.to_string(),
            entries: Vec::new(),
        }
    }
}

impl RouteRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another route variable as the handler slot.
    pub fn handler_key(mut self, key: &str) -> Self {
        self.handler_key = key.trim().to_lowercase();
        self
    }

    /// Register a template for `type_name`.
    ///
    /// Registration order is significant: it breaks ties between equally
    /// short URLs and decides which template wins a reverse lookup.
    pub fn register<K, V, S>(
        &mut self,
        type_name: TypeName,
        template: &str,
        defaults: impl IntoIterator<Item = (K, V)>,
        handlers: impl IntoIterator<Item = S>,
    ) -> Result<&mut Self, TemplateError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        S: AsRef<str>,
    {
        let defaults: FxHashMap<String, String> = defaults
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.as_ref().trim().to_string()))
            .collect();
        let template = RouteTemplate::parse(template, &defaults)?;
        self.entries.push(RouteEntry {
            type_name,
            template,
            handlers: normalize_handlers(handlers),
        });
        Ok(self)
    }

    /// Register a template with no defaults and no declared handlers.
    pub fn route(&mut self, type_name: TypeName, template: &str) -> Result<&mut Self, TemplateError> {
        self.register(
            type_name,
            template,
            std::iter::empty::<(&str, &str)>(),
            std::iter::empty::<&str>(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recently registered route.
    pub fn last(&self) -> Option<&RouteEntry> {
        self.entries.last()
    }

    pub fn build(self) -> RouteRegistry {
        RouteRegistry {
            handler_key: self.handler_key,
            entries: self.entries,
        }
    }
}

/// Frozen, read-only route table.
#[derive(Debug, Clone)]
pub struct RouteRegistry {
    handler_key: String,
    entries: Vec<RouteEntry>,
}

impl RouteRegistry {
    pub fn builder() -> RouteRegistryBuilder {
        RouteRegistryBuilder::new()
    }

    #[inline]
    pub fn handler_key(&self) -> &str {
        &self.handler_key
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&RouteEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Routes whose declared type is assignable from `type_name`, in
    /// registration order, with their indices.
    pub fn routes_for<'a>(
        &'a self,
        types: &'a TypeRegistry,
        type_name: &'a str,
    ) -> impl Iterator<Item = (usize, &'a RouteEntry)> + 'a {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, e)| types.is_assignable(e.type_name.as_str(), type_name))
    }
}
