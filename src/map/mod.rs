//! Content map - the orchestrator over types and routes.
//!
//! A [`ContentMap`] is built once from a [`TypeRegistry`] and a frozen
//! [`RouteRegistry`] and is read-only afterwards. Every operation works on
//! its own copy of the address, so one map can serve many threads.
//!
//! ```text
//! canonical_url(address)         shortest forward candidate
//! all_urls(address)              every candidate, shortest first
//! resolve_address(type, values)  first template that fully matches
//! resolve_url(path)              path -> (route, address)
//! is_occupied(address, source)   collision check against existing content
//! ```

pub mod conflict;
mod error;
mod source;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::address::{Address, SchemaError, TypeRegistry};
use crate::core::RoutePath;
use crate::debug;
use crate::route::{ForwardRequest, RouteCandidate, RouteRegistry, RouteValues, forward, reverse};

pub use error::MapError;
pub use source::{ContentIndex, ContentSource};

/// Placeholder substituted for wildcard slots during the collision probe.
const PROBE_SENTINEL: &str = "_";

/// A URL resolved back to content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    /// Index of the matching route in the registry
    pub route: usize,
    pub address: Address,
    /// Handler selected by the URL, if the route has a handler slot
    pub handler: Option<String>,
    pub values: RouteValues,
}

/// Bidirectional content identity <-> URL mapping.
#[derive(Debug, Clone)]
pub struct ContentMap {
    types: TypeRegistry,
    routes: RouteRegistry,
}

impl ContentMap {
    pub fn new(types: TypeRegistry, routes: RouteRegistry) -> Self {
        Self { types, routes }
    }

    #[inline]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    #[inline]
    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    // ========================================================================
    // forward
    // ========================================================================

    /// Forward pass over every template serving the address's type.
    ///
    /// Candidates are deduplicated by path and sorted by segment count;
    /// ties keep registration order.
    pub fn route_data(&self, address: &Address, handler: Option<&str>) -> Vec<RouteCandidate> {
        let type_name = address.type_name().as_str();
        let mut seen = FxHashSet::default();
        let mut candidates = Vec::new();

        for (index, entry) in self.routes.routes_for(&self.types, type_name) {
            let legal = entry.legal_handlers(&self.types, type_name);
            let request = ForwardRequest {
                handler_key: self.routes.handler_key(),
                legal_handlers: &legal,
                handler,
            };
            match forward::expand(index, entry, address, request) {
                Ok(found) => {
                    for candidate in found {
                        if seen.insert(candidate.path.clone()) {
                            candidates.push(candidate);
                        }
                    }
                }
                Err(reason) => {
                    debug!("route"; "`{}` skips {} {}: {}", entry.template, type_name, address, reason)
                }
            }
        }

        candidates.sort_by_key(|c| c.path.segment_count());
        candidates
    }

    /// Every URL of the address, shortest first.
    pub fn all_urls(&self, address: &Address) -> Vec<RoutePath> {
        Self::paths(self.route_data(address, None))
    }

    /// Every URL selecting `handler`, shortest first.
    pub fn urls_for_handler(&self, address: &Address, handler: &str) -> Vec<RoutePath> {
        Self::paths(self.route_data(address, Some(handler)))
    }

    /// The shortest URL, or `None` when no template serves the address.
    pub fn canonical_url(&self, address: &Address) -> Option<RoutePath> {
        self.route_data(address, None).into_iter().next().map(|c| c.path)
    }

    fn paths(candidates: Vec<RouteCandidate>) -> Vec<RoutePath> {
        candidates.into_iter().map(|c| c.path).collect()
    }

    // ========================================================================
    // reverse
    // ========================================================================

    /// Reverse pass for `type_name`: the first template, in registration
    /// order, that yields a fully matched address wins.
    pub fn resolve_address(
        &self,
        type_name: &str,
        values: &RouteValues,
    ) -> Result<Option<Address>, SchemaError> {
        let schema = self.types.schema(type_name)?;
        Ok(self
            .routes
            .routes_for(&self.types, type_name)
            .find_map(|(_, entry)| {
                let legal = entry.legal_handlers(&self.types, type_name);
                reverse::resolve(entry, schema, values, self.routes.handler_key(), &legal)
            }))
    }

    /// Resolve a URL path to the first route (and its declared type) that
    /// matches and fully resolves.
    pub fn resolve_url(&self, path: &RoutePath) -> Option<Resolved> {
        self.resolve_all(path).next()
    }

    /// Every `(route, type)` resolution of `path`, in registration order.
    ///
    /// Each route is tried for its declared type and then every registered
    /// subtype of it.
    pub fn resolve_all<'a>(&'a self, path: &'a RoutePath) -> impl Iterator<Item = Resolved> + 'a {
        self.routes
            .entries()
            .iter()
            .enumerate()
            .filter_map(move |(index, entry)| {
                reverse::match_path(&entry.template, path).map(|values| (index, entry, values))
            })
            .flat_map(move |(index, entry, values)| {
                self.types
                    .iter()
                    .filter(move |t| self.types.is_assignable(entry.type_name.as_str(), t.name().as_str()))
                    .filter_map(move |content_type| {
                        let type_name = content_type.name().as_str();
                        let legal = entry.legal_handlers(&self.types, type_name);
                        let handler_key = self.routes.handler_key();
                        let address =
                            reverse::resolve(entry, &content_type.schema, &values, handler_key, &legal)?;
                        Some(Resolved {
                            route: index,
                            address,
                            handler: values.get(handler_key).map(|h| h.to_lowercase()),
                            values: values.clone(),
                        })
                    })
            })
    }

    // ========================================================================
    // collisions
    // ========================================================================

    /// The existing item sitting on `address`'s canonical URL, if any.
    ///
    /// Wildcard slots of the canonical URL are probed with a placeholder
    /// value; every template match of the probe is checked against
    /// `source`, not just the first.
    pub fn occupant<S>(&self, address: &Address, source: &S) -> Option<(RoutePath, Address)>
    where
        S: ContentSource + ?Sized,
    {
        let url = self.canonical_url(address)?;
        let probe = probe_path(&url);
        self.resolve_all(&probe)
            .find(|resolved| source.contains(&resolved.address))
            .map(|resolved| (url, resolved.address))
    }

    /// True iff another (or the same) item already lives at the address.
    pub fn is_occupied<S>(&self, address: &Address, source: &S) -> bool
    where
        S: ContentSource + ?Sized,
    {
        self.occupant(address, source).is_some()
    }

    /// `Err(MapError::Collision)` when the address is occupied.
    pub fn check_available<S>(&self, address: &Address, source: &S) -> Result<(), MapError>
    where
        S: ContentSource + ?Sized,
    {
        match self.occupant(address, source) {
            Some((url, existing)) => Err(MapError::Collision { url, existing }),
            None => Ok(()),
        }
    }
}

/// Replace every `{key}` wildcard with [`PROBE_SENTINEL`].
fn probe_path(path: &RoutePath) -> RoutePath {
    let mut out = String::with_capacity(path.as_str().len());
    let mut in_wildcard = false;
    for c in path.as_str().chars() {
        match (c, in_wildcard) {
            ('{', false) => {
                in_wildcard = true;
                out.push_str(PROBE_SENTINEL);
            }
            ('}', true) => in_wildcard = false,
            (_, true) => {}
            (c, false) => out.push(c),
        }
    }
    // already decoded; `?` and `#` are part of the values here
    RoutePath::from_segments(out.split('/'))
}
