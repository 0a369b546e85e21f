//! Existing-content lookup used by the collision check.

use std::collections::HashSet;
use std::hash::BuildHasher;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::address::{Address, HasAddressSchema, SchemaError};

/// Answers "does an item exist at this address?".
///
/// The persistence layer implements this; the map never stores content.
pub trait ContentSource {
    fn contains(&self, address: &Address) -> bool;
}

impl<S: BuildHasher> ContentSource for HashSet<Address, S> {
    fn contains(&self, address: &Address) -> bool {
        HashSet::contains(self, address)
    }
}

impl ContentSource for [Address] {
    fn contains(&self, address: &Address) -> bool {
        self.iter().any(|a| a == address)
    }
}

/// In-memory set of existing addresses.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    addresses: FxHashSet<Address>,
}

impl ContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the address was already present.
    pub fn insert(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    /// Index a content object by its declared natural keys.
    pub fn insert_item<T: HasAddressSchema + Serialize>(&mut self, item: &T) -> Result<bool, SchemaError> {
        Ok(self.insert(Address::of(item)?))
    }

    pub fn remove(&mut self, address: &Address) -> bool {
        self.addresses.remove(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

impl ContentSource for ContentIndex {
    fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }
}

impl FromIterator<Address> for ContentIndex {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().collect(),
        }
    }
}

impl Extend<Address> for ContentIndex {
    fn extend<I: IntoIterator<Item = Address>>(&mut self, iter: I) {
        self.addresses.extend(iter);
    }
}
