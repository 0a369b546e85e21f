//! Addresses - the natural-key identity of content items.
//!
//! An [`Address`] is what a route variable set resolves to, and what the
//! forward pass renders into URLs:
//!
//! ```text
//! Content Item                         Address (type Post)
//! ============                        ===================
//! Post { category: "news",     ->     category = news
//!        slug: "hello", .. }          slug     = hello      path: news/hello
//! ```
//!
//! # Module Structure
//!
//! - [`schema`]: Declared natural keys ([`AddressSchema`], [`KeyFormat`])
//! - [`item`]: The [`Address`] value and its matching-pass flags
//! - [`types`]: [`TypeRegistry`] (schemas, supertypes, legal handlers)

mod item;
mod schema;
mod types;

pub use item::Address;
pub use schema::{AddressSchema, DEFAULT_SEPARATOR, HasAddressSchema, KeyFormat, KeySpec, SchemaError};
pub use types::{ContentType, TypeRegistry, normalize_handlers};
