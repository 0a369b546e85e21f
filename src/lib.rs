//! contentmap - bidirectional mapping between content identity and URLs.
//!
//! # Module Structure
//!
//! | Module     | Purpose                                                  |
//! |------------|----------------------------------------------------------|
//! | `core`     | Primitive values: [`core::KeyValue`], [`core::RoutePath`] |
//! | `address`  | Natural-key addresses, schemas, the type registry        |
//! | `version`  | Version vectors and the caller's version context         |
//! | `identity` | Item ids and versioned identities                        |
//! | `route`    | Route templates, forward and reverse passes              |
//! | `map`      | [`map::ContentMap`] orchestrator, collisions, conflicts   |
//! | `config`   | `contentmap.toml` loading and validation                 |
//!
//! # Example
//!
//! ```ignore
//! let compiled = MapConfig::discover(&cwd, Path::new(CONFIG_FILE))?.compile()?;
//! let post = Address::from_values(compiled.map.types().schema("Post")?, [("slug", "hello")])?;
//! let url = compiled.map.canonical_url(&post);
//! ```

pub mod address;
pub mod config;
pub mod core;
pub mod identity;
pub mod logger;
pub mod map;
pub mod route;
pub mod version;
