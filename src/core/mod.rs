//! Core types - pure abstractions shared across the codebase.

mod url;
mod value;

pub use url::RoutePath;
pub use value::{KeyValue, TypeName};
