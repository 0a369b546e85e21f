use thiserror::Error;

use crate::address::{Address, SchemaError};
use crate::core::RoutePath;
use crate::route::TemplateError;

/// Errors surfaced by [`ContentMap`](super::ContentMap) operations.
///
/// Absence of a URL or of a resolved address is not an error; those come
/// back as `None` or an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The target address is already taken.
    #[error("an item already exists at `/{url}` ({} {existing})", .existing.type_name())]
    Collision { url: RoutePath, existing: Address },
}
