//! Version vectors.
//!
//! | Module    | Purpose                                        |
//! |-----------|------------------------------------------------|
//! | `item`    | [`ItemVersion`] and its mask/superimpose algebra |
//! | `context` | [`VersionContext`], the caller's current version |

mod context;
mod item;

pub use context::VersionContext;
pub use item::{ItemVersion, VersionParseError, WILDCARD};
