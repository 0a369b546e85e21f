//! Route templates and the permutation engine.
//!
//! ```text
//!                   forward (expand)
//!   Address  ─────────────────────────▶  candidate URLs
//!      ▲                                      │
//!      └──────── reverse (resolve) ◀── match_path
//! ```
//!
//! # Module Structure
//!
//! - [`template`]: Template syntax, variable kinds, compiled matcher
//! - [`registry`]: Registration-ordered route table
//! - [`forward`]: Address to URL permutations
//! - [`reverse`]: Route values back to an Address

pub mod forward;
mod registry;
pub mod reverse;
mod template;

pub use forward::{ForwardRequest, Rejection, RouteCandidate, RouteValues};
pub use registry::{DEFAULT_HANDLER_KEY, RouteEntry, RouteRegistry, RouteRegistryBuilder};
pub use template::{RouteTemplate, RouteVariable, Segment, TemplateError, Token, VarKind};
