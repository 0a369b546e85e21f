//! Forward pass: Address -> candidate URLs for one template.
//!
//! Each variable contributes a list of bindings; the candidate set is their
//! cartesian product. Rendering then drops trailing omitted segments and
//! discards candidates that would omit a segment in the middle of the path.
//!
//! ```text
//! template  a/{x=1}/{y=2}      address {x: 1, y: 2}
//!
//! x: [1, omit]   y: [2, omit]
//!   a/1/2   a/1   (a/omit/2 discarded)   a
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use super::registry::RouteEntry;
use super::template::{RouteTemplate, RouteVariable, Token, VarKind};
use crate::address::Address;
use crate::core::RoutePath;

/// Route variable values (lower-cased keys).
pub type RouteValues = BTreeMap<String, String>;

/// One URL a template can produce for an address, with its route data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCandidate {
    /// Index of the producing route in the registry
    pub route: usize,
    pub path: RoutePath,
    /// Every bound variable, omitted ones at their default
    pub values: RouteValues,
    /// False when the path still carries `{key}` wildcards
    pub concrete: bool,
}

/// Why a template produced no URLs for an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("handler `{0}` is not a legal handler")]
    IllegalHandler(String),

    #[error("template pins handler `{fixed}`, requested `{requested}`")]
    HandlerMismatch { fixed: String, requested: String },

    #[error("no legal handler value for the handler slot")]
    NoLegalHandlers,

    #[error("template pins `{key}` to `{fixed}`, address has `{actual}`")]
    FixedMismatch {
        key: String,
        fixed: String,
        actual: String,
    },

    #[error("address keys not carried by template: {}", .0.join(", "))]
    Unmatched(Vec<String>),
}

/// A single choice for one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    /// Substitute this value.
    Value(String),
    /// Drop the segment (implies the default).
    Omit,
    /// Unconstrained: the URL stands for a family.
    Wildcard,
    /// Fixed variable, satisfied; not part of the path.
    Pinned,
}

/// What the caller asks of the forward pass.
#[derive(Debug, Clone, Copy)]
pub struct ForwardRequest<'a> {
    pub handler_key: &'a str,
    pub legal_handlers: &'a BTreeSet<String>,
    /// Handler the URL must select (`None`: any legal handler)
    pub handler: Option<&'a str>,
}

/// Expand one registered route into its candidate URLs for `address`.
///
/// The address is cloned: matched flags never leak between templates.
pub fn expand(
    route: usize,
    entry: &RouteEntry,
    address: &Address,
    request: ForwardRequest<'_>,
) -> Result<Vec<RouteCandidate>, Rejection> {
    let template = &entry.template;
    let mut address = address.clone();
    address.reset_matched();

    let has_slot = template.variable(request.handler_key).is_some();
    if !has_slot
        && let Some(h) = request.handler
        && !request.legal_handlers.is_empty()
        && !request.legal_handlers.contains(&h.to_lowercase())
    {
        return Err(Rejection::IllegalHandler(h.to_string()));
    }

    let mut options: Vec<Vec<Binding>> = Vec::with_capacity(template.variables().len());
    for (index, var) in template.variables().iter().enumerate() {
        let bindings = if var.key == request.handler_key {
            handler_bindings(template, index, var, request)?
        } else {
            key_bindings(template, index, var, &mut address)?
        };
        options.push(bindings);
    }

    if !address.is_fully_matched() {
        return Err(Rejection::Unmatched(
            address.unmatched_keys().map(str::to_string).collect(),
        ));
    }

    let candidates = combinations(&options)
        .into_iter()
        .filter_map(|combo| render(route, template, &options, &combo))
        .collect();
    Ok(candidates)
}

/// Bindings for the handler slot.
fn handler_bindings(
    template: &RouteTemplate,
    index: usize,
    var: &RouteVariable,
    request: ForwardRequest<'_>,
) -> Result<Vec<Binding>, Rejection> {
    let legal = request.legal_handlers;
    let is_legal = |h: &str| legal.contains(&h.to_lowercase());

    match &var.kind {
        VarKind::Fixed(fixed) => {
            if !is_legal(fixed) {
                return Err(Rejection::IllegalHandler(fixed.clone()));
            }
            if let Some(h) = request.handler
                && !h.eq_ignore_ascii_case(fixed)
            {
                return Err(Rejection::HandlerMismatch {
                    fixed: fixed.clone(),
                    requested: h.to_string(),
                });
            }
            Ok(vec![Binding::Pinned])
        }
        VarKind::Optional(default) => {
            let omittable = template.is_omittable(index);
            let bindings = match request.handler {
                Some(h) => {
                    if !is_legal(h) {
                        return Err(Rejection::IllegalHandler(h.to_string()));
                    }
                    let mut b = vec![Binding::Value(h.to_lowercase())];
                    if omittable && h.eq_ignore_ascii_case(default) {
                        b.push(Binding::Omit);
                    }
                    b
                }
                None => {
                    let mut b: Vec<Binding> = legal.iter().cloned().map(Binding::Value).collect();
                    if omittable && is_legal(default) {
                        b.push(Binding::Omit);
                    }
                    b
                }
            };
            if bindings.is_empty() {
                return Err(Rejection::NoLegalHandlers);
            }
            Ok(bindings)
        }
        VarKind::Free => match request.handler {
            Some(h) if is_legal(h) => Ok(vec![Binding::Value(h.to_lowercase())]),
            Some(h) => Err(Rejection::IllegalHandler(h.to_string())),
            None if legal.is_empty() => Err(Rejection::NoLegalHandlers),
            None => Ok(legal.iter().cloned().map(Binding::Value).collect()),
        },
    }
}

/// Bindings for an ordinary (address-key) variable; marks matched keys.
fn key_bindings(
    template: &RouteTemplate,
    index: usize,
    var: &RouteVariable,
    address: &mut Address,
) -> Result<Vec<Binding>, Rejection> {
    let value = address.get(&var.key).cloned();
    if value.is_some() {
        address.set_matched(&var.key);
    }

    match (&var.kind, value) {
        (VarKind::Free, Some(v)) => Ok(vec![Binding::Value(v.to_route_value())]),
        (VarKind::Free, None) => Ok(vec![Binding::Wildcard]),
        (VarKind::Optional(default), value) => {
            let differs = value.as_ref().is_some_and(|v| !v.matches_route_value(default));
            let shown = value.map_or_else(|| default.clone(), |v| v.to_route_value());
            if differs || !template.is_omittable(index) {
                Ok(vec![Binding::Value(shown)])
            } else {
                Ok(vec![Binding::Value(shown), Binding::Omit])
            }
        }
        (VarKind::Fixed(fixed), Some(v)) if !v.matches_route_value(fixed) => {
            Err(Rejection::FixedMismatch {
                key: var.key.clone(),
                fixed: fixed.clone(),
                actual: v.to_route_value(),
            })
        }
        (VarKind::Fixed(_), _) => Ok(vec![Binding::Pinned]),
    }
}

/// Cartesian product of option indices.
fn combinations(options: &[Vec<Binding>]) -> Vec<Vec<usize>> {
    options.iter().fold(vec![Vec::new()], |acc, opts| {
        acc.into_iter()
            .flat_map(|prefix| {
                (0..opts.len()).map(move |j| {
                    let mut next = prefix.clone();
                    next.push(j);
                    next
                })
            })
            .collect()
    })
}

/// Render one combination; `None` if an omitted segment is embedded.
fn render(
    route: usize,
    template: &RouteTemplate,
    options: &[Vec<Binding>],
    combo: &[usize],
) -> Option<RouteCandidate> {
    let binding = |v: usize| &options[v][combo[v]];
    let variables = template.variables();
    let mut concrete = true;

    let mut segments: Vec<Option<String>> = Vec::with_capacity(template.segments().len());
    for segment in template.segments() {
        if let Some(v) = segment.sole_variable()
            && *binding(v) == Binding::Omit
        {
            segments.push(None);
            continue;
        }
        let mut text = String::new();
        for token in &segment.tokens {
            match token {
                Token::Literal(lit) => text.push_str(lit),
                Token::Var(v) => match binding(*v) {
                    Binding::Value(s) => text.push_str(s),
                    Binding::Wildcard => {
                        concrete = false;
                        text.push('{');
                        text.push_str(&variables[*v].key);
                        text.push('}');
                    }
                    Binding::Omit | Binding::Pinned => {
                        text.push_str(variables[*v].default_value().unwrap_or_default())
                    }
                },
            }
        }
        segments.push(Some(text));
    }

    // Cascade: strip omitted segments off the end
    while matches!(segments.last(), Some(None)) {
        segments.pop();
    }
    if segments.iter().any(Option::is_none) {
        return None;
    }

    let values = variables
        .iter()
        .enumerate()
        .filter_map(|(i, var)| {
            let value = match binding(i) {
                Binding::Value(s) => s.clone(),
                Binding::Omit | Binding::Pinned => var.default_value()?.to_string(),
                Binding::Wildcard => return None,
            };
            Some((var.key.clone(), value))
        })
        .collect();

    Some(RouteCandidate {
        route,
        path: RoutePath::from_segments(segments.iter().flatten().map(String::as_str)),
        values,
        concrete,
    })
}
