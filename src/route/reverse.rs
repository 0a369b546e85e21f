//! Reverse pass: route values -> Address.

use std::collections::BTreeSet;

use super::forward::RouteValues;
use super::registry::RouteEntry;
use super::template::{RouteTemplate, VarKind, group_name};
use crate::address::{Address, AddressSchema};
use crate::core::RoutePath;
use crate::debug;

/// Match a normalized path against a template.
///
/// Omitted optional segments come back at their defaults, and fixed
/// variables at their pinned values.
pub fn match_path(template: &RouteTemplate, path: &RoutePath) -> Option<RouteValues> {
    let caps = template.pattern().captures(path.as_str())?;
    let mut values = RouteValues::new();
    for (index, var) in template.variables().iter().enumerate() {
        let captured = var
            .segment
            .and_then(|_| caps.name(&group_name(index)))
            .map(|m| m.as_str());
        if let Some(value) = captured.or(var.default_value()) {
            values.insert(var.key.clone(), value.to_string());
        }
    }
    Some(values)
}

/// Rebuild the address of `schema`'s type from a route variable set.
///
/// Every key of the returned address is flagged as matched by the template
/// variable that supplied it.
///
/// Returns `None` when the values cannot produce a fully matched address:
/// a pinned value is contradicted, the handler is not legal, a key is
/// missing, or a value does not convert to its key's format.
pub fn resolve(
    entry: &RouteEntry,
    schema: &AddressSchema,
    values: &RouteValues,
    handler_key: &str,
    legal_handlers: &BTreeSet<String>,
) -> Option<Address> {
    let template = &entry.template;
    let lookup = |key: &str| {
        values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    };

    if let Some(var) = template.variable(handler_key) {
        let handler = match &var.kind {
            VarKind::Fixed(fixed) => {
                if lookup(handler_key).is_some_and(|raw| !raw.eq_ignore_ascii_case(fixed)) {
                    return None;
                }
                fixed.as_str()
            }
            VarKind::Optional(default) => lookup(handler_key).unwrap_or(default),
            VarKind::Free => lookup(handler_key)?,
        };
        if !legal_handlers.contains(&handler.to_lowercase()) {
            debug!("route"; "{}: handler `{}` not legal", template, handler);
            return None;
        }
    }

    // Pinned values outside the schema must not be contradicted either
    for var in template.variables() {
        if let VarKind::Fixed(fixed) = &var.kind
            && !schema.has_key(&var.key)
            && lookup(&var.key).is_some_and(|raw| !raw.eq_ignore_ascii_case(fixed))
        {
            return None;
        }
    }

    let mut typed = Vec::with_capacity(schema.keys.len());
    let mut consumed = Vec::with_capacity(schema.keys.len());
    for spec in &schema.keys {
        let Some(var) = template.variable(&spec.name) else {
            debug!("route"; "{}: no variable for key `{}`", template, spec.name);
            return None;
        };
        let raw = match &var.kind {
            VarKind::Free => lookup(&spec.name)?,
            VarKind::Optional(default) => lookup(&spec.name).unwrap_or(default),
            VarKind::Fixed(fixed) => {
                if lookup(&spec.name).is_some_and(|raw| !raw.eq_ignore_ascii_case(fixed)) {
                    return None;
                }
                fixed.as_str()
            }
        };
        consumed.push(var.key.as_str());
        match spec.format.parse(&spec.name, raw) {
            Ok(value) => typed.push((spec.name.clone(), value)),
            Err(e) => {
                debug!("route"; "{}: {}", template, e);
                return None;
            }
        }
    }

    let mut address = Address::from_key_values(schema, typed).ok()?;
    for key in consumed {
        address.set_matched(key);
    }
    Some(address)
}
