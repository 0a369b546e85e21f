//! `check` command: config validation, route coverage and URL conflicts.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value as JsonValue;

use contentmap::address::Address;
use contentmap::config::Compiled;
use contentmap::logger::{status_success, status_warning};
use contentmap::map::ContentMap;
use contentmap::map::conflict::{collect_url_claims, detect_conflicts, print_conflicts};
use contentmap::log;

use super::args::CheckArgs;

/// Execute check command
pub fn run_check(args: &CheckArgs, compiled: &Compiled) -> Result<()> {
    let map = &compiled.map;
    compiled.diagnostics.print_warnings();
    print_coverage(map);

    let Some(content) = &args.content else {
        status_success(&format!(
            "{} types, {} routes",
            map.types().len(),
            map.routes().len()
        ));
        return Ok(());
    };

    let addresses = load_content(map, content)?;
    let conflicts = detect_conflicts(&collect_url_claims(map, &addresses));
    if !conflicts.is_empty() {
        print_conflicts(&conflicts);
        bail!("{} conflicting url(s)", conflicts.len());
    }
    status_success(&format!("{} items, no url conflicts", addresses.len()));
    Ok(())
}

/// Routes serving each type, including the ones inherited from supertypes.
fn print_coverage(map: &ContentMap) {
    for content_type in map.types().iter() {
        let name = content_type.name().as_str();
        let templates: Vec<&str> = map
            .routes()
            .routes_for(map.types(), name)
            .map(|(_, entry)| entry.template.as_str())
            .collect();
        if templates.is_empty() {
            status_warning(&format!("{name}: no routes"));
        } else {
            log!("route"; "{}: {}", name, templates.join(", "));
        }
    }
}

/// Read a JSON array of objects tagged with `"type"` into addresses.
fn load_content(map: &ContentMap, path: &Path) -> Result<Vec<Address>> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read `{}`", path.display()))?;
    let items: Vec<JsonValue> =
        serde_json::from_str(&text).with_context(|| format!("`{}` is not a JSON array", path.display()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let type_name = item
                .get("type")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| anyhow!("item {i}: missing string field `type`"))?;
            let schema = map.types().schema(type_name)?;
            Address::from_object(schema, item).with_context(|| format!("item {i}"))
        })
        .collect()
}
