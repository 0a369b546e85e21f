//! `resolve` command: URL -> addresses.

use anyhow::{Result, bail};
use serde::Serialize;

use contentmap::config::Compiled;
use contentmap::core::RoutePath;
use contentmap::map::Resolved;

use super::args::ResolveArgs;

#[derive(Debug, Serialize)]
struct Resolution<'a> {
    template: &'a str,
    #[serde(rename = "type")]
    type_name: &'a str,
    #[serde(flatten)]
    resolved: &'a Resolved,
}

/// Execute resolve command
pub fn run_resolve(args: &ResolveArgs, compiled: &Compiled) -> Result<()> {
    let map = &compiled.map;
    let path = RoutePath::from_browser(&args.path);

    let found: Vec<Resolved> = if args.all {
        map.resolve_all(&path).collect()
    } else {
        map.resolve_url(&path).into_iter().collect()
    };

    let resolutions: Vec<Resolution> = found
        .iter()
        .map(|resolved| Resolution {
            template: map
                .routes()
                .get(resolved.route)
                .map_or("", |entry| entry.template.as_str()),
            type_name: resolved.address.type_name().as_str(),
            resolved,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolutions)?);
        return Ok(());
    }

    if resolutions.is_empty() {
        bail!("no route resolves `{}`", path.to_encoded());
    }
    for r in &resolutions {
        let handler = r
            .resolved
            .handler
            .as_deref()
            .map(|h| format!(" [{h}]"))
            .unwrap_or_default();
        println!("{} {}{}  ({})", r.type_name, r.resolved.address, handler, r.template);
    }
    Ok(())
}
