//! `urls` command: address -> URLs.

use anyhow::{Context, Result, bail};
use serde::Serialize;

use contentmap::address::Address;
use contentmap::config::Compiled;
use contentmap::identity::VersionedAddress;
use contentmap::route::RouteCandidate;
use contentmap::version::ItemVersion;

use super::args::UrlsArgs;

#[derive(Debug, Serialize)]
struct UrlsReport<'a> {
    address: &'a Address,
    /// `<path> <version>` form
    versioned: String,
    canonical: Option<String>,
    urls: Vec<UrlEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct UrlEntry<'a> {
    url: String,
    template: &'a str,
    #[serde(flatten)]
    candidate: &'a RouteCandidate,
}

/// Execute urls command
pub fn run_urls(args: &UrlsArgs, compiled: &Compiled) -> Result<()> {
    let map = &compiled.map;
    let schema = map
        .types()
        .schema(&args.type_name)
        .with_context(|| format!("cannot build `{}` address", args.type_name))?;
    let address = Address::from_values(schema, args.keys.iter().map(|(k, v)| (k, v)))?;

    let version = match &args.at {
        Some(at) => match ItemVersion::parse(at) {
            Some(v) => Some(v),
            None => bail!("invalid version `{at}`, expected `name=value;...`"),
        },
        None => None,
    };
    let versioned = VersionedAddress::new(address.clone(), version, &compiled.versions);

    let candidates = map.route_data(&address, args.handler.as_deref());
    let urls: Vec<UrlEntry> = candidates
        .iter()
        .map(|candidate| UrlEntry {
            url: candidate.path.to_encoded(),
            template: map
                .routes()
                .get(candidate.route)
                .map_or("", |entry| entry.template.as_str()),
            candidate,
        })
        .collect();

    let report = UrlsReport {
        address: &address,
        versioned: versioned.to_string(),
        canonical: urls.first().map(|u| u.url.clone()),
        urls,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.urls.is_empty() {
        bail!("no url for {} `{}`", address.type_name(), versioned);
    }
    for (i, entry) in report.urls.iter().enumerate() {
        println!("{}", text_line(i == 0, entry));
    }
    Ok(())
}

/// One text-mode row; the canonical url is starred.
fn text_line(canonical: bool, entry: &UrlEntry) -> String {
    let marker = if canonical { "*" } else { " " };
    format!("{marker} {:<40} {}", entry.url, entry.template)
}
