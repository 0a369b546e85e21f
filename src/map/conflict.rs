//! URL conflict detection across a content set.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::ContentMap;
use crate::address::Address;
use crate::core::RoutePath;
use crate::log;

/// URL claims: URL -> addresses that render to it.
pub type UrlClaimMap = FxHashMap<RoutePath, Vec<Address>>;

/// A URL conflict: several addresses claim the same URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlConflict {
    /// The conflicting URL
    pub url: RoutePath,
    /// Every address claiming it, in input order
    pub addresses: Vec<Address>,
}

/// Collect every concrete URL each address renders to.
///
/// Forward passes run in parallel; the claim map keeps input order per URL.
pub fn collect_url_claims(map: &ContentMap, addresses: &[Address]) -> UrlClaimMap {
    let rendered: Vec<Vec<RoutePath>> = addresses
        .par_iter()
        .map(|address| {
            map.route_data(address, None)
                .into_iter()
                .filter(|c| c.concrete)
                .map(|c| c.path)
                .collect()
        })
        .collect();

    let mut claims = UrlClaimMap::default();
    for (address, urls) in addresses.iter().zip(rendered) {
        for url in urls {
            let owners = claims.entry(url).or_default();
            if !owners.contains(address) {
                owners.push(address.clone());
            }
        }
    }
    claims
}

/// URLs with more than one claimant, sorted by URL.
pub fn detect_conflicts(claims: &UrlClaimMap) -> Vec<UrlConflict> {
    let mut conflicts: Vec<UrlConflict> = claims
        .iter()
        .filter(|(_, owners)| owners.len() > 1)
        .map(|(url, owners)| UrlConflict {
            url: url.clone(),
            addresses: owners.clone(),
        })
        .collect();
    conflicts.sort_by(|a, b| a.url.cmp(&b.url));
    conflicts
}

/// Print conflicts using the standard log format.
///
/// Output format:
/// ```text
/// [conflict] url conflicts (1 url, 2 addresses)
/// [url] /news/hello (2 addresses)
///   - Post news/hello
///   - Page news/hello
/// ```
pub fn print_conflicts(conflicts: &[UrlConflict]) {
    if conflicts.is_empty() {
        return;
    }

    let total: usize = conflicts.iter().map(|c| c.addresses.len()).sum();
    log!("conflict"; "url conflicts ({} url{}, {} address{})",
        conflicts.len(), plural_s(conflicts.len()),
        total, plural_es(total));

    for conflict in conflicts {
        eprintln!();
        log!("url"; "{} ({} address{})", conflict.url.to_encoded(), conflict.addresses.len(),
            plural_es(conflict.addresses.len()));
        for address in &conflict.addresses {
            eprintln!("  - {} {}", address.type_name(), address);
        }
    }
}

/// Format conflicts as a string (for error messages).
pub fn format_conflicts(conflicts: &[UrlConflict]) -> String {
    conflicts
        .iter()
        .map(format_single_conflict)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_single_conflict(conflict: &UrlConflict) -> String {
    let mut lines = vec![format!(
        "{} ({})",
        conflict.url.to_encoded(),
        conflict.addresses.len()
    )];
    for address in &conflict.addresses {
        lines.push(format!("  - {} {}", address.type_name(), address));
    }
    lines.join("\n")
}

#[inline]
fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[inline]
fn plural_es(n: usize) -> &'static str {
    if n == 1 { "" } else { "es" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AddressSchema, ContentType, KeyFormat, TypeRegistry};
    use crate::core::TypeName;
    use crate::route::RouteRegistry;

    fn name(s: &str) -> TypeName {
        TypeName::new(s).unwrap()
    }

    fn map() -> ContentMap {
        let mut types = TypeRegistry::new();
        types.register(ContentType::new(
            AddressSchema::new(name("Post")).key("slug", KeyFormat::Text),
        ));
        types.register(ContentType::new(
            AddressSchema::new(name("Page")).key("path", KeyFormat::Text),
        ));
        let mut routes = RouteRegistry::builder();
        routes.route(name("Post"), "{slug}").unwrap();
        routes.route(name("Page"), "{path}").unwrap();
        ContentMap::new(types, routes.build())
    }

    fn address(map: &ContentMap, type_name: &str, key: &str, value: &str) -> Address {
        Address::from_values(map.types().schema(type_name).unwrap(), [(key, value)]).unwrap()
    }

    #[test]
    fn test_no_conflicts() {
        let map = map();
        let addresses = vec![
            address(&map, "Post", "slug", "a"),
            address(&map, "Post", "slug", "b"),
            address(&map, "Page", "path", "c"),
        ];
        let claims = collect_url_claims(&map, &addresses);
        assert_eq!(claims.len(), 3);
        assert!(detect_conflicts(&claims).is_empty());
    }

    #[test]
    fn test_cross_type_conflict() {
        let map = map();
        let addresses = vec![
            address(&map, "Post", "slug", "about"),
            address(&map, "Page", "path", "about"),
            address(&map, "Page", "path", "contact"),
        ];
        let conflicts = detect_conflicts(&collect_url_claims(&map, &addresses));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].url, "about");
        assert_eq!(conflicts[0].addresses, addresses[..2]);
    }

    #[test]
    fn test_duplicate_input_is_not_a_conflict() {
        let map = map();
        let a = address(&map, "Post", "slug", "a");
        let claims = collect_url_claims(&map, &[a.clone(), a]);
        assert!(detect_conflicts(&claims).is_empty());
    }

    #[test]
    fn test_conflicts_sorted_by_url() {
        let map = map();
        let addresses = vec![
            address(&map, "Post", "slug", "z"),
            address(&map, "Page", "path", "z"),
            address(&map, "Post", "slug", "b"),
            address(&map, "Page", "path", "b"),
        ];
        let conflicts = detect_conflicts(&collect_url_claims(&map, &addresses));
        let urls: Vec<&str> = conflicts.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, ["b", "z"]);
    }

    #[test]
    fn test_format_conflicts() {
        let map = map();
        let conflicts = vec![UrlConflict {
            url: RoutePath::new("foo"),
            addresses: vec![
                address(&map, "Post", "slug", "foo"),
                address(&map, "Page", "path", "foo"),
            ],
        }];

        let formatted = format_conflicts(&conflicts);
        assert!(formatted.contains("/foo (2)"));
        assert!(formatted.contains("  - Post foo"));
        assert!(formatted.contains("  - Page foo"));
    }
}
