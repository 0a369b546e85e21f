//! Map configuration for `contentmap.toml`.
//!
//! # Sections
//!
//! | Section       | Purpose                                             |
//! |---------------|-----------------------------------------------------|
//! | `[routing]`   | Handler slot name                                   |
//! | `[versions]`  | Current version (`coordinate = "value"`, `*` = any) |
//! | `[[types]]`   | Content types: keys, supertype, handlers, id format |
//! | `[[routes]]`  | Route templates in registration order               |
//!
//! # Example
//!
//! ```toml
//! [routing]
//! handler_key = "action"
//!
//! [versions]
//! locale = "en"
//!
//! [[types]]
//! name = "Post"
//! handlers = ["show", "edit"]
//! keys = [{ name = "category" }, { name = "slug" }]
//!
//! [[routes]]
//! type = "Post"
//! template = "blog/{category}/{slug}/{action=show}"
//! ```

mod error;
mod util;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use util::find_config_file;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::address::{AddressSchema, ContentType, DEFAULT_SEPARATOR, KeyFormat, KeySpec, TypeRegistry};
use crate::core::TypeName;
use crate::log;
use crate::map::ContentMap;
use crate::route::{DEFAULT_HANDLER_KEY, RouteRegistry, RouteRegistryBuilder};
use crate::version::{ItemVersion, VersionContext};
use util::suggest;

/// Default config file name.
pub const CONFIG_FILE: &str = "contentmap.toml";

// ============================================================================
// sections
// ============================================================================

/// Root configuration structure representing `contentmap.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub routing: RoutingConfig,

    /// Current version coordinates
    #[serde(default)]
    pub versions: BTreeMap<String, String>,

    #[serde(default)]
    pub types: Vec<TypeConfig>,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// `[routing]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Route variable naming the handler slot
    #[serde(default = "default_handler_key")]
    pub handler_key: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            handler_key: default_handler_key(),
        }
    }
}

fn default_handler_key() -> String {
    DEFAULT_HANDLER_KEY.to_string()
}

/// `[[types]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeConfig {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub handlers: Vec<String>,
    /// Item id format
    #[serde(default)]
    pub id: KeyFormat,
    /// Natural keys, in address order
    #[serde(default)]
    pub keys: Vec<KeySpec>,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

/// `[[routes]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    #[serde(rename = "type")]
    pub type_name: String,
    pub template: String,
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
    #[serde(default)]
    pub handlers: Vec<String>,
}

/// A validated configuration, ready to serve lookups.
#[derive(Debug)]
pub struct Compiled {
    pub map: ContentMap,
    pub versions: VersionContext,
    /// Non-fatal findings (errors abort compilation)
    pub diagnostics: ConfigDiagnostics,
}

// ============================================================================
// loading
// ============================================================================

impl MapConfig {
    /// Locate the config file upward from `start` and load it.
    pub fn discover(start: &Path, config_name: &Path) -> Result<Self, ConfigError> {
        let path = find_config_file(start, config_name)
            .ok_or_else(|| ConfigError::NotFound(config_name.to_path_buf()))?;
        Self::from_path(&path)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    // ========================================================================
    // compilation
    // ========================================================================

    /// Validate everything and build the registries.
    ///
    /// All problems are collected before failing, so one run reports them all.
    pub fn compile(&self) -> Result<Compiled, ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        let handler_key = self.routing.handler_key.trim().to_lowercase();
        if handler_key.is_empty() {
            diag.error("routing.handler_key", "handler key must not be empty");
        }

        let types = self.build_types(&handler_key, &mut diag);
        let routes = self.build_routes(&handler_key, &types, &mut diag);
        let versions = self.build_versions(&mut diag);

        let diagnostics = diag.into_result().map_err(ConfigError::Diagnostics)?;
        Ok(Compiled {
            map: ContentMap::new(types, routes),
            versions,
            diagnostics,
        })
    }

    fn build_types(&self, handler_key: &str, diag: &mut ConfigDiagnostics) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        let mut seen = FxHashSet::default();

        for (i, ty) in self.types.iter().enumerate() {
            let field = |name: &str| format!("types[{i}].{name}");

            let Some(type_name) = TypeName::new(ty.name.trim()) else {
                diag.error_with_hint(
                    field("name"),
                    format!("invalid type name `{}`", ty.name),
                    "type names are non-empty and contain no `:` or spaces",
                );
                continue;
            };
            if !seen.insert(type_name.clone()) {
                diag.error(field("name"), format!("duplicate type `{type_name}`"));
                continue;
            }

            let mut separators = ty.separator.chars();
            let separator = match (separators.next(), separators.next()) {
                (Some(c), None) => c,
                _ => {
                    diag.error(
                        field("separator"),
                        format!("separator must be one character, got `{}`", ty.separator),
                    );
                    DEFAULT_SEPARATOR
                }
            };

            let mut schema = AddressSchema::new(type_name.clone()).with_separator(separator);
            for (k, key) in ty.keys.iter().enumerate() {
                let spec = KeySpec::new(&key.name, key.format);
                let key_field = format!("types[{i}].keys[{k}].name");
                if spec.name.is_empty() {
                    diag.error(key_field, "key name must not be empty");
                } else if spec.name == handler_key {
                    diag.error_with_hint(
                        key_field,
                        format!("key `{}` collides with the handler slot", spec.name),
                        "rename the key or change [routing].handler_key",
                    );
                } else if schema.has_key(&spec.name) {
                    diag.error(key_field, format!("duplicate key `{}`", spec.name));
                } else {
                    schema.keys.push(spec);
                }
            }

            let mut content_type = ContentType::new(schema)
                .handlers(&ty.handlers)
                .id_format(ty.id);
            if let Some(parent) = &ty.extends {
                match TypeName::new(parent.trim()) {
                    Some(parent) => content_type = content_type.extends(parent),
                    None => diag.error(field("extends"), format!("invalid type name `{parent}`")),
                }
            }
            registry.register(content_type);
        }

        for (child, parent) in registry.dangling_supertypes() {
            let known = registry.iter().map(|t| t.name().as_str());
            let message = format!("`{child}` extends unknown type `{parent}`");
            match suggest(parent.as_str(), known) {
                Some(hint) => diag.error_with_hint("types.extends", message, format!("did you mean `{hint}`?")),
                None => diag.error("types.extends", message),
            }
        }

        registry
    }

    fn build_routes(
        &self,
        handler_key: &str,
        types: &TypeRegistry,
        diag: &mut ConfigDiagnostics,
    ) -> RouteRegistry {
        let mut builder = RouteRegistryBuilder::new().handler_key(handler_key);

        for (i, route) in self.routes.iter().enumerate() {
            let field = |name: &str| format!("routes[{i}].{name}");

            let type_name = match TypeName::new(route.type_name.trim()) {
                Some(name) if types.contains(name.as_str()) => name,
                _ => {
                    let message = format!("unknown type `{}`", route.type_name);
                    let known = types.iter().map(|t| t.name().as_str());
                    match suggest(&route.type_name, known) {
                        Some(hint) => {
                            diag.error_with_hint(field("type"), message, format!("did you mean `{hint}`?"))
                        }
                        None => diag.error(field("type"), message),
                    }
                    continue;
                }
            };

            if let Err(e) = builder.register(
                type_name.clone(),
                &route.template,
                &route.defaults,
                &route.handlers,
            ) {
                diag.error(field("template"), e.to_string());
                continue;
            }

            // A schema key the template never carries makes the route dead
            let Some(entry) = builder.last() else { continue };
            if let Ok(schema) = types.schema(type_name.as_str()) {
                for key in schema.key_names() {
                    if entry.template.variable(key).is_none() {
                        diag.warn(
                            field("template"),
                            format!("`{}` never carries key `{key}` of `{type_name}`", route.template),
                        );
                    }
                }
            }
        }

        builder.build()
    }

    fn build_versions(&self, diag: &mut ConfigDiagnostics) -> VersionContext {
        let mut pairs = Vec::with_capacity(self.versions.len());
        for (name, value) in &self.versions {
            if name.trim().is_empty() || name.contains(['=', ';', ' ']) {
                diag.error(format!("versions.{name}"), "invalid coordinate name");
                continue;
            }
            if value.contains(['=', ';', ' ']) {
                diag.error(format!("versions.{name}"), format!("invalid value `{value}`"));
                continue;
            }
            pairs.push((name.as_str(), Some(value.as_str())));
        }
        VersionContext::new(ItemVersion::from_pairs(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BLOG: &str = r#"
[routing]
handler_key = "action"

[versions]
locale = "en"
stage = "*"

[[types]]
name = "Content"
handlers = ["show"]

[[types]]
name = "Post"
extends = "Content"
handlers = ["show", "edit"]
id = "uuid"
keys = [{ name = "category" }, { name = "slug", format = "text" }]

[[types]]
name = "Archive"
keys = [{ name = "year", format = "int" }, { name = "page", format = "int" }]

[[routes]]
type = "Post"
template = "blog/{category}/{slug}/{action=show}"

[[routes]]
type = "Post"
template = "{slug}"
defaults = { category = "pages" }

[[routes]]
type = "Archive"
template = "archive/{year}/{page=1}"
"#;

    #[test]
    fn test_compile_blog() {
        let config = MapConfig::parse(BLOG).unwrap();
        let compiled = config.compile().unwrap();
        assert!(compiled.diagnostics.warnings().is_empty());

        let map = &compiled.map;
        assert_eq!(map.types().len(), 3);
        assert_eq!(map.routes().len(), 3);
        assert_eq!(map.types().get("Post").unwrap().id_format, KeyFormat::Uuid);

        let post = Address::from_values(
            map.types().schema("Post").unwrap(),
            [("category", "news"), ("slug", "hello")],
        )
        .unwrap();
        assert_eq!(map.canonical_url(&post).unwrap(), "blog/news/hello");

        let current = compiled.versions.current();
        assert_eq!(current.value("locale"), Some("en"));
        assert_eq!(current.get("stage"), Some(None));
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = MapConfig::parse("").unwrap();
        assert_eq!(config.routing.handler_key, "action");
        let compiled = config.compile().unwrap();
        assert!(compiled.map.types().is_empty());
        assert!(compiled.versions.current().is_empty());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = MapConfig::parse(
            r#"
[[types]]
name = "Post"
separator = "::"
keys = [{ name = "slug" }, { name = "Slug" }, { name = "action" }]

[[types]]
name = "Post"

[[types]]
name = "Page"
extends = "Contnt"

[[routes]]
type = "Pots"
template = "{slug}"

[[routes]]
type = "Post"
template = "blog/{slug"
"#,
        )
        .unwrap();

        let Err(ConfigError::Diagnostics(diag)) = config.compile() else {
            panic!("expected diagnostics");
        };
        let fields: Vec<&str> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "types[0].separator",
                "types[0].keys[1].name",
                "types[0].keys[2].name",
                "types[1].name",
                "types.extends",
                "routes[0].type",
                "routes[1].template",
            ]
        );
        assert_eq!(diag.errors()[5].hint.as_deref(), Some("did you mean `Post`?"));
    }

    #[test]
    fn test_warns_on_dead_route() {
        let config = MapConfig::parse(
            r#"
[[types]]
name = "Post"
keys = [{ name = "year", format = "int" }, { name = "slug" }]

[[routes]]
type = "Post"
template = "blog/{slug}"
"#,
        )
        .unwrap();
        let compiled = config.compile().unwrap();
        let warnings = compiled.diagnostics.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("`year`"));
    }

    #[test]
    fn test_from_path_and_unknown_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{BLOG}\n[extra]\nfoo = 1").unwrap();

        let config = MapConfig::from_path(file.path()).unwrap();
        assert_eq!(config.config_path, file.path());
        assert_eq!(config.types.len(), 3);
    }

    #[test]
    fn test_from_path_errors() {
        let missing = MapConfig::from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(..))));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[types]\nname = ").unwrap();
        assert!(matches!(MapConfig::from_path(file.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), BLOG).unwrap();

        let config = MapConfig::discover(&nested, Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(config.routes.len(), 3);

        let empty = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            MapConfig::discover(empty.path(), Path::new("missing-contentmap.toml")),
            Err(ConfigError::NotFound(_))
        ));
    }
}
