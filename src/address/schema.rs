//! Natural-key schemas.
//!
//! A content type declares its address components explicitly through
//! [`AddressSchema`]: an ordered list of `(key, format)` pairs. Addresses are
//! extracted by schema, never by inspecting the content object.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{KeyValue, TypeName};

/// Default separator between address components.
pub const DEFAULT_SEPARATOR: char = '/';

/// Errors converting natural keys to or from their string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("`{type_name}` has no value for key `{key}`")]
    MissingKey { type_name: TypeName, key: String },

    #[error("cannot convert `{value}` to {format} for key `{key}`")]
    Conversion {
        key: String,
        value: String,
        format: KeyFormat,
    },

    #[error("`{type_name}` declares no key `{key}`")]
    UnknownKey { type_name: TypeName, key: String },

    #[error("content type `{0}` is not registered")]
    UnknownType(String),

    #[error("cannot read address fields of `{type_name}`: {message}")]
    Source { type_name: TypeName, message: String },
}

/// Declared conversion format of a natural key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    /// Free text, lower-cased (default).
    #[default]
    Text,
    /// Signed 64-bit integer.
    Int,
    /// `true` / `false`.
    Bool,
    /// GUID in any textual form `uuid` accepts.
    Uuid,
}

impl KeyFormat {
    /// Parse a raw string into a typed key value.
    pub fn parse(self, key: &str, raw: &str) -> Result<KeyValue, SchemaError> {
        let fail = || SchemaError::Conversion {
            key: key.to_string(),
            value: raw.to_string(),
            format: self,
        };
        let raw = raw.trim();
        match self {
            Self::Text if raw.is_empty() => Err(fail()),
            Self::Text => Ok(KeyValue::text(raw)),
            Self::Int => raw.parse::<i64>().map(KeyValue::Int).map_err(|_| fail()),
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Ok(KeyValue::Bool(true)),
                "false" => Ok(KeyValue::Bool(false)),
                _ => Err(fail()),
            },
            Self::Uuid => Uuid::parse_str(raw).map(KeyValue::Uuid).map_err(|_| fail()),
        }
    }

    /// Coerce a field value read off a content object.
    pub fn coerce(self, key: &str, value: &JsonValue) -> Result<KeyValue, SchemaError> {
        match (self, value) {
            (Self::Int, JsonValue::Number(n)) => n.as_i64().map(KeyValue::Int).ok_or_else(|| {
                SchemaError::Conversion {
                    key: key.to_string(),
                    value: n.to_string(),
                    format: self,
                }
            }),
            (Self::Bool, JsonValue::Bool(b)) => Ok(KeyValue::Bool(*b)),
            (_, JsonValue::String(s)) => self.parse(key, s),
            (Self::Text, JsonValue::Number(n)) => Ok(KeyValue::text(n.to_string())),
            (Self::Text, JsonValue::Bool(b)) => Ok(KeyValue::text(b.to_string())),
            (_, other) => Err(SchemaError::Conversion {
                key: key.to_string(),
                value: other.to_string(),
                format: self,
            }),
        }
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// One declared natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Key name (lower-cased on construction)
    pub name: String,
    /// Conversion format
    #[serde(default)]
    pub format: KeyFormat,
}

impl KeySpec {
    pub fn new(name: &str, format: KeyFormat) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            format,
        }
    }
}

/// Ordered natural-key schema of a content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSchema {
    pub type_name: TypeName,
    pub keys: Vec<KeySpec>,
    pub separator: char,
}

impl AddressSchema {
    pub fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            keys: Vec::new(),
            separator: DEFAULT_SEPARATOR,
        }
    }

    /// Append a key (builder style).
    pub fn key(mut self, name: &str, format: KeyFormat) -> Self {
        self.keys.push(KeySpec::new(name, format));
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Look up a key spec by (case-insensitive) name.
    pub fn spec(&self, name: &str) -> Option<&KeySpec> {
        self.keys.iter().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.spec(name).is_some()
    }

    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.name.as_str())
    }
}

/// Implemented by content types that declare their natural keys.
///
/// ```ignore
/// impl HasAddressSchema for Post {
///     fn address_schema() -> AddressSchema {
///         AddressSchema::new(TypeName::new("Post").unwrap())
///             .key("category", KeyFormat::Text)
///             .key("slug", KeyFormat::Text)
///     }
/// }
/// ```
pub trait HasAddressSchema {
    fn address_schema() -> AddressSchema;
}
