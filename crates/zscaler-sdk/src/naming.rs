//! snake_case ⇄ camelCase key conversion.
//!
//! Zscaler APIs speak camelCase; callers see snake_case. Most keys convert
//! algorithmically. Vendor fields with multi-letter abbreviations (`routableIP`,
//! `nameL10nTag`) defeat the algorithm and are listed in an exception table that
//! takes precedence in both directions. Keys missing from the table are always
//! converted algorithmically, even when the result is not what the vendor uses.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde_json::{Map, Value};

/// Canonical `(camelCase, snake_case)` pairs for irregular vendor fields.
pub const IRREGULAR_KEYS: &[(&str, &str)] = &[
    ("routableIP", "routable_ip"),
    ("surrogateIP", "surrogate_ip"),
    ("surrogateIPEnforcedForKnownBrowsers", "surrogate_ip_enforced_for_known_browsers"),
    ("isNameL10nTag", "is_name_l10n_tag"),
    ("nameL10nTag", "name_l10n_tag"),
    ("ecVMs", "ec_vms"),
    ("ipV6Enabled", "ipv6_enabled"),
    ("capturePCAP", "capture_pcap"),
    ("validateSSLCertificate", "validate_ssl_certificate"),
];

static DEFAULT_CONVERTER: LazyLock<NamingConverter> = LazyLock::new(NamingConverter::default);

/// Bidirectional key mapper backed by an exception table.
#[derive(Debug, Clone)]
pub struct NamingConverter {
    camel_to_snake: HashMap<String, String>,
    snake_to_camel: HashMap<String, String>,
}

impl NamingConverter {
    /// Converter with no exceptions at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            camel_to_snake: HashMap::new(),
            snake_to_camel: HashMap::new(),
        }
    }

    /// Add integrator-supplied `(camel, snake)` pairs on top of the current table.
    ///
    /// A later pair replaces an earlier one for the same key in either direction.
    #[must_use]
    pub fn with_exceptions<'a, I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (camel, snake) in pairs {
            self.camel_to_snake.insert(camel.to_string(), snake.to_string());
            self.snake_to_camel.insert(snake.to_string(), camel.to_string());
        }
        self
    }

    /// Returns true if `key` is listed in the table, in either convention.
    #[must_use]
    pub fn is_irregular(&self, key: &str) -> bool {
        self.camel_to_snake.contains_key(key) || self.snake_to_camel.contains_key(key)
    }

    /// Convert a single camelCase key to snake_case.
    #[must_use]
    pub fn to_snake(&self, key: &str) -> String {
        if let Some(mapped) = self.camel_to_snake.get(key) {
            return mapped.clone();
        }

        let mut out = String::with_capacity(key.len() + 4);
        for (i, ch) in key.chars().enumerate() {
            if ch.is_uppercase() && i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        }
        out
    }

    /// Convert a single snake_case key to camelCase.
    #[must_use]
    pub fn to_camel(&self, key: &str) -> String {
        if !key.contains('_') {
            return key.to_string();
        }
        if let Some(mapped) = self.snake_to_camel.get(key) {
            return mapped.clone();
        }

        let joined: String = key.split('_').map(capitalize).collect();
        lowercase_first(&joined)
    }

    /// Recursively snake-case every object key in `value`.
    #[must_use]
    pub fn to_snake_deep(&self, value: Value) -> Value {
        self.convert_deep(value, &|k| self.to_snake(k))
    }

    /// Recursively camel-case every object key in `value`.
    #[must_use]
    pub fn to_camel_deep(&self, value: Value) -> Value {
        self.convert_deep(value, &|k| self.to_camel(k))
    }

    fn convert_deep(&self, value: Value, convert: &dyn Fn(&str) -> String) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (convert(&k), self.convert_deep(v, convert)))
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.convert_deep(v, convert)).collect())
            }
            other => other,
        }
    }

    /// Camel-case the keys of a top-level map, recursing into values.
    #[must_use]
    pub fn camelize_map(&self, map: Map<String, Value>) -> Map<String, Value> {
        match self.to_camel_deep(Value::Object(map)) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

impl Default for NamingConverter {
    fn default() -> Self {
        Self::empty().with_exceptions(IRREGULAR_KEYS.iter().copied())
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map_or_else(String::new, |first| first.to_lowercase().chain(chars).collect())
}

/// The shared converter built from [`IRREGULAR_KEYS`].
#[must_use]
pub fn default_converter() -> &'static NamingConverter {
    &DEFAULT_CONVERTER
}

/// Convert a camelCase key to snake_case using the default table.
#[must_use]
pub fn to_snake(key: &str) -> String {
    DEFAULT_CONVERTER.to_snake(key)
}

/// Convert a snake_case key to camelCase using the default table.
#[must_use]
pub fn to_camel(key: &str) -> String {
    DEFAULT_CONVERTER.to_camel(key)
}

/// Recursively snake-case every object key using the default table.
#[must_use]
pub fn to_snake_deep(value: Value) -> Value {
    DEFAULT_CONVERTER.to_snake_deep(value)
}

/// Recursively camel-case every object key using the default table.
#[must_use]
pub fn to_camel_deep(value: Value) -> Value {
    DEFAULT_CONVERTER.to_camel_deep(value)
}
