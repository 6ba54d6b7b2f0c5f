//! Configuration normalisation.
//!
//! A configuration source is the flattened output of a KConfig run: one
//! `KEY=value` assignment per line, blank lines and `#` comments ignored,
//! with `y` standing for an enabled boolean option. The Python tooling
//! also consumes the same data as a JSON object, which [`Config::from_json_str`]
//! accepts.
//!
//! Entry order is preserved from the source. Downstream, it alone decides
//! the order of capabilities and task fields, so the mapping is backed by
//! an [`IndexMap`]. When a key is assigned twice the last value wins and the
//! entry keeps the position of its first occurrence.

use std::fmt;

use indexmap::IndexMap;
use indexmap::map::Iter;
use log::{trace, warn};

use crate::error::{MetadataError, Result};

/// Comment marker for configuration lines.
const COMMENT_MARKER: char = '#';

/// Raw value denoting an enabled boolean option.
const ENABLED_SENTINEL: &str = "y";

/// A normalised configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// A boolean option, produced from the `y` sentinel (or a JSON boolean).
    Bool(bool),
    /// Any other value, kept verbatim.
    String(String),
}

impl ConfigValue {
    /// Normalises a raw right-hand side of a configuration assignment.
    ///
    /// # Examples
    ///
    /// ```
    /// use outpost_metadata::config::ConfigValue;
    ///
    /// assert_eq!(ConfigValue::from_raw("y"), ConfigValue::Bool(true));
    /// assert_eq!(
    ///     ConfigValue::from_raw("\"demo\""),
    ///     ConfigValue::String("\"demo\"".to_owned())
    /// );
    /// ```
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        if raw == ENABLED_SENTINEL {
            Self::Bool(true)
        } else {
            Self::String(raw.to_owned())
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

/// An ordered mapping from configuration key to normalised value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    entries: IndexMap<String, ConfigValue>,
}

impl Config {
    /// Parses a line-oriented configuration source.
    ///
    /// Keys are trimmed; values lose trailing whitespace only.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::MalformedConfigLine`] for the first
    /// non-comment line lacking a `=` separator or a key.
    ///
    /// # Examples
    ///
    /// ```
    /// use outpost_metadata::config::{Config, ConfigValue};
    ///
    /// let config = Config::parse("# comment\nCONFIG_CAP_GPIO=y\n")?;
    /// assert_eq!(config.get("CONFIG_CAP_GPIO"), Some(&ConfigValue::Bool(true)));
    /// # Ok::<(), outpost_metadata::error::MetadataError>(())
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        Self::from_lines(source.lines())
    }

    /// Builds the mapping from an iterator of raw lines.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::MalformedConfigLine`] as [`Self::parse`] does.
    pub fn from_lines<'a, I>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut config = Self::default();

        for (index, line) in lines.into_iter().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
                continue;
            }

            let (key, raw) =
                split_assignment(trimmed).ok_or_else(|| MetadataError::MalformedConfigLine {
                    line: index + 1,
                    content: trimmed.trim_end().to_owned(),
                })?;

            config.insert(key, ConfigValue::from_raw(raw));
        }

        Ok(config)
    }

    /// Builds the mapping from a JSON object, as exported by the KConfig
    /// JSON backend.
    ///
    /// Booleans and strings map directly; numbers are kept as their JSON
    /// text.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidConfig`] if the document is not
    /// valid JSON, is not an object, or contains null or nested values.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let document: IndexMap<String, serde_json::Value> = serde_json::from_str(source)
            .map_err(|err| MetadataError::InvalidConfig {
                reason: err.to_string(),
            })?;

        let mut config = Self::default();
        for (key, value) in document {
            let value = match value {
                serde_json::Value::Bool(flag) => ConfigValue::Bool(flag),
                serde_json::Value::String(text) => ConfigValue::String(text),
                serde_json::Value::Number(number) => ConfigValue::String(number.to_string()),
                other => {
                    return Err(MetadataError::InvalidConfig {
                        reason: format!("{key} has unsupported value {other}"),
                    });
                }
            };
            config.insert(&key, value);
        }

        Ok(config)
    }

    /// Inserts an entry, keeping the position of an earlier occurrence.
    pub fn insert(&mut self, key: &str, value: ConfigValue) {
        trace!("config entry {key} = {value}");
        if let Some(previous) = self.entries.insert(key.to_owned(), value) {
            warn!("configuration key {key} assigned more than once; dropping earlier value {previous}");
        }
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Iterates entries in source order.
    pub fn iter(&self) -> Iter<'_, String, ConfigValue> {
        self.entries.iter()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entries were read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a ConfigValue);
    type IntoIter = Iter<'a, String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (key, raw) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, raw.trim_end()))
}
