//! Declarative registry configuration.
//!
//! A [`Config`] names the payload of the default mode, the modes to register
//! up front, and the tracing level for [`init_tracing`](crate::observability::init_tracing).
//! It can be built in code, parsed from TOML or JSON, or read from a flat
//! key/value map supplied by a host application.
//!
//! # Example
//!
//! ```toml
//! trace_level = "debug"
//! default_payload = { title = "Commands" }
//!
//! [modes.search]
//! title = "Search"
//!
//! [modes.help]
//! title = "Help"
//! ```

use crate::domain::{ModeError, ModeRegistry, Result, DEFAULT_MODE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config<T> {
    /// Tracing filter directive, e.g. `"debug"` or `"modestack=trace"`.
    ///
    /// `RUST_LOG` takes precedence when set. Default: `"info"`.
    #[serde(default)]
    pub trace_level: Option<String>,

    /// Payload attached to the default mode.
    pub default_payload: T,

    /// Additional modes to register, keyed by name.
    ///
    /// Must not contain the default mode's name.
    #[serde(default = "BTreeMap::new")]
    pub modes: BTreeMap<String, T>,
}

impl<T: Default> Default for Config<T> {
    fn default() -> Self {
        Self {
            trace_level: None,
            default_payload: T::default(),
            modes: BTreeMap::new(),
        }
    }
}

impl<T: DeserializeOwned> Config<T> {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError::Config`] if the document is malformed or does not
    /// match the expected shape.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ModeError::Config(format!("failed to parse TOML: {e}")))
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError::Config`] if the document is malformed or does not
    /// match the expected shape.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| ModeError::Config(format!("failed to parse JSON: {e}")))
    }

    /// Reads a configuration file.
    ///
    /// Files ending in `.json` are parsed as JSON; anything else as TOML.
    ///
    /// # Errors
    ///
    /// - [`ModeError::Io`] if the file cannot be read
    /// - [`ModeError::Config`] if it cannot be parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        tracing::debug!(path = %path.display(), json = is_json, "loading mode configuration");
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }
}

impl<T> Config<T> {
    /// Tracing filter to use when `RUST_LOG` is not set.
    #[must_use]
    pub fn trace_level(&self) -> &str {
        self.trace_level.as_deref().unwrap_or("info")
    }
}

impl Config<()> {
    /// Parses configuration for payload-free modes from a flat string map.
    ///
    /// # Parsing Rules
    ///
    /// - `modes`: comma-separated mode names (blank entries are skipped)
    /// - `trace_level`: copied as-is
    ///
    /// Unknown keys are ignored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use modestack::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("modes".to_string(), "search, help,".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.modes.keys().collect::<Vec<_>>(), vec!["help", "search"]);
    /// assert_eq!(config.trace_level(), "info");
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let modes = map
            .get("modes")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), ()))
                    .collect::<BTreeMap<_, _>>()
            })
            .unwrap_or_default();

        Self {
            trace_level: map.get("trace_level").cloned(),
            default_payload: (),
            modes,
        }
    }
}

impl<T> ModeRegistry<T> {
    /// Builds a registry with every mode from `config` registered.
    ///
    /// The modes stay registered for the registry's lifetime unless removed
    /// by name with [`unregister`](Self::unregister).
    ///
    /// # Errors
    ///
    /// Returns [`ModeError::Config`] if `config.modes` contains the default
    /// mode's name.
    pub fn from_config(config: Config<T>) -> Result<Self> {
        if config.modes.contains_key(DEFAULT_MODE) {
            return Err(ModeError::Config(format!(
                "mode name `{DEFAULT_MODE}` is reserved for the default mode"
            )));
        }

        let registry = Self::new(config.default_payload);
        for (name, payload) in config.modes {
            registry.register_mode(&name, payload);
        }

        tracing::debug!(modes = registry.modes().len(), "registry built from configuration");
        Ok(registry)
    }
}
