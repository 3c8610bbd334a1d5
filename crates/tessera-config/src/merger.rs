//! Option merging with priority ordering
//!
//! Priority order (lowest to highest):
//! 1. Defaults - Built-in engine defaults
//! 2. File config - From tessera.toml
//! 3. Environment variables - TESSERA__* pattern
//! 4. Call - Per-call overrides

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::{EngineOptions, SortMode};
use tracing::debug;

use crate::{ConfigError, Result};

const SORT_KEY: &str = "dynamic_sort_subtable";
const ALL_TABLES_KEY: &str = "get_all_tables";
const ALL_TABLES_ALIAS: &str = "import_all";

/// Priority levels for option sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Default = 0,
    File = 10,
    Environment = 20,
    Call = 30,
}

/// Option set where every key may be left unset.
///
/// Each layer contributes one of these; unset keys fall through to lower layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_sort_subtable: Option<SortMode>,
    #[serde(default, alias = "import_all", skip_serializing_if = "Option::is_none")]
    pub get_all_tables: Option<bool>,
}

impl PartialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort(mut self, mode: SortMode) -> Self {
        self.dynamic_sort_subtable = Some(mode);
        self
    }

    pub fn with_all_tables(mut self, enabled: bool) -> Self {
        self.get_all_tables = Some(enabled);
        self
    }

    /// Parse from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let value: Value = toml::from_str(toml_str)
            .map_err(|e| ConfigError::parse(format!("TOML parse error: {e}")))?;
        Self::from_json(value)
    }

    /// Parse from JSON value
    pub fn from_json(value: Value) -> Result<Self> {
        if let Some(map) = value.as_object()
            && map.contains_key(ALL_TABLES_KEY)
            && map.contains_key(ALL_TABLES_ALIAS)
        {
            return Err(ConfigError::validation(format!(
                "{ALL_TABLES_KEY} and {ALL_TABLES_ALIAS} are the same option; set only one"
            )));
        }
        serde_json::from_value(value)
            .map_err(|e| ConfigError::parse(format!("JSON parse error: {e}")))
    }

    pub fn is_empty(&self) -> bool {
        self.dynamic_sort_subtable.is_none() && self.get_all_tables.is_none()
    }

    /// Overlay the set keys onto `base`.
    pub fn apply(&self, mut base: EngineOptions) -> EngineOptions {
        if let Some(mode) = self.dynamic_sort_subtable {
            base.dynamic_sort_subtable = mode;
        }
        if let Some(enabled) = self.get_all_tables {
            base.get_all_tables = enabled;
        }
        base
    }
}

impl From<EngineOptions> for PartialOptions {
    fn from(options: EngineOptions) -> Self {
        Self {
            dynamic_sort_subtable: Some(options.dynamic_sort_subtable),
            get_all_tables: Some(options.get_all_tables),
        }
    }
}

/// Merged options with tracking of which layer set each key
#[derive(Debug, Clone, PartialEq)]
pub struct Layered {
    options: EngineOptions,
    sources: HashMap<&'static str, Priority>,
}

impl Layered {
    /// Create with default values
    pub fn defaults() -> Self {
        let sources = [SORT_KEY, ALL_TABLES_KEY]
            .into_iter()
            .map(|key| (key, Priority::Default))
            .collect();
        Self {
            options: EngineOptions::default(),
            sources,
        }
    }

    /// Merge a partial option set at `priority`.
    ///
    /// A key is overridden only when `priority` is at least the priority of
    /// the layer that last set it, so merge order does not matter.
    pub fn merge(mut self, partial: PartialOptions, priority: Priority) -> Self {
        if let Some(mode) = partial.dynamic_sort_subtable
            && self.accepts(SORT_KEY, priority)
        {
            debug!(key = SORT_KEY, value = %mode, ?priority, "option set");
            self.options.dynamic_sort_subtable = mode;
            self.sources.insert(SORT_KEY, priority);
        }
        if let Some(enabled) = partial.get_all_tables
            && self.accepts(ALL_TABLES_KEY, priority)
        {
            debug!(key = ALL_TABLES_KEY, value = enabled, ?priority, "option set");
            self.options.get_all_tables = enabled;
            self.sources.insert(ALL_TABLES_KEY, priority);
        }
        self
    }

    /// Apply per-call overrides, which outrank every other layer.
    pub fn with_call(self, overrides: PartialOptions) -> Self {
        self.merge(overrides, Priority::Call)
    }

    fn accepts(&self, key: &str, priority: Priority) -> bool {
        self.sources
            .get(key)
            .is_none_or(|&existing| existing <= priority)
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Layer that set `key`, for the keys [`EngineOptions`] carries.
    pub fn get_source(&self, key: &str) -> Option<Priority> {
        let key = if key == ALL_TABLES_ALIAS {
            ALL_TABLES_KEY
        } else {
            key
        };
        self.sources.get(key).copied()
    }
}

impl Default for Layered {
    fn default() -> Self {
        Self::defaults()
    }
}
