//! Translation of abstract effect values into driver-ready values.
//!
//! Ingress clients speak in symbols (`"high"`, `"warm"`); drivers want
//! numbers or concrete codes. Lookups go per-parameter key first, then the
//! global symbol table. Anything unmapped passes through unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::effect::{Effect, Parameters};

/// Parameter key under which the translated intensity is sent.
pub const INTENSITY_KEY: &str = "intensity";
/// Parameter key under which the effect duration is sent.
pub const DURATION_KEY: &str = "duration_ms";
/// Parameter key under which the effect location is sent.
pub const LOCATION_KEY: &str = "location";

/// Configurable symbol → value table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationTable {
    /// Global symbols applied to any string parameter.
    pub symbols: HashMap<String, serde_json::Value>,
    /// Per-parameter-key symbols, consulted before [`symbols`](Self::symbols).
    pub keys: HashMap<String, HashMap<String, serde_json::Value>>,
    /// When set, intensity `0..=100` is rescaled to `0..=intensity_max`.
    pub intensity_max: Option<u32>,
}

impl Default for TranslationTable {
    fn default() -> Self {
        let symbols = [("off", 0), ("low", 64), ("medium", 128), ("high", 255)]
            .into_iter()
            .map(|(symbol, value)| (symbol.to_string(), serde_json::Value::from(value)))
            .collect();
        Self {
            symbols,
            keys: HashMap::new(),
            intensity_max: None,
        }
    }
}

impl TranslationTable {
    /// A table that maps nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            symbols: HashMap::new(),
            keys: HashMap::new(),
            intensity_max: None,
        }
    }

    #[must_use]
    pub fn with_symbol(
        mut self,
        symbol: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.symbols.insert(symbol.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_key_symbol(
        mut self,
        key: impl Into<String>,
        symbol: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.keys
            .entry(key.into())
            .or_default()
            .insert(symbol.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_intensity_max(mut self, max: u32) -> Self {
        self.intensity_max = Some(max);
        self
    }

    /// Translate a single parameter value.
    #[must_use]
    pub fn translate_value(&self, key: &str, value: &serde_json::Value) -> serde_json::Value {
        let Some(symbol) = value.as_str() else {
            return value.clone();
        };
        self.keys
            .get(key)
            .and_then(|table| table.get(symbol))
            .or_else(|| self.symbols.get(symbol))
            .cloned()
            .unwrap_or_else(|| value.clone())
    }

    #[must_use]
    pub fn translate_parameters(&self, parameters: &Parameters) -> Parameters {
        parameters
            .iter()
            .map(|(key, value)| (key.clone(), self.translate_value(key, value)))
            .collect()
    }

    /// Rescale an intensity when [`intensity_max`](Self::intensity_max) is set.
    #[must_use]
    pub fn translate_intensity(&self, intensity: i32) -> i64 {
        let intensity = i64::from(intensity);
        match self.intensity_max {
            Some(max) => (intensity.max(0) * i64::from(max)) / 100,
            None => intensity,
        }
    }

    /// Build the full driver parameter map for `effect`.
    ///
    /// Translated free-form parameters plus `intensity`, `duration_ms` and
    /// `location`. The reserved keys overwrite same-named free-form ones.
    #[must_use]
    pub fn command_params(&self, effect: &Effect) -> Parameters {
        let mut params = self.translate_parameters(effect.parameters());
        params.insert(
            INTENSITY_KEY.to_string(),
            self.translate_intensity(effect.intensity()).into(),
        );
        params.insert(DURATION_KEY.to_string(), effect.duration_ms().into());
        params.insert(
            LOCATION_KEY.to_string(),
            effect.location().to_string().into(),
        );
        params
    }
}
