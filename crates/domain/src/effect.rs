//! Effect: one sensory output request (vibration, light, wind, scent, …).
//!
//! An [`Effect`] is immutable once built: fields are private and only
//! readable through accessors, so a validated effect stays valid while it
//! travels from an ingress adapter through the router or a timeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EffectHubError, ValidationError};

/// Free-form effect parameters (color, pattern, …).
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Where around the audience an effect is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Left,
    Right,
    Center,
    #[default]
    Everywhere,
}

impl Location {
    /// Whether a device placed at `self` should render an effect aimed at `target`.
    ///
    /// `Everywhere` on either side always matches.
    #[must_use]
    pub fn covers(self, target: Location) -> bool {
        self == Self::Everywhere || target == Self::Everywhere || self == target
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
            Self::Center => f.write_str("center"),
            Self::Everywhere => f.write_str("everywhere"),
        }
    }
}

impl FromStr for Location {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "center" | "centre" => Ok(Self::Center),
            "everywhere" | "all" => Ok(Self::Everywhere),
            _ => Err(ValidationError::UnknownLocation(s.to_string())),
        }
    }
}

/// One instance of a sensory effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EffectRepr", into = "EffectRepr")]
pub struct Effect {
    effect_type: String,
    timestamp_ms: i64,
    duration_ms: i64,
    intensity: i32,
    location: Location,
    parameters: Parameters,
}

impl Effect {
    /// Create a builder for constructing an [`Effect`].
    #[must_use]
    pub fn builder() -> EffectBuilder {
        EffectBuilder::default()
    }

    /// Effect vocabulary word, e.g. `"light"` or `"vibration"`.
    #[must_use]
    pub fn effect_type(&self) -> &str {
        &self.effect_type
    }

    /// Offset from the start of a timeline. Ignored for direct dispatch.
    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    /// Requested intensity, nominally `0..=100`. Range enforcement belongs
    /// to the driver.
    #[must_use]
    pub fn intensity(&self) -> i32 {
        self.intensity
    }

    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Look up a single parameter.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&serde_json::Value> {
        self.parameters.get(key)
    }

    fn validate(&self) -> Result<(), EffectHubError> {
        if self.effect_type.trim().is_empty() {
            return Err(ValidationError::EmptyEffectType.into());
        }
        if self.duration_ms < 0 {
            return Err(ValidationError::NegativeDuration(self.duration_ms).into());
        }
        if self.timestamp_ms < 0 {
            return Err(ValidationError::NegativeTimestamp(self.timestamp_ms).into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Effect`].
#[derive(Debug, Default)]
pub struct EffectBuilder {
    effect_type: Option<String>,
    timestamp_ms: i64,
    duration_ms: i64,
    intensity: i32,
    location: Location,
    parameters: Parameters,
}

impl EffectBuilder {
    #[must_use]
    pub fn effect_type(mut self, effect_type: impl Into<String>) -> Self {
        self.effect_type = Some(effect_type.into());
        self
    }

    #[must_use]
    pub fn timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    #[must_use]
    pub fn duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[must_use]
    pub fn intensity(mut self, intensity: i32) -> Self {
        self.intensity = intensity;
        self
    }

    #[must_use]
    pub fn location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Consume the builder, validate, and return an [`Effect`].
    ///
    /// # Errors
    ///
    /// Returns [`EffectHubError::Validation`] when the effect type is
    /// missing or blank, or when duration or timestamp is negative.
    pub fn build(self) -> Result<Effect, EffectHubError> {
        let effect = Effect {
            effect_type: self.effect_type.unwrap_or_default(),
            timestamp_ms: self.timestamp_ms,
            duration_ms: self.duration_ms,
            intensity: self.intensity,
            location: self.location,
            parameters: self.parameters,
        };
        effect.validate()?;
        Ok(effect)
    }
}

/// Wire shape used by serde so that deserialised effects go through validation.
#[derive(Serialize, Deserialize)]
struct EffectRepr {
    effect_type: String,
    #[serde(default)]
    timestamp_ms: i64,
    #[serde(default)]
    duration_ms: i64,
    #[serde(default)]
    intensity: i32,
    #[serde(default)]
    location: Location,
    #[serde(default)]
    parameters: Parameters,
}

impl TryFrom<EffectRepr> for Effect {
    type Error = EffectHubError;

    fn try_from(repr: EffectRepr) -> Result<Self, Self::Error> {
        Effect::builder()
            .effect_type(repr.effect_type)
            .timestamp_ms(repr.timestamp_ms)
            .duration_ms(repr.duration_ms)
            .intensity(repr.intensity)
            .location(repr.location)
            .parameters(repr.parameters)
            .build()
    }
}

impl From<Effect> for EffectRepr {
    fn from(effect: Effect) -> Self {
        Self {
            effect_type: effect.effect_type,
            timestamp_ms: effect.timestamp_ms,
            duration_ms: effect.duration_ms,
            intensity: effect.intensity,
            location: effect.location,
            parameters: effect.parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_effect_with_defaults() {
        let effect = Effect::builder().effect_type("light").build().unwrap();
        assert_eq!(effect.effect_type(), "light");
        assert_eq!(effect.duration_ms(), 0);
        assert_eq!(effect.location(), Location::Everywhere);
        assert!(effect.parameters().is_empty());
    }

    #[test]
    fn should_reject_missing_effect_type() {
        let result = Effect::builder().intensity(10).build();
        assert!(matches!(
            result,
            Err(EffectHubError::Validation(ValidationError::EmptyEffectType))
        ));
    }

    #[test]
    fn should_reject_negative_duration() {
        let result = Effect::builder()
            .effect_type("wind")
            .duration_ms(-1)
            .build();
        assert!(matches!(
            result,
            Err(EffectHubError::Validation(ValidationError::NegativeDuration(
                -1
            )))
        ));
    }

    #[test]
    fn should_store_named_parameters() {
        let effect = Effect::builder()
            .effect_type("light")
            .parameter("color", "red")
            .parameter("pattern", "pulse")
            .build()
            .unwrap();
        assert_eq!(effect.parameter("color"), Some(&serde_json::json!("red")));
        assert_eq!(effect.parameters().len(), 2);
    }

    #[test]
    fn should_validate_when_deserializing() {
        let result: Result<Effect, _> =
            serde_json::from_str(r#"{"effect_type": "", "duration_ms": 10}"#);
        assert!(result.is_err());
    }

    #[test]
    fn should_deserialize_with_optional_fields_missing() {
        let effect: Effect = serde_json::from_str(
            r#"{"effect_type": "vibration", "intensity": 80, "location": "left"}"#,
        )
        .unwrap();
        assert_eq!(effect.intensity(), 80);
        assert_eq!(effect.location(), Location::Left);
    }

    #[test]
    fn should_parse_location_case_insensitively() {
        assert_eq!("Center".parse::<Location>().unwrap(), Location::Center);
        assert!("up".parse::<Location>().is_err());
    }

    #[test]
    fn should_cover_everything_from_everywhere() {
        assert!(Location::Everywhere.covers(Location::Left));
        assert!(Location::Left.covers(Location::Everywhere));
        assert!(Location::Left.covers(Location::Left));
        assert!(!Location::Left.covers(Location::Right));
    }
}
