//! Preset definition and TOML persistence.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tapesat_effects::{ParamId, ParamStore, ParameterSnapshot};

use crate::ConfigError;

/// A named set of pipeline parameter values.
///
/// On disk a preset is a small TOML document:
///
/// ```toml
/// name = "Warm"
/// description = "Gentle glue"
///
/// [params]
/// saturation = 35.0
/// drive = 3.0
/// mix = 60.0
/// hiss = 5.0
/// ```
///
/// Parameters missing from `[params]` take their defaults. Keys are matched
/// case-insensitively; a key that names no parameter is rejected. Values
/// outside a parameter's range are clamped when the preset is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Preset name
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameter values keyed by lowercase parameter name
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
}

fn param_key(id: ParamId) -> String {
    id.name().to_ascii_lowercase()
}

impl Preset {
    /// Create a new empty preset. Every parameter resolves to its default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: BTreeMap::new(),
        }
    }

    /// Capture every parameter of `snapshot`.
    pub fn from_snapshot(name: impl Into<String>, snapshot: &ParameterSnapshot) -> Self {
        let params = snapshot
            .clamped()
            .iter()
            .map(|(id, value)| (param_key(id), value))
            .collect();
        Self {
            name: name.into(),
            description: None,
            params,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set one parameter, clamped to its range.
    pub fn with_param(mut self, id: ParamId, value: f32) -> Self {
        self.params.insert(param_key(id), id.clamp(value));
        self
    }

    /// Resolve the preset into a full parameter snapshot.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownParameter`] for a key that names no parameter,
    /// [`ConfigError::NonFiniteValue`] for NaN or infinite values.
    pub fn snapshot(&self) -> Result<ParameterSnapshot, ConfigError> {
        let mut snapshot = ParameterSnapshot::default();
        for (key, &value) in &self.params {
            let id: ParamId = key.parse()?;
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteValue {
                    param: key.clone(),
                    value,
                });
            }
            snapshot.set(id, value);
        }
        Ok(snapshot)
    }

    /// Push every parameter into a live store.
    pub fn apply_to(&self, store: &ParamStore) -> Result<(), ConfigError> {
        store.apply_snapshot(&self.snapshot()?);
        Ok(())
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a preset from a TOML string.
    ///
    /// Keys are canonicalized to lowercase and values clamped to range.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let raw: Preset = toml::from_str(s)?;
        let mut params = BTreeMap::new();
        for (key, value) in &raw.params {
            let id: ParamId = key.parse()?;
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteValue {
                    param: key.clone(),
                    value: *value,
                });
            }
            params.insert(param_key(id), id.clamp(*value));
        }
        Ok(Self { params, ..raw })
    }

    /// Save the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Serialize the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_preset_resolves_to_defaults() {
        let preset = Preset::new("Empty");
        assert_eq!(preset.snapshot().unwrap(), ParameterSnapshot::default());
    }

    #[test]
    fn parse_full_preset() {
        let preset = Preset::from_toml(
            r#"
            name = "Warm"
            description = "Gentle glue"

            [params]
            saturation = 35.0
            drive = 3
            mix = 60.0
            hiss = 5.0
            "#,
        )
        .unwrap();

        assert_eq!(preset.name, "Warm");
        assert_eq!(preset.description.as_deref(), Some("Gentle glue"));
        let snapshot = preset.snapshot().unwrap();
        assert_eq!(snapshot.saturation, 35.0);
        assert_eq!(snapshot.drive, 3.0);
        assert_eq!(snapshot.mix, 60.0);
        assert_eq!(snapshot.hiss, 5.0);
    }

    #[test]
    fn keys_are_case_insensitive_and_canonicalized() {
        let preset = Preset::from_toml(
            r#"
            name = "Caps"
            [params]
            Drive = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(preset.params.get("drive"), Some(&4.0));
        assert!(!preset.params.contains_key("Drive"));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let preset = Preset::from_toml(
            r#"
            name = "Loud"
            [params]
            drive = 25.0
            hiss = -10.0
            "#,
        )
        .unwrap();
        assert_eq!(preset.params["drive"], 10.0);
        assert_eq!(preset.params["hiss"], 0.0);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = Preset::from_toml(
            r#"
            name = "Typo"
            [params]
            satuation = 20.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownParameter(_)));
        assert!(err.to_string().contains("satuation"));
    }

    #[test]
    fn non_finite_value_is_rejected() {
        let err = Preset::from_toml(
            r#"
            name = "Nan"
            [params]
            mix = nan
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteValue { .. }));
    }

    #[test]
    fn missing_name_is_a_parse_error() {
        let err = Preset::from_toml("[params]\ndrive = 2.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn snapshot_round_trip() {
        let original = ParameterSnapshot {
            saturation: 42.0,
            drive: 6.5,
            mix: 80.0,
            hiss: 12.0,
        };
        let preset = Preset::from_snapshot("Round", &original);
        let text = preset.to_toml().unwrap();
        let reparsed = Preset::from_toml(&text).unwrap();
        assert_eq!(reparsed, preset);
        assert_eq!(reparsed.snapshot().unwrap(), original);
    }

    #[test]
    fn description_is_omitted_when_absent() {
        let text = Preset::new("Bare").to_toml().unwrap();
        assert!(!text.contains("description"));
    }

    #[test]
    fn with_param_clamps() {
        let preset = Preset::new("Builder").with_param(ParamId::Mix, 150.0);
        assert_eq!(preset.params["mix"], 100.0);
    }

    #[test]
    fn apply_to_store() {
        let store = ParamStore::new();
        Preset::new("Hot")
            .with_param(ParamId::Drive, 7.0)
            .with_param(ParamId::Saturation, 80.0)
            .apply_to(&store)
            .unwrap();
        assert_eq!(store.get(ParamId::Drive), 7.0);
        assert_eq!(store.get(ParamId::Saturation), 80.0);
        assert_eq!(store.get(ParamId::Mix), 0.0);
    }
}
