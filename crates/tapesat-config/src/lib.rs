//! Preset persistence for the tapesat pipeline.
//!
//! A [`Preset`] is a named [`ParameterSnapshot`](tapesat_effects::ParameterSnapshot)
//! stored as TOML. This crate loads and saves presets, resolves them against
//! the parameter ranges, and ships a handful of factory presets.
//!
//! # Example
//!
//! ```rust,no_run
//! use tapesat_config::{Preset, get_factory_preset, user_presets_dir};
//! use tapesat_effects::ParamStore;
//!
//! let store = ParamStore::new();
//! let warm = get_factory_preset("warm").unwrap();
//! warm.apply_to(&store).unwrap();
//!
//! let mine = Preset::from_snapshot("mine", &store.snapshot())
//!     .with_description("warm with a bit more drive");
//! mine.save(user_presets_dir().join("mine.toml")).unwrap();
//! ```

mod error;
mod preset;

/// Factory presets bundled with the library.
pub mod factory_presets;

/// Platform-specific preset locations.
#[cfg(feature = "std")]
pub mod paths;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_presets, get_factory_preset, is_factory_preset,
};
#[cfg(feature = "std")]
pub use paths::{find_preset, user_presets_dir};
pub use preset::Preset;

/// Resolve a preset by factory name, file path, or user preset name.
///
/// Factory names win over files of the same name.
#[cfg(feature = "std")]
pub fn resolve_preset(name: &str) -> Result<Preset, ConfigError> {
    if let Some(preset) = get_factory_preset(name) {
        return Ok(preset);
    }
    match find_preset(name) {
        Some(path) => Preset::load(path),
        None => Err(ConfigError::PresetNotFound(name.to_string())),
    }
}
