//! Factory presets bundled with the library.
//!
//! Embedded as TOML text so they go through the same parser (and the same
//! clamping) as presets loaded from disk.

use crate::Preset;

/// Names of all factory presets, in display order.
pub static FACTORY_PRESET_NAMES: &[&str] = &["clean", "warm", "hot", "dusty"];

const CLEAN: &str = r#"
name = "clean"
description = "Tape EQ and gentle level, no added saturation or hiss"

[params]
saturation = 0.0
drive = 1.0
mix = 100.0
hiss = 0.0
"#;

const WARM: &str = r#"
name = "warm"
description = "Light saturation blended under the dry signal"

[params]
saturation = 35.0
drive = 3.0
mix = 60.0
hiss = 5.0
"#;

const HOT: &str = r#"
name = "hot"
description = "Driven hard into the shaper and compressor"

[params]
saturation = 80.0
drive = 7.0
mix = 100.0
hiss = 10.0
"#;

const DUSTY: &str = r#"
name = "dusty"
description = "Worn tape with an audible hiss bed"

[params]
saturation = 50.0
drive = 4.0
mix = 80.0
hiss = 60.0
"#;

const FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("clean", CLEAN),
    ("warm", WARM),
    ("hot", HOT),
    ("dusty", DUSTY),
];

/// All factory presets, parsed.
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Preset::from_toml(toml).ok())
        .collect()
}

/// Look up a factory preset by name, case-insensitively.
pub fn get_factory_preset(name: &str) -> Option<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .find(|(preset_name, _)| preset_name.eq_ignore_ascii_case(name.trim()))
        .and_then(|(_, toml)| Preset::from_toml(toml).ok())
}

/// Whether `name` refers to a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    FACTORY_PRESET_NAMES
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name.trim()))
}
