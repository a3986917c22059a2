use std::path::Path;

use anyhow::{Context, Result};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use ssrando_game::AreaKey;
use ssrando_logic::Options;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RandomizerSettings {
    #[serde(default)]
    pub options: Options,
    pub start_area: AreaKey,
    #[serde(default)]
    pub start_events: Vec<String>,
    pub item_pool: Vec<String>,
    // Items treated as owned throughout, without being placed
    #[serde(default)]
    pub assumed_items: Vec<String>,
    // "Region - Check" -> item
    #[serde(default)]
    pub prefilled: HashMap<String, String>,
    // Defaults to every location that is not pre-filled
    #[serde(default)]
    pub location_pool: Option<Vec<String>>,
    #[serde(default)]
    pub hint_ban_prefilled: bool,
    #[serde(default)]
    pub max_attempts: Option<usize>,
}

pub fn parse_randomizer_settings(settings_json: &str) -> Result<RandomizerSettings> {
    let mut des = serde_json::Deserializer::from_str(settings_json);
    let settings = serde_path_to_error::deserialize(&mut des)?;
    Ok(settings)
}

pub fn load_randomizer_settings(path: &Path) -> Result<RandomizerSettings> {
    let settings_str = std::fs::read_to_string(path)
        .with_context(|| format!("Unable to read settings at {}", path.display()))?;
    parse_randomizer_settings(&settings_str)
        .with_context(|| format!("Unable to parse settings at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssrando_logic::OptionValue;

    #[test]
    fn test_parse_settings() {
        let settings = parse_randomizer_settings(
            r#"{
                "options": {"logic-mode": "BiTless", "enabled-tricks-bitless": []},
                "start_area": {"stage": "Knight Academy", "area": "Main"},
                "start_events": ["Sealed Grounds Statue"],
                "item_pool": ["Clawshots", "Bow"],
                "prefilled": {"Skyloft - Chest": "Progressive Sword"}
            }"#,
        )
        .unwrap();
        assert_eq!(settings.start_area, AreaKey::new("Knight Academy", "Main"));
        assert_eq!(
            settings.options.get("logic-mode"),
            Some(&OptionValue::Str("BiTless".to_string()))
        );
        assert_eq!(settings.prefilled["Skyloft - Chest"], "Progressive Sword");
        assert!(settings.assumed_items.is_empty());
        assert_eq!(settings.location_pool, None);
        assert!(!settings.hint_ban_prefilled);
    }

    #[test]
    fn test_parse_settings_error_path() {
        let err = parse_randomizer_settings(
            r#"{"start_area": {"stage": "Knight Academy", "area": 5}, "item_pool": []}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("start_area.area"), "{err}");
    }
}
