pub mod helpers;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ssrando_game::{AreaId, EventId, GameData, ItemCount, ItemId, LocationId};

use crate::helpers::{check_option, is_trick_enabled};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

/// Static randomizer settings, keyed by option name (e.g. "logic-mode").
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    values: BTreeMap<String, OptionValue>,
}

impl Options {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: &str, value: OptionValue) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn with(mut self, name: &str, value: OptionValue) -> Self {
        self.set(name, value);
        self
    }
}

// Options resolved against the names interned in GameData, so that evaluation only
// needs to index into these vectors.
#[derive(Clone, Debug)]
pub struct LogicConfig {
    pub tricks: Vec<bool>,        // Corresponds to GameData.trick_isv
    pub option_checks: Vec<bool>, // Corresponds to GameData.option_check_isv
}

impl LogicConfig {
    pub fn new(options: &Options, game_data: &GameData) -> Self {
        LogicConfig {
            tricks: game_data
                .trick_isv
                .keys
                .iter()
                .map(|trick| is_trick_enabled(options, trick))
                .collect(),
            option_checks: game_data
                .option_check_isv
                .keys
                .iter()
                .map(|check| check_option(check, options))
                .collect(),
        }
    }
}

/// Mutable logic state for a single exploration or fill attempt.
#[derive(Clone)]
pub struct LogicState<'a> {
    pub game_data: &'a GameData,
    pub config: &'a LogicConfig,
    pub items: Vec<ItemCount>, // Corresponds to GameData.item_isv
    pub events: Vec<bool>,     // Corresponds to GameData.event_isv
    pub areas: Vec<bool>,      // Corresponds to GameData.areas
    pub collected_locations: Vec<bool>, // Corresponds to GameData.location_isv: placed item taken
}

impl<'a> LogicState<'a> {
    pub fn new(game_data: &'a GameData, config: &'a LogicConfig) -> Self {
        LogicState {
            game_data,
            config,
            items: vec![0; game_data.item_isv.len()],
            events: vec![false; game_data.event_isv.len()],
            areas: vec![false; game_data.areas.len()],
            collected_locations: vec![false; game_data.location_isv.len()],
        }
    }

    pub fn collect_item(&mut self, item_id: ItemId) {
        self.items[item_id] += 1;
    }

    /// Returns false for names that no requirement refers to; owning those changes nothing.
    pub fn collect_item_name(&mut self, name: &str) -> bool {
        match self.game_data.item_id(name) {
            Some(item_id) => {
                self.collect_item(item_id);
                true
            }
            None => false,
        }
    }

    pub fn collect_event(&mut self, event_id: EventId) -> bool {
        !std::mem::replace(&mut self.events[event_id], true)
    }

    pub fn collect_area(&mut self, area_id: AreaId) -> bool {
        !std::mem::replace(&mut self.areas[area_id], true)
    }

    /// Marks the item at `location_id` as taken; false if it already was.
    pub fn collect_location(&mut self, location_id: LocationId) -> bool {
        !std::mem::replace(&mut self.collected_locations[location_id], true)
    }

    pub fn item_count(&self, item_id: ItemId) -> ItemCount {
        self.items[item_id]
    }

    pub fn has_event(&self, event_id: EventId) -> bool {
        self.events[event_id]
    }

    pub fn has_area(&self, area_id: AreaId) -> bool {
        self.areas[area_id]
    }

    pub fn num_areas(&self) -> usize {
        self.areas.iter().filter(|&&x| x).count()
    }

    pub fn num_events(&self) -> usize {
        self.events.iter().filter(|&&x| x).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssrando_game::GameData;

    #[test]
    fn test_options_from_json() {
        let options: Options = serde_json::from_str(
            r#"{"logic-mode": "BiTless", "hero-mode": true, "max-batreaux-reward": 80,
                "enabled-tricks-bitless": ["Stuttersprint"]}"#,
        )
        .unwrap();
        assert_eq!(
            options.get("logic-mode"),
            Some(&OptionValue::Str("BiTless".to_string()))
        );
        assert_eq!(options.get("hero-mode"), Some(&OptionValue::Bool(true)));
        assert_eq!(options.get("max-batreaux-reward"), Some(&OptionValue::Int(80)));
        assert_eq!(
            options.get("enabled-tricks-bitless"),
            Some(&OptionValue::List(vec!["Stuttersprint".to_string()]))
        );
        assert_eq!(options.get("missing"), None);
    }

    #[test]
    fn test_logic_config() {
        let mut game_data = GameData::new(&["Bow"]);
        game_data
            .parse_and_compile("Stuttersprint Trick | Brakeslide Trick | Option \"hero-mode\" Enabled")
            .unwrap();
        let options = Options::default()
            .with("hero-mode", OptionValue::Bool(true))
            .with(
                "enabled-tricks-glitched",
                OptionValue::List(vec!["Brakeslide".to_string()]),
            );
        let config = LogicConfig::new(&options, &game_data);
        assert_eq!(config.tricks, vec![false, true]);
        assert_eq!(config.option_checks, vec![true]);
    }

    #[test]
    fn test_collect() {
        let mut game_data = GameData::new(&["Bow"]);
        game_data.parse_and_compile("Bow x2").unwrap();
        let config = LogicConfig::new(&Options::default(), &game_data);
        let mut state = LogicState::new(&game_data, &config);
        assert!(state.collect_item_name("Bow"));
        assert!(state.collect_item_name("Bow"));
        assert!(!state.collect_item_name("Rupoor"));
        assert_eq!(state.item_count(0), 2);
        assert_eq!(state.num_areas(), 0);
        assert_eq!(state.num_events(), 0);
    }
}
