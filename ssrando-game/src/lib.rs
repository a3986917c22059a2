pub mod requirement;

pub use requirement::{
    Expr, OptionCheck, OptionCheckKind, Requirement, RequirementError, parse_option_check,
    parse_requirement,
};

use anyhow::{Context, Result, bail, ensure};
use hashbrown::HashMap;
use json::{self, JsonValue};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, ToOwned};
use std::fmt::{self, Display, Formatter};
use std::hash::Hash;
use std::path::Path;
use std::str::FromStr;
use strum::VariantNames;
use strum_macros::{EnumString, VariantNames};

pub type ItemId = usize; // Index into GameData.item_isv.keys: known item names first, then names only used with a count
pub type ItemCount = u32;
pub type EventId = usize; // Index into GameData.event_isv.keys: distinct event names across all areas
pub type TrickId = usize; // Index into GameData.trick_isv.keys
pub type OptionCheckId = usize; // Index into GameData.option_check_isv.keys: distinct option checks
pub type RawRefId = usize; // Index into GameData.raw_isv.keys: names left for resolution at evaluation time
pub type MacroId = usize; // Index into GameData.macro_isv.keys, in declaration order
pub type AreaId = usize; // Index into GameData.areas
pub type LocationId = usize; // Index into GameData.location_isv.keys

const REGION_KEYS: [&str; 2] = ["stages", "force-tod"];
const STAGE_KEYS: [&str; 4] = ["areas", "force-tod", "can-sleep", "stage"];
const AREA_KEYS: [&str; 7] = [
    "macros",
    "locations",
    "events",
    "force-tod",
    "map-exits",
    "logic-exits",
    "can-sleep",
];

#[derive(Clone, Debug)]
pub struct IndexedVec<T: Hash + Eq> {
    pub keys: Vec<T>,
    pub index_by_key: HashMap<T, usize>,
}

impl<T: Hash + Eq> Default for IndexedVec<T> {
    fn default() -> Self {
        IndexedVec {
            keys: vec![],
            index_by_key: HashMap::new(),
        }
    }
}

impl<T: Hash + Eq> IndexedVec<T> {
    pub fn add<U: ToOwned<Owned = T> + ?Sized>(&mut self, name: &U) -> usize {
        let key = name.to_owned();
        if let Some(&idx) = self.index_by_key.get(&key) {
            return idx;
        }
        let idx = self.keys.len();
        self.index_by_key.insert(name.to_owned(), idx);
        self.keys.push(key);
        idx
    }

    pub fn get<Q: Hash + Eq + ?Sized>(&self, key: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
    {
        self.index_by_key.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Areas are only unique within a stage (e.g. many stages have a "Main" area).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaKey {
    pub stage: String,
    pub area: String,
}

impl AreaKey {
    pub fn new(stage: &str, area: &str) -> Self {
        AreaKey {
            stage: stage.to_owned(),
            area: area.to_owned(),
        }
    }
}

impl Display for AreaKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} - {}", self.stage, self.area)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationKey {
    pub region: String,
    pub check: String,
}

impl LocationKey {
    pub fn new(region: &str, check: &str) -> Self {
        LocationKey {
            region: region.to_owned(),
            check: check.to_owned(),
        }
    }
}

impl Display for LocationKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} - {}", self.region, self.check)
    }
}

impl FromStr for LocationKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((region, check)) = s.split_once(" - ") else {
            bail!("Bad location name (expected \"Region - Check\"): {s}");
        };
        Ok(LocationKey::new(region, check))
    }
}

/// Exit descriptor; the disambiguation tells apart several exits between the same two areas.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Passageway {
    pub area_key: AreaKey,
    pub disambiguation: Option<String>,
}

impl Display for Passageway {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.disambiguation {
            Some(d) => write!(f, "{} ({})", self.area_key, d),
            None => write!(f, "{}", self.area_key),
        }
    }
}

pub fn parse_map_exit(map_exit: &str) -> Result<Passageway> {
    let Some((stage, area)) = map_exit.split_once(" - ") else {
        bail!("Bad map exit: {map_exit}");
    };
    let (area, disambiguation) = match area
        .strip_suffix(')')
        .and_then(|x| x.rsplit_once(" ("))
    {
        Some((area, disambiguation)) => (area, Some(disambiguation.to_owned())),
        None => (area, None),
    };
    Ok(Passageway {
        area_key: AreaKey::new(stage, area),
        disambiguation,
    })
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, EnumString, VariantNames, Serialize, Deserialize,
)]
pub enum ForceTod {
    #[default]
    Both,
    Day,
    Night,
}

#[derive(Clone, Debug)]
pub struct MapExit {
    pub passageway: Passageway,
    pub to_area_id: Option<AreaId>, // None if the target area does not exist (see GameData.logic_gaps)
    pub requirement: Requirement,
}

#[derive(Clone, Debug)]
pub struct LogicExit {
    pub area_key: AreaKey,
    pub to_area_id: Option<AreaId>,
    pub requirement: Requirement,
}

#[derive(Clone, Debug)]
pub struct Area {
    pub region: String,
    pub stage: String,
    pub name: String,
    pub force_tod: ForceTod,
    pub can_sleep: bool,
    pub locations: Vec<(LocationId, Requirement)>,
    pub events: Vec<(EventId, Requirement)>,
    pub map_exits: Vec<MapExit>,
    pub logic_exits: Vec<LogicExit>,
}

impl Area {
    pub fn key(&self) -> AreaKey {
        AreaKey::new(&self.stage, &self.name)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRefTarget {
    pub event_id: Option<EventId>,
    pub macro_id: Option<MacroId>,
}

/// Problems in incompletely authored logic. These are reported but do not reject the data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogicGap {
    MissingLogicExit { from: AreaKey, to: AreaKey },
    MissingMapExit { from: AreaKey, to: Passageway },
    UnresolvedReference { name: String },
}

impl Display for LogicGap {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LogicGap::MissingLogicExit { from, to } => {
                write!(f, "logic exit not found: {from} -> {to}")
            }
            LogicGap::MissingMapExit { from, to } => {
                write!(f, "map exit not found: {from} -> {to}")
            }
            LogicGap::UnresolvedReference { name } => {
                write!(f, "{name} is neither an event nor a macro")
            }
        }
    }
}

// Compiled logic: the area graph plus every name interned while compiling it.
// Read-only once loading has finished.
#[derive(Default, Clone, Debug)]
pub struct GameData {
    pub item_isv: IndexedVec<String>,
    pub num_known_items: usize,
    pub event_isv: IndexedVec<String>,
    pub trick_isv: IndexedVec<String>,
    pub option_check_isv: IndexedVec<OptionCheck>,
    pub raw_isv: IndexedVec<String>,
    pub raw_targets: Vec<RawRefTarget>, // Corresponds to raw_isv, filled in by `finish`
    pub macro_isv: IndexedVec<String>,
    pub macros: Vec<Requirement>,
    pub area_isv: IndexedVec<AreaKey>,
    pub areas: Vec<Area>,
    pub location_isv: IndexedVec<LocationKey>,
    pub location_slot: Vec<(AreaId, usize)>, // (owning area, index into Area.locations)
    pub location_types: Vec<Vec<String>>, // Corresponds to location_isv, e.g. ["Goddess Chests"]
    pub logic_gaps: Vec<LogicGap>,
}

fn read_json(path: &Path) -> Result<JsonValue> {
    let json_str = std::fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    let json_data =
        json::parse(&json_str).with_context(|| format!("unable to parse {}", path.display()))?;
    Ok(json_data)
}

fn check_keys(json_value: &JsonValue, allowed: &[&str], what: &str) -> Result<()> {
    ensure!(json_value.is_object(), "{what}: expected an object");
    for (key, _) in json_value.entries() {
        if !allowed.contains(&key) {
            bail!("{what}: unexpected key \"{key}\"");
        }
    }
    Ok(())
}

fn parse_force_tod(value: &JsonValue, default: ForceTod) -> Result<ForceTod> {
    if value.is_null() {
        return Ok(default);
    }
    let s = value.as_str().context("expected a string for force-tod")?;
    ForceTod::from_str(s).with_context(|| {
        format!(
            "Unrecognized force-tod: {s} (expected one of {:?})",
            ForceTod::VARIANTS
        )
    })
}

fn parse_can_sleep(value: &JsonValue, default: bool) -> Result<bool> {
    if value.is_null() {
        return Ok(default);
    }
    value.as_bool().context("expected a boolean for can-sleep")
}

// Area sections may be left out, but when present must be name -> requirement maps.
fn section<'a>(area_json: &'a JsonValue, key: &str) -> Result<json::iterators::Entries<'a>> {
    let value = &area_json[key];
    ensure!(
        value.is_null() || value.is_object(),
        "{key}: expected an object"
    );
    Ok(value.entries())
}

fn requirement_str<'a>(value: &'a JsonValue, what: &dyn Display) -> Result<&'a str> {
    value
        .as_str()
        .with_context(|| format!("{what}: expected a requirement string"))
}

impl GameData {
    /// Starts an empty graph whose item vocabulary is `items`.
    pub fn new<S: AsRef<str>>(items: &[S]) -> Self {
        let mut game_data = GameData::default();
        for item in items {
            game_data.item_isv.add(item.as_ref());
        }
        game_data.num_known_items = game_data.item_isv.len();
        game_data
    }

    /// Loads `items.json`, `macros.json` and `areas/*.json` from a logic data directory,
    /// plus the check types in `checks.json` if there is one.
    pub fn load(data_path: &Path) -> Result<GameData> {
        let items_json = read_json(&data_path.join("items.json"))?;
        let macros_json = read_json(&data_path.join("macros.json"))?;
        let area_pattern = data_path.join("areas").join("*.json");
        let area_pattern = area_pattern
            .to_str()
            .context("non-UTF-8 data path")?
            .to_owned();
        let mut area_paths = vec![];
        for entry in glob::glob(&area_pattern)? {
            area_paths.push(entry?);
        }
        area_paths.sort();
        let mut area_docs = vec![];
        for path in &area_paths {
            info!("parsing {}", path.display());
            area_docs.push(read_json(path)?);
        }
        let mut game_data = GameData::from_json(&items_json, &macros_json, &area_docs)
            .with_context(|| format!("unable to load logic from {}", data_path.display()))?;
        let checks_path = data_path.join("checks.json");
        if checks_path.exists() {
            game_data.add_check_types(&read_json(&checks_path)?)?;
        }
        Ok(game_data)
    }

    pub fn from_json(
        items_json: &JsonValue,
        macros_json: &JsonValue,
        area_docs: &[JsonValue],
    ) -> Result<GameData> {
        ensure!(items_json.is_array(), "items: expected an array");
        let mut items: Vec<&str> = vec![];
        for item in items_json.members() {
            items.push(item.as_str().context("items: expected strings")?);
        }
        let mut game_data = GameData::new(&items);
        game_data.add_macros(macros_json)?;
        for doc in area_docs {
            game_data.add_regions(doc)?;
        }
        game_data.finish()?;
        Ok(game_data)
    }

    /// Macros are compiled in declaration order, so a macro may only inline earlier ones.
    pub fn add_macros(&mut self, macros_json: &JsonValue) -> Result<()> {
        ensure!(macros_json.is_object(), "macros: expected an object");
        for (name, value) in macros_json.entries() {
            self.add_macro(name, value)?;
        }
        Ok(())
    }

    fn add_macro(&mut self, name: &str, value: &JsonValue) -> Result<()> {
        if self.macro_isv.get(name).is_some() {
            return Err(RequirementError::DuplicateKey {
                kind: "macro",
                name: name.to_owned(),
            }
            .into());
        }
        let text = requirement_str(value, &format!("macro {name}"))?;
        let req = self
            .parse_and_compile(text)
            .with_context(|| format!("Processing macro {name}"))?;
        self.macro_isv.add(name);
        self.macros.push(req);
        Ok(())
    }

    /// Reads `{"Region - Check": {"type": ["Type", ...]}, ...}`. Checks left out have no types.
    pub fn add_check_types(&mut self, checks_json: &JsonValue) -> Result<()> {
        ensure!(checks_json.is_object(), "checks: expected an object");
        for (name, check_json) in checks_json.entries() {
            let key: LocationKey = name.parse()?;
            let Some(location_id) = self.location_isv.get(&key) else {
                bail!("checks: unknown location {name}");
            };
            check_keys(check_json, &["type"], name)?;
            ensure!(
                check_json["type"].is_array(),
                "{name}: expected a list of type names"
            );
            let mut types = vec![];
            for t in check_json["type"].members() {
                types.push(
                    t.as_str()
                        .with_context(|| format!("{name}: expected a list of type names"))?
                        .to_owned(),
                );
            }
            self.location_types[location_id] = types;
        }
        Ok(())
    }

    pub fn add_regions(&mut self, doc: &JsonValue) -> Result<()> {
        ensure!(doc.is_object(), "expected an object of regions");
        for (region_name, region_json) in doc.entries() {
            self.add_region(region_name, region_json)
                .with_context(|| format!("Processing region {region_name}"))?;
        }
        Ok(())
    }

    fn add_region(&mut self, region_name: &str, region_json: &JsonValue) -> Result<()> {
        check_keys(region_json, &REGION_KEYS, region_name)?;
        let force_tod = parse_force_tod(&region_json["force-tod"], ForceTod::Both)?;
        ensure!(
            region_json["stages"].is_object(),
            "{region_name}: expected an object of stages"
        );
        for (stage_name, stage_json) in region_json["stages"].entries() {
            check_keys(stage_json, &STAGE_KEYS, stage_name)?;
            let force_tod = parse_force_tod(&stage_json["force-tod"], force_tod)?;
            let can_sleep = parse_can_sleep(&stage_json["can-sleep"], false)?;
            ensure!(
                stage_json["areas"].is_object(),
                "{stage_name}: expected an object of areas"
            );
            for (area_name, area_json) in stage_json["areas"].entries() {
                self.add_area(
                    region_name,
                    stage_name,
                    area_name,
                    area_json,
                    force_tod,
                    can_sleep,
                )
                .with_context(|| format!("Processing area {stage_name} - {area_name}"))?;
            }
        }
        Ok(())
    }

    fn add_area(
        &mut self,
        region: &str,
        stage: &str,
        name: &str,
        area_json: &JsonValue,
        force_tod: ForceTod,
        can_sleep: bool,
    ) -> Result<()> {
        check_keys(area_json, &AREA_KEYS, name)?;
        let area_key = AreaKey::new(stage, name);
        if self.area_isv.get(&area_key).is_some() {
            return Err(RequirementError::DuplicateKey {
                kind: "area",
                name: area_key.to_string(),
            }
            .into());
        }
        let area_id = self.areas.len();

        // Area macros join the global table, ahead of the content that may use them.
        for (macro_name, value) in section(area_json, "macros")? {
            self.add_macro(macro_name, value)?;
        }

        let mut locations = vec![];
        for (check, value) in section(area_json, "locations")? {
            let location_key = LocationKey::new(region, check);
            if self.location_isv.get(&location_key).is_some() {
                return Err(RequirementError::DuplicateKey {
                    kind: "location",
                    name: location_key.to_string(),
                }
                .into());
            }
            let text = requirement_str(value, &location_key)?;
            let req = self
                .parse_and_compile(text)
                .with_context(|| format!("Processing requirement for location {location_key}"))?;
            let location_id = self.location_isv.add(&location_key);
            self.location_slot.push((area_id, locations.len()));
            self.location_types.push(vec![]);
            locations.push((location_id, req));
        }

        let mut events = vec![];
        for (event, value) in section(area_json, "events")? {
            let text = requirement_str(value, &event)?;
            let req = self
                .parse_and_compile(text)
                .with_context(|| format!("Processing requirement for event {event}"))?;
            events.push((self.event_isv.add(event), req));
        }

        let mut map_exits = vec![];
        for (exit, value) in section(area_json, "map-exits")? {
            let passageway = parse_map_exit(exit)?;
            let text = requirement_str(value, &exit)?;
            let req = self
                .parse_and_compile(text)
                .with_context(|| format!("Processing requirement for map exit {exit}"))?;
            map_exits.push(MapExit {
                passageway,
                to_area_id: None,
                requirement: req,
            });
        }

        let mut logic_exits = vec![];
        for (exit, value) in section(area_json, "logic-exits")? {
            let text = requirement_str(value, &exit)?;
            let req = self
                .parse_and_compile(text)
                .with_context(|| format!("Processing requirement for logic exit {exit}"))?;
            logic_exits.push(LogicExit {
                area_key: AreaKey::new(stage, exit),
                to_area_id: None,
                requirement: req,
            });
        }

        self.area_isv.add(&area_key);
        self.areas.push(Area {
            region: region.to_owned(),
            stage: stage.to_owned(),
            name: name.to_owned(),
            force_tod: parse_force_tod(&area_json["force-tod"], force_tod)?,
            can_sleep: parse_can_sleep(&area_json["can-sleep"], can_sleep)?,
            locations,
            events,
            map_exits,
            logic_exits,
        });
        Ok(())
    }

    /// Links exits and raw references once all content has been added.
    pub fn finish(&mut self) -> Result<()> {
        let mut gaps: Vec<LogicGap> = vec![];
        for area in &mut self.areas {
            let from = AreaKey::new(&area.stage, &area.name);
            for exit in &mut area.logic_exits {
                exit.to_area_id = self.area_isv.get(&exit.area_key);
                if exit.to_area_id.is_none() {
                    gaps.push(LogicGap::MissingLogicExit {
                        from: from.clone(),
                        to: exit.area_key.clone(),
                    });
                }
            }
            for exit in &mut area.map_exits {
                exit.to_area_id = self.area_isv.get(&exit.passageway.area_key);
                if exit.to_area_id.is_none() {
                    gaps.push(LogicGap::MissingMapExit {
                        from: from.clone(),
                        to: exit.passageway.clone(),
                    });
                }
            }
        }

        self.raw_targets = self
            .raw_isv
            .keys
            .iter()
            .map(|name| RawRefTarget {
                event_id: self.event_isv.get(name.as_str()),
                macro_id: self.macro_isv.get(name.as_str()),
            })
            .collect();
        for (name, target) in self.raw_isv.keys.iter().zip(&self.raw_targets) {
            if target.event_id.is_none() && target.macro_id.is_none() {
                gaps.push(LogicGap::UnresolvedReference { name: name.clone() });
            }
        }
        self.check_macro_cycles()?;

        for gap in &gaps {
            warn!("{gap}");
        }
        self.logic_gaps = gaps;
        info!(
            "Loaded {} areas, {} locations, {} events, {} macros ({} logic gaps)",
            self.areas.len(),
            self.location_isv.len(),
            self.event_isv.len(),
            self.macros.len(),
            self.logic_gaps.len()
        );
        Ok(())
    }

    // Macros are inlined at compile time, but a raw reference inside a macro can still
    // name a macro, so evaluation could recurse forever. Reject such cycles up front.
    fn check_macro_cycles(&self) -> Result<()> {
        #[derive(Copy, Clone, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }
        let edges: Vec<Vec<MacroId>> = self
            .macros
            .iter()
            .map(|req| {
                let mut raw_ids = vec![];
                req.collect_raw_refs(&mut raw_ids);
                raw_ids
                    .into_iter()
                    .filter_map(|r| self.raw_targets[r].macro_id)
                    .collect()
            })
            .collect();
        let mut marks = vec![Mark::New; self.macros.len()];
        for root in 0..self.macros.len() {
            if marks[root] != Mark::New {
                continue;
            }
            // (macro, index of next edge to follow)
            let mut stack: Vec<(MacroId, usize)> = vec![(root, 0)];
            marks[root] = Mark::Active;
            while let Some((m, next)) = stack.pop() {
                if next == edges[m].len() {
                    marks[m] = Mark::Done;
                    continue;
                }
                stack.push((m, next + 1));
                let dst = edges[m][next];
                match marks[dst] {
                    Mark::Active => {
                        return Err(
                            RequirementError::CircularMacro(self.macro_isv.keys[dst].clone())
                                .into(),
                        );
                    }
                    Mark::New => {
                        marks[dst] = Mark::Active;
                        stack.push((dst, 0));
                    }
                    Mark::Done => {}
                }
            }
        }
        Ok(())
    }

    pub fn area_id(&self, key: &AreaKey) -> Option<AreaId> {
        self.area_isv.get(key)
    }

    pub fn location_id(&self, key: &LocationKey) -> Option<LocationId> {
        self.location_isv.get(key)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_isv.get(name)
    }

    pub fn location_area(&self, location_id: LocationId) -> AreaId {
        self.location_slot[location_id].0
    }

    pub fn location_requirement(&self, location_id: LocationId) -> &Requirement {
        let (area_id, idx) = self.location_slot[location_id];
        &self.areas[area_id].locations[idx].1
    }

    /// Map connections (exit stage, entrance stage, disambiguation) without a counterpart
    /// going the other way.
    pub fn one_way_connections(&self) -> Vec<(String, String, Option<String>)> {
        let mut one_way: Vec<(String, String, Option<String>)> = vec![];
        for area in &self.areas {
            for exit in &area.map_exits {
                let connection = (
                    area.stage.clone(),
                    exit.passageway.area_key.stage.clone(),
                    exit.passageway.disambiguation.clone(),
                );
                let reverse = (
                    connection.1.clone(),
                    connection.0.clone(),
                    connection.2.clone(),
                );
                if let Some(idx) = one_way.iter().position(|c| c == &reverse) {
                    one_way.swap_remove(idx);
                } else if !one_way.contains(&connection) {
                    one_way.push(connection);
                }
            }
        }
        one_way.sort();
        one_way
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(macros: &str, areas: &str) -> Result<GameData> {
        GameData::from_json(
            &json::array!["Bow", "Clawshots", "Progressive Sword"],
            &json::parse(macros)?,
            &[json::parse(areas)?],
        )
    }

    const AREAS: &str = r#"{
        "Skyloft": {
            "force-tod": "Day",
            "stages": {
                "Knight Academy": {
                    "can-sleep": true,
                    "areas": {
                        "Main": {
                            "locations": {"Chest": "Nothing"},
                            "events": {"Talk to Instructor": "Can Fight"},
                            "map-exits": {"Skyloft - Central (Front Door)": "Nothing"},
                            "logic-exits": {"Upper": "Clawshots", "Basement": "Nothing"}
                        },
                        "Upper": {"force-tod": "Night", "locations": {"Ledge": "Bow"}}
                    }
                },
                "Skyloft": {
                    "areas": {
                        "Central": {
                            "map-exits": {
                                "Knight Academy - Main (Front Door)": "Nothing",
                                "Sky - Field": "Nothing"
                            },
                            "locations": {"Statue": "Talk to Instructor | Unknown Flag"}
                        }
                    }
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_map_exit() {
        let p = parse_map_exit("Skyloft - Central (Front Door)").unwrap();
        assert_eq!(p.area_key, AreaKey::new("Skyloft", "Central"));
        assert_eq!(p.disambiguation.as_deref(), Some("Front Door"));
        let p = parse_map_exit("Sky - Field").unwrap();
        assert_eq!(p.disambiguation, None);
        assert!(parse_map_exit("Sky Field").is_err());
    }

    #[test]
    fn test_load_areas() -> Result<()> {
        let game_data = load(r#"{"Can Fight": "Progressive Sword"}"#, AREAS)?;
        assert_eq!(game_data.areas.len(), 3);

        let main = &game_data.areas[0];
        assert_eq!(main.key(), AreaKey::new("Knight Academy", "Main"));
        assert_eq!(main.force_tod, ForceTod::Day);
        assert!(main.can_sleep);
        assert_eq!(main.events[0].1, Requirement::ItemCount(2, 1));
        assert_eq!(main.map_exits[0].to_area_id, Some(2));
        assert_eq!(main.logic_exits[0].to_area_id, Some(1));
        assert_eq!(main.logic_exits[1].to_area_id, None);
        assert_eq!(game_data.areas[1].force_tod, ForceTod::Night);
        assert!(!game_data.areas[2].can_sleep);

        let statue = game_data
            .location_id(&LocationKey::new("Skyloft", "Statue"))
            .unwrap();
        assert_eq!(game_data.location_area(statue), 2);
        assert_eq!(
            game_data
                .location_requirement(statue)
                .to_string_pretty(&game_data),
            "(Talk to Instructor | Unknown Flag)"
        );

        assert_eq!(
            game_data.logic_gaps,
            vec![
                LogicGap::MissingLogicExit {
                    from: AreaKey::new("Knight Academy", "Main"),
                    to: AreaKey::new("Knight Academy", "Basement"),
                },
                LogicGap::MissingMapExit {
                    from: AreaKey::new("Skyloft", "Central"),
                    to: parse_map_exit("Sky - Field")?,
                },
                LogicGap::UnresolvedReference {
                    name: "Unknown Flag".to_string()
                },
            ]
        );
        assert_eq!(
            game_data.one_way_connections(),
            vec![("Skyloft".to_string(), "Sky".to_string(), None)]
        );
        Ok(())
    }

    #[test]
    fn test_bad_data_rejected() {
        let err = load("{}", r#"{"R": {"stages": {"S": {"areas": {"A": {"locations": {"L": "A & B | C"}}}}}}}"#)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RequirementError>(),
            Some(RequirementError::MixedOperators(_))
        ));

        let err = load(
            r#"{"M": "Option \"x\" Perhaps"}"#,
            r#"{"R": {"stages": {}}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RequirementError>(),
            Some(RequirementError::InvalidOptionCheck(_))
        ));

        let err = load(
            "{}",
            r#"{"R": {"stages": {
                "S": {"areas": {"A": {"locations": {"L": "Nothing"}}, "B": {"locations": {"L": "Nothing"}}}}
            }}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RequirementError>(),
            Some(RequirementError::DuplicateKey { kind: "location", .. })
        ));

        assert!(load("{}", r#"{"R": {"stages": {"S": {"areas": {"A": {"exits": {}}}}}}}"#).is_err());
    }

    #[test]
    fn test_area_macros() -> Result<()> {
        let game_data = load(
            r#"{"Can Fight": "Progressive Sword"}"#,
            r#"{"R": {"stages": {"S": {"areas": {
                "A": {"macros": {"Can Shoot": "Bow"}, "locations": {"L": "Can Shoot & Can Fight"}},
                "B": {"locations": {"M": "Can Shoot"}}
            }}}}}"#,
        )?;
        assert_eq!(game_data.macro_isv.keys, vec!["Can Fight", "Can Shoot"]);
        let l = game_data.location_id(&LocationKey::new("R", "L")).unwrap();
        assert_eq!(
            game_data.location_requirement(l).to_string_pretty(&game_data),
            "(Bow & Progressive Sword)"
        );
        let m = game_data.location_id(&LocationKey::new("R", "M")).unwrap();
        assert_eq!(
            *game_data.location_requirement(m),
            Requirement::ItemCount(0, 1)
        );

        let err = load(
            r#"{"Can Shoot": "Bow"}"#,
            r#"{"R": {"stages": {"S": {"areas": {"A": {"macros": {"Can Shoot": "Clawshots"}}}}}}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RequirementError>(),
            Some(RequirementError::DuplicateKey { kind: "macro", .. })
        ));
        Ok(())
    }

    #[test]
    fn test_area_sections_must_be_objects() {
        for section in ["macros", "locations", "events", "map-exits", "logic-exits"] {
            let areas = format!(
                r#"{{"R": {{"stages": {{"S": {{"areas": {{"A": {{"{section}": ["Nothing"]}}}}}}}}}}}}"#
            );
            assert!(load("{}", &areas).is_err(), "{section}");
        }
        assert!(load("{}", r#"{"R": {"stages": {"S": {"areas": {"A": {}}}}}}"#).is_ok());
    }

    #[test]
    fn test_check_types() -> Result<()> {
        let mut game_data = load(r#"{"Can Fight": "Progressive Sword"}"#, AREAS)?;
        let chest = game_data
            .location_id(&LocationKey::new("Skyloft", "Chest"))
            .unwrap();
        let ledge = game_data
            .location_id(&LocationKey::new("Skyloft", "Ledge"))
            .unwrap();
        game_data.add_check_types(&json::parse(
            r#"{"Skyloft - Chest": {"type": ["Goddess Chests", "Skyloft"]}}"#,
        )?)?;
        assert_eq!(game_data.location_types[chest], vec!["Goddess Chests", "Skyloft"]);
        assert!(game_data.location_types[ledge].is_empty());

        assert!(game_data
            .add_check_types(&json::parse(r#"{"Skyloft - Nowhere": {"type": []}}"#)?)
            .is_err());
        assert!(game_data
            .add_check_types(&json::parse(r#"{"Skyloft - Chest": {"type": "Goddess Chests"}}"#)?)
            .is_err());
        Ok(())
    }

    #[test]
    fn test_circular_macro_rejected() {
        // "A" is not yet defined while compiling "A", so it stays a raw reference.
        let err = load(
            r#"{"A": "Bow & (A | Clawshots)"}"#,
            r#"{"R": {"stages": {}}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RequirementError>(),
            Some(&RequirementError::CircularMacro("A".to_string()))
        );

        let err = load(r#"{"A": "B", "B": "A"}"#, r#"{"R": {"stages": {}}}"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RequirementError>(),
            Some(RequirementError::CircularMacro(_))
        ));

        // Forward references that do not loop back are fine:
        assert!(load(r#"{"A": "B | Bow", "B": "Clawshots"}"#, r#"{"R": {"stages": {}}}"#).is_ok());
    }
}
