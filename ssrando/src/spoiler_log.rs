use serde::{Deserialize, Serialize};
use ssrando_game::{GameData, LocationId};
use ssrando_logic::LogicConfig;

use crate::{
    randomize::Placement,
    traverse::{StartState, explore},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpoilerLog {
    pub seed: usize,
    pub regions: Vec<SpoilerRegion>,
    pub playthrough: Vec<SpoilerSphere>,
    pub unreachable: Vec<SpoilerItemLoc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpoilerRegion {
    pub region: String,
    pub checks: Vec<SpoilerItemLoc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpoilerItemLoc {
    pub region: String,
    pub check: String,
    pub item: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hint_banned: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpoilerSphere {
    pub sphere: usize,
    pub items: Vec<SpoilerItemLoc>,
}

fn get_item_loc(
    game_data: &GameData,
    placement: &Placement,
    location_id: LocationId,
) -> SpoilerItemLoc {
    let key = &game_data.location_isv.keys[location_id];
    SpoilerItemLoc {
        region: key.region.clone(),
        check: key.check.clone(),
        item: placement.get(location_id).unwrap_or_default().to_owned(),
        hint_banned: placement.is_hint_banned(location_id),
    }
}

/// Filled locations grouped into playthrough spheres: sphere 0 is reachable from the start
/// (with the assumed items), and each later sphere is reachable once the items of all
/// earlier spheres are collected. Also returns the filled locations never reached.
pub fn get_spheres(
    game_data: &GameData,
    config: &LogicConfig,
    start: &StartState,
    assumed_items: &[String],
    placement: &Placement,
) -> (Vec<Vec<LocationId>>, Vec<LocationId>) {
    let mut state = start.new_state(game_data, config);
    for item in assumed_items {
        state.collect_item_name(item);
    }
    let mut collected = vec![false; game_data.location_isv.len()];
    let mut spheres: Vec<Vec<LocationId>> = vec![];
    loop {
        let exploration = explore(&mut state, None);
        let sphere: Vec<LocationId> = placement
            .iter()
            .map(|(location_id, _)| location_id)
            .filter(|&i| exploration.locations[i] && !collected[i])
            .collect();
        if sphere.is_empty() {
            break;
        }
        for &location_id in &sphere {
            collected[location_id] = true;
            if let Some(item) = placement.get(location_id) {
                state.collect_item_name(item);
            }
        }
        spheres.push(sphere);
    }
    let unreachable = placement
        .iter()
        .map(|(location_id, _)| location_id)
        .filter(|&i| !collected[i])
        .collect();
    (spheres, unreachable)
}

impl SpoilerLog {
    pub fn new(
        game_data: &GameData,
        config: &LogicConfig,
        start: &StartState,
        assumed_items: &[String],
        placement: &Placement,
        seed: usize,
    ) -> Self {
        let mut regions: Vec<SpoilerRegion> = vec![];
        for (location_id, _) in placement.iter() {
            let item_loc = get_item_loc(game_data, placement, location_id);
            match regions.iter_mut().find(|r| r.region == item_loc.region) {
                Some(region) => region.checks.push(item_loc),
                None => regions.push(SpoilerRegion {
                    region: item_loc.region.clone(),
                    checks: vec![item_loc],
                }),
            }
        }

        let (spheres, unreachable) = get_spheres(game_data, config, start, assumed_items, placement);
        let playthrough = spheres
            .iter()
            .enumerate()
            .map(|(i, sphere)| SpoilerSphere {
                sphere: i,
                items: sphere
                    .iter()
                    .map(|&location_id| get_item_loc(game_data, placement, location_id))
                    .collect(),
            })
            .collect();
        SpoilerLog {
            seed,
            regions,
            playthrough,
            unreachable: unreachable
                .iter()
                .map(|&location_id| get_item_loc(game_data, placement, location_id))
                .collect(),
        }
    }
}
