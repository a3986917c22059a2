use anyhow::{Context, Result, bail, ensure};
use log::{debug, info};
use rand::{Rng, SeedableRng, seq::SliceRandom};
use ssrando_game::{GameData, LocationId, LocationKey};
use ssrando_logic::{LogicConfig, helpers::is_progress_location};
use thiserror::Error;

use crate::{
    settings::RandomizerSettings,
    spoiler_log::SpoilerLog,
    traverse::{StartState, explore, is_requirement_met},
};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FillFailure {
    #[error("no open location for {item} ({placed} placed, {remaining_items} items left)")]
    NoLocation {
        item: String,
        placed: usize,
        remaining_items: usize, // Unplaced items, including `item`
    },
    #[error("location {0} is already filled")]
    LocationAlreadyFilled(LocationKey),
}

/// Items assigned to locations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    items: Vec<Option<String>>, // Corresponds to GameData.location_isv
    hint_banned: Vec<bool>,     // Corresponds to GameData.location_isv
}

impl Placement {
    pub fn new(game_data: &GameData) -> Self {
        let num_locations = game_data.location_isv.len();
        Placement {
            items: vec![None; num_locations],
            hint_banned: vec![false; num_locations],
        }
    }

    pub fn place(
        &mut self,
        game_data: &GameData,
        location_id: LocationId,
        item: &str,
        hint_banned: bool,
    ) -> Result<(), FillFailure> {
        if self.items[location_id].is_some() {
            return Err(FillFailure::LocationAlreadyFilled(
                game_data.location_isv.keys[location_id].clone(),
            ));
        }
        self.items[location_id] = Some(item.to_owned());
        self.hint_banned[location_id] = hint_banned;
        Ok(())
    }

    pub fn get(&self, location_id: LocationId) -> Option<&str> {
        self.items[location_id].as_deref()
    }

    pub fn is_hint_banned(&self, location_id: LocationId) -> bool {
        self.hint_banned[location_id]
    }

    /// Number of filled locations.
    pub fn len(&self) -> usize {
        self.items.iter().filter(|x| x.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filled locations in location order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &str)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_deref().map(|item| (i, item)))
    }
}

/// Outcome of an assumed fill that placed every item it could.
pub struct AssumedFill {
    pub placement: Placement,
    pub remaining_items: Vec<String>, // Left over once the locations ran out
    pub remaining_locations: Vec<LocationId>, // Left over once the items ran out
}

pub struct Randomization {
    pub seed: usize,
    pub placement: Placement,
    pub spoiler_log: SpoilerLog,
}

pub struct Randomizer<'a> {
    pub game_data: &'a GameData,
    pub settings: &'a RandomizerSettings,
    pub logic_config: LogicConfig,
    pub start: StartState,
    pub prefilled: Placement,
    pub location_pool: Vec<LocationId>,
}

impl<'a> Randomizer<'a> {
    pub fn new(game_data: &'a GameData, settings: &'a RandomizerSettings) -> Result<Self> {
        let logic_config = LogicConfig::new(&settings.options, game_data);

        let Some(start_area) = game_data.area_id(&settings.start_area) else {
            bail!("Unknown start area: {}", settings.start_area);
        };
        let mut start = StartState {
            areas: vec![start_area],
            events: vec![],
        };
        for event in &settings.start_events {
            let Some(event_id) = game_data.event_isv.get(event.as_str()) else {
                bail!("Unknown start event: {event}");
            };
            start.events.push(event_id);
        }

        let mut prefilled = Placement::new(game_data);
        let mut prefilled_locations: Vec<(&String, &String)> = settings.prefilled.iter().collect();
        prefilled_locations.sort();
        for (location, item) in prefilled_locations {
            let location_id = lookup_location(game_data, location)?;
            prefilled
                .place(game_data, location_id, item, settings.hint_ban_prefilled)
                .with_context(|| format!("Pre-filling {location}"))?;
        }

        let location_pool: Vec<LocationId> = match &settings.location_pool {
            Some(names) => names
                .iter()
                .map(|name| lookup_location(game_data, name))
                .collect::<Result<_>>()?,
            None => (0..game_data.location_isv.len())
                .filter(|&i| {
                    prefilled.get(i).is_none()
                        && is_progress_location(
                            &settings.options,
                            &game_data.location_isv.keys[i].to_string(),
                            &game_data.location_types[i],
                        )
                })
                .collect(),
        };
        debug!(
            "Location pool: {} of {} locations",
            location_pool.len(),
            game_data.location_isv.len()
        );
        ensure!(
            settings.item_pool.len() <= location_pool.len(),
            "Item pool ({} items) does not fit in location pool ({} locations)",
            settings.item_pool.len(),
            location_pool.len()
        );

        Ok(Randomizer {
            game_data,
            settings,
            logic_config,
            start,
            prefilled,
            location_pool,
        })
    }

    /// Places `items` into `locations`, assuming while placing each item that every item not
    /// yet placed (and every one of `assumed_items`) is already owned.
    ///
    /// The location for each item is the first one, in shuffled order, that is reachable
    /// under that assumption. Since each placement is checked against the items still to be
    /// placed, the finished placement stays completable. `placement` is left untouched: the
    /// result is either a complete new placement or a failure.
    pub fn fill_assumed<R: Rng>(
        &self,
        placement: &Placement,
        assumed_items: &[String],
        mut items: Vec<String>,
        mut locations: Vec<LocationId>,
        rng: &mut R,
        mark_as_hint_banned: bool,
    ) -> Result<AssumedFill, FillFailure> {
        let game_data = self.game_data;
        for (i, &location_id) in locations.iter().enumerate() {
            if placement.get(location_id).is_some() || locations[..i].contains(&location_id) {
                return Err(FillFailure::LocationAlreadyFilled(
                    game_data.location_isv.keys[location_id].clone(),
                ));
            }
        }

        locations.shuffle(rng);
        items.shuffle(rng);

        let mut placement = placement.clone();
        let mut num_placed = 0;
        while !locations.is_empty() {
            let Some(item) = items.pop() else {
                break;
            };
            let mut state = self.start.new_state(game_data, &self.logic_config);
            for assumed in assumed_items.iter().chain(items.iter()) {
                state.collect_item_name(assumed);
            }
            let exploration = explore(&mut state, Some(&placement));

            let found = locations.iter().position(|&location_id| {
                state.has_area(game_data.location_area(location_id))
                    && is_requirement_met(game_data.location_requirement(location_id), &state)
            });
            let Some(idx) = found else {
                debug!(
                    "No location for {item}: {} areas and {} locations reachable, {} locations left",
                    state.num_areas(),
                    exploration.num_locations(),
                    locations.len()
                );
                return Err(FillFailure::NoLocation {
                    item,
                    placed: num_placed,
                    remaining_items: items.len() + 1,
                });
            };
            let location_id = locations.remove(idx);
            debug!(
                "Placed {item} at {}",
                game_data.location_isv.keys[location_id]
            );
            placement.place(game_data, location_id, &item, mark_as_hint_banned)?;
            num_placed += 1;
        }
        Ok(AssumedFill {
            placement,
            remaining_items: items,
            remaining_locations: locations,
        })
    }

    pub fn randomize(&self, seed: usize) -> Result<Randomization> {
        let mut rng_seed = [0u8; 32];
        rng_seed[..8].copy_from_slice(&seed.to_le_bytes());
        let mut rng = rand::rngs::StdRng::from_seed(rng_seed);

        let fill = self.fill_assumed(
            &self.prefilled,
            &self.settings.assumed_items,
            self.settings.item_pool.clone(),
            self.location_pool.clone(),
            &mut rng,
            false,
        )?;
        info!(
            "Seed {seed}: placed {} items, {} locations left empty",
            self.settings.item_pool.len(),
            fill.remaining_locations.len()
        );
        let spoiler_log = SpoilerLog::new(
            self.game_data,
            &self.logic_config,
            &self.start,
            &self.settings.assumed_items,
            &fill.placement,
            seed,
        );
        Ok(Randomization {
            seed,
            placement: fill.placement,
            spoiler_log,
        })
    }
}

fn lookup_location(game_data: &GameData, name: &str) -> Result<LocationId> {
    let key: LocationKey = name.parse()?;
    game_data
        .location_id(&key)
        .with_context(|| format!("Unknown location: {name}"))
}
