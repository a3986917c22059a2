use std::collections::VecDeque;

use ssrando_game::{AreaId, EventId, GameData, LocationId, Requirement};
use ssrando_logic::{LogicConfig, LogicState};

use crate::randomize::Placement;

pub fn is_requirement_met(req: &Requirement, state: &LogicState) -> bool {
    match req {
        Requirement::Free => true,
        Requirement::Never => false,
        &Requirement::ItemCount(item_id, count) => state.item_count(item_id) >= count,
        &Requirement::OptionCheck(check_id) => state.config.option_checks[check_id],
        &Requirement::Trick(trick_id) => state.config.tricks[trick_id],
        &Requirement::Raw(raw_id) => {
            let target = state.game_data.raw_targets[raw_id];
            if let Some(event_id) = target.event_id {
                if state.has_event(event_id) {
                    return true;
                }
            }
            // Names that are neither an owned event nor a macro never hold
            // (they are listed in GameData.logic_gaps).
            match target.macro_id {
                Some(macro_id) => is_requirement_met(&state.game_data.macros[macro_id], state),
                None => false,
            }
        }
        Requirement::And(reqs) => reqs.iter().all(|r| is_requirement_met(r, state)),
        Requirement::Or(reqs) => reqs.iter().any(|r| is_requirement_met(r, state)),
    }
}

/// Starting point of every exploration: owned areas and events before anything is collected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StartState {
    pub areas: Vec<AreaId>,
    pub events: Vec<EventId>,
}

impl StartState {
    pub fn new_state<'a>(&self, game_data: &'a GameData, config: &'a LogicConfig) -> LogicState<'a> {
        let mut state = LogicState::new(game_data, config);
        for &area_id in &self.areas {
            state.collect_area(area_id);
        }
        for &event_id in &self.events {
            state.collect_event(event_id);
        }
        state
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Guard {
    LogicExit(AreaId, usize),
    MapExit(AreaId, usize),
    Event(AreaId, usize),
    Location(LocationId),
}

pub struct Exploration {
    pub locations: Vec<bool>, // Corresponds to GameData.location_isv: true if the location was reached
    pub rounds: usize,        // Number of times blocked guards were re-examined, plus one
}

impl Exploration {
    pub fn num_locations(&self) -> usize {
        self.locations.iter().filter(|&&x| x).count()
    }
}

fn push_area_guards(game_data: &GameData, area_id: AreaId, queue: &mut VecDeque<Guard>) {
    let area = &game_data.areas[area_id];
    for i in 0..area.logic_exits.len() {
        queue.push_back(Guard::LogicExit(area_id, i));
    }
    for i in 0..area.map_exits.len() {
        queue.push_back(Guard::MapExit(area_id, i));
    }
    for i in 0..area.events.len() {
        queue.push_back(Guard::Event(area_id, i));
    }
    for &(location_id, _) in &area.locations {
        queue.push_back(Guard::Location(location_id));
    }
}

/// Expands `state` to its reachability fixpoint.
///
/// Every guard of every owned area is placed on one work queue. A guard that does not
/// hold is parked until an item or event is gained, since only those can change its
/// value; reaching an area merely adds that area's own guards to the queue. Items
/// placed at reached locations are collected when `placement` is given, at most once
/// per location for the lifetime of `state`.
pub fn explore(state: &mut LogicState, placement: Option<&Placement>) -> Exploration {
    let game_data = state.game_data;
    let mut locations = vec![false; game_data.location_isv.len()];
    let mut queue: VecDeque<Guard> = VecDeque::new();
    let mut blocked: Vec<Guard> = vec![];
    let mut rounds = 1;
    for area_id in 0..game_data.areas.len() {
        if state.has_area(area_id) {
            push_area_guards(game_data, area_id, &mut queue);
        }
    }

    while let Some(guard) = queue.pop_front() {
        let mut gained = false;
        match guard {
            Guard::LogicExit(area_id, i) => {
                let exit = &game_data.areas[area_id].logic_exits[i];
                let Some(to_area_id) = exit.to_area_id else {
                    continue;
                };
                if state.has_area(to_area_id) {
                    continue;
                }
                if !is_requirement_met(&exit.requirement, state) {
                    blocked.push(guard);
                    continue;
                }
                state.collect_area(to_area_id);
                push_area_guards(game_data, to_area_id, &mut queue);
            }
            Guard::MapExit(area_id, i) => {
                let exit = &game_data.areas[area_id].map_exits[i];
                let Some(to_area_id) = exit.to_area_id else {
                    continue;
                };
                if state.has_area(to_area_id) {
                    continue;
                }
                if !is_requirement_met(&exit.requirement, state) {
                    blocked.push(guard);
                    continue;
                }
                state.collect_area(to_area_id);
                push_area_guards(game_data, to_area_id, &mut queue);
            }
            Guard::Event(area_id, i) => {
                let (event_id, req) = &game_data.areas[area_id].events[i];
                if state.has_event(*event_id) {
                    continue;
                }
                if !is_requirement_met(req, state) {
                    blocked.push(guard);
                    continue;
                }
                gained = state.collect_event(*event_id);
            }
            Guard::Location(location_id) => {
                if locations[location_id] {
                    continue;
                }
                if !is_requirement_met(game_data.location_requirement(location_id), state) {
                    blocked.push(guard);
                    continue;
                }
                locations[location_id] = true;
                if let Some(item) = placement.and_then(|p| p.get(location_id)) {
                    // A state explored again must not count the same item twice.
                    if state.collect_location(location_id) {
                        gained = state.collect_item_name(item);
                    }
                }
            }
        }
        if gained && !blocked.is_empty() {
            rounds += 1;
            queue.extend(blocked.drain(..));
        }
    }
    Exploration { locations, rounds }
}

/// Whether `location_id` can be reached owning `items`, plus anything found along the way
/// at locations already filled in `placement`.
pub fn is_location_reachable(
    game_data: &GameData,
    config: &LogicConfig,
    start: &StartState,
    items: &[String],
    placement: &Placement,
    location_id: LocationId,
) -> bool {
    let mut state = start.new_state(game_data, config);
    for item in items {
        state.collect_item_name(item);
    }
    let exploration = explore(&mut state, Some(placement));
    exploration.locations[location_id]
}
