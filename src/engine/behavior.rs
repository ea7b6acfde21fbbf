use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::warn;

use crate::config::EngineConfig;
use crate::engine::reservation::Reservations;
use crate::engine::stuck::StuckTracker;
use crate::pathing::{PathTruncator, ScoutPathCache, find_min_cost_path_to_any, flee_path};
use crate::world::{EntityMemory, FoodItem, FoodKind, Hex, TerrainKind, Unit, UnitKind, WorldMemory};

/// A named way of choosing a unit's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Behavior {
    ReturnToBase,
    Flee,
    Explore,
    Engage,
    Forage,
    Unstuck,
}

impl Behavior {
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::ReturnToBase => "return_to_base",
            Behavior::Flee => "flee",
            Behavior::Explore => "explore",
            Behavior::Engage => "engage",
            Behavior::Forage => "forage",
            Behavior::Unstuck => "unstuck",
        }
    }

    /// Behaviors tried in order for a unit of the given class. `Unstuck` is
    /// never listed; it runs when every listed behavior comes back empty.
    pub fn chain(unit: &Unit, class: PriorityClass) -> &'static [Behavior] {
        match class {
            PriorityClass::Returning => &[Behavior::ReturnToBase],
            PriorityClass::Stuck => &[],
            PriorityClass::Routine => match unit.kind {
                UnitKind::Scout => &[Behavior::Flee, Behavior::Explore],
                UnitKind::Fighter => &[Behavior::Engage, Behavior::Forage],
                UnitKind::Worker => &[Behavior::Forage],
            },
        }
    }

    /// Plan a move for `unit`. `None` means this behavior found nothing.
    pub fn plan(self, unit: &Unit, turn: &Turn<'_>, planner: &mut Planner<'_>) -> Option<Vec<Hex>> {
        let path = match self {
            Behavior::ReturnToBase => return_to_base(unit, turn, planner),
            Behavior::Flee => flee(unit, turn, planner),
            Behavior::Explore => explore(unit, turn, planner),
            Behavior::Engage => engage(unit, turn, planner),
            Behavior::Forage => forage(unit, turn, planner),
            Behavior::Unstuck => unstuck(unit, turn, planner),
        };
        if path.is_empty() { None } else { Some(path) }
    }
}

/// Decision passes, run in this order over the whole roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriorityClass {
    Returning,
    Stuck,
    Routine,
}

impl PriorityClass {
    pub fn all() -> &'static [PriorityClass] {
        &[
            PriorityClass::Returning,
            PriorityClass::Stuck,
            PriorityClass::Routine,
        ]
    }

    pub fn of(unit: &Unit, stuck: &StuckTracker, config: &EngineConfig) -> PriorityClass {
        if unit.is_carrying() {
            PriorityClass::Returning
        } else if stuck.is_stuck(unit, config.stuck_turns) {
            PriorityClass::Stuck
        } else {
            PriorityClass::Routine
        }
    }
}

/// Read-only view of the turn shared by every behavior.
pub struct Turn<'a> {
    pub config: &'a EngineConfig,
    pub memory: &'a WorldMemory,
    pub food: &'a EntityMemory<FoodItem>,
    pub visible_enemies: HashSet<Hex>,
    pub remembered_enemies: HashSet<Hex>,
    pub food_hexes: HashSet<Hex>,
    pub frontier: HashSet<Hex>,
    pub home: HashSet<Hex>,
    pub hives: HashSet<Hex>,
}

impl<'a> Turn<'a> {
    /// Anthill cells that are not ours.
    pub fn enemy_hives(&self) -> impl Iterator<Item = &Hex> {
        self.hives.iter().filter(|h| !self.home.contains(h))
    }
}

/// Mutable state threaded through the decisions of one turn.
pub struct Planner<'a> {
    pub reserved: Reservations,
    pub cache: &'a mut ScoutPathCache,
    pub rng: &'a mut ChaCha8Rng,
    pub last_resort_moves: u32,
}

impl Planner<'_> {
    fn truncate(&self, unit: &Unit, path: &[Hex], memory: &WorldMemory) -> Vec<Hex> {
        PathTruncator::new(memory, &self.reserved).truncate(path, unit.speed())
    }
}

/// A uniformly random neighbor of `from` passing `accept`.
fn random_neighbor(rng: &mut ChaCha8Rng, from: Hex, accept: impl Fn(Hex) -> bool) -> Option<Hex> {
    let mut cells = from.neighbors();
    cells.shuffle(rng);
    cells.into_iter().find(|h| accept(*h))
}

fn return_to_base(unit: &Unit, turn: &Turn<'_>, planner: &mut Planner<'_>) -> Vec<Hex> {
    let path = find_min_cost_path_to_any(
        unit.hex(),
        &turn.home,
        turn.memory,
        &planner.reserved,
        turn.config.max_target_hits,
    );
    planner.truncate(unit, &path, turn.memory)
}

fn forage(unit: &Unit, turn: &Turn<'_>, planner: &mut Planner<'_>) -> Vec<Hex> {
    let mut targets: HashSet<Hex> = turn
        .food_hexes
        .iter()
        .copied()
        .filter(|h| !planner.reserved.contains(*h))
        .collect();

    // Nectar sitting on someone else's hive is not worth a worker's trip.
    if unit.kind == UnitKind::Worker {
        for hive in turn.enemy_hives() {
            if turn.food.get(*hive).is_some_and(|f| f.kind == FoodKind::Nectar) {
                targets.remove(hive);
            }
        }
    }

    if targets.is_empty() {
        return Vec::new();
    }
    let path = find_min_cost_path_to_any(
        unit.hex(),
        &targets,
        turn.memory,
        &planner.reserved,
        turn.config.max_target_hits,
    );
    planner.truncate(unit, &path, turn.memory)
}

fn engage(unit: &Unit, turn: &Turn<'_>, planner: &mut Planner<'_>) -> Vec<Hex> {
    let max_hits = turn.config.max_target_hits;
    let mut path = find_min_cost_path_to_any(
        unit.hex(),
        &turn.visible_enemies,
        turn.memory,
        &planner.reserved,
        max_hits,
    );
    if path.is_empty() && !turn.remembered_enemies.is_empty() {
        path = find_min_cost_path_to_any(
            unit.hex(),
            &turn.remembered_enemies,
            turn.memory,
            &planner.reserved,
            max_hits,
        );
    }
    planner.truncate(unit, &path, turn.memory)
}

/// Runs only when an enemy is within the danger radius.
fn flee(unit: &Unit, turn: &Turn<'_>, planner: &mut Planner<'_>) -> Vec<Hex> {
    let here = unit.hex();
    let threatened = turn
        .visible_enemies
        .iter()
        .any(|e| here.distance(*e) <= turn.config.danger_radius);
    if !threatened {
        return Vec::new();
    }

    let path = flee_path(
        here,
        &turn.visible_enemies,
        &turn.food_hexes,
        unit.speed(),
        turn.memory,
        &planner.reserved,
    );
    if !path.is_empty() {
        return path;
    }

    random_neighbor(planner.rng, here, |h| {
        !planner.reserved.contains(h) && is_passable(turn.memory, h)
    })
    .map(|h| vec![h])
    .unwrap_or_default()
}

fn explore(unit: &Unit, turn: &Turn<'_>, planner: &mut Planner<'_>) -> Vec<Hex> {
    let here = unit.hex();

    if turn.frontier.is_empty() {
        // Nothing left to uncover: keep moving so units stay spread out.
        let reserved = &planner.reserved;
        let open = |h: Hex| !reserved.contains(h) && is_passable(turn.memory, h);
        let step = random_neighbor(planner.rng, here, |h| open(h) && !turn.food_hexes.contains(&h))
            .or_else(|| random_neighbor(planner.rng, here, open));
        return step.map(|h| vec![h]).unwrap_or_default();
    }

    let path = planner
        .cache
        .path_to_frontier(here, &turn.frontier, &turn.food_hexes, turn.memory);
    let mut steps = planner.truncate(unit, &path, turn.memory);
    while steps.last().is_some_and(|h| turn.food_hexes.contains(h)) {
        steps.pop();
    }
    steps
}

/// Terminal fallback: always tries to take one step.
///
/// Prefers an unreserved, known, passable cell that is not an anthill, then
/// any unreserved non-anthill cell not known to be stone or acid, then any
/// neighbor at all.
fn unstuck(unit: &Unit, turn: &Turn<'_>, planner: &mut Planner<'_>) -> Vec<Hex> {
    let here = unit.hex();
    let reserved = &planner.reserved;
    let open = |h: Hex| !reserved.contains(h) && !turn.hives.contains(&h);

    let step = random_neighbor(planner.rng, here, |h| open(h) && is_passable(turn.memory, h))
        .or_else(|| {
            random_neighbor(planner.rng, here, |h| {
                open(h) && !turn.memory.terrain(h).is_some_and(TerrainKind::is_hazard)
            })
        });
    if let Some(step) = step {
        return vec![step];
    }

    planner.last_resort_moves += 1;
    warn!(unit = %unit, "Unit is boxed in, taking a random step");
    random_neighbor(planner.rng, here, |_| true)
        .map(|h| vec![h])
        .unwrap_or_default()
}

fn is_passable(memory: &WorldMemory, hex: Hex) -> bool {
    memory.terrain(hex).is_some_and(TerrainKind::is_passable)
}
