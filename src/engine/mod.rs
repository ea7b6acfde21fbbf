pub mod behavior;
pub mod reservation;
pub mod statistics;
pub mod stuck;

use std::collections::HashSet;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::behavior::{Behavior, Planner, PriorityClass, Turn};
use crate::engine::reservation::seed_reservations;
use crate::engine::statistics::TurnStatistics;
use crate::engine::stuck::StuckTracker;
use crate::pathing::ScoutPathCache;
use crate::protocol::{MoveBatch, MoveCommand, TurnSnapshot};
use crate::world::{Enemy, EntityMemory, FoodItem, Hex, TerrainKind, WorldMemory};

/// Everything the engine carries from one turn to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub id: Uuid,
    pub turns_processed: u64,
    pub last_turn: u32,
    pub memory: WorldMemory,
    pub food: EntityMemory<FoodItem>,
    pub enemies: EntityMemory<Enemy>,
    pub stuck: StuckTracker,
    pub scout_cache: ScoutPathCache,
    pub rng: ChaCha8Rng,
}

impl EngineState {
    /// Fresh state with empty memory. A zero seed draws one from the OS.
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            rand::thread_rng().r#gen()
        } else {
            seed
        };
        EngineState {
            id: Uuid::new_v4(),
            turns_processed: 0,
            last_turn: 0,
            memory: WorldMemory::new(),
            food: EntityMemory::new(),
            enemies: EntityMemory::new(),
            stuck: StuckTracker::new(),
            scout_cache: ScoutPathCache::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.memory.is_consistent()
    }
}

/// Output of one decision cycle.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub commands: MoveBatch,
    pub statistics: TurnStatistics,
}

/// The decision engine. Owns all cross-turn state; one instance per game.
pub struct Engine {
    config: EngineConfig,
    state: EngineState,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let state = EngineState::new(config.seed);
        Engine { config, state }
    }

    /// Resume from a previously saved state.
    pub fn with_state(config: EngineConfig, state: EngineState) -> Self {
        Engine { config, state }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn into_state(self) -> EngineState {
        self.state
    }

    /// Run one decision cycle and return exactly one command per unit.
    ///
    /// Memory is updated from the snapshot first, then the reservation set
    /// is seeded, then units are decided in priority passes. Each decided
    /// path is claimed before the next unit plans.
    pub fn execute_turn(&mut self, snapshot: &TurnSnapshot) -> TurnResult {
        let turn_start = Instant::now();
        let config = &self.config;
        let EngineState {
            memory,
            food,
            enemies,
            stuck,
            scout_cache,
            rng,
            ..
        } = &mut self.state;

        let new_tiles = memory.observe(&snapshot.map);
        let visible = snapshot.visible_hexes();
        food.update(&visible, &snapshot.food);
        enemies.update(&visible, &snapshot.enemies);

        let (reserved, seeded) = seed_reservations(config, snapshot, memory, food);
        stuck.record(&snapshot.ants);

        let memory: &WorldMemory = memory;
        let food: &EntityMemory<FoodItem> = food;
        let food_hexes = food.hexes();
        let visible_enemies = snapshot.enemy_hexes();
        let remembered_enemies: HashSet<Hex> = enemies
            .hexes()
            .difference(&visible_enemies)
            .copied()
            .collect();
        let frontier: HashSet<Hex> = memory
            .hexes()
            .filter(|h| !visible.contains(h) && !food_hexes.contains(h))
            .collect();

        let mut statistics = TurnStatistics {
            turn: snapshot.turn_no,
            units: snapshot.ants.len(),
            known_tiles: memory.len(),
            new_tiles: new_tiles.len(),
            visible_tiles: visible.len(),
            frontier: frontier.len(),
            remembered_food: food.len(),
            remembered_enemies: enemies.len(),
            seeded_reservations: reserved.len(),
            contested_food: seeded.contested_food.len(),
            ..TurnStatistics::default()
        };
        debug!(
            spawn = seeded.spawn,
            hazards = seeded.hazards,
            enemies = seeded.enemies,
            fighter_zone = seeded.fighter_zone,
            contested_food = seeded.contested_food.len(),
            "Seeded reservations"
        );

        let turn = Turn {
            config,
            memory,
            food,
            visible_enemies,
            remembered_enemies,
            food_hexes,
            frontier,
            home: snapshot.home_hexes(),
            hives: memory.hexes_of(TerrainKind::Anthill),
        };
        let (hits_before, misses_before) = scout_cache.hit_counts();
        let mut planner = Planner {
            reserved,
            cache: scout_cache,
            rng,
            last_resort_moves: 0,
        };

        let classes: Vec<PriorityClass> = snapshot
            .ants
            .iter()
            .map(|unit| PriorityClass::of(unit, stuck, config))
            .collect();

        let mut moves = Vec::with_capacity(snapshot.ants.len());
        for &class in PriorityClass::all() {
            for (unit, _) in snapshot.ants.iter().zip(&classes).filter(|(_, c)| **c == class) {
                let unit_start = Instant::now();
                let decision = Behavior::chain(unit, class)
                    .iter()
                    .find_map(|b| b.plan(unit, &turn, &mut planner).map(|path| (*b, path)))
                    .or_else(|| {
                        Behavior::Unstuck
                            .plan(unit, &turn, &mut planner)
                            .map(|path| (Behavior::Unstuck, path))
                    });

                let command = match decision {
                    Some((behavior, path)) => {
                        debug!(unit = %unit, behavior = behavior.name(), steps = path.len(), "Unit decided");
                        planner.reserved.claim_path(&path);
                        statistics.record_behavior(behavior);
                        MoveCommand {
                            ant: unit.id.clone(),
                            path,
                        }
                    }
                    None => {
                        statistics.stayed += 1;
                        MoveCommand::stay(&unit.id)
                    }
                };
                moves.push(command);

                let unit_ms = unit_start.elapsed().as_millis() as u64;
                if unit_ms > config.slow_unit_warn_ms {
                    warn!(unit = %unit, elapsed_ms = unit_ms, "Slow unit decision");
                }
            }
        }

        let (hits_after, misses_after) = planner.cache.hit_counts();
        statistics.cache_hits = hits_after - hits_before;
        statistics.cache_misses = misses_after - misses_before;
        statistics.last_resort_moves = planner.last_resort_moves;
        statistics.elapsed_ms = turn_start.elapsed().as_secs_f32() * 1000.0;

        self.state.turns_processed += 1;
        self.state.last_turn = snapshot.turn_no;

        info!(
            turn = statistics.turn,
            known_tiles = statistics.known_tiles,
            new_tiles = statistics.new_tiles,
            visible_tiles = statistics.visible_tiles,
            units = statistics.units,
            remembered_food = statistics.remembered_food,
            remembered_enemies = statistics.remembered_enemies,
            seeded_reservations = statistics.seeded_reservations,
            behaviors = %statistics.behavior_summary(),
            elapsed_ms = statistics.elapsed_ms,
            "Turn decided"
        );

        TurnResult {
            commands: MoveBatch { moves },
            statistics,
        }
    }
}
