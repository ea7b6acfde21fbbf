use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::behavior::Behavior;

/// Per-turn aggregate metrics for logs and the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnStatistics {
    pub turn: u32,
    pub units: usize,
    pub known_tiles: usize,
    pub new_tiles: usize,
    pub visible_tiles: usize,
    pub frontier: usize,
    pub remembered_food: usize,
    pub remembered_enemies: usize,
    pub seeded_reservations: usize,
    pub contested_food: usize,
    pub behavior_counts: BTreeMap<Behavior, u32>,
    pub last_resort_moves: u32,
    pub stayed: u32,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub elapsed_ms: f32,
}

impl TurnStatistics {
    pub fn record_behavior(&mut self, behavior: Behavior) {
        *self.behavior_counts.entry(behavior).or_insert(0) += 1;
    }

    pub fn behavior_count(&self, behavior: Behavior) -> u32 {
        self.behavior_counts.get(&behavior).copied().unwrap_or(0)
    }

    /// Units that received a non-empty path.
    pub fn moved(&self) -> u32 {
        self.behavior_counts.values().sum()
    }

    /// Compact `name=count` list in behavior order, e.g. `forage=3 explore=1`.
    pub fn behavior_summary(&self) -> String {
        self.behavior_counts
            .iter()
            .map(|(b, n)| format!("{}={}", b.name(), n))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
