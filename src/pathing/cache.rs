use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::pathing::search::path_to_nearest_unexplored;
use crate::world::{Hex, WorldMemory};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Order-independent fingerprint of a frontier set.
///
/// FNV-1a over the sorted coordinates, so equal sets always agree no matter
/// how they were built, including across restarts.
pub fn frontier_fingerprint(frontier: &HashSet<Hex>) -> u64 {
    let mut cells: Vec<Hex> = frontier.iter().copied().collect();
    cells.sort_unstable();

    let mut hash = FNV_OFFSET;
    for cell in cells {
        for byte in cell.q.to_le_bytes().into_iter().chain(cell.r.to_le_bytes()) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Key: unit cell, frontier size, frontier fingerprint.
type CacheKey = (Hex, usize, u64);

/// Memoized explore paths.
///
/// Dropped wholesale whenever the number of known tiles differs from the
/// count at the last population, or the frontier is not the one the
/// entries were computed against. Only one frontier is held at a time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutPathCache {
    entries: HashMap<CacheKey, Vec<Hex>>,
    known_tiles: usize,
    frontier: (usize, u64),
    #[serde(skip)]
    hits: u64,
    #[serde(skip)]
    misses: u64,
}

// Hit counters are diagnostics and not part of the cached state.
impl PartialEq for ScoutPathCache {
    fn eq(&self, other: &Self) -> bool {
        self.known_tiles == other.known_tiles
            && self.frontier == other.frontier
            && self.entries == other.entries
    }
}

impl ScoutPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path from `start` to the nearest non-food frontier cell, computed at
    /// most once per (start, frontier) while the known map is unchanged.
    pub fn path_to_frontier(
        &mut self,
        start: Hex,
        frontier: &HashSet<Hex>,
        food: &HashSet<Hex>,
        memory: &WorldMemory,
    ) -> Vec<Hex> {
        let current = (frontier.len(), frontier_fingerprint(frontier));
        if memory.len() != self.known_tiles || current != self.frontier {
            self.entries.clear();
            self.known_tiles = memory.len();
            self.frontier = current;
        }

        let key = (start, current.0, current.1);
        if let Some(path) = self.entries.get(&key) {
            self.hits += 1;
            return path.clone();
        }

        self.misses += 1;
        let path = path_to_nearest_unexplored(start, frontier, food, memory);
        self.entries.insert(key, path.clone());
        path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since this cache was created or loaded.
    pub fn hit_counts(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
