use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::world::hex::Hex;
use crate::world::tile::{Enemy, FoodItem, TerrainKind, Tile};

/// Every tile ever observed, keyed by coordinate.
///
/// Entries are overwritten when re-observed and never removed, so the
/// number of known coordinates only grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldMemory {
    tiles: HashMap<Hex, Tile>,
}

impl WorldMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch of visible tiles. Returns the tiles whose coordinate
    /// was not known before this call.
    pub fn observe(&mut self, tiles: &[Tile]) -> Vec<Tile> {
        let mut new_tiles = Vec::new();
        for tile in tiles {
            if self.tiles.insert(tile.hex(), *tile).is_none() {
                new_tiles.push(*tile);
            }
        }
        new_tiles
    }

    pub fn get(&self, hex: Hex) -> Option<&Tile> {
        self.tiles.get(&hex)
    }

    pub fn terrain(&self, hex: Hex) -> Option<TerrainKind> {
        self.tiles.get(&hex).map(|t| t.terrain)
    }

    /// Entry cost of a known passable cell; `None` for stone and unknown cells.
    pub fn entry_cost(&self, hex: Hex) -> Option<u32> {
        self.tiles.get(&hex).and_then(Tile::entry_cost)
    }

    pub fn contains(&self, hex: Hex) -> bool {
        self.tiles.contains_key(&hex)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn hexes(&self) -> impl Iterator<Item = Hex> + '_ {
        self.tiles.keys().copied()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Coordinates of every known tile of the given terrain.
    pub fn hexes_of(&self, terrain: TerrainKind) -> HashSet<Hex> {
        self.tiles
            .values()
            .filter(|t| t.terrain == terrain)
            .map(Tile::hex)
            .collect()
    }

    /// True when every entry is stored under its own coordinate.
    pub fn is_consistent(&self) -> bool {
        self.tiles.iter().all(|(hex, tile)| tile.hex() == *hex)
    }
}

/// Anything that sits on a single map cell.
pub trait Located {
    fn hex(&self) -> Hex;
}

impl Located for FoodItem {
    fn hex(&self) -> Hex {
        FoodItem::hex(self)
    }
}

impl Located for Enemy {
    fn hex(&self) -> Hex {
        Enemy::hex(self)
    }
}

/// Last known entity per coordinate, forgotten only when disproved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMemory<T> {
    entries: HashMap<Hex, T>,
}

impl<T> Default for EntityMemory<T> {
    fn default() -> Self {
        EntityMemory {
            entries: HashMap::new(),
        }
    }
}

impl<T: Located + Clone> EntityMemory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one turn of observations.
    ///
    /// A remembered cell inside `visible` is refreshed if the entity is still
    /// there and dropped otherwise. Cells outside `visible` keep whatever was
    /// remembered. Every observed entity is then merged in.
    pub fn update(&mut self, visible: &HashSet<Hex>, observed: &[T]) {
        let current: HashMap<Hex, &T> = observed.iter().map(|e| (e.hex(), e)).collect();

        self.entries.retain(|hex, _| !visible.contains(hex) || current.contains_key(hex));
        for (hex, entity) in current {
            self.entries.insert(hex, entity.clone());
        }
    }

    pub fn get(&self, hex: Hex) -> Option<&T> {
        self.entries.get(&hex)
    }

    pub fn contains(&self, hex: Hex) -> bool {
        self.entries.contains_key(&hex)
    }

    pub fn hexes(&self) -> HashSet<Hex> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Hex, &T)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
