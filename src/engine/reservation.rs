use std::collections::HashSet;

use tracing::debug;

use crate::config::EngineConfig;
use crate::protocol::TurnSnapshot;
use crate::world::{EntityMemory, FoodItem, Hex, TerrainKind, UnitKind, WorldMemory};

/// Cells claimed for the current turn. Later units treat them as obstacles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reservations {
    cells: HashSet<Hex>,
}

impl Reservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the cell was already claimed.
    pub fn claim(&mut self, hex: Hex) -> bool {
        self.cells.insert(hex)
    }

    pub fn claim_path(&mut self, path: &[Hex]) {
        self.cells.extend(path.iter().copied());
    }

    pub fn contains(&self, hex: Hex) -> bool {
        self.cells.contains(&hex)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Counts of what went into a freshly seeded reservation set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedSummary {
    pub spawn: bool,
    pub hazards: usize,
    pub enemies: usize,
    pub fighter_zone: usize,
    pub contested_food: Vec<Hex>,
}

/// Build the turn's starting reservation set.
///
/// Seeds, in order: the spawn cell while the roster is small, known stone
/// (and acid early in the game), every visible enemy, the cells around
/// enemy fighters while the roster is small, and remembered food with too
/// many enemies nearby.
pub fn seed_reservations(
    config: &EngineConfig,
    snapshot: &TurnSnapshot,
    memory: &WorldMemory,
    food: &EntityMemory<FoodItem>,
) -> (Reservations, SeedSummary) {
    let mut reserved = Reservations::new();
    let mut summary = SeedSummary::default();
    let unit_count = snapshot.ants.len();

    if unit_count < config.home_block_max_units {
        reserved.claim(snapshot.spot);
        summary.spawn = true;
    }

    let avoid_acid = snapshot.turn_no <= config.acid_avoid_until_turn;
    for tile in memory.tiles() {
        let hazard = match tile.terrain {
            TerrainKind::Stone => true,
            TerrainKind::Acid => avoid_acid,
            _ => false,
        };
        if hazard {
            reserved.claim(tile.hex());
            summary.hazards += 1;
        }
    }

    let enemy_hexes = snapshot.enemy_hexes();
    for hex in &enemy_hexes {
        reserved.claim(*hex);
    }
    summary.enemies = enemy_hexes.len();

    if unit_count < config.fighter_zone_max_units {
        for enemy in snapshot.enemies.iter().filter(|e| e.kind == UnitKind::Fighter) {
            for neighbor in enemy.hex().neighbors() {
                if reserved.claim(neighbor) {
                    summary.fighter_zone += 1;
                }
            }
        }
    }

    for food_hex in food.hexes() {
        let nearby = enemy_hexes
            .iter()
            .filter(|e| food_hex.distance(**e) <= config.contested_food_radius)
            .count();
        if nearby >= config.contested_food_min_enemies {
            debug!(food = %food_hex, enemies = nearby, "Abandoning contested food");
            reserved.claim(food_hex);
            summary.contested_food.push(food_hex);
        }
    }

    (reserved, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Carried, Enemy, FoodKind, Tile, Unit};
    use std::collections::HashSet;

    fn unit(id: usize) -> Unit {
        Unit {
            id: format!("u{}", id),
            q: 0,
            r: 0,
            kind: UnitKind::Worker,
            health: 130,
            food: Carried::default(),
        }
    }

    fn enemy(q: i32, r: i32, kind: UnitKind) -> Enemy {
        Enemy {
            q,
            r,
            kind,
            health: 100,
            attack: 10,
            food: Carried::default(),
        }
    }

    fn snapshot(units: usize, turn_no: u32, enemies: Vec<Enemy>) -> TurnSnapshot {
        TurnSnapshot {
            ants: (0..units).map(unit).collect(),
            enemies,
            food: Vec::new(),
            home: vec![Hex::new(0, 0)],
            map: Vec::new(),
            turn_no,
            spot: Hex::new(0, 0),
            next_turn_in: 1.0,
            score: 0,
        }
    }

    fn memory_with(tiles: &[((i32, i32), TerrainKind)]) -> WorldMemory {
        let mut memory = WorldMemory::new();
        let tiles: Vec<Tile> = tiles
            .iter()
            .map(|&((q, r), t)| Tile::new(Hex::new(q, r), t))
            .collect();
        memory.observe(&tiles);
        memory
    }

    #[test]
    fn spawn_reserved_only_for_small_roster() {
        let config = EngineConfig::default();
        let memory = WorldMemory::new();
        let food = EntityMemory::new();

        let (reserved, summary) = seed_reservations(&config, &snapshot(99, 1, vec![]), &memory, &food);
        assert!(reserved.contains(Hex::new(0, 0)));
        assert!(summary.spawn);

        let (reserved, _) = seed_reservations(&config, &snapshot(100, 1, vec![]), &memory, &food);
        assert!(!reserved.contains(Hex::new(0, 0)));
    }

    #[test]
    fn acid_reserved_until_turn_200_stone_always() {
        let config = EngineConfig::default();
        let memory = memory_with(&[
            ((5, 5), TerrainKind::Stone),
            ((6, 5), TerrainKind::Acid),
            ((7, 5), TerrainKind::Dirt),
        ]);
        let food = EntityMemory::new();

        let (early, _) = seed_reservations(&config, &snapshot(200, 200, vec![]), &memory, &food);
        assert!(early.contains(Hex::new(5, 5)));
        assert!(early.contains(Hex::new(6, 5)));
        assert!(!early.contains(Hex::new(7, 5)));

        let (late, _) = seed_reservations(&config, &snapshot(200, 201, vec![]), &memory, &food);
        assert!(late.contains(Hex::new(5, 5)));
        assert!(!late.contains(Hex::new(6, 5)));
    }

    #[test]
    fn fighter_zone_only_below_threshold() {
        let config = EngineConfig::default();
        let memory = WorldMemory::new();
        let food = EntityMemory::new();
        let enemies = vec![
            enemy(10, 10, UnitKind::Fighter),
            enemy(20, 20, UnitKind::Worker),
        ];

        let (reserved, summary) =
            seed_reservations(&config, &snapshot(69, 1, enemies.clone()), &memory, &food);
        assert!(reserved.contains(Hex::new(10, 10)));
        assert!(reserved.contains(Hex::new(20, 20)));
        for n in Hex::new(10, 10).neighbors() {
            assert!(reserved.contains(n));
        }
        assert!(!reserved.contains(Hex::new(21, 20)));
        assert_eq!(summary.fighter_zone, 6);

        let (reserved, _) = seed_reservations(&config, &snapshot(70, 1, enemies), &memory, &food);
        assert!(reserved.contains(Hex::new(10, 10)));
        assert!(!reserved.contains(Hex::new(11, 10)));
    }

    #[test]
    fn food_with_more_than_two_enemies_nearby_is_abandoned() {
        let config = EngineConfig::default();
        let memory = WorldMemory::new();
        let mut food = EntityMemory::new();
        let visible: HashSet<Hex> = HashSet::new();
        food.update(
            &visible,
            &[
                FoodItem { q: 0, r: 10, kind: FoodKind::Apple, amount: 3 },
                FoodItem { q: 30, r: 10, kind: FoodKind::Bread, amount: 3 },
            ],
        );
        let enemies = vec![
            enemy(1, 10, UnitKind::Worker),
            enemy(2, 10, UnitKind::Worker),
            enemy(3, 10, UnitKind::Worker),
            enemy(30, 12, UnitKind::Worker),
            enemy(31, 12, UnitKind::Worker),
        ];

        let (reserved, summary) =
            seed_reservations(&config, &snapshot(100, 1, enemies), &memory, &food);
        assert!(reserved.contains(Hex::new(0, 10)));
        assert!(!reserved.contains(Hex::new(30, 10)));
        assert_eq!(summary.contested_food, vec![Hex::new(0, 10)]);
    }
}
