use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::world::{Enemy, FoodItem, Hex, Tile, Unit};

/// Everything the bot sees on one turn, as sent by the arena endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnSnapshot {
    #[serde(default)]
    pub ants: Vec<Unit>,
    #[serde(default)]
    pub enemies: Vec<Enemy>,
    #[serde(default)]
    pub food: Vec<FoodItem>,
    #[serde(default)]
    pub home: Vec<Hex>,
    #[serde(default)]
    pub map: Vec<Tile>,
    pub turn_no: u32,
    pub spot: Hex,
    #[serde(default)]
    pub next_turn_in: f64,
    #[serde(default)]
    pub score: i64,
}

impl TurnSnapshot {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid turn snapshot: {}", e))
    }

    /// Cells currently within sensor range.
    pub fn visible_hexes(&self) -> HashSet<Hex> {
        self.map.iter().map(Tile::hex).collect()
    }

    pub fn enemy_hexes(&self) -> HashSet<Hex> {
        self.enemies.iter().map(Enemy::hex).collect()
    }

    pub fn food_hexes(&self) -> HashSet<Hex> {
        self.food.iter().map(FoodItem::hex).collect()
    }

    pub fn home_hexes(&self) -> HashSet<Hex> {
        self.home.iter().copied().collect()
    }
}

/// A move order. An empty path means stay; the current cell is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCommand {
    pub ant: String,
    pub path: Vec<Hex>,
}

impl MoveCommand {
    pub fn stay(ant: &str) -> Self {
        MoveCommand {
            ant: ant.to_string(),
            path: Vec::new(),
        }
    }
}

/// Body of the move submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveBatch {
    pub moves: Vec<MoveCommand>,
}

impl MoveBatch {
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("Cannot encode moves: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{TerrainKind, UnitKind};

    const ARENA_JSON: &str = r#"{
        "ants": [
            {"id": "a-1", "q": 10, "r": 10, "type": 0, "health": 130,
             "food": {"type": 0, "amount": 0}, "lastMove": [], "move": [],
             "lastAttack": null, "lastEnemyAnt": null}
        ],
        "enemies": [
            {"q": 14, "r": 9, "type": 1, "health": 180, "attack": 70,
             "food": {"type": 0, "amount": 0}}
        ],
        "food": [{"q": 11, "r": 10, "type": 2, "amount": 5}],
        "home": [{"q": 10, "r": 10}, {"q": 11, "r": 10}, {"q": 10, "r": 11}],
        "map": [
            {"q": 10, "r": 10, "type": 1, "cost": 1},
            {"q": 11, "r": 10, "type": 2, "cost": 1},
            {"q": 12, "r": 10, "type": 5, "cost": 0}
        ],
        "nextTurnIn": 1.8,
        "score": 12,
        "spot": {"q": 10, "r": 10},
        "turnNo": 7
    }"#;

    #[test]
    fn parses_arena_response() {
        let snapshot = TurnSnapshot::from_json(ARENA_JSON).unwrap();
        assert_eq!(snapshot.turn_no, 7);
        assert_eq!(snapshot.spot, Hex::new(10, 10));
        assert_eq!(snapshot.ants.len(), 1);
        assert_eq!(snapshot.ants[0].kind, UnitKind::Worker);
        assert_eq!(snapshot.enemies[0].kind, UnitKind::Fighter);
        assert_eq!(snapshot.map[2].terrain, TerrainKind::Stone);
        assert_eq!(snapshot.home_hexes().len(), 3);
        assert!(snapshot.visible_hexes().contains(&Hex::new(12, 10)));
        assert!(snapshot.food_hexes().contains(&Hex::new(11, 10)));
    }

    #[test]
    fn missing_turn_number_is_an_error() {
        let err = TurnSnapshot::from_json(r#"{"spot": {"q": 0, "r": 0}}"#).unwrap_err();
        assert!(err.contains("turnNo"), "{}", err);
    }

    #[test]
    fn move_batch_uses_server_field_names() {
        let batch = MoveBatch {
            moves: vec![
                MoveCommand {
                    ant: "a-1".to_string(),
                    path: vec![Hex::new(11, 10)],
                },
                MoveCommand::stay("a-2"),
            ],
        };
        let json = batch.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"moves":[{"ant":"a-1","path":[{"q":11,"r":10}]},{"ant":"a-2","path":[]}]}"#
        );
    }
}
