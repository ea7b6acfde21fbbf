use serde::{Deserialize, Serialize};

use crate::world::hex::Hex;

// === Enums ===

/// Terrain of a map cell. Encoded as an integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TerrainKind {
    Anthill,
    Empty,
    Dirt,
    Acid,
    Stone,
}

impl TerrainKind {
    /// Movement points needed to step onto a cell of this terrain.
    /// `None` means the cell cannot be entered.
    pub fn entry_cost(self) -> Option<u32> {
        match self {
            TerrainKind::Anthill | TerrainKind::Empty | TerrainKind::Acid => Some(1),
            TerrainKind::Dirt => Some(2),
            TerrainKind::Stone => None,
        }
    }

    pub fn is_passable(self) -> bool {
        self.entry_cost().is_some()
    }

    /// Passable but damaging, or impassable.
    pub fn is_hazard(self) -> bool {
        matches!(self, TerrainKind::Acid | TerrainKind::Stone)
    }
}

impl TryFrom<u8> for TerrainKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TerrainKind::Anthill),
            2 => Ok(TerrainKind::Empty),
            3 => Ok(TerrainKind::Dirt),
            4 => Ok(TerrainKind::Acid),
            5 => Ok(TerrainKind::Stone),
            other => Err(format!("unknown terrain type {}", other)),
        }
    }
}

impl From<TerrainKind> for u8 {
    fn from(kind: TerrainKind) -> u8 {
        match kind {
            TerrainKind::Anthill => 1,
            TerrainKind::Empty => 2,
            TerrainKind::Dirt => 3,
            TerrainKind::Acid => 4,
            TerrainKind::Stone => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum UnitKind {
    Worker,
    Fighter,
    Scout,
}

/// Fixed per-kind unit stats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStats {
    pub health: u32,
    pub attack: u32,
    pub view: u32,
    pub speed: u32,
}

impl UnitKind {
    pub fn stats(self) -> UnitStats {
        match self {
            UnitKind::Worker => UnitStats {
                health: 130,
                attack: 30,
                view: 1,
                speed: 5,
            },
            UnitKind::Fighter => UnitStats {
                health: 180,
                attack: 70,
                view: 1,
                speed: 4,
            },
            UnitKind::Scout => UnitStats {
                health: 80,
                attack: 20,
                view: 4,
                speed: 7,
            },
        }
    }

    pub fn speed(self) -> u32 {
        self.stats().speed
    }
}

impl TryFrom<u8> for UnitKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UnitKind::Worker),
            1 => Ok(UnitKind::Fighter),
            2 => Ok(UnitKind::Scout),
            other => Err(format!("unknown unit type {}", other)),
        }
    }
}

impl From<UnitKind> for u8 {
    fn from(kind: UnitKind) -> u8 {
        match kind {
            UnitKind::Worker => 0,
            UnitKind::Fighter => 1,
            UnitKind::Scout => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FoodKind {
    Apple,
    Bread,
    Nectar,
}

impl TryFrom<u8> for FoodKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FoodKind::Apple),
            2 => Ok(FoodKind::Bread),
            3 => Ok(FoodKind::Nectar),
            other => Err(format!("unknown food type {}", other)),
        }
    }
}

impl From<FoodKind> for u8 {
    fn from(kind: FoodKind) -> u8 {
        match kind {
            FoodKind::Apple => 1,
            FoodKind::Bread => 2,
            FoodKind::Nectar => 3,
        }
    }
}

// === Map cells ===

/// One observation of a map cell. Superseded, never mutated, by a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub q: i32,
    pub r: i32,
    #[serde(rename = "type")]
    pub terrain: TerrainKind,
    /// Cost as reported by the server. Planning uses `TerrainKind::entry_cost`.
    #[serde(default)]
    pub cost: u32,
}

impl Tile {
    pub fn new(hex: Hex, terrain: TerrainKind) -> Self {
        Tile {
            q: hex.q,
            r: hex.r,
            terrain,
            cost: terrain.entry_cost().unwrap_or(u32::MAX),
        }
    }

    pub fn hex(&self) -> Hex {
        Hex::new(self.q, self.r)
    }

    pub fn entry_cost(&self) -> Option<u32> {
        self.terrain.entry_cost()
    }
}

// === Entities ===

/// Food carried by a unit. The server sends `type: 0` for an empty load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carried {
    #[serde(rename = "type", default)]
    pub kind: u8,
    #[serde(default)]
    pub amount: u32,
}

impl Carried {
    pub fn kind(&self) -> Option<FoodKind> {
        FoodKind::try_from(self.kind).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }
}

/// A friendly unit, read-only within a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub q: i32,
    pub r: i32,
    #[serde(rename = "type")]
    pub kind: UnitKind,
    #[serde(default)]
    pub health: u32,
    #[serde(default)]
    pub food: Carried,
}

impl Unit {
    pub fn hex(&self) -> Hex {
        Hex::new(self.q, self.r)
    }

    pub fn speed(&self) -> u32 {
        self.kind.speed()
    }

    pub fn is_carrying(&self) -> bool {
        !self.food.is_empty()
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short: String = self.id.chars().take(8).collect();
        write!(f, "{:?} {} at {}", self.kind, short, self.hex())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub q: i32,
    pub r: i32,
    #[serde(rename = "type")]
    pub kind: UnitKind,
    #[serde(default)]
    pub health: u32,
    #[serde(default)]
    pub attack: u32,
    #[serde(default)]
    pub food: Carried,
}

impl Enemy {
    pub fn hex(&self) -> Hex {
        Hex::new(self.q, self.r)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub q: i32,
    pub r: i32,
    #[serde(rename = "type")]
    pub kind: FoodKind,
    pub amount: u32,
}

impl FoodItem {
    pub fn hex(&self) -> Hex {
        Hex::new(self.q, self.r)
    }
}
