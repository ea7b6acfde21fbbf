pub mod hex;
pub mod memory;
pub mod tile;

pub use hex::Hex;
pub use memory::{EntityMemory, Located, WorldMemory};
pub use tile::{Carried, Enemy, FoodItem, FoodKind, TerrainKind, Tile, Unit, UnitKind, UnitStats};
