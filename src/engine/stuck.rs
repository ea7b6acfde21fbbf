use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::world::{Hex, Unit};

/// How many consecutive turns each cell has been held by the same unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StuckTracker {
    occupants: HashMap<Hex, (String, u32)>,
}

impl StuckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more turn for every unit on its current cell. A cell taken
    /// over by a different unit restarts at 1; cells nobody holds are dropped.
    pub fn record(&mut self, units: &[Unit]) {
        let occupied: HashSet<Hex> = units.iter().map(Unit::hex).collect();
        self.occupants.retain(|hex, _| occupied.contains(hex));

        for unit in units {
            let entry = self
                .occupants
                .entry(unit.hex())
                .or_insert_with(|| (unit.id.clone(), 0));
            if entry.0 == unit.id {
                entry.1 += 1;
            } else {
                *entry = (unit.id.clone(), 1);
            }
        }
    }

    pub fn turns_in_place(&self, unit: &Unit) -> u32 {
        match self.occupants.get(&unit.hex()) {
            Some((id, count)) if *id == unit.id => *count,
            _ => 0,
        }
    }

    pub fn is_stuck(&self, unit: &Unit, threshold: u32) -> bool {
        self.turns_in_place(unit) > threshold
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }
}
