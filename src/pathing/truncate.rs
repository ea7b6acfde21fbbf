use crate::engine::reservation::Reservations;
use crate::world::{Hex, WorldMemory};

/// Cuts planned paths down to what a unit can walk this turn.
pub struct PathTruncator<'a> {
    memory: &'a WorldMemory,
    reserved: &'a Reservations,
}

impl<'a> PathTruncator<'a> {
    pub fn new(memory: &'a WorldMemory, reserved: &'a Reservations) -> Self {
        PathTruncator { memory, reserved }
    }

    /// Steps of `path` (which starts at the unit's cell) that fit in `speed`
    /// movement points, excluding the start.
    ///
    /// Stops at the first step that would exceed the budget or that enters an
    /// unknown or stone cell, then cuts before the first reserved cell.
    pub fn truncate(&self, path: &[Hex], speed: u32) -> Vec<Hex> {
        if path.len() < 2 {
            return Vec::new();
        }

        let mut steps = Vec::new();
        let mut spent = 0;
        for &hex in &path[1..] {
            let Some(cost) = self.memory.entry_cost(hex) else {
                break;
            };
            if spent + cost > speed {
                break;
            }
            steps.push(hex);
            spent += cost;
        }

        if let Some(cut) = steps.iter().position(|h| self.reserved.contains(*h)) {
            steps.truncate(cut);
        }
        steps
    }
}

/// Sum of entry costs of `steps`. Unknown or impassable steps count as `None`.
pub fn steps_cost(steps: &[Hex], memory: &WorldMemory) -> Option<u32> {
    steps.iter().map(|h| memory.entry_cost(*h)).sum()
}
