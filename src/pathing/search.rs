use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use crate::engine::reservation::Reservations;
use crate::world::{Hex, WorldMemory};

/// Min-heap entry: `(cost, insertion counter, cell, parent)`.
/// The counter is unique, so ties in cost pop in insertion order and
/// the cell/parent fields never take part in the comparison.
type QueueEntry = Reverse<(u32, u64, Hex, Option<Hex>)>;

/// Dijkstra over known tiles, shared by the goal-directed searches.
///
/// Unknown and stone cells are never entered. `blocked` cells are pruned
/// unless they are the start.
struct Dijkstra<'a> {
    memory: &'a WorldMemory,
    start: Hex,
    queue: BinaryHeap<QueueEntry>,
    counter: u64,
    came_from: HashMap<Hex, Option<Hex>>,
}

impl<'a> Dijkstra<'a> {
    fn new(memory: &'a WorldMemory, start: Hex) -> Self {
        let mut search = Dijkstra {
            memory,
            start,
            queue: BinaryHeap::new(),
            counter: 0,
            came_from: HashMap::new(),
        };
        search.push(0, start, None);
        search
    }

    fn push(&mut self, cost: u32, hex: Hex, parent: Option<Hex>) {
        self.queue.push(Reverse((cost, self.counter, hex, parent)));
        self.counter += 1;
    }

    /// Settle the next cheapest unvisited cell and queue its neighbors.
    fn next(&mut self, blocked: impl Fn(Hex) -> bool) -> Option<(Hex, u32)> {
        while let Some(Reverse((cost, _, current, parent))) = self.queue.pop() {
            if self.came_from.contains_key(&current) {
                continue;
            }
            self.came_from.insert(current, parent);

            for neighbor in current.neighbors() {
                if self.came_from.contains_key(&neighbor) {
                    continue;
                }
                if neighbor != self.start && blocked(neighbor) {
                    continue;
                }
                let Some(step) = self.memory.entry_cost(neighbor) else {
                    continue;
                };
                self.push(cost + step, neighbor, Some(current));
            }
            return Some((current, cost));
        }
        None
    }

    /// Path from the start to a settled cell, both ends included.
    fn path_to(&self, end: Hex) -> Vec<Hex> {
        let mut path = vec![end];
        let mut current = end;
        while let Some(Some(parent)) = self.came_from.get(&current) {
            path.push(*parent);
            current = *parent;
        }
        path.reverse();
        path
    }
}

/// Cheapest path from `start` to any of `targets`, start included.
///
/// Reserved targets are not valid goals and reserved cells are never
/// expanded. The search stops after `max_hits` valid targets have been
/// settled and returns the cheapest of those, so the result is exact up
/// to that bound. A target equal to `start` is ignored. Empty when no
/// target is reachable.
pub fn find_min_cost_path_to_any(
    start: Hex,
    targets: &HashSet<Hex>,
    memory: &WorldMemory,
    reserved: &Reservations,
    max_hits: usize,
) -> Vec<Hex> {
    let valid: HashSet<Hex> = targets
        .iter()
        .copied()
        .filter(|h| !reserved.contains(*h) && *h != start)
        .collect();
    if valid.is_empty() {
        return Vec::new();
    }

    let mut search = Dijkstra::new(memory, start);
    let mut hits: Vec<(u32, Hex)> = Vec::new();
    while hits.len() < max_hits {
        let Some((current, cost)) = search.next(|h| reserved.contains(h)) else {
            break;
        };
        if valid.contains(&current) {
            hits.push((cost, current));
        }
    }

    match hits.iter().min_by_key(|(cost, _)| *cost) {
        Some(&(_, best)) => search.path_to(best),
        None => Vec::new(),
    }
}

/// Cheapest path from `start` to a frontier cell that is not food.
///
/// Ignores reservations; the caller truncates against them. Empty when no
/// such cell is reachable through known terrain.
pub fn path_to_nearest_unexplored(
    start: Hex,
    frontier: &HashSet<Hex>,
    food: &HashSet<Hex>,
    memory: &WorldMemory,
) -> Vec<Hex> {
    let mut search = Dijkstra::new(memory, start);
    while let Some((current, _)) = search.next(|_| false) {
        if frontier.contains(&current) && !food.contains(&current) {
            return search.path_to(current);
        }
    }
    Vec::new()
}

/// Escape route for a unit near enemies.
///
/// Flood-fills from `start` within `speed` movement points, never entering
/// stone, unknown, or reserved cells, and returns the path (start excluded)
/// to the reachable non-food cell whose nearest enemy is farthest away.
/// Ties keep the first cell found. Empty when nothing is reachable.
pub fn flee_path(
    start: Hex,
    enemies: &HashSet<Hex>,
    food: &HashSet<Hex>,
    speed: u32,
    memory: &WorldMemory,
    reserved: &Reservations,
) -> Vec<Hex> {
    let mut visited: HashSet<Hex> = HashSet::new();
    let mut queue: VecDeque<(Hex, Vec<Hex>, u32)> = VecDeque::new();
    queue.push_back((start, Vec::new(), 0));

    let mut best: Option<(u32, Vec<Hex>)> = None;

    while let Some((current, path, cost)) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }

        if current != start && !food.contains(&current) {
            let nearest_enemy = enemies
                .iter()
                .map(|e| current.distance(*e))
                .min()
                .unwrap_or(u32::MAX);
            if best.as_ref().is_none_or(|(d, _)| nearest_enemy > *d) {
                best = Some((nearest_enemy, path.clone()));
            }
        }

        for neighbor in current.neighbors() {
            if visited.contains(&neighbor) || reserved.contains(neighbor) {
                continue;
            }
            let Some(step) = memory.entry_cost(neighbor) else {
                continue;
            };
            if cost + step > speed {
                continue;
            }
            let mut next_path = path.clone();
            next_path.push(neighbor);
            queue.push_back((neighbor, next_path, cost + step));
        }
    }

    best.map(|(_, path)| path).unwrap_or_default()
}
