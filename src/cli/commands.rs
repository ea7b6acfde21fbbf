use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::EngineConfig;
use crate::engine::{Engine, EngineState};
use crate::persistence::{self, SnapshotError};
use crate::protocol::TurnSnapshot;

/// Decide one turn: resume the latest saved state (or start fresh), print
/// the move batch on stdout, then save and prune state.
pub fn decide(config: &EngineConfig, snapshot_path: &Path) -> Result<(), String> {
    let json = fs::read_to_string(snapshot_path)
        .map_err(|e| format!("Cannot read {}: {}", snapshot_path.display(), e))?;
    let snapshot = TurnSnapshot::from_json(&json)?;

    let state_dir = Path::new(&config.state_directory);
    let mut engine = match persistence::load_latest_valid_snapshot(state_dir) {
        Ok(state) => {
            info!(
                session = %state.id,
                last_turn = state.last_turn,
                known_tiles = state.memory.len(),
                "Resuming engine state"
            );
            Engine::with_state(config.clone(), state)
        }
        Err(SnapshotError::NoValidSnapshots) => {
            info!(dir = %state_dir.display(), "No saved state, starting fresh");
            Engine::new(config.clone())
        }
        Err(e) => return Err(format!("Failed to load engine state: {}", e)),
    };

    let result = engine.execute_turn(&snapshot);
    println!("{}", result.commands.to_json()?);

    save_and_prune(engine.state(), config)
}

/// Run a fresh engine over newline-delimited snapshots, printing one move
/// batch per line.
pub fn replay(config: &EngineConfig, input: &Path, save: bool) -> Result<(), String> {
    let content = fs::read_to_string(input)
        .map_err(|e| format!("Cannot read {}: {}", input.display(), e))?;

    let mut engine = Engine::new(config.clone());
    let mut turns = 0_u32;
    let mut total_ms = 0.0_f32;
    let mut last_resort = 0_u32;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let snapshot = TurnSnapshot::from_json(line)
            .map_err(|e| format!("{}:{}: {}", input.display(), line_no + 1, e))?;
        let result = engine.execute_turn(&snapshot);
        println!("{}", result.commands.to_json()?);

        turns += 1;
        total_ms += result.statistics.elapsed_ms;
        last_resort += result.statistics.last_resort_moves;
    }

    let state = engine.state();
    eprintln!(
        "Replayed {} turn(s): {} known tiles, {} remembered food, {} remembered enemies, \
         {} last-resort move(s), {:.2} ms/turn",
        turns,
        state.memory.len(),
        state.food.len(),
        state.enemies.len(),
        last_resort,
        if turns > 0 { total_ms / turns as f32 } else { 0.0 }
    );

    if save {
        save_and_prune(state, config)?;
    }
    Ok(())
}

fn save_and_prune(state: &EngineState, config: &EngineConfig) -> Result<(), String> {
    let state_dir = Path::new(&config.state_directory);
    let path = persistence::save_snapshot(state, state_dir)
        .map_err(|e| format!("Failed to save engine state: {}", e))?;
    info!(path = %path.display(), "Engine state saved");

    if let Err(e) = persistence::prune_snapshots(state_dir, config.max_snapshots as usize) {
        eprintln!("Warning: snapshot pruning failed: {}", e);
    }
    Ok(())
}

/// Print the saved engine states in `dir`, newest first.
pub fn list_states(dir: &Path) -> Result<(), String> {
    let snapshots =
        persistence::list_snapshots(dir).map_err(|e| format!("Error listing snapshots: {}", e))?;

    if snapshots.is_empty() {
        println!("No snapshots found in {}", dir.display());
        return Ok(());
    }

    println!(
        "{:<40} {:>8} {:>8} {:>6} {:>8} {:>12}",
        "File", "Turn", "Tiles", "Food", "Enemies", "Size"
    );
    println!("{}", "-".repeat(87));
    for s in &snapshots {
        let name = s.path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
        match &s.summary {
            Some(summary) => println!(
                "{:<40} {:>8} {:>8} {:>6} {:>8} {:>9} KB",
                name,
                s.turn,
                summary.known_tiles,
                summary.remembered_food,
                summary.remembered_enemies,
                s.file_size / 1024
            ),
            None => println!(
                "{:<40} {:>8} {:>24} {:>9} KB",
                name,
                s.turn,
                "(unreadable)",
                s.file_size / 1024
            ),
        }
    }
    println!("\n{} snapshot(s) in {}", snapshots.len(), dir.display());
    Ok(())
}

/// Print a summary of one saved engine state.
pub fn inspect_state(path: &Path) -> Result<(), String> {
    let state = persistence::load_snapshot(path)
        .map_err(|e| format!("Failed to load snapshot: {}", e))?;

    println!("=== Engine state {} ===", state.id);
    println!("Turns processed: {}", state.turns_processed);
    println!("Last turn: {}", state.last_turn);
    println!();

    println!("--- World memory ---");
    println!("  Known tiles: {}", state.memory.len());
    let mut terrain_counts: HashMap<_, u32> = HashMap::new();
    for tile in state.memory.tiles() {
        *terrain_counts.entry(tile.terrain).or_default() += 1;
    }
    let mut sorted: Vec<_> = terrain_counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    let known = state.memory.len().max(1) as f64;
    for (terrain, count) in &sorted {
        println!(
            "  {:?}: {} ({:.1}%)",
            terrain,
            count,
            *count as f64 / known * 100.0
        );
    }
    println!();

    println!("--- Remembered entities ---");
    println!("  Food: {}", state.food.len());
    let mut food: Vec<_> = state.food.iter().collect();
    food.sort_by_key(|(hex, _)| **hex);
    for (hex, item) in food {
        println!("    {} {:?} x{}", hex, item.kind, item.amount);
    }
    println!("  Enemies: {}", state.enemies.len());
    let mut enemies: Vec<_> = state.enemies.iter().collect();
    enemies.sort_by_key(|(hex, _)| **hex);
    for (hex, enemy) in enemies {
        println!("    {} {:?} hp {}", hex, enemy.kind, enemy.health);
    }
    println!();

    println!("--- Bookkeeping ---");
    println!("  Same-place counters: {}", state.stuck.len());
    println!("  Cached explore paths: {}", state.scout_cache.len());

    Ok(())
}
