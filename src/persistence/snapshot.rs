use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::engine::EngineState;

/// Header written ahead of every saved state. Listing reads only this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub session: Uuid,
    pub last_turn: u32,
    pub turns_processed: u64,
    pub known_tiles: u64,
    pub remembered_food: u64,
    pub remembered_enemies: u64,
}

impl StateSummary {
    pub fn of(state: &EngineState) -> Self {
        StateSummary {
            session: state.id,
            last_turn: state.last_turn,
            turns_processed: state.turns_processed,
            known_tiles: state.memory.len() as u64,
            remembered_food: state.food.len() as u64,
            remembered_enemies: state.enemies.len() as u64,
        }
    }
}

/// Metadata about an engine-state file on disk.
///
/// `summary` is `None` when the header cannot be decoded.
#[derive(Debug, Clone)]
pub struct SnapshotMetadata {
    pub path: PathBuf,
    pub turn: u32,
    pub timestamp: u64,
    pub file_size: u64,
    pub summary: Option<StateSummary>,
}

/// Errors that can occur during snapshot operations.
#[derive(Debug)]
pub enum SnapshotError {
    Io(io::Error),
    Serialize(String),
    Deserialize(String),
    Corrupt(PathBuf),
    NoValidSnapshots,
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "I/O error: {}", e),
            SnapshotError::Serialize(e) => write!(f, "Serialization error: {}", e),
            SnapshotError::Deserialize(e) => write!(f, "Deserialization error: {}", e),
            SnapshotError::Corrupt(path) => {
                write!(f, "Corrupt snapshot: {}", path.display())
            }
            SnapshotError::NoValidSnapshots => {
                write!(f, "No valid engine snapshots found")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<io::Error> for SnapshotError {
    fn from(e: io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

fn snapshot_filename(turn: u32, timestamp: u64) -> String {
    format!("engine-turn{}-{}.bin", turn, timestamp)
}

/// Expected format: `engine-turn{N}-{timestamp}.bin`
fn parse_snapshot_filename(filename: &str) -> Option<(u32, u64)> {
    let stem = filename.strip_suffix(".bin")?;
    let rest = stem.strip_prefix("engine-turn")?;
    let (turn_str, ts_str) = rest.split_once('-')?;
    let turn = turn_str.parse::<u32>().ok()?;
    let ts = ts_str.parse::<u64>().ok()?;
    Some((turn, ts))
}

fn unix_timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Summary header followed by the full state, both bincode.
pub fn encode_state(state: &EngineState) -> Result<Vec<u8>, SnapshotError> {
    let mut encoded = bincode::serialize(&StateSummary::of(state))
        .map_err(|e| SnapshotError::Serialize(e.to_string()))?;
    let body = bincode::serialize(state).map_err(|e| SnapshotError::Serialize(e.to_string()))?;
    encoded.extend_from_slice(&body);
    Ok(encoded)
}

/// Save engine state to `snapshot_dir` via a temp file and rename, so a
/// partial write never replaces a good snapshot.
pub fn save_snapshot(state: &EngineState, snapshot_dir: &Path) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(snapshot_dir)?;

    let filename = snapshot_filename(state.last_turn, unix_timestamp_now());
    let target = snapshot_dir.join(&filename);
    let tmp = snapshot_dir.join(format!(".{}.tmp", filename));

    let encoded = encode_state(state)?;

    if let Err(e) = fs::write(&tmp, &encoded) {
        let _ = fs::remove_file(&tmp);
        return Err(SnapshotError::Io(e));
    }

    if let Err(e) = fs::rename(&tmp, &target) {
        let _ = fs::remove_file(&tmp);
        return Err(SnapshotError::Io(e));
    }

    Ok(target)
}

/// Upper bound on the encoded header size read when listing.
const SUMMARY_READ_LIMIT: u64 = 256;

/// Decode just the header of a saved state.
pub fn read_summary(path: &Path) -> Result<StateSummary, SnapshotError> {
    let mut head = Vec::new();
    File::open(path)?
        .take(SUMMARY_READ_LIMIT)
        .read_to_end(&mut head)?;
    bincode::deserialize(&head).map_err(|e| SnapshotError::Deserialize(e.to_string()))
}

/// Load engine state from a snapshot file.
///
/// Rejects a state whose world memory files a tile under the wrong
/// coordinate, or whose body disagrees with its header.
pub fn load_snapshot(path: &Path) -> Result<EngineState, SnapshotError> {
    let data = fs::read(path)?;
    let summary: StateSummary =
        bincode::deserialize(&data).map_err(|e| SnapshotError::Deserialize(e.to_string()))?;
    let header_len = bincode::serialized_size(&summary)
        .map_err(|e| SnapshotError::Deserialize(e.to_string()))? as usize;
    let body = data
        .get(header_len..)
        .ok_or_else(|| SnapshotError::Corrupt(path.to_path_buf()))?;
    let state: EngineState =
        bincode::deserialize(body).map_err(|e| SnapshotError::Deserialize(e.to_string()))?;

    if !state.is_consistent() || StateSummary::of(&state) != summary {
        return Err(SnapshotError::Corrupt(path.to_path_buf()));
    }

    Ok(state)
}

/// List snapshots in a directory, newest first.
pub fn list_snapshots(snapshot_dir: &Path) -> Result<Vec<SnapshotMetadata>, SnapshotError> {
    if !snapshot_dir.exists() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();

    for entry in fs::read_dir(snapshot_dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };

        // temp files
        if filename.starts_with('.') {
            continue;
        }

        if let Some((turn, timestamp)) = parse_snapshot_filename(&filename) {
            let file_size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            snapshots.push(SnapshotMetadata {
                summary: read_summary(&path).ok(),
                path: path.clone(),
                turn,
                timestamp,
                file_size,
            });
        }
    }

    snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.turn.cmp(&a.turn)));

    Ok(snapshots)
}

/// Delete all but the `max_snapshots` newest snapshots. Returns the deleted paths.
pub fn prune_snapshots(
    snapshot_dir: &Path,
    max_snapshots: usize,
) -> Result<Vec<PathBuf>, SnapshotError> {
    let snapshots = list_snapshots(snapshot_dir)?;

    let mut deleted = Vec::new();
    if snapshots.len() > max_snapshots {
        for snapshot in &snapshots[max_snapshots..] {
            fs::remove_file(&snapshot.path)?;
            deleted.push(snapshot.path.clone());
        }
    }

    Ok(deleted)
}

/// Load the newest snapshot that decodes cleanly, skipping corrupt ones.
pub fn load_latest_valid_snapshot(snapshot_dir: &Path) -> Result<EngineState, SnapshotError> {
    let snapshots = list_snapshots(snapshot_dir)?;

    for snapshot in &snapshots {
        match load_snapshot(&snapshot.path) {
            Ok(state) => return Ok(state),
            Err(e) => {
                warn!(
                    path = %snapshot.path.display(),
                    error = %e,
                    "Corrupt snapshot, trying next"
                );
            }
        }
    }

    Err(SnapshotError::NoValidSnapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::protocol::TurnSnapshot;
    use crate::world::{Carried, Enemy, FoodItem, FoodKind, Hex, TerrainKind, Tile, Unit, UnitKind};
    use rand_chacha::ChaCha8Rng;
    use rand::SeedableRng;
    use serde::Serialize;
    use std::time::Instant;
    use tempfile::TempDir;
    use uuid::Uuid;

    /// State after one turn on a `size x size` map with a worker and some food.
    fn make_test_state(size: i32) -> EngineState {
        let mut map = Vec::new();
        for r in 0..size {
            for q in 0..size {
                let terrain = if (q + r) % 7 == 3 {
                    TerrainKind::Dirt
                } else {
                    TerrainKind::Empty
                };
                map.push(Tile::new(Hex::new(q, r), terrain));
            }
        }
        let snapshot = TurnSnapshot {
            ants: vec![Unit {
                id: "w-1".to_string(),
                q: 1,
                r: 1,
                kind: UnitKind::Worker,
                health: 130,
                food: Carried::default(),
            }],
            enemies: Vec::new(),
            food: vec![FoodItem {
                q: 4,
                r: 2,
                kind: FoodKind::Bread,
                amount: 4,
            }],
            home: vec![Hex::new(0, 0)],
            map,
            turn_no: 12,
            spot: Hex::new(0, 0),
            next_turn_in: 1.0,
            score: 0,
        };
        let mut engine = Engine::new(EngineConfig {
            seed: 42,
            ..EngineConfig::default()
        });
        engine.execute_turn(&snapshot);
        engine.into_state()
    }

    #[test]
    fn save_and_load_round_trip_identical() {
        let dir = TempDir::new().unwrap();
        let state = make_test_state(20);

        let path = save_snapshot(&state, dir.path()).unwrap();
        let restored = load_snapshot(&path).unwrap();

        assert_eq!(state, restored);
        assert_eq!(restored.last_turn, 12);
        assert_eq!(restored.memory.len(), 400);
        assert_eq!(restored.food.len(), 1);
    }

    #[test]
    fn file_name_carries_last_turn() {
        let dir = TempDir::new().unwrap();
        let path = save_snapshot(&make_test_state(5), dir.path()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("engine-turn12-"), "{}", name);
    }

    #[test]
    fn snapshot_filename_parse_round_trip() {
        let filename = snapshot_filename(500, 1708300000);
        assert_eq!(filename, "engine-turn500-1708300000.bin");

        let (turn, ts) = parse_snapshot_filename(&filename).unwrap();
        assert_eq!(turn, 500);
        assert_eq!(ts, 1708300000);
    }

    #[test]
    fn parse_invalid_filename_returns_none() {
        assert!(parse_snapshot_filename("random.bin").is_none());
        assert!(parse_snapshot_filename("engine-turn.bin").is_none());
        assert!(parse_snapshot_filename("engine-turnabc-123.bin").is_none());
        assert!(parse_snapshot_filename("engine-turn100-abc.bin").is_none());
        assert!(parse_snapshot_filename("state-turn100-123.bin").is_none());
    }

    #[test]
    fn list_snapshots_returns_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        let data = encode_state(&make_test_state(5)).unwrap();

        fs::write(dir.path().join("engine-turn10-1000.bin"), &data).unwrap();
        fs::write(dir.path().join("engine-turn20-2000.bin"), &data).unwrap();
        fs::write(dir.path().join("engine-turn30-3000.bin"), &data).unwrap();

        let snapshots = list_snapshots(dir.path()).unwrap();
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].turn, 30);
        assert_eq!(snapshots[1].turn, 20);
        assert_eq!(snapshots[2].turn, 10);
    }

    #[test]
    fn list_snapshots_skips_foreign_and_temp_files() {
        let dir = TempDir::new().unwrap();
        let data = encode_state(&make_test_state(5)).unwrap();

        fs::write(dir.path().join("engine-turn10-1000.bin"), &data).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a snapshot").unwrap();
        fs::write(dir.path().join(".engine-turn99-9999.bin.tmp"), "temp file").unwrap();

        let snapshots = list_snapshots(dir.path()).unwrap();
        assert_eq!(snapshots.len(), 1);
    }

    #[test]
    fn list_snapshots_nonexistent_dir() {
        let dir = TempDir::new().unwrap();
        let snapshots = list_snapshots(&dir.path().join("missing")).unwrap();
        assert!(snapshots.is_empty());
    }

    #[test]
    fn prune_keeps_max_snapshots() {
        let dir = TempDir::new().unwrap();
        let data = encode_state(&make_test_state(5)).unwrap();

        for i in 0..6u64 {
            fs::write(
                dir.path().join(format!("engine-turn{}-{}.bin", i * 10, 1000 + i)),
                &data,
            )
            .unwrap();
        }

        let deleted = prune_snapshots(dir.path(), 3).unwrap();
        assert_eq!(deleted.len(), 3);

        let remaining = list_snapshots(dir.path()).unwrap();
        let stamps: Vec<u64> = remaining.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![1005, 1004, 1003]);
    }

    #[test]
    fn prune_noop_when_under_limit() {
        let dir = TempDir::new().unwrap();
        let data = encode_state(&make_test_state(5)).unwrap();

        fs::write(dir.path().join("engine-turn10-1000.bin"), &data).unwrap();
        fs::write(dir.path().join("engine-turn20-2000.bin"), &data).unwrap();

        assert!(prune_snapshots(dir.path(), 5).unwrap().is_empty());
        assert_eq!(list_snapshots(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn load_garbage_returns_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine-turn0-1000.bin");
        fs::write(&path, b"this is not valid bincode data").unwrap();

        assert!(load_snapshot(&path).is_err());
    }

    #[test]
    fn load_truncated_snapshot_returns_error() {
        let dir = TempDir::new().unwrap();
        let data = encode_state(&make_test_state(10)).unwrap();

        let path = dir.path().join("engine-turn0-1000.bin");
        fs::write(&path, &data[..data.len() / 2]).unwrap();

        assert!(load_snapshot(&path).is_err());
    }

    /// Same wire layout as `EngineState`, with maps written as pair lists so
    /// a tile can be filed under the wrong coordinate.
    #[derive(Serialize)]
    struct RawState {
        id: Uuid,
        turns_processed: u64,
        last_turn: u32,
        memory: Vec<(Hex, Tile)>,
        food: Vec<(Hex, FoodItem)>,
        enemies: Vec<(Hex, Enemy)>,
        stuck: Vec<(Hex, (String, u32))>,
        scout_entries: Vec<((Hex, usize, u64), Vec<Hex>)>,
        scout_known_tiles: usize,
        scout_frontier: (usize, u64),
        rng: ChaCha8Rng,
    }

    #[test]
    fn misfiled_tile_is_reported_corrupt() {
        let dir = TempDir::new().unwrap();
        let raw = RawState {
            id: Uuid::new_v4(),
            turns_processed: 1,
            last_turn: 1,
            memory: vec![(Hex::new(0, 0), Tile::new(Hex::new(3, 3), TerrainKind::Empty))],
            food: Vec::new(),
            enemies: Vec::new(),
            stuck: Vec::new(),
            scout_entries: Vec::new(),
            scout_known_tiles: 0,
            scout_frontier: (0, 0),
            rng: ChaCha8Rng::seed_from_u64(1),
        };
        let summary = StateSummary {
            session: raw.id,
            last_turn: 1,
            turns_processed: 1,
            known_tiles: 1,
            remembered_food: 0,
            remembered_enemies: 0,
        };
        let mut data = bincode::serialize(&summary).unwrap();
        data.extend(bincode::serialize(&raw).unwrap());
        let path = dir.path().join("engine-turn1-1000.bin");
        fs::write(&path, data).unwrap();

        assert!(matches!(
            load_snapshot(&path).unwrap_err(),
            SnapshotError::Corrupt(p) if p == path
        ));
    }

    #[test]
    fn listing_reads_state_summary() {
        let dir = TempDir::new().unwrap();
        let state = make_test_state(6);
        save_snapshot(&state, dir.path()).unwrap();
        fs::write(dir.path().join("engine-turn40-9999.bin"), b"not a state").unwrap();

        // The hand-written file carries an older timestamp, so it lists last.
        let snapshots = list_snapshots(dir.path()).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[1].summary.is_none());

        let summary = snapshots[0].summary.as_ref().unwrap();
        assert_eq!(summary.session, state.id);
        assert_eq!(summary.last_turn, 12);
        assert_eq!(summary.known_tiles, 36);
        assert_eq!(summary.remembered_food, 1);
        assert_eq!(summary.remembered_enemies, 0);
    }

    #[test]
    fn header_disagreeing_with_body_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let state = make_test_state(5);
        let mut summary = StateSummary::of(&state);
        summary.known_tiles += 1;

        let mut data = bincode::serialize(&summary).unwrap();
        data.extend(bincode::serialize(&state).unwrap());
        let path = dir.path().join("engine-turn12-1000.bin");
        fs::write(&path, data).unwrap();

        assert_eq!(read_summary(&path).unwrap(), summary);
        assert!(matches!(load_snapshot(&path).unwrap_err(), SnapshotError::Corrupt(_)));
    }

    #[test]
    fn load_latest_valid_falls_back_on_corrupt() {
        let dir = TempDir::new().unwrap();
        let state = make_test_state(8);
        let valid_data = encode_state(&state).unwrap();

        fs::write(dir.path().join("engine-turn10-1000.bin"), &valid_data).unwrap();
        fs::write(dir.path().join("engine-turn20-2000.bin"), b"corrupt data here").unwrap();

        let restored = load_latest_valid_snapshot(dir.path()).unwrap();
        assert_eq!(restored.id, state.id);
    }

    #[test]
    fn load_latest_valid_all_corrupt_returns_error() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("engine-turn10-1000.bin"), b"corrupt1").unwrap();
        fs::write(dir.path().join("engine-turn20-2000.bin"), b"corrupt2").unwrap();

        assert!(matches!(
            load_latest_valid_snapshot(dir.path()).unwrap_err(),
            SnapshotError::NoValidSnapshots
        ));
    }

    #[test]
    fn load_latest_valid_empty_dir_returns_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_latest_valid_snapshot(dir.path()).unwrap_err(),
            SnapshotError::NoValidSnapshots
        ));
    }

    #[test]
    fn atomic_write_no_temp_files_remain() {
        let dir = TempDir::new().unwrap();
        save_snapshot(&make_test_state(5), dir.path()).unwrap();

        let temp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().is_some_and(|n| n.starts_with('.')))
            .collect();
        assert!(temp_files.is_empty());
    }

    #[test]
    fn save_creates_directory_if_missing() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("nested").join("state");

        let path = save_snapshot(&make_test_state(5), &nested).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn large_memory_round_trip_within_one_second() {
        let state = make_test_state(100);

        let dir = TempDir::new().unwrap();

        let start = Instant::now();
        let path = save_snapshot(&state, dir.path()).unwrap();
        let decoded = load_snapshot(&path).unwrap();
        let elapsed = start.elapsed();

        assert_eq!(decoded.memory.len(), 10_000);
        assert!(
            elapsed.as_millis() < 1000,
            "10K tile round-trip took {}ms, expected < 1000ms",
            elapsed.as_millis()
        );
    }
}
