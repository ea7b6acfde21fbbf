pub mod snapshot;

pub use snapshot::{
    encode_state, list_snapshots, load_latest_valid_snapshot, load_snapshot, prune_snapshots,
    read_summary, save_snapshot, SnapshotError, SnapshotMetadata, StateSummary,
};
