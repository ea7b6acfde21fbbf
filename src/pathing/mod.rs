pub mod cache;
pub mod search;
pub mod truncate;

pub use cache::ScoutPathCache;
pub use search::{find_min_cost_path_to_any, flee_path, path_to_nearest_unexplored};
pub use truncate::PathTruncator;
