pub mod cache;
pub mod engine;
pub mod simhash;

pub use cache::OrderedCache;
pub use engine::{DedupEngine, DedupEngineConfig, DedupStatsSnapshot, DuplicateReason, MIN_TEXT_LENGTH};
pub use simhash::{hamming_distance, normalize, simhash as fingerprint, similarity};
