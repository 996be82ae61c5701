//! The near-duplicate detector: SimHash + two LRU caches, exact and
//! approximate lookup.

use chrono::{DateTime, Utc};
use hydra_core::types::ChannelId;
use tracing::debug;

use crate::cache::OrderedCache;
use crate::simhash::{emoji_stripped_len, exact_hash, similarity, simhash};

/// Minimum text length (in chars) below which dedup is skipped entirely.
pub const MIN_TEXT_LENGTH: usize = 20;
/// Below this count of non-emoji characters, emoji-heavy residue is treated
/// the same as too-short text.
const MIN_NON_EMOJI_RESIDUE: usize = 10;
const DEFAULT_CACHE_SIZE: usize = 5000;
const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Why `is_duplicate` returned true, if it did.
#[derive(Debug, Clone, PartialEq)]
pub enum DuplicateReason {
    Exact,
    Near(f64),
}

impl std::fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateReason::Exact => write!(f, "exact"),
            DuplicateReason::Near(sim) => write!(f, "near:{sim:.4}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupStats {
    pub total_checked: u64,
    pub exact_duplicates: u64,
    pub near_duplicates: u64,
    pub unique_messages: u64,
}

impl DedupStats {
    /// Fraction of checked messages that turned out to be duplicates
    /// (exact or near). `0.0` when nothing has been checked yet.
    pub fn dedup_rate(&self) -> f64 {
        if self.total_checked == 0 {
            return 0.0;
        }
        (self.exact_duplicates + self.near_duplicates) as f64 / self.total_checked as f64
    }
}

pub struct DedupEngineConfig {
    pub max_cache_size: usize,
    pub similarity_threshold: f64,
}

impl Default for DedupEngineConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_CACHE_SIZE,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Content-addressed SimHash cache with LRU eviction and exact/approximate
/// lookup. Single-writer (the ingest path owns it).
pub struct DedupEngine {
    exact_hashes: OrderedCache<String, DateTime<Utc>>,
    fingerprints: OrderedCache<u64, (ChannelId, DateTime<Utc>)>,
    similarity_threshold: f64,
    stats: DedupStats,
}

impl DedupEngine {
    pub fn new(config: DedupEngineConfig) -> Self {
        Self {
            exact_hashes: OrderedCache::new(config.max_cache_size),
            fingerprints: OrderedCache::new(config.max_cache_size),
            similarity_threshold: config.similarity_threshold,
            stats: DedupStats::default(),
        }
    }

    /// `is_duplicate(text, channel, check_near)` runs the lookup algorithm below.
    pub fn is_duplicate(
        &mut self,
        text: &str,
        channel: &ChannelId,
        check_near: bool,
    ) -> (bool, Option<DuplicateReason>) {
        if is_too_short(text) {
            return (false, None);
        }

        self.stats.total_checked += 1;
        let now = Utc::now();

        let exact = exact_hash(text);
        if self.exact_hashes.contains(&exact) {
            self.stats.exact_duplicates += 1;
            debug!(%channel, "dedup: exact duplicate");
            return (true, Some(DuplicateReason::Exact));
        }

        if check_near {
            let fp = simhash(text);
            let mut best: Option<f64> = None;
            for (&resident_fp, _) in self.fingerprints.iter() {
                let sim = similarity(resident_fp, fp);
                if best.map(|b| sim > b).unwrap_or(true) {
                    best = Some(sim);
                }
            }
            if let Some(sim) = best {
                if sim >= self.similarity_threshold {
                    self.stats.near_duplicates += 1;
                    debug!(%channel, similarity = sim, "dedup: near duplicate");
                    return (true, Some(DuplicateReason::Near(sim)));
                }
            }
            self.fingerprints.insert(fp, (channel.clone(), now));
        }

        self.exact_hashes.insert(exact, now);
        self.stats.unique_messages += 1;
        (false, None)
    }

    /// Records `text` as seen without performing a lookup — used by callers
    /// (e.g. VIP senders) that want the cache populated without gating on
    /// the duplicate check, and by tests exercising the idempotence property.
    pub fn add_message(&mut self, text: &str, channel: &ChannelId) {
        if is_too_short(text) {
            return;
        }
        let now = Utc::now();
        self.exact_hashes.insert(exact_hash(text), now);
        self.fingerprints.insert(simhash(text), (channel.clone(), now));
    }

    pub fn clear(&mut self) {
        self.exact_hashes.clear();
        self.fingerprints.clear();
        self.stats = DedupStats::default();
    }

    pub fn stats(&self) -> DedupStatsSnapshot {
        DedupStatsSnapshot {
            total_checked: self.stats.total_checked,
            exact_duplicates: self.stats.exact_duplicates,
            near_duplicates: self.stats.near_duplicates,
            unique_messages: self.stats.unique_messages,
            cache_size: self.fingerprints.len(),
            dedup_rate: self.stats.dedup_rate(),
        }
    }
}

/// Point-in-time snapshot of dedup stats, independent of the engine's
/// lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupStatsSnapshot {
    pub total_checked: u64,
    pub exact_duplicates: u64,
    pub near_duplicates: u64,
    pub unique_messages: u64,
    pub cache_size: usize,
    pub dedup_rate: f64,
}

fn is_too_short(text: &str) -> bool {
    text.chars().count() < MIN_TEXT_LENGTH || emoji_stripped_len(text) < MIN_NON_EMOJI_RESIDUE
}
