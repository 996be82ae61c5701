//! Shared process state, modeled on the gateway's `AppState` (one struct
//! bundling every subsystem, passed around as `Arc<AppState>`).

use std::sync::{Arc, Mutex as StdMutex};

use dashmap::DashMap;
use hydra_compress::HotWordsService;
use hydra_core::config::HydraConfig;
use hydra_dedup::{DedupEngine, DedupEngineConfig, OrderedCache};
use hydra_filter::pipeline::FilterConfig;
use hydra_gateway::AiGateway;
use rusqlite::Connection;
use tokio::sync::Mutex as AsyncMutex;

use crate::db::MonitorDb;
use crate::error::Result;

/// Per-chat mailbox lock: serializes ingestion within one chat so the
/// reentry guard and the cache write stay consistent, while letting
/// different chats process concurrently. Values are `Arc`-wrapped
/// so a caller can clone the handle out and drop the `DashMap` shard guard
/// before awaiting the lock.
pub type MailboxLocks = DashMap<String, Arc<AsyncMutex<()>>>;

pub struct AppState {
    pub config: HydraConfig,
    pub db: MonitorDb,
    pub filter: StdMutex<FilterConfig>,
    pub processed: StdMutex<OrderedCache<(String, String), ()>>,
    pub dedup: StdMutex<DedupEngine>,
    pub hotwords: HotWordsService,
    pub gateway: AiGateway,
    pub mailboxes: MailboxLocks,
}

impl AppState {
    pub fn new(config: HydraConfig, db_conn: Connection, gateway_conn: Connection) -> Result<Self> {
        let filter = FilterConfig {
            own_identities: config.monitor.own_identities.iter().cloned().collect(),
            destination_channels: config
                .monitor
                .target_channel
                .iter()
                .chain(config.monitor.vip_target_channel.iter())
                .chain(config.monitor.report_target_channel.iter())
                .map(|c| c.as_str().into())
                .collect(),
            blacklist: config.monitor.blacklist_channels.iter().map(|c| c.as_str().into()).collect(),
            source_channels: config.monitor.source_channels.iter().cloned().collect(),
            from_users: config.monitor.from_users.iter().cloned().collect(),
            keywords: config.monitor.keywords.clone(),
        };

        let dedup = DedupEngine::new(DedupEngineConfig {
            max_cache_size: config.dedup.cache_size,
            similarity_threshold: config.dedup.similarity_threshold,
        });

        let gateway = AiGateway::new(&config.ai, gateway_conn)?;

        Ok(Self {
            db: MonitorDb::new(db_conn)?,
            filter: StdMutex::new(filter),
            processed: StdMutex::new(OrderedCache::new(config.dedup.cache_size)),
            dedup: StdMutex::new(dedup),
            hotwords: HotWordsService::new(),
            gateway,
            mailboxes: DashMap::new(),
            config,
        })
    }
}
