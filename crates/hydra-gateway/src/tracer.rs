//! Wraps every provider call with timing + token-usage tracking. Token counts are approximated as `len(text)/3`, a
//! language-agnostic stand-in used when a vendor's response omits usage.

use rusqlite::{params, Connection};
use tracing::info;

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS token_usage (
            provider        TEXT NOT NULL,
            model           TEXT NOT NULL,
            prompt_tokens   INTEGER NOT NULL DEFAULT 0,
            response_tokens INTEGER NOT NULL DEFAULT 0,
            call_count      INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (provider, model)
        );",
    )
}

/// `len(text) / 3` — a language-agnostic approximation, vendor-agnostic.
pub fn estimate_tokens(text: &str) -> u32 {
    (text.chars().count() / 3) as u32
}

#[derive(Debug, Clone)]
pub struct CallTrace {
    pub provider: String,
    pub model: String,
    pub prompt_tokens_est: u32,
    pub response_tokens_est: u32,
    pub duration_ms: u128,
    pub success: bool,
    pub tool_call_summary: String,
}

/// Upsert aggregated usage: `ON CONFLICT (provider, model) DO UPDATE SET ...
/// + EXCLUDED.*`.
pub fn record(conn: &Connection, trace: &CallTrace) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO token_usage (provider, model, prompt_tokens, response_tokens, call_count)
         VALUES (?1, ?2, ?3, ?4, 1)
         ON CONFLICT(provider, model) DO UPDATE SET
            prompt_tokens = prompt_tokens + excluded.prompt_tokens,
            response_tokens = response_tokens + excluded.response_tokens,
            call_count = call_count + 1",
        params![trace.provider, trace.model, trace.prompt_tokens_est, trace.response_tokens_est],
    )?;

    info!(
        provider = %trace.provider,
        model = %trace.model,
        prompt_tokens_est = trace.prompt_tokens_est,
        response_tokens_est = trace.response_tokens_est,
        duration_ms = trace.duration_ms,
        success = trace.success,
        tool_call_summary = %trace.tool_call_summary,
        "provider call traced"
    );
    Ok(())
}
