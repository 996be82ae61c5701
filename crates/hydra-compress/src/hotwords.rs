//! Hot-words service: a daily word-frequency table, persisted
//! per date with a category tag, and a trending query comparing today's
//! counts against a recent rolling average.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::market_keywords;

const TOP_N_PERSISTED: usize = 100;

static UNICODE_FALLBACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{4e00}-\u{9fff}]+|[A-Za-z]+").expect("valid regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        // English function words.
        "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "be", "been",
        "to", "of", "in", "on", "at", "for", "with", "as", "by", "this", "that", "it",
        "from", "will", "not", "has", "have", "had", "you", "i", "we", "they",
        // CJK function words / particles.
        "的", "了", "在", "是", "我", "你", "他", "她", "和", "就", "也", "都", "而", "及",
        "与", "着", "或", "一个", "没有", "这个", "那个", "这", "那",
    ])
});

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS hot_words (
            date     TEXT NOT NULL,
            word     TEXT NOT NULL,
            count    INTEGER NOT NULL,
            category TEXT NOT NULL,
            PRIMARY KEY (date, word)
        );",
    )
}

/// Tokenize `text` into candidate hot-words: jieba when available, a
/// Unicode-range regex otherwise. The stop-word set is always applied.
pub fn tokenize(jieba: Option<&jieba_rs::Jieba>, text: &str) -> Vec<String> {
    let raw: Vec<String> = match jieba {
        Some(j) => j.cut(text, false).into_iter().map(|s| s.to_string()).collect(),
        None => UNICODE_FALLBACK_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
    };

    raw.into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty() && w.chars().count() > 1)
        .filter(|w| !STOP_WORDS.contains(w.as_str()))
        .collect()
}

/// In-memory accumulator keyed by date, mapping to a `Counter<word,int>`.
/// A `Some(jieba)` instance is reused across calls
/// since constructing one loads its dictionary.
pub struct HotWordsService {
    jieba: Option<jieba_rs::Jieba>,
    counters: Mutex<HashMap<NaiveDate, HashMap<String, u32>>>,
}

impl HotWordsService {
    pub fn new() -> Self {
        Self {
            jieba: Some(jieba_rs::Jieba::new()),
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Construct a service that always uses the Unicode-range fallback
    /// tokenizer, for tests or environments where loading jieba's
    /// dictionary is undesirable.
    pub fn without_segmenter() -> Self {
        Self {
            jieba: None,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn add_message(&self, date: NaiveDate, text: &str) {
        let tokens = tokenize(self.jieba.as_ref(), text);
        let mut counters = self.counters.lock().unwrap();
        let day = counters.entry(date).or_default();
        for token in tokens {
            *day.entry(token).or_insert(0) += 1;
        }
    }

    /// Persist the top-100 words for `date` into the `hot_words` table.
    /// Idempotent — re-running for the same date overwrites previous counts.
    pub fn persist_to_db(&self, conn: &Connection, date: NaiveDate) -> rusqlite::Result<()> {
        let day_counts = {
            let counters = self.counters.lock().unwrap();
            counters.get(&date).cloned().unwrap_or_default()
        };

        let mut ranked: Vec<(String, u32)> = day_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(TOP_N_PERSISTED);

        let date_str = date.format("%Y-%m-%d").to_string();
        for (word, count) in ranked {
            let category = market_keywords::categorize(&word)
                .into_iter()
                .next()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "general".to_string());
            conn.execute(
                "INSERT INTO hot_words (date, word, count, category) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(date, word) DO UPDATE SET count = excluded.count, category = excluded.category",
                params![date_str, word, count, category],
            )?;
        }
        Ok(())
    }

    /// Today's words whose count exceeds the `days`-day historical average
    /// by the largest positive delta. Reads only from
    /// persisted rows, so `persist_to_db` must run for `today` first.
    pub fn get_trending(
        &self,
        conn: &Connection,
        today: NaiveDate,
        days: i64,
        top_n: usize,
    ) -> rusqlite::Result<Vec<(String, f64)>> {
        let today_str = today.format("%Y-%m-%d").to_string();
        let mut stmt = conn.prepare("SELECT word, count FROM hot_words WHERE date = ?1")?;
        let today_counts: HashMap<String, i64> = stmt
            .query_map(params![today_str], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .filter_map(|r| r.ok())
            .collect();

        let mut deltas: Vec<(String, f64)> = Vec::with_capacity(today_counts.len());
        for (word, count) in today_counts {
            let avg = historical_average(conn, &word, today, days)?;
            deltas.push((word, count as f64 - avg));
        }

        deltas.retain(|(_, delta)| *delta > 0.0);
        deltas.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        deltas.truncate(top_n);
        Ok(deltas)
    }
}

impl Default for HotWordsService {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a `get_trending` result as a markdown digest for the scheduled
/// report: medal emoji for the top 3, numbered after that, with the word's
/// market-category badge.
pub fn format_report(trending: &[(String, f64)]) -> String {
    if trending.is_empty() {
        return "## Hot words\n\n_no trending words today_\n".to_string();
    }

    let mut out = String::from("## Hot words\n\n");
    for (i, (word, delta)) in trending.iter().enumerate() {
        let rank = match i {
            0 => "🥇".to_string(),
            1 => "🥈".to_string(),
            2 => "🥉".to_string(),
            n => format!("{}.", n + 1),
        };
        let category = market_keywords::categorize(word)
            .into_iter()
            .next()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "general".to_string());
        out.push_str(&format!("{rank} **{word}** [{category}] (+{delta:.0})\n"));
    }
    out
}

fn historical_average(conn: &Connection, word: &str, today: NaiveDate, days: i64) -> rusqlite::Result<f64> {
    let start = (today - chrono::Duration::days(days)).format("%Y-%m-%d").to_string();
    let end = today.format("%Y-%m-%d").to_string();
    let total: Option<i64> = conn
        .query_row(
            "SELECT SUM(count) FROM hot_words WHERE word = ?1 AND date >= ?2 AND date < ?3",
            params![word, start, end],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    match total {
        Some(t) if days > 0 => Ok(t as f64 / days as f64),
        _ => {
            if total.is_none() {
                warn!(word, "no historical data, treating average as 0");
            }
            Ok(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    fn conn() -> Connection {
        let c = Connection::open_in_memory().unwrap();
        init_db(&c).unwrap();
        c
    }

    #[test]
    fn stop_words_are_filtered() {
        let tokens = tokenize(None, "the btc rally is the biggest of the year");
        assert!(!tokens.contains(&"the".to_string()));
        assert!(tokens.contains(&"btc".to_string()));
    }

    #[test]
    fn add_message_accumulates_counts() {
        let svc = HotWordsService::without_segmenter();
        let d = date("2026-07-28");
        svc.add_message(d, "btc breaks resistance, btc rally continues");
        let counters = svc.counters.lock().unwrap();
        assert_eq!(*counters.get(&d).unwrap().get("btc").unwrap(), 2);
    }

    #[test]
    fn persist_writes_rows_for_the_day() {
        let svc = HotWordsService::without_segmenter();
        let d = date("2026-07-28");
        svc.add_message(d, "btc rally continues, crypto markets surge higher");
        let c = conn();
        svc.persist_to_db(&c, d).unwrap();

        let count: i64 = c.query_row("SELECT COUNT(*) FROM hot_words WHERE date = ?1", [d.format("%Y-%m-%d").to_string()], |r| r.get(0)).unwrap();
        assert!(count > 0);
    }

    #[test]
    fn trending_surfaces_positive_deltas_over_history() {
        let svc = HotWordsService::without_segmenter();
        let c = conn();

        for i in 1..=5 {
            let d = date("2026-07-28") - chrono::Duration::days(i);
            svc.add_message(d, "btc steady market update");
            svc.persist_to_db(&c, d).unwrap();
        }

        let today = date("2026-07-28");
        svc.add_message(today, "btc surges btc surges btc surges btc rally btc rally");
        svc.persist_to_db(&c, today).unwrap();

        let trending = svc.get_trending(&c, today, 7, 10).unwrap();
        assert!(trending.iter().any(|(w, delta)| w == "btc" && *delta > 0.0));
    }

    #[test]
    fn format_report_ranks_top_three_with_medals() {
        let trending = vec![("btc".to_string(), 10.0), ("eth".to_string(), 5.0)];
        let report = format_report(&trending);
        assert!(report.contains("🥇"));
        assert!(report.contains("🥈"));
        assert!(report.contains("btc"));
    }

    #[test]
    fn format_report_handles_empty_input() {
        let report = format_report(&[]);
        assert!(report.contains("no trending"));
    }
}
