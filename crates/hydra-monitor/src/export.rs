//! Report artifact export: two files per
//! channel per window, written under a configurable base directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hydra_compress::CompressionResult;

use crate::error::Result;

/// Lowercase, filesystem-safe rendering of a channel name: alphanumerics
/// pass through, everything else becomes `_`.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

pub struct ReportArtifacts {
    pub markdown_path: PathBuf,
    pub json_path: PathBuf,
}

/// Write `reports/channels/<safe>_<YYYYMMDD_HHMM>.md` and
/// `reports/data/<YYYY-MM-DD>_<safe>.json` under `base_dir`.
pub fn write_report(
    base_dir: &Path,
    channel_name: &str,
    markdown: &str,
    result: &CompressionResult,
    now: DateTime<Utc>,
) -> Result<ReportArtifacts> {
    let safe = safe_name(channel_name);

    let channels_dir = base_dir.join("reports").join("channels");
    std::fs::create_dir_all(&channels_dir)?;
    let markdown_path = channels_dir.join(format!("{}_{}.md", safe, now.format("%Y%m%d_%H%M")));
    std::fs::write(&markdown_path, markdown)?;

    let data_dir = base_dir.join("reports").join("data");
    std::fs::create_dir_all(&data_dir)?;
    let json_path = data_dir.join(format!("{}_{}.json", now.format("%Y-%m-%d"), safe));
    let json = serde_json::to_string_pretty(result).unwrap_or_default();
    std::fs::write(&json_path, json)?;

    Ok(ReportArtifacts { markdown_path, json_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn safe_name_lowercases_and_replaces_punctuation() {
        assert_eq!(safe_name("Market News!"), "market_news_");
        assert_eq!(safe_name("@crypto_alpha"), "_crypto_alpha");
    }

    #[test]
    fn write_report_creates_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap();
        let result = CompressionResult { channel: "Market".into(), ..Default::default() };

        let artifacts = write_report(dir.path(), "Market News", "# Report", &result, now).unwrap();
        assert!(artifacts.markdown_path.exists());
        assert!(artifacts.json_path.exists());
        assert!(artifacts.markdown_path.to_string_lossy().contains("market_news_20260728_1200"));
        assert!(artifacts.json_path.to_string_lossy().contains("2026-07-28_market_news"));
    }
}
