//! Tool: fetch_url — fetch a URL and strip it down to plain text.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::tool::{ParamType, Tool, ToolParameter, ToolResult};

static PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![
        ToolParameter::new("url", ParamType::String, "The URL to fetch", true),
        ToolParameter::new(
            "max_length",
            ParamType::Integer,
            "Maximum characters to return",
            false,
        )
        .with_default(serde_json::json!(5000)),
    ]
});

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static STYLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub struct FetchUrlTool {
    client: reqwest::Client,
}

impl FetchUrlTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 hydra/1.0")
                .build()
                .expect("client builds"),
        }
    }
}

impl Default for FetchUrlTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FetchUrlTool {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch content from a URL. Returns the text content of the page."
    }

    fn parameters(&self) -> &[ToolParameter] {
        &PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let url = match args.get("url").and_then(|v| v.as_str()) {
            Some(u) => u,
            None => return ToolResult::error("missing required parameter: url"),
        };
        let max_length = args.get("max_length").and_then(|v| v.as_u64()).unwrap_or(5000) as usize;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return ToolResult::error("invalid URL");
        }

        let response = match self.client.get(url).timeout(std::time::Duration::from_secs(20)).send().await {
            Ok(r) => r,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let response = match response.error_for_status() {
            Ok(r) => r,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let raw = match response.text().await {
            Ok(t) => t,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let content = to_plain_text(&raw);
        let truncated: String = content.chars().take(max_length).collect();

        let mut metadata = std::collections::HashMap::new();
        metadata.insert("url".to_string(), serde_json::json!(url));
        metadata.insert("length".to_string(), serde_json::json!(content.chars().count()));
        ToolResult::ok_with_metadata(serde_json::json!(truncated), metadata)
    }
}

fn to_plain_text(html: &str) -> String {
    let no_script = SCRIPT_RE.replace_all(html, "");
    let no_style = STYLE_RE.replace_all(&no_script, "");
    let no_tags = TAG_RE.replace_all(&no_style, " ");
    WHITESPACE_RE.replace_all(&no_tags, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_style_and_tags() {
        let html = "<html><head><style>.x{}</style><script>alert(1)</script></head><body><p>Hello <b>world</b></p></body></html>";
        assert_eq!(to_plain_text(html), "Hello world");
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let result = FetchUrlTool::new().execute(serde_json::json!({"url": "file:///etc/passwd"})).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap(), "invalid URL");
    }
}
