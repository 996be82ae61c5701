//! Tool: web_search — SearXNG-backed web search.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::tool::{ParamType, Tool, ToolParameter, ToolResult};

static PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![
        ToolParameter::new("query", ParamType::String, "The search query", true),
        ToolParameter::new(
            "num_results",
            ParamType::Integer,
            "Number of results to return (max 10)",
            false,
        )
        .with_default(serde_json::json!(5)),
    ]
});

pub struct WebSearchTool {
    client: reqwest::Client,
    searx_url: Option<String>,
}

impl WebSearchTool {
    pub fn new(searx_url: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), searx_url }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns results with titles, URLs, and snippets."
    }

    fn parameters(&self) -> &[ToolParameter] {
        &PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let Some(searx_url) = &self.searx_url else {
            return ToolResult::error("SEARX_URL not configured");
        };
        let query = match args.get("query").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolResult::error("missing required parameter: query"),
        };
        let num_results = args.get("num_results").and_then(|v| v.as_u64()).unwrap_or(5).min(10);

        let response = match self
            .client
            .get(format!("{searx_url}/search"))
            .query(&[("q", query), ("format", "json")])
            .timeout(std::time::Duration::from_secs(15))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let response = match response.error_for_status() {
            Ok(r) => r,
            Err(e) => return ToolResult::error(e.to_string()),
        };
        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let results: Vec<Value> = body["results"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(num_results as usize)
            .map(|item| {
                let snippet: String = item["content"].as_str().unwrap_or_default().chars().take(300).collect();
                serde_json::json!({
                    "title": item["title"].as_str().unwrap_or_default(),
                    "url": item["url"].as_str().unwrap_or_default(),
                    "snippet": snippet,
                })
            })
            .collect();

        let mut metadata = std::collections::HashMap::new();
        metadata.insert("query".to_string(), serde_json::json!(query));
        metadata.insert("count".to_string(), serde_json::json!(results.len()));
        ToolResult::ok_with_metadata(serde_json::json!(results), metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_searx_fails_cleanly() {
        let tool = WebSearchTool::new(None);
        let result = tool.execute(serde_json::json!({"query": "rust"})).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap(), "SEARX_URL not configured");
    }
}
