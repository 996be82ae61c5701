//! `cloudflare_*` tools for the devops agent.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::tool::{ParamType, Tool, ToolParameter, ToolResult};

const CF_API: &str = "https://api.cloudflare.com/client/v4";

pub struct CloudflareDnsTool {
    client: reqwest::Client,
    api_token: Option<String>,
}

impl CloudflareDnsTool {
    pub fn new(api_token: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), api_token }
    }
}

static DNS_PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![
        ToolParameter::new("action", ParamType::String, "Action to perform", true)
            .with_enum(&["list", "get"]),
        ToolParameter::new("zone_id", ParamType::String, "Cloudflare zone ID", true),
        ToolParameter::new("record_id", ParamType::String, "DNS record ID (required for 'get')", false),
    ]
});

#[async_trait]
impl Tool for CloudflareDnsTool {
    fn name(&self) -> &str {
        "cloudflare_dns"
    }
    fn description(&self) -> &str {
        "List or inspect DNS records in a Cloudflare zone."
    }
    fn parameters(&self) -> &[ToolParameter] {
        &DNS_PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let Some(token) = &self.api_token else {
            return ToolResult::error("CLOUDFLARE_API_TOKEN not configured");
        };
        let Some(action) = args.get("action").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: action");
        };
        let Some(zone_id) = args.get("zone_id").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: zone_id");
        };

        let url = match action {
            "list" => format!("{CF_API}/zones/{zone_id}/dns_records"),
            "get" => {
                let Some(record_id) = args.get("record_id").and_then(|v| v.as_str()) else {
                    return ToolResult::error("record_id required for 'get'");
                };
                format!("{CF_API}/zones/{zone_id}/dns_records/{record_id}")
            }
            other => return ToolResult::error(format!("unsupported action: {other}")),
        };

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .timeout(std::time::Duration::from_secs(15))
            .send()
            .await;

        let response = match response {
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

        if body["success"].as_bool() == Some(false) {
            return ToolResult::error(body["errors"].to_string());
        }
        ToolResult::ok(body["result"].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_token_fails_cleanly() {
        let tool = CloudflareDnsTool::new(None);
        let result = tool.execute(serde_json::json!({"action": "list", "zone_id": "z1"})).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap(), "CLOUDFLARE_API_TOKEN not configured");
    }

    #[tokio::test]
    async fn get_without_record_id_fails() {
        let tool = CloudflareDnsTool::new(Some("tok".to_string()));
        let result = tool.execute(serde_json::json!({"action": "get", "zone_id": "z1"})).await;
        assert!(!result.success);
    }
}
