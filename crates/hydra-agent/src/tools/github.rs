//! `github_*` tools for the devops agent.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::tool::{ParamType, Tool, ToolParameter, ToolResult};

const GITHUB_API: &str = "https://api.github.com";

fn headers(token: &Option<String>) -> reqwest::header::HeaderMap {
    let mut map = reqwest::header::HeaderMap::new();
    map.insert("Accept", "application/vnd.github.v3+json".parse().unwrap());
    map.insert("User-Agent", "hydra-agent/1.0".parse().unwrap());
    if let Some(t) = token {
        if let Ok(value) = format!("token {t}").parse() {
            map.insert("Authorization", value);
        }
    }
    map
}

pub struct GithubRepoTool {
    client: reqwest::Client,
    token: Option<String>,
}

impl GithubRepoTool {
    pub fn new(token: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), token }
    }
}

static REPO_PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![
        ToolParameter::new("owner", ParamType::String, "Repository owner (username or org)", true),
        ToolParameter::new("repo", ParamType::String, "Repository name", true),
    ]
});

#[async_trait]
impl Tool for GithubRepoTool {
    fn name(&self) -> &str {
        "github_repo"
    }
    fn description(&self) -> &str {
        "Get information about a GitHub repository: description, stars, forks, recent activity."
    }
    fn parameters(&self) -> &[ToolParameter] {
        &REPO_PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let Some(owner) = args.get("owner").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: owner");
        };
        let Some(repo) = args.get("repo").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: repo");
        };

        let response = self
            .client
            .get(format!("{GITHUB_API}/repos/{owner}/{repo}"))
            .headers(headers(&self.token))
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

        ToolResult::ok(serde_json::json!({
            "full_name": body["full_name"],
            "description": body["description"],
            "stars": body["stargazers_count"],
            "forks": body["forks_count"],
            "open_issues": body["open_issues_count"],
            "default_branch": body["default_branch"],
        }))
    }
}

pub struct GithubIssuesTool {
    client: reqwest::Client,
    token: Option<String>,
}

impl GithubIssuesTool {
    pub fn new(token: Option<String>) -> Self {
        Self { client: reqwest::Client::new(), token }
    }
}

static ISSUES_PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![
        ToolParameter::new("owner", ParamType::String, "Repository owner", true),
        ToolParameter::new("repo", ParamType::String, "Repository name", true),
        ToolParameter::new("state", ParamType::String, "Issue state filter", false)
            .with_enum(&["open", "closed", "all"])
            .with_default(serde_json::json!("open")),
    ]
});

#[async_trait]
impl Tool for GithubIssuesTool {
    fn name(&self) -> &str {
        "github_issues"
    }
    fn description(&self) -> &str {
        "List issues for a GitHub repository, filtered by state."
    }
    fn parameters(&self) -> &[ToolParameter] {
        &ISSUES_PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let Some(owner) = args.get("owner").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: owner");
        };
        let Some(repo) = args.get("repo").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: repo");
        };
        let state = args.get("state").and_then(|v| v.as_str()).unwrap_or("open");

        let response = self
            .client
            .get(format!("{GITHUB_API}/repos/{owner}/{repo}/issues"))
            .query(&[("state", state)])
            .headers(headers(&self.token))
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
        let body: Vec<Value> = match response.json().await {
            Ok(v) => v,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let issues: Vec<Value> = body
            .into_iter()
            .map(|i| serde_json::json!({"number": i["number"], "title": i["title"], "state": i["state"]}))
            .collect();
        ToolResult::ok(serde_json::json!(issues))
    }
}
