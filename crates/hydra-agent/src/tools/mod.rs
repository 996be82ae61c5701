//! Tool registry construction: assembles the fixed built-in tool set into
//! a name-keyed registry.

pub mod calculator;
pub mod cloudflare;
pub mod fetch_url;
pub mod filesystem;
pub mod github;
pub mod memory_tool;
pub mod web_search;

use std::collections::HashMap;
use std::sync::Arc;

use hydra_core::config::{AiConfig, ExportConfig, ToolsConfig};
use hydra_memory::MemoryManager;

use crate::tool::Tool;

/// Everything a tool constructor might need, gathered once at startup.
pub struct ToolContext {
    pub memory: Arc<MemoryManager>,
    pub user_id: String,
    pub allowed_paths: Vec<String>,
    pub searx_url: Option<String>,
    pub github_token: Option<String>,
    pub cloudflare_api_token: Option<String>,
}

impl ToolContext {
    pub fn new(
        ai_config: &AiConfig,
        tools_config: &ToolsConfig,
        export_config: &ExportConfig,
        memory: Arc<MemoryManager>,
        user_id: String,
    ) -> Self {
        Self {
            memory,
            user_id,
            allowed_paths: ai_config.allowed_paths.clone(),
            searx_url: tools_config.searx_url.clone(),
            github_token: export_config.github_token.clone(),
            cloudflare_api_token: tools_config.cloudflare_api_token.clone(),
        }
    }
}

/// Build every registered tool keyed by name.
pub fn build_registry(ctx: &ToolContext) -> HashMap<String, Arc<dyn Tool>> {
    let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();

    let mut insert = |tool: Arc<dyn Tool>| {
        tools.insert(tool.name().to_string(), tool);
    };

    insert(Arc::new(web_search::WebSearchTool::new(ctx.searx_url.clone())));
    insert(Arc::new(fetch_url::FetchUrlTool::new()));
    insert(Arc::new(memory_tool::MemoryTool::new(ctx.memory.clone(), ctx.user_id.clone())));
    insert(Arc::new(calculator::CalculatorTool));
    insert(Arc::new(filesystem::FileReadTool { allowed_roots: ctx.allowed_paths.clone() }));
    insert(Arc::new(filesystem::FileWriteTool { allowed_roots: ctx.allowed_paths.clone() }));
    insert(Arc::new(filesystem::FileListTool { allowed_roots: ctx.allowed_paths.clone() }));
    insert(Arc::new(filesystem::FileSearchTool { allowed_roots: ctx.allowed_paths.clone() }));
    insert(Arc::new(github::GithubRepoTool::new(ctx.github_token.clone())));
    insert(Arc::new(github::GithubIssuesTool::new(ctx.github_token.clone())));
    insert(Arc::new(cloudflare::CloudflareDnsTool::new(ctx.cloudflare_api_token.clone())));

    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn test_ctx() -> ToolContext {
        let conn = Connection::open_in_memory().unwrap();
        hydra_memory::db::init_db(&conn).unwrap();
        ToolContext::new(
            &AiConfig::default(),
            &ToolsConfig::default(),
            &ExportConfig::default(),
            Arc::new(MemoryManager::new(conn)),
            "u1".to_string(),
        )
    }

    #[test]
    fn registry_contains_every_builtin_tool() {
        let registry = build_registry(&test_ctx());
        for name in [
            "web_search",
            "fetch_url",
            "memory",
            "calculator",
            "file_read",
            "file_write",
            "file_list",
            "file_search",
            "github_repo",
            "github_issues",
            "cloudflare_dns",
        ] {
            assert!(registry.contains_key(name), "missing tool: {name}");
        }
    }
}
