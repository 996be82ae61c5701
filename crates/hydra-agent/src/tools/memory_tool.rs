//! Tool: memory — store/retrieve per-user facts via `hydra-memory`'s
//! persisted store.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;

use hydra_memory::{MemoryCategory, MemoryManager, MemorySource};

use crate::tool::{ParamType, Tool, ToolParameter, ToolResult};

static PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![
        ToolParameter::new("action", ParamType::String, "Action: 'set', 'get', 'delete', or 'search'", true)
            .with_enum(&["set", "get", "delete", "search"]),
        ToolParameter::new("key", ParamType::String, "Key name (required for set/get/delete)", false),
        ToolParameter::new("value", ParamType::String, "Value to store (required for set)", false),
    ]
});

pub struct MemoryTool {
    manager: Arc<MemoryManager>,
    user_id: String,
}

impl MemoryTool {
    pub fn new(manager: Arc<MemoryManager>, user_id: String) -> Self {
        Self { manager, user_id }
    }
}

#[async_trait]
impl Tool for MemoryTool {
    fn name(&self) -> &str {
        "memory"
    }

    fn description(&self) -> &str {
        "Store or retrieve persistent notes about the user. Use to remember information across conversations."
    }

    fn parameters(&self) -> &[ToolParameter] {
        &PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let action = args.get("action").and_then(|v| v.as_str()).unwrap_or("get");
        let key = args.get("key").and_then(|v| v.as_str()).unwrap_or("");
        let value = args.get("value").and_then(|v| v.as_str()).unwrap_or("");

        match action {
            "set" => {
                if key.is_empty() {
                    return ToolResult::error("key required for set");
                }
                match self.manager.learn(
                    &self.user_id,
                    MemoryCategory::Context,
                    key,
                    value,
                    0.8,
                    MemorySource::UserSaid,
                ) {
                    Ok(()) => ToolResult::ok(serde_json::json!(format!("stored '{key}'"))),
                    Err(e) => ToolResult::error(e.to_string()),
                }
            }
            "get" => {
                if key.is_empty() {
                    return ToolResult::error("key required for get");
                }
                match self.manager.search(&self.user_id, key, 1) {
                    Ok(matches) if !matches.is_empty() => ToolResult::ok(serde_json::json!(matches[0].value)),
                    Ok(_) => ToolResult::error(format!("key '{key}' not found")),
                    Err(e) => ToolResult::error(e.to_string()),
                }
            }
            "delete" => {
                if key.is_empty() {
                    return ToolResult::error("key required for delete");
                }
                match self.manager.forget(&self.user_id, MemoryCategory::Context, key) {
                    Ok(()) => ToolResult::ok(serde_json::json!(format!("deleted '{key}'"))),
                    Err(e) => ToolResult::error(e.to_string()),
                }
            }
            "search" => match self.manager.search(&self.user_id, key, 10) {
                Ok(matches) => {
                    let values: Vec<Value> =
                        matches.into_iter().map(|m| serde_json::json!({"key": m.key, "value": m.value})).collect();
                    ToolResult::ok(serde_json::json!(values))
                }
                Err(e) => ToolResult::error(e.to_string()),
            },
            other => ToolResult::error(format!("unknown action: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn test_tool() -> MemoryTool {
        let conn = Connection::open_in_memory().unwrap();
        hydra_memory::db::init_db(&conn).unwrap();
        MemoryTool::new(Arc::new(MemoryManager::new(conn)), "user-1".to_string())
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let tool = test_tool();
        let set = tool.execute(serde_json::json!({"action": "set", "key": "favorite_color", "value": "teal"})).await;
        assert!(set.success);

        let get = tool.execute(serde_json::json!({"action": "get", "key": "favorite_color"})).await;
        assert!(get.success);
        assert_eq!(get.output, serde_json::json!("teal"));
    }

    #[tokio::test]
    async fn get_missing_key_fails() {
        let tool = test_tool();
        let result = tool.execute(serde_json::json!({"action": "get", "key": "nope"})).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn delete_removes_the_entry() {
        let tool = test_tool();
        tool.execute(serde_json::json!({"action": "set", "key": "k", "value": "v"})).await;
        let delete = tool.execute(serde_json::json!({"action": "delete", "key": "k"})).await;
        assert!(delete.success);

        let get = tool.execute(serde_json::json!({"action": "get", "key": "k"})).await;
        assert!(!get.success);
    }

    #[tokio::test]
    async fn unknown_action_fails() {
        let tool = test_tool();
        let result = tool.execute(serde_json::json!({"action": "nonsense"})).await;
        assert!(!result.success);
    }
}
