//! File tools: read, write, list, and search, each enforcing the
//! configured path allow-list before touching the filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::tool::{ParamType, Tool, ToolParameter, ToolResult};

const MAX_READ_CHARS: usize = 30_000;
const MAX_LIST_ENTRIES: usize = 1_000;
const MAX_SEARCH_MATCHES: usize = 100;

/// Resolve `path` and check it falls under one of `allowed_roots` after
/// expansion. Does not require the path to exist (write_file creates new
/// files), only that its absolute form is rooted under an allowed prefix.
fn check_allowed(path: &str, allowed_roots: &[String]) -> Result<PathBuf, String> {
    let expanded = expand_tilde(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir().unwrap_or_default().join(expanded)
    };

    for root in allowed_roots {
        let root_expanded = expand_tilde(root);
        let root_absolute = if root_expanded.is_absolute() {
            root_expanded
        } else {
            std::env::current_dir().unwrap_or_default().join(root_expanded)
        };
        if absolute.starts_with(&root_absolute) {
            return Ok(absolute);
        }
    }
    Err("Access denied".to_string())
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

pub struct FileReadTool {
    pub allowed_roots: Vec<String>,
}

static READ_PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![
        ToolParameter::new("path", ParamType::String, "Path to the file to read", true),
        ToolParameter::new("offset", ParamType::Integer, "1-based line to start from", false),
        ToolParameter::new("limit", ParamType::Integer, "Maximum number of lines to return", false),
    ]
});

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }
    fn description(&self) -> &str {
        "Read the contents of a file. Only works on allowed paths."
    }
    fn parameters(&self) -> &[ToolParameter] {
        &READ_PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let Some(path) = args.get("path").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: path");
        };
        let resolved = match check_allowed(path, &self.allowed_roots) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        let content = match std::fs::read_to_string(&resolved) {
            Ok(c) => c,
            Err(e) => return ToolResult::error(format!("failed to read '{path}': {e}")),
        };

        let offset = args.get("offset").and_then(|v| v.as_u64()).map(|v| v.saturating_sub(1) as usize);
        let limit = args.get("limit").and_then(|v| v.as_u64()).map(|v| v as usize);

        let body = if offset.is_some() || limit.is_some() {
            let lines: Vec<&str> = content.lines().skip(offset.unwrap_or(0)).collect();
            let slice = if let Some(n) = limit { &lines[..n.min(lines.len())] } else { &lines[..] };
            slice.join("\n")
        } else {
            content
        };

        let body = if body.len() > MAX_READ_CHARS {
            format!("{}\n\n[output truncated at {} characters]", &body[..MAX_READ_CHARS], MAX_READ_CHARS)
        } else {
            body
        };

        ToolResult::ok(serde_json::json!(body))
    }
}

pub struct FileWriteTool {
    pub allowed_roots: Vec<String>,
}

static WRITE_PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![
        ToolParameter::new("path", ParamType::String, "Path to write to", true),
        ToolParameter::new("content", ParamType::String, "Text content to write", true),
    ]
});

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }
    fn description(&self) -> &str {
        "Write content to a file, creating parent directories as needed. Only works on allowed paths."
    }
    fn parameters(&self) -> &[ToolParameter] {
        &WRITE_PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let Some(path) = args.get("path").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: path");
        };
        let Some(content) = args.get("content").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: content");
        };
        let resolved = match check_allowed(path, &self.allowed_roots) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        if let Some(parent) = resolved.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return ToolResult::error(format!("failed to create directories: {e}"));
                }
            }
        }

        let byte_len = content.len();
        if let Err(e) = std::fs::write(&resolved, content) {
            return ToolResult::error(format!("failed to write '{path}': {e}"));
        }
        ToolResult::ok(serde_json::json!(format!("wrote {byte_len} bytes to '{path}'")))
    }
}

pub struct FileListTool {
    pub allowed_roots: Vec<String>,
}

static LIST_PARAMS: Lazy<Vec<ToolParameter>> =
    Lazy::new(|| vec![ToolParameter::new("path", ParamType::String, "Directory to list", true)]);

#[async_trait]
impl Tool for FileListTool {
    fn name(&self) -> &str {
        "file_list"
    }
    fn description(&self) -> &str {
        "List directory contents with type and size. Returns at most 1000 entries."
    }
    fn parameters(&self) -> &[ToolParameter] {
        &LIST_PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let Some(path) = args.get("path").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: path");
        };
        let resolved = match check_allowed(path, &self.allowed_roots) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        let read_dir = match std::fs::read_dir(&resolved) {
            Ok(rd) => rd,
            Err(e) => return ToolResult::error(format!("failed to list '{path}': {e}")),
        };

        let mut entries = Vec::new();
        let mut truncated = false;
        for entry in read_dir {
            if entries.len() >= MAX_LIST_ENTRIES {
                truncated = true;
                break;
            }
            let Ok(entry) = entry else { continue };
            let Ok(metadata) = entry.metadata() else { continue };
            let kind = if metadata.is_dir() { "dir" } else { "file" };
            entries.push(format!("[{}] {} ({} bytes)", kind, entry.file_name().to_string_lossy(), metadata.len()));
        }
        entries.sort();

        let mut output = entries.join("\n");
        if truncated {
            output.push_str(&format!("\n\n[truncated at {MAX_LIST_ENTRIES} entries]"));
        }
        ToolResult::ok(serde_json::json!(output))
    }
}

pub struct FileSearchTool {
    pub allowed_roots: Vec<String>,
}

static SEARCH_PARAMS: Lazy<Vec<ToolParameter>> = Lazy::new(|| {
    vec![
        ToolParameter::new("path", ParamType::String, "Root directory to search in", true),
        ToolParameter::new("pattern", ParamType::String, "Substring to search for (case-sensitive)", true),
        ToolParameter::new("file_pattern", ParamType::String, "Optional filename suffix filter (e.g. '.rs')", false),
    ]
});

#[async_trait]
impl Tool for FileSearchTool {
    fn name(&self) -> &str {
        "file_search"
    }
    fn description(&self) -> &str {
        "Recursively search file contents for a substring. Skips binary files and .git. Returns at most 100 matches."
    }
    fn parameters(&self) -> &[ToolParameter] {
        &SEARCH_PARAMS
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let Some(root) = args.get("path").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: path");
        };
        let Some(pattern) = args.get("pattern").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing required parameter: pattern");
        };
        let file_pattern = args.get("file_pattern").and_then(|v| v.as_str());

        let resolved = match check_allowed(root, &self.allowed_roots) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e),
        };

        let mut matches = Vec::new();
        let mut truncated = false;
        search_dir(&resolved, pattern, file_pattern, &mut matches, &mut truncated);

        let mut output = matches.join("\n");
        if truncated {
            output.push_str(&format!("\n\n[truncated at {MAX_SEARCH_MATCHES} matches]"));
        }
        ToolResult::ok(serde_json::json!(output))
    }
}

fn search_dir(dir: &Path, pattern: &str, file_pattern: Option<&str>, matches: &mut Vec<String>, truncated: &mut bool) {
    if *truncated || matches.len() >= MAX_SEARCH_MATCHES {
        *truncated = true;
        return;
    }
    let Ok(read_dir) = std::fs::read_dir(dir) else { return };
    for entry in read_dir.flatten() {
        if matches.len() >= MAX_SEARCH_MATCHES {
            *truncated = true;
            return;
        }
        let path = entry.path();
        if path.file_name().and_then(|n| n.to_str()) == Some(".git") {
            continue;
        }
        if path.is_dir() {
            search_dir(&path, pattern, file_pattern, matches, truncated);
            continue;
        }
        if let Some(suffix) = file_pattern {
            if !path.to_string_lossy().ends_with(suffix) {
                continue;
            }
        }
        let Ok(content) = std::fs::read_to_string(&path) else { continue };
        for (lineno, line) in content.lines().enumerate() {
            if line.contains(pattern) {
                matches.push(format!("{}:{}: {}", path.display(), lineno + 1, line.trim()));
                if matches.len() >= MAX_SEARCH_MATCHES {
                    *truncated = true;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_and_read_within_allowed_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_string_lossy().to_string();
        let file_path = tmp.path().join("note.txt").to_string_lossy().to_string();

        let writer = FileWriteTool { allowed_roots: vec![root.clone()] };
        let result = writer.execute(serde_json::json!({"path": file_path, "content": "hello"})).await;
        assert!(result.success);

        let reader = FileReadTool { allowed_roots: vec![root] };
        let result = reader.execute(serde_json::json!({"path": file_path})).await;
        assert!(result.success);
        assert_eq!(result.output, serde_json::json!("hello"));
    }

    #[tokio::test]
    async fn path_outside_allow_list_is_denied() {
        let tool = FileReadTool { allowed_roots: vec!["/tmp/hydra-allowed-only".to_string()] };
        let result = tool.execute(serde_json::json!({"path": "/etc/passwd"})).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap(), "Access denied");
    }

    #[tokio::test]
    async fn list_sorts_entries_and_tags_kind() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b.txt"), "x").unwrap();
        std::fs::create_dir(tmp.path().join("a_dir")).unwrap();
        let root = tmp.path().to_string_lossy().to_string();

        let tool = FileListTool { allowed_roots: vec![root.clone()] };
        let result = tool.execute(serde_json::json!({"path": root})).await;
        assert!(result.success);
        let output = result.output.as_str().unwrap();
        assert!(output.contains("[dir] a_dir"));
        assert!(output.contains("[file] b.txt"));
    }

    #[tokio::test]
    async fn search_finds_matching_lines() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("src.rs"), "fn main() {\n    // needle here\n}\n").unwrap();
        let root = tmp.path().to_string_lossy().to_string();

        let tool = FileSearchTool { allowed_roots: vec![root.clone()] };
        let result = tool.execute(serde_json::json!({"path": root, "pattern": "needle"})).await;
        assert!(result.success);
        assert!(result.output.as_str().unwrap().contains("needle here"));
    }
}
