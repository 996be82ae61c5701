//! Built-in agents and their fixed tool slices.
//!
//! Each agent pairs a system prompt with a flat, fixed slice of the tool
//! registry (see DESIGN.md for the rationale behind keeping the table flat
//! rather than a richer per-resource permission system).

use std::sync::Arc;

use crate::tool::Tool;

/// One built-in agent: a name, a system prompt, and the tools it may call.
pub struct Agent {
    pub name: &'static str,
    pub description: &'static str,
    pub system_prompt: &'static str,
    /// Tool names this agent may use, or `None` for "every registered tool".
    pub tool_names: Option<&'static [&'static str]>,
    /// Maximum skills injected into this agent's system prompt.
    pub max_skills: usize,
}

pub static AGENTS: &[Agent] = &[
    Agent {
        name: "chat",
        description: "General-purpose conversational agent with access to every tool.",
        system_prompt: "You are a helpful assistant. Use tools when they help answer the user accurately.",
        tool_names: None,
        max_skills: 5,
    },
    Agent {
        name: "research",
        description: "Finds and summarizes information from the web and memory.",
        system_prompt: "You are a research assistant. Search the web, fetch pages, and consult memory to answer factual questions thoroughly and cite what you find.",
        tool_names: Some(&["web_search", "fetch_url", "memory"]),
        max_skills: 2,
    },
    Agent {
        name: "code",
        description: "Reads, writes, and searches local files and performs calculations.",
        system_prompt: "You are a coding assistant. Read and write files, search the codebase, and compute exact results with the calculator before answering.",
        tool_names: Some(&["file_read", "file_write", "file_list", "file_search", "calculator"]),
        max_skills: 2,
    },
    Agent {
        name: "devops",
        description: "Operates on GitHub repositories and Cloudflare DNS.",
        system_prompt: "You are a devops assistant. Inspect GitHub repositories and issues, and manage Cloudflare DNS records as requested.",
        tool_names: Some(&["github_repo", "github_issues", "cloudflare_dns"]),
        max_skills: 2,
    },
    Agent {
        name: "writer",
        description: "Drafts written content, researching sources as needed.",
        system_prompt: "You are a writing assistant. Research with web search and memory as needed, then draft clear, well-structured prose.",
        tool_names: Some(&["web_search", "fetch_url", "memory"]),
        max_skills: 2,
    },
];

/// Look up a built-in agent by name.
pub fn get_agent(name: &str) -> Option<&'static Agent> {
    AGENTS.iter().find(|a| a.name == name)
}

/// Default agent returned when none is named.
pub fn default_agent() -> &'static Agent {
    get_agent("chat").expect("chat agent always registered")
}

pub fn list_names() -> Vec<&'static str> {
    AGENTS.iter().map(|a| a.name).collect()
}

/// Filter a tool registry down to the slice this agent may call.
pub fn tools_for_agent(agent: &Agent, registry: &std::collections::HashMap<String, Arc<dyn Tool>>) -> Vec<Arc<dyn Tool>> {
    match agent.tool_names {
        None => registry.values().cloned().collect(),
        Some(names) => names.iter().filter_map(|n| registry.get(*n).cloned()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_agent_is_chat() {
        assert_eq!(default_agent().name, "chat");
    }

    #[test]
    fn unknown_agent_lookup_returns_none() {
        assert!(get_agent("nonexistent").is_none());
    }

    #[test]
    fn research_agent_tool_slice_excludes_filesystem() {
        let research = get_agent("research").unwrap();
        assert!(!research.tool_names.unwrap().contains(&"file_read"));
        assert!(research.tool_names.unwrap().contains(&"web_search"));
    }

    #[test]
    fn chat_agent_has_no_tool_restriction() {
        assert!(get_agent("chat").unwrap().tool_names.is_none());
    }
}
