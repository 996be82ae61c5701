//! Deterministic keyword-to-agent routing: a fixed, ordered keyword table.
//! Ties resolve to `chat`.

/// Ordered (agent, keywords) table — first match wins.
static ROUTES: &[(&str, &[&str])] = &[
    ("research", &["search", "find", "research", "look up", "what is", "who is"]),
    ("code", &["code", "function", "class", "bug", "error", "implement", "python", "javascript"]),
    ("devops", &["github", "repo", "issue", "pr", "cloudflare", "dns", "deploy", "worker"]),
    ("writer", &["write", "article", "blog", "document", "essay", "draft"]),
];

/// Route a message to an agent name. Falls back to `"chat"` when no
/// keyword table entry matches.
pub fn route_message(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    for (agent, keywords) in ROUTES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return agent;
        }
    }
    "chat"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_research_queries() {
        assert_eq!(route_message("can you search for the latest rust release"), "research");
        assert_eq!(route_message("who is the author of this crate"), "research");
    }

    #[test]
    fn routes_code_queries() {
        assert_eq!(route_message("there's a bug in this function"), "code");
    }

    #[test]
    fn routes_devops_queries() {
        assert_eq!(route_message("check the github repo issue tracker"), "devops");
        assert_eq!(route_message("update the cloudflare dns worker"), "devops");
    }

    #[test]
    fn routes_writer_queries() {
        assert_eq!(route_message("write a blog article about this"), "writer");
    }

    #[test]
    fn falls_back_to_chat() {
        assert_eq!(route_message("hello there, how are you"), "chat");
    }

    #[test]
    fn first_matching_rule_wins_on_ambiguity() {
        // "search" (research) appears before "code" would otherwise match.
        assert_eq!(route_message("search for a code example"), "research");
    }
}
