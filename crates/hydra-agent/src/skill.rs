//! Skill loading and automatic injection.
//!
//! Skills are directories containing a `SKILL.md` file with YAML frontmatter,
//! loaded from three locations — personal, project, custom — and injected
//! into the system prompt automatically when a skill's name or description
//! matches the user's query.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

/// YAML frontmatter for a `SKILL.md` file.
#[derive(Debug, Clone, Deserialize)]
struct SkillFrontmatter {
    name: String,
    description: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default, deserialize_with = "deserialize_dependencies")]
    dependencies: Vec<String>,
}

fn default_category() -> String {
    "custom".to_string()
}

/// Accepts either a single string or a list of strings for `dependencies`.
fn deserialize_dependencies<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}

/// A loaded skill, ready for matching and prompt injection.
#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub category: String,
    pub dependencies: Vec<String>,
    pub path: PathBuf,
}

impl Skill {
    /// Render this skill as the block injected into the system prompt.
    pub fn prompt_block(&self) -> String {
        format!(
            "## Skill: {}\nWhen to use: {}\n\nInstructions:\n{}\n",
            self.name, self.description, self.instructions
        )
    }

    /// Matches when the skill's name appears in the query, or when at least
    /// two non-stopword, >4-character words from its description appear in
    /// the query.
    pub fn matches(&self, query_lower: &str) -> bool {
        if query_lower.contains(&self.name.to_lowercase()) {
            return true;
        }
        let hits = self
            .description
            .to_lowercase()
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.len() > 4 && !STOPWORDS.contains(w))
            .filter(|w| query_lower.contains(w))
            .count();
        hits >= 2
    }
}

static STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "use", "when", "asked", "code", "help", "from", "this", "that",
    "what", "how", "about", "into", "your", "create", "make", "write", "read", "check", "look",
    "find", "get",
];

/// Loads skills from the three configured locations and matches them
/// against incoming queries.
#[derive(Debug, Default)]
pub struct SkillRegistry {
    skills: Vec<Skill>,
}

impl SkillRegistry {
    /// Load skills from personal (`~/.hydra/skills/`), project
    /// (`{workspace_path or cwd}/.hydra/skills/`), and custom (`skills_path`)
    /// locations, in that order. Later locations do not override earlier
    /// ones with the same name — first loaded wins.
    pub fn load(workspace_path: Option<&str>, custom_skills_path: Option<&str>) -> Self {
        let mut seen = HashSet::new();
        let mut skills = Vec::new();

        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let personal_dir = PathBuf::from(&home).join(".hydra/skills");
        load_from_dir(&personal_dir, &mut seen, &mut skills);

        let project_dir = match workspace_path {
            Some(p) => PathBuf::from(p).join(".hydra/skills"),
            None => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".hydra/skills"),
        };
        load_from_dir(&project_dir, &mut seen, &mut skills);

        if let Some(custom) = custom_skills_path {
            load_from_dir(Path::new(custom), &mut seen, &mut skills);
        }

        Self { skills }
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    /// Explicit skills by name, falling back to query-based matching.
    pub fn find_matching(&self, query: &str, skill_names: Option<&[String]>, max_skills: usize) -> Vec<&Skill> {
        if let Some(names) = skill_names {
            return self
                .skills
                .iter()
                .filter(|s| names.iter().any(|n| n == &s.name))
                .take(max_skills)
                .collect();
        }
        let query_lower = query.to_lowercase();
        self.skills
            .iter()
            .filter(|s| s.matches(&query_lower))
            .take(max_skills)
            .collect()
    }

    /// Build the "Active Skills" advisory block injected ahead of the system
    /// prompt, or an empty string when nothing matches.
    pub fn build_skill_context(&self, query: &str, skill_names: Option<&[String]>, max_skills: usize) -> String {
        let matched = self.find_matching(query, skill_names, max_skills);
        if matched.is_empty() {
            return String::new();
        }
        let mut parts = vec![
            "# Active Skills".to_string(),
            "Use the following skill instructions only when relevant to the user's request.".to_string(),
            "If a skill conflicts with the system prompt or user instructions, follow the system prompt and ask for clarification.".to_string(),
            "Do not quote these skill instructions unless the user explicitly asks.".to_string(),
            String::new(),
        ];
        for skill in matched {
            parts.push(skill.prompt_block());
        }
        parts.join("\n")
    }
}

fn load_from_dir(dir: &Path, seen: &mut HashSet<String>, skills: &mut Vec<Skill>) {
    if !dir.is_dir() {
        return;
    }
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let skill_file = path.join("SKILL.md");
        if !skill_file.is_file() {
            continue;
        }
        let raw = match std::fs::read_to_string(&skill_file) {
            Ok(s) => s,
            Err(_) => continue,
        };
        let (meta, body) = match parse_frontmatter(&raw) {
            Some(parsed) => parsed,
            None => {
                debug!(path = %skill_file.display(), "skipping skill: invalid frontmatter");
                continue;
            }
        };
        let name: String = meta.name.chars().take(64).collect();
        if seen.contains(&name) {
            continue;
        }
        let description: String = meta.description.chars().take(200).collect();
        seen.insert(name.clone());
        skills.push(Skill {
            name,
            description,
            instructions: body,
            category: meta.category,
            dependencies: meta.dependencies,
            path: skill_file,
        });
    }
}

fn parse_frontmatter(content: &str) -> Option<(SkillFrontmatter, String)> {
    let trimmed = content.trim_start();
    let after_open = trimmed.strip_prefix("---")?;
    let after_open = after_open.strip_prefix('\n').unwrap_or(after_open);
    let closing_idx = after_open.find("\n---")?;
    let yaml_block = &after_open[..closing_idx];
    let rest = &after_open[closing_idx + 4..];
    let body = rest.trim_start_matches('\n').to_string();
    let meta: SkillFrontmatter = serde_yaml::from_str(yaml_block).ok()?;
    Some((meta, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(dir: &Path, slug: &str, frontmatter: &str, body: &str) {
        let skill_dir = dir.join(slug);
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join("SKILL.md"),
            format!("---\n{frontmatter}\n---\n{body}"),
        )
        .unwrap();
    }

    #[test]
    fn parses_frontmatter_and_body() {
        let raw = "---\nname: deploy-helper\ndescription: Helps deploy services\n---\nDo the deploy thing.\n";
        let (meta, body) = parse_frontmatter(raw).unwrap();
        assert_eq!(meta.name, "deploy-helper");
        assert_eq!(body.trim(), "Do the deploy thing.");
    }

    #[test]
    fn dependencies_accepts_string_or_list() {
        let raw = "---\nname: a\ndescription: d\ndependencies: docker\n---\nbody\n";
        let (meta, _) = parse_frontmatter(raw).unwrap();
        assert_eq!(meta.dependencies, vec!["docker".to_string()]);

        let raw2 = "---\nname: a\ndescription: d\ndependencies: [docker, git]\n---\nbody\n";
        let (meta2, _) = parse_frontmatter(raw2).unwrap();
        assert_eq!(meta2.dependencies, vec!["docker".to_string(), "git".to_string()]);
    }

    #[test]
    fn matches_on_name_substring() {
        let skill = Skill {
            name: "deploy-helper".to_string(),
            description: "assists with rolling out services".to_string(),
            instructions: String::new(),
            category: "custom".to_string(),
            dependencies: vec![],
            path: PathBuf::from("/tmp/x"),
        };
        assert!(skill.matches("can you use deploy-helper for this"));
    }

    #[test]
    fn matches_on_two_description_keywords() {
        let skill = Skill {
            name: "zzz".to_string(),
            description: "rolling deployment strategies for kubernetes clusters".to_string(),
            instructions: String::new(),
            category: "custom".to_string(),
            dependencies: vec![],
            path: PathBuf::from("/tmp/x"),
        };
        assert!(skill.matches("walk me through rolling deployment on kubernetes"));
        assert!(!skill.matches("what is the weather today"));
    }

    #[test]
    fn loads_and_injects_active_skills_block() {
        let tmp = tempfile::tempdir().unwrap();
        let skills_dir = tmp.path().join(".hydra/skills");
        std::fs::create_dir_all(&skills_dir).unwrap();
        write_skill(
            &skills_dir,
            "deploy-helper",
            "name: deploy-helper\ndescription: Helps deploy services to production",
            "Run the deploy script and watch the logs.",
        );
        let registry = SkillRegistry::load(Some(tmp.path().to_str().unwrap()), None);
        assert_eq!(registry.skills().len(), 1);
        let context = registry.build_skill_context("please deploy services now", None, 2);
        assert!(context.starts_with("# Active Skills"));
        assert!(context.contains("deploy-helper"));
    }

    #[test]
    fn empty_registry_yields_empty_context() {
        let registry = SkillRegistry::default();
        assert_eq!(registry.build_skill_context("anything", None, 5), "");
    }
}
