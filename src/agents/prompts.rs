//! Prompt templates with `{name}` placeholders.
//!
//! Built-in templates can be overridden by `<name>.prompt` files in a
//! configured directory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::PromptError;

pub const TOPIC_EXTRACTOR: &str = "topic_extractor";
pub const SUBQUERY_GENERATOR: &str = "subquery_generator";
pub const ANSWER_GENERATOR: &str = "answer_generator";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

const TOPIC_EXTRACTOR_TEMPLATE: &str = r#"Identify the research topic of the user query.

Predefined topics:
{predefined_topics}

If the query clearly belongs to one of the predefined topics, answer with that topic name copied exactly.
Otherwise answer with a short name for the topic of the query.

User query: {user_query}

Respond with a JSON object of the form {"topic_name": "<topic>"}."#;

const SUBQUERY_GENERATOR_TEMPLATE: &str = r#"Break the user query into self-contained search queries, one per distinct information need.
If the query asks for a single thing, return it unchanged as the only subquery.
Do not return more than five subqueries.

User query: {user_query}

Respond with a JSON object of the form {"subqueries": ["<subquery>", ...]}."#;

const ANSWER_GENERATOR_TEMPLATE: &str = r#"Answer the user query using only the retrieved material below.
Cite paper titles or source URLs where they support a statement.
If the material does not contain the answer, say so.

User query: {query}

Retrieved material:
{results}

Respond with a JSON object of the form {"answer": "<answer>"}."#;

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    templates: HashMap<String, String>,
}

impl PromptTemplates {
    pub fn builtin() -> Self {
        let templates = [
            (TOPIC_EXTRACTOR, TOPIC_EXTRACTOR_TEMPLATE),
            (SUBQUERY_GENERATOR, SUBQUERY_GENERATOR_TEMPLATE),
            (ANSWER_GENERATOR, ANSWER_GENERATOR_TEMPLATE),
        ]
        .into_iter()
        .map(|(name, text)| (name.to_string(), text.to_string()))
        .collect();
        Self { templates }
    }

    /// Built-in templates, overridden by any `*.prompt` files under `dir`.
    pub fn load(dir: Option<&Path>) -> Result<Self, PromptError> {
        let mut prompts = Self::builtin();
        let Some(dir) = dir else {
            return Ok(prompts);
        };

        if !dir.is_dir() {
            return Err(PromptError::LoadError(format!(
                "prompt directory not found: {}",
                dir.display()
            )));
        }

        for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "prompt") {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let text = std::fs::read_to_string(path)
                .map_err(|e| PromptError::LoadError(format!("{}: {}", path.display(), e)))?;
            debug!(template = %name, path = %path.display(), "loaded prompt override");
            prompts.templates.insert(name, text);
        }

        Ok(prompts)
    }

    pub fn get(&self, name: &str) -> Result<&str, PromptError> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))
    }

    /// Render a template. Every placeholder must have a value; extra values are ignored.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<String, PromptError> {
        let template = self.get(name)?;
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in PLACEHOLDER_RE.captures_iter(template) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = vars
                .iter()
                .find(|(k, _)| *k == key.as_str())
                .map(|(_, v)| *v)
                .ok_or_else(|| PromptError::MissingVariable {
                    template: name.to_string(),
                    variable: key.as_str().to_string(),
                })?;
            out.push_str(&template[last..whole.start()]);
            out.push_str(value);
            last = whole.end();
        }

        out.push_str(&template[last..]);
        Ok(out)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}
