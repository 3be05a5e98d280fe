use crate::application::tooling::Catalog;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Substitution point for the formatted tool catalog.
pub const TOOL_SECTION_PLACEHOLDER: &str = "{formatted_tool_section}";

const EMBEDDED_TEMPLATE: &str = r#"You are an AI assistant with access to the following tools:

{formatted_tool_section}

When you need to use a tool, respond with a JSON object in the following format:
{
    "tool_call": true,
    "tool_server": "server_name",
    "tool": "tool_name",
    "tool_args": {
        "arg1": "value1",
        "arg2": "value2"
    },
    "response": "Your explanation of what you're doing"
}

If you don't need to use a tool, respond with:
{
    "tool_call": false,
    "response": "Your response to the user"
}
"#;

const NO_TOOLS_SECTION: &str = "No tools are currently available.";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt template '{path}' is unavailable: {source}")]
    TemplateUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("prompt template must contain {{formatted_tool_section}} exactly once (found {found})")]
    MissingPlaceholder { found: usize },
}

/// Builds the system prompt from a catalog snapshot.
///
/// Rendering is pure: the same catalog always yields the same bytes.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    template: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::embedded()
    }
}

impl PromptAssembler {
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        let found = template.matches(TOOL_SECTION_PLACEHOLDER).count();
        if found != 1 {
            return Err(PromptError::MissingPlaceholder { found });
        }
        Ok(Self { template })
    }

    pub fn embedded() -> Self {
        Self {
            template: EMBEDDED_TEMPLATE.to_string(),
        }
    }

    /// Read a template file, validating its placeholder.
    pub fn from_file(path: &Path) -> Result<Self, PromptError> {
        let template =
            std::fs::read_to_string(path).map_err(|source| PromptError::TemplateUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(template)
    }

    /// Like [`from_file`](Self::from_file), but any failure yields the
    /// embedded template.
    pub fn load(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(assembler) => {
                debug!(path = %path.display(), "Loaded prompt template");
                assembler
            }
            Err(err) => {
                warn!(%err, "Using embedded prompt template");
                Self::embedded()
            }
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self, catalog: &Catalog) -> String {
        self.template.replacen(TOOL_SECTION_PLACEHOLDER, &format_tool_section(catalog), 1)
    }
}

/// One block per server, tools indented underneath in advertised order.
pub fn format_tool_section(catalog: &Catalog) -> String {
    if catalog.values().all(Vec::is_empty) {
        return NO_TOOLS_SECTION.to_string();
    }

    let mut lines = Vec::new();
    for (server, tools) in catalog {
        if tools.is_empty() {
            continue;
        }
        lines.push(format!("Server: {server}"));
        for tool in tools {
            match tool.description.as_deref().map(str::trim) {
                Some(description) if !description.is_empty() => {
                    lines.push(format!("  - {}: {description}", tool.name))
                }
                _ => lines.push(format!("  - {}", tool.name)),
            }
            if let Some(schema) = &tool.input_schema {
                lines.push(format!("    input schema: {schema}"));
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tooling::ToolDescriptor;
    use serde_json::json;
    use std::io::Write;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert(
            "weather".into(),
            vec![ToolDescriptor::new("forecast").with_description("Daily forecast")],
        );
        catalog.insert(
            "search".into(),
            vec![
                ToolDescriptor::new("web_search")
                    .with_description("Search the web")
                    .with_schema(json!({"type": "object", "properties": {"q": {"type": "string"}}})),
                ToolDescriptor::new("news"),
            ],
        );
        catalog
    }

    #[test]
    fn tool_section_lists_servers_in_name_order() {
        let section = format_tool_section(&catalog());
        assert_eq!(
            section,
            "Server: search\n  - web_search: Search the web\n    input schema: {\"properties\":{\"q\":{\"type\":\"string\"}},\"type\":\"object\"}\n  - news\nServer: weather\n  - forecast: Daily forecast"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let assembler = PromptAssembler::embedded();
        let first = assembler.render(&catalog());
        let second = assembler.render(&catalog());
        assert_eq!(first, second);
        assert!(first.contains("Server: search"));
        assert!(!first.contains(TOOL_SECTION_PLACEHOLDER));
        assert!(first.contains("\"tool_call\": true"));
        assert!(first.contains("\"tool_call\": false"));
    }

    #[test]
    fn empty_catalog_says_so() {
        let prompt = PromptAssembler::embedded().render(&Catalog::new());
        assert!(prompt.contains(NO_TOOLS_SECTION));
    }

    #[test]
    fn template_needs_exactly_one_placeholder() {
        assert!(matches!(
            PromptAssembler::new("no tools here"),
            Err(PromptError::MissingPlaceholder { found: 0 })
        ));
        assert!(matches!(
            PromptAssembler::new("{formatted_tool_section} {formatted_tool_section}"),
            Err(PromptError::MissingPlaceholder { found: 2 })
        ));
        let assembler = PromptAssembler::new("Tools:\n{formatted_tool_section}").expect("valid");
        assert_eq!(
            assembler.render(&catalog()).lines().next(),
            Some("Tools:")
        );
    }

    #[test]
    fn missing_file_falls_back_to_embedded_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        let assembler = PromptAssembler::load(&dir.path().join("absent.txt"));
        assert_eq!(assembler.template(), EMBEDDED_TEMPLATE);
    }

    #[test]
    fn template_file_is_used_when_valid() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "Custom\n{TOOL_SECTION_PLACEHOLDER}\nEnd").expect("write");

        let assembler = PromptAssembler::load(file.path());
        assert_eq!(
            assembler.render(&Catalog::new()),
            format!("Custom\n{NO_TOOLS_SECTION}\nEnd")
        );
    }
}
