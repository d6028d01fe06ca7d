use std::collections::BTreeMap;
use std::path::Path;

use crate::DoctagError;
use crate::DoctagResult;
use crate::ElementKind;

/// Values available to `value` and `description` templates while a single
/// documentation block is rewritten.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
	/// The tag key of the rule being applied.
	pub tag: &'a str,
	pub element: ElementKind,
	pub element_name: Option<&'a str>,
	/// The file the block belongs to, when known.
	pub path: Option<&'a Path>,
	/// User-defined `variables` from the policy document.
	pub variables: &'a BTreeMap<String, serde_json::Value>,
}

impl TemplateContext<'_> {
	fn to_value(&self) -> serde_json::Value {
		let file_name = self
			.path
			.and_then(Path::file_name)
			.map(|name| name.to_string_lossy().to_string());
		let file_stem = self
			.path
			.and_then(Path::file_stem)
			.map(|stem| stem.to_string_lossy().to_string());

		serde_json::json!({
			"tag": self.tag,
			"element": {
				"kind": self.element.as_str(),
				"name": self.element_name,
			},
			"file": {
				"name": file_name,
				"stem": file_stem,
			},
			"vars": self.variables,
		})
	}
}

/// Renders tag templates against one shared template environment.
///
/// Build one renderer per block pass rather than one per template.
pub struct TemplateRenderer {
	env: minijinja::Environment<'static>,
}

impl Default for TemplateRenderer {
	fn default() -> Self {
		Self::new()
	}
}

impl TemplateRenderer {
	pub fn new() -> Self {
		let mut env = minijinja::Environment::new();
		env.set_undefined_behavior(minijinja::UndefinedBehavior::Chainable);
		Self { env }
	}

	/// Render a tag template. Content without template syntax is returned
	/// as-is (trimmed) without touching the template engine.
	pub fn render(&self, content: &str, ctx: &TemplateContext<'_>) -> DoctagResult<String> {
		if !has_template_syntax(content) {
			return Ok(content.trim().to_string());
		}

		let rendered = self
			.env
			.render_str(content, ctx.to_value())
			.map_err(|e| DoctagError::TemplateRender(e.to_string()))?;

		Ok(rendered.trim().to_string())
	}
}

/// Compile a template without rendering it, returning the syntax error
/// message on failure.
pub(crate) fn validate_template(content: &str) -> Result<(), String> {
	if !has_template_syntax(content) {
		return Ok(());
	}

	let mut env = minijinja::Environment::new();
	env.add_template("__tag__", content)
		.map_err(|e| e.to_string())
}

fn has_template_syntax(content: &str) -> bool {
	content.contains("{{") || content.contains("{%") || content.contains("{#")
}
