use std::path::Path;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::BlockOutcome;
use crate::CodeUnit;
use crate::DocumentationBlock;
use crate::DoctagResult;
use crate::TagPolicy;
use crate::apply_rules;

/// The result of rewriting every documentation block of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRewrite {
	/// The new file content.
	pub content: String,
	/// Total tag mutations across all blocks.
	pub substitutions: usize,
	/// Number of blocks whose text changed.
	pub blocks_changed: usize,
	/// Number of lines in `content`.
	pub line_count: usize,
}

impl FileRewrite {
	pub fn changed(&self) -> bool {
		self.substitutions > 0
	}
}

fn block_token() -> String {
	format!("__DOCTAG_BLOCK_{}__", Uuid::new_v4().simple())
}

/// Rewrite every block of a parsed code unit.
///
/// Each block's text is first swapped for a unique token, searching for the
/// first occurrence after the previous token. Identical blocks therefore map
/// to distinct sites and are each rewritten exactly once.
pub fn rewrite_code_unit(unit: &CodeUnit, policy: &TagPolicy) -> DoctagResult<FileRewrite> {
	let mut working = unit.full_text.clone();
	let mut tokens = Vec::with_capacity(unit.blocks.len());
	let mut search_from = 0;

	for block in &unit.blocks {
		let Some(found) = working[search_from..].find(&block.original_text) else {
			debug!(line = block.position.start.line, "block text not found, leaving it untouched");
			tokens.push(None);
			continue;
		};

		let start = search_from + found;
		let token = block_token();
		working.replace_range(start..start + block.original_text.len(), &token);
		search_from = start + token.len();
		tokens.push(Some(token));
	}

	let mut substitutions = 0;
	let mut blocks_changed = 0;

	for (block, token) in unit.blocks.iter().zip(tokens) {
		let Some(token) = token else {
			continue;
		};

		let crlf = uses_crlf(&unit.full_text, block);
		let outcome = rewrite_block(block, crlf, policy, unit.path())?;
		debug!(
			element = %block.element,
			name = block.element_name.as_deref().unwrap_or_default(),
			line = block.position.start.line,
			mutations = outcome.mutations,
			"processed block"
		);

		substitutions += outcome.mutations;
		if outcome.text != block.original_text {
			blocks_changed += 1;
		}
		working = working.replacen(&token, &outcome.text, 1);
	}

	let line_count = count_lines(&working);

	Ok(FileRewrite {
		content: working,
		substitutions,
		blocks_changed,
		line_count,
	})
}

/// Whether a block is written with `\r\n` line endings. A single-line block
/// follows the line it sits on.
fn uses_crlf(full_text: &str, block: &DocumentationBlock) -> bool {
	if block.original_text.contains("\r\n") {
		return true;
	}

	full_text
		.get(block.position.end.offset..)
		.and_then(|rest| rest.find('\n').map(|idx| rest[..idx].ends_with('\r')))
		.unwrap_or(false)
}

/// Apply the policy to one block. A `\r\n` block is processed as `\n` and its
/// rewritten text is converted back.
fn rewrite_block(
	block: &DocumentationBlock,
	crlf: bool,
	policy: &TagPolicy,
	path: Option<&Path>,
) -> DoctagResult<BlockOutcome> {
	if !crlf {
		return apply_rules(block, policy, path);
	}

	let normalized = DocumentationBlock::new(
		block.original_text.replace("\r\n", "\n"),
		block.indent.clone(),
		block.element,
		block.element_name.clone(),
		block.position,
	);
	let mut outcome = apply_rules(&normalized, policy, path)?;
	outcome.text = if outcome.changed() {
		outcome.text.replace('\n', "\r\n")
	} else {
		block.original_text.clone()
	};

	Ok(outcome)
}

/// Scan and rewrite source text. Only documentation blocks are touched; every
/// other byte, including its line endings, is kept as-is.
pub fn rewrite_source(
	content: &str,
	path: Option<&Path>,
	policy: &TagPolicy,
) -> DoctagResult<FileRewrite> {
	let mut unit = CodeUnit::parse(content);
	if let Some(path) = path {
		unit = unit.with_path(path);
	}

	let mut rewrite = rewrite_code_unit(&unit, policy)?;
	if !rewrite.changed() {
		rewrite.content = content.to_string();
	}

	Ok(rewrite)
}

fn count_lines(content: &str) -> usize {
	content.lines().count()
}
