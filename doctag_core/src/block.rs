use std::ops::Range;

use serde::Serialize;

use crate::ElementKind;
use crate::Position;

const OPEN_MARKER: &str = "/**";
const CLOSE_MARKER: &str = "*/";

/// A tag found in a documentation block, e.g. `@since 1.2.0 first release`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistingTag {
	/// Tag identifier without the `@`.
	pub key: String,
	/// First whitespace-delimited token after the key.
	pub value: String,
	/// Remaining text, continuation lines joined with single spaces.
	pub description: String,
	/// Byte range of `@key …` up to the last non-blank character, relative to
	/// the block's original text.
	pub span: Range<usize>,
	/// The exact substring at `span`.
	pub matched_text: String,
}

impl ExistingTag {
	/// The tag as it would be written fresh, without line prefixes.
	pub fn rendered(&self) -> String {
		render_tag(&self.key, &self.value, &self.description)
	}
}

/// Where a tag sits inside the block text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSite {
	/// Byte range of the tag text.
	pub span: Range<usize>,
	/// The full lines occupied by the tag, including the line prefix and the
	/// trailing newline. `None` when the tag shares a line with `/**` or `*/`.
	pub lines: Option<Range<usize>>,
}

impl TagSite {
	/// The range removed when this tag is deleted.
	pub fn removal_range(&self) -> Range<usize> {
		self.lines.clone().unwrap_or_else(|| self.span.clone())
	}
}

/// Where tags appended at the end of a block are inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndAnchor {
	/// `*/` is alone on its line; new tag lines go before that line.
	BeforeClosingLine(usize),
	/// `*/` shares a line with other text. The whitespace between `split_at`
	/// and `*/` is replaced by a line break so new tag lines fit in between.
	SplitClosingLine { split_at: usize, close: usize },
}

/// One `/** … */` comment and the element it documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentationBlock {
	pub element: ElementKind,
	/// Name of the documented element when the scanner could find one.
	pub element_name: Option<String>,
	/// The verbatim comment text from `/**` through `*/`.
	pub original_text: String,
	/// Whitespace preceding `/**` on its line.
	pub indent: String,
	/// Location of the block in its file.
	pub position: Position,
	/// Tags in the order they appear.
	pub tags: Vec<ExistingTag>,
}

impl DocumentationBlock {
	/// Parse a comment's text into a block. `text` must start with `/**` and
	/// end with `*/`.
	pub fn new(
		text: impl Into<String>,
		indent: impl Into<String>,
		element: ElementKind,
		element_name: Option<String>,
		position: Position,
	) -> Self {
		let original_text = text.into();
		let tags = parse_tags(&original_text);

		Self {
			element,
			element_name,
			original_text,
			indent: indent.into(),
			position,
			tags,
		}
	}

	/// Convenience constructor for a block that is not tied to a file.
	pub fn parse(text: impl Into<String>, element: ElementKind) -> Self {
		Self::new(text, "", element, None, Position::default())
	}

	/// The first tag with this key.
	pub fn tag(&self, key: &str) -> Option<&ExistingTag> {
		self.tags.iter().find(|tag| tag.key == key)
	}

	/// Index (in block order) of the first tag with this key.
	pub fn tag_index(&self, key: &str) -> Option<usize> {
		self.tags.iter().position(|tag| tag.key == key)
	}

	/// Byte offset of `*/`.
	pub fn close_offset(&self) -> usize {
		self.original_text
			.len()
			.saturating_sub(CLOSE_MARKER.len())
			.max(OPEN_MARKER.len())
	}

	/// The prefix written before a new tag line. Taken from the first
	/// continuation line of the block when there is one, otherwise derived
	/// from the block's indentation.
	pub fn line_prefix(&self) -> String {
		let close = self.close_offset();
		let mut offset = 0;
		for line in self.original_text.split_inclusive('\n') {
			let start = offset;
			offset += line.len();
			if start == 0 || start >= close {
				continue;
			}

			let trimmed = line.trim_start_matches([' ', '\t']);
			let leading = line.len() - trimmed.len();
			if trimmed.starts_with('*') && !trimmed.starts_with(CLOSE_MARKER) {
				return format!("{}* ", &line[..leading]);
			}
		}

		format!("{} * ", self.indent)
	}

	pub fn end_anchor(&self) -> EndAnchor {
		let text = &self.original_text;
		let close = self.close_offset();
		let line_start = text[..close].rfind('\n').map_or(0, |idx| idx + 1);

		if line_start > 0 && text[line_start..close].trim().is_empty() {
			return EndAnchor::BeforeClosingLine(line_start);
		}

		let content_end = text[..close].trim_end().len().max(OPEN_MARKER.len());
		EndAnchor::SplitClosingLine {
			split_at: content_end,
			close,
		}
	}

	/// Describe where the tag text at `span` sits.
	pub fn site(&self, span: Range<usize>) -> TagSite {
		let text = &self.original_text;
		let close = self.close_offset();
		let line_start = text[..span.start].rfind('\n').map_or(0, |idx| idx + 1);
		let line_end = text[span.end..]
			.find('\n')
			.map(|idx| span.end + idx + 1);

		let on_opening_line = line_start == 0;
		let lines = match line_end {
			Some(line_end)
				if !on_opening_line
					&& line_end <= close
					&& is_line_prefix(&text[line_start..span.start])
					&& text[span.end..line_end].trim().is_empty() =>
			{
				Some(line_start..line_end)
			}
			_ => None,
		};

		TagSite { span, lines }
	}

	/// Re-locate a tag by searching for its text in the original block. Only
	/// the first occurrence is considered.
	pub fn locate(&self, tag: &ExistingTag) -> Option<TagSite> {
		let start = self.original_text.find(&tag.matched_text)?;
		Some(self.site(start..start + tag.matched_text.len()))
	}
}

/// Render a tag without its line prefix.
pub fn render_tag(key: &str, value: &str, description: &str) -> String {
	let mut tag = format!("@{key}");
	let value = value.trim();
	let description = description.trim();
	if !value.is_empty() {
		tag.push(' ');
		tag.push_str(value);
	}
	if !description.is_empty() {
		tag.push(' ');
		tag.push_str(description);
	}
	tag
}

fn is_line_prefix(text: &str) -> bool {
	text.chars().all(|c| matches!(c, ' ' | '\t' | '*'))
}

/// The text of one comment line with the comment decoration removed.
struct ContentLine {
	/// Offset of the first content character.
	start: usize,
	/// Offset after the last non-blank content character.
	end: usize,
}

fn content_lines(text: &str) -> Vec<ContentLine> {
	let close = text
		.len()
		.saturating_sub(CLOSE_MARKER.len())
		.max(OPEN_MARKER.len());
	let mut lines = Vec::new();
	let mut offset = 0;

	for line in text.split_inclusive('\n') {
		let line_start = offset;
		offset += line.len();
		if line_start >= close {
			break;
		}

		let mut start = if line_start == 0 {
			OPEN_MARKER.len().min(line.len())
		} else {
			let trimmed = line.trim_start_matches([' ', '\t']);
			let mut start = line_start + (line.len() - trimmed.len());
			if trimmed.starts_with('*') && !trimmed.starts_with(CLOSE_MARKER) {
				start += 1;
			}
			start
		};
		let end_limit = offset.min(close);
		start = start.min(end_limit);

		let raw = &text[start..end_limit];
		let leading = raw.len() - raw.trim_start().len();
		let content = raw.trim();
		let start = start + leading;

		lines.push(ContentLine {
			start,
			end: start + content.len(),
		});
	}

	lines
}

fn tag_key_at(content: &str) -> Option<&str> {
	let rest = content.strip_prefix('@')?;
	let len = rest
		.char_indices()
		.find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
		.map_or(rest.len(), |(idx, _)| idx);
	let key = &rest[..len];

	key.chars()
		.next()
		.is_some_and(|c| c.is_ascii_alphabetic())
		.then_some(key)
}

/// Collect the tags of a block in order. A tag runs from its `@key` line
/// across following continuation lines until the next tag, a blank line, or
/// the end of the comment.
fn parse_tags(text: &str) -> Vec<ExistingTag> {
	struct PendingTag {
		key: String,
		span: Range<usize>,
		body: Vec<String>,
	}

	fn finish(text: &str, pending: PendingTag) -> ExistingTag {
		let body = pending.body.join(" ");
		let body = body.trim();
		let (value, description) = match body.split_once(char::is_whitespace) {
			Some((value, description)) => (value.to_string(), description.trim().to_string()),
			None => (body.to_string(), String::new()),
		};

		ExistingTag {
			key: pending.key,
			value,
			description,
			matched_text: text[pending.span.clone()].to_string(),
			span: pending.span,
		}
	}

	let mut tags = Vec::new();
	let mut pending: Option<PendingTag> = None;

	for line in content_lines(text) {
		let content = &text[line.start..line.end];

		if let Some(key) = tag_key_at(content) {
			if let Some(done) = pending.take() {
				tags.push(finish(text, done));
			}
			let body = content[1 + key.len()..].trim().to_string();
			pending = Some(PendingTag {
				key: key.to_string(),
				span: line.start..line.end,
				body: vec![body],
			});
			continue;
		}

		if content.is_empty() {
			if let Some(done) = pending.take() {
				tags.push(finish(text, done));
			}
			continue;
		}

		if let Some(current) = pending.as_mut() {
			current.span.end = line.end;
			current.body.push(content.to_string());
		}
	}

	if let Some(done) = pending.take() {
		tags.push(finish(text, done));
	}

	tags
}
