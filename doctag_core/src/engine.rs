use std::ops::Range;
use std::path::Path;

use tracing::debug;
use tracing::warn;

use crate::DoctagError;
use crate::DoctagResult;
use crate::DocumentationBlock;
use crate::EndAnchor;
use crate::ExistingTag;
use crate::OverwritePolicy;
use crate::Placement;
use crate::TagPolicy;
use crate::TagRule;
use crate::TagSite;
use crate::TemplateContext;
use crate::TemplateRenderer;
use crate::Version;
use crate::is_version_tag;
use crate::render_tag;

/// The rewritten text of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
	pub text: String,
	/// Number of tags added, removed, moved or rewritten.
	pub mutations: usize,
}

impl BlockOutcome {
	pub fn changed(&self) -> bool {
		self.mutations > 0
	}
}

/// Apply every rule of the policy, in order, to a single block.
///
/// Existing tags are looked up once in the block's original text. All edits
/// are recorded against that text and applied in one pass at the end, so no
/// offset is ever reused after a mutation.
pub fn apply_rules(
	block: &DocumentationBlock,
	policy: &TagPolicy,
	path: Option<&Path>,
) -> DoctagResult<BlockOutcome> {
	let renderer = TemplateRenderer::new();
	let mut cursor = EngineCursor::new(block);
	let mut seen_keys: Vec<&str> = Vec::with_capacity(policy.rules.len());

	for (rule_index, rule) in policy.rules.iter().enumerate() {
		if seen_keys.contains(&rule.tag_key.as_str()) {
			debug!(tag = %rule.tag_key, "tag already handled by an earlier rule");
			continue;
		}
		seen_keys.push(&rule.tag_key);

		let location_matches = rule.location.matches(&rule.tag_key, block.element);
		let ctx = TemplateContext {
			tag: &rule.tag_key,
			element: block.element,
			element_name: block.element_name.as_deref(),
			path,
			variables: &policy.variables,
		};

		let Some(tag_index) = block.tag_index(&rule.tag_key) else {
			if !location_matches {
				debug!(tag = %rule.tag_key, element = %block.element, "location does not match");
				continue;
			}

			let value = renderer.render(&rule.value, &ctx)?;
			let description = renderer.render(&rule.description, &ctx)?;
			let tag = render_tag(&rule.tag_key, &value, &description);
			debug!(tag = %rule.tag_key, placement = ?rule.placement, "adding tag");
			cursor.add(rule.placement, &tag);
			cursor.mutations += 1;
			continue;
		};

		let existing = &block.tags[tag_index];

		if rule.location.remove_if_misplaced && !location_matches {
			debug!(tag = %rule.tag_key, element = %block.element, "removing misplaced tag");
			if let Err(error) = cursor.delete(existing) {
				warn!(tag = %rule.tag_key, %error, "skipping tag");
				continue;
			}
			cursor.mutations += 1;
			continue;
		}

		let value = renderer.render(&rule.value, &ctx)?;
		let in_position = match rule.placement {
			Placement::Beginning => is_leading(block, policy, tag_index, rule_index),
			Placement::End => is_trailing(block, policy, tag_index),
			Placement::Preserve | Placement::Unspecified => true,
		};

		if !should_overwrite(rule, existing, &value) {
			debug!(tag = %rule.tag_key, "keeping existing tag");
			if in_position && rule.placement == Placement::Beginning {
				cursor.advance_head_past(existing);
			}
			continue;
		}

		let description = renderer.render(&rule.description, &ctx)?;
		let tag = render_tag(&rule.tag_key, &value, &description);

		if in_position {
			if existing.rendered() != tag {
				debug!(tag = %rule.tag_key, "overwriting tag in place");
				match cursor.replace(existing, tag) {
					Ok(()) => cursor.mutations += 1,
					Err(error) => warn!(tag = %rule.tag_key, %error, "skipping tag"),
				}
			}
			if rule.placement == Placement::Beginning {
				cursor.advance_head_past(existing);
			}
			continue;
		}

		debug!(tag = %rule.tag_key, placement = ?rule.placement, "moving tag");
		if let Err(error) = cursor.delete(existing) {
			warn!(tag = %rule.tag_key, %error, "skipping tag");
			continue;
		}
		cursor.add(rule.placement, &tag);
		cursor.mutations += 1;
	}

	Ok(cursor.finish())
}

/// Decide whether an existing tag is replaced by the rule's rendered value.
///
/// Under [`OverwritePolicy::IfIncomingVersionLower`] the existing tag is only
/// replaced when its version is lower than `incoming`. Keys that do not hold
/// versions are always replaced. Values that cannot be compared keep the
/// existing tag.
pub fn should_overwrite(rule: &TagRule, existing: &ExistingTag, incoming: &str) -> bool {
	match rule.overwrite {
		OverwritePolicy::Never | OverwritePolicy::Unspecified => false,
		OverwritePolicy::Always => true,
		OverwritePolicy::IfIncomingVersionLower => {
			if !is_version_tag(&rule.tag_key) {
				return true;
			}

			match compare_versions(&existing.value, incoming) {
				Ok(ordering) => ordering.is_lt(),
				Err(error) => {
					warn!(
						tag = %rule.tag_key,
						%error,
						"not a comparable version, keeping the existing tag"
					);
					false
				}
			}
		}
	}
}

fn compare_versions(existing: &str, incoming: &str) -> DoctagResult<std::cmp::Ordering> {
	let existing: Version = existing.parse()?;
	let incoming: Version = incoming.parse()?;
	Ok(existing.cmp(&incoming))
}

/// Every tag before `tag_index` was placed there by an earlier `Beginning`
/// rule.
fn is_leading(
	block: &DocumentationBlock,
	policy: &TagPolicy,
	tag_index: usize,
	rule_index: usize,
) -> bool {
	block.tags[..tag_index].iter().all(|tag| {
		policy.rule(&tag.key).is_some_and(|(index, rule)| {
			index < rule_index && rule.placement == Placement::Beginning
		})
	})
}

/// Every tag after `tag_index` belongs to a rule that appends at the end, in
/// any rule order.
fn is_trailing(block: &DocumentationBlock, policy: &TagPolicy, tag_index: usize) -> bool {
	block.tags[tag_index + 1..].iter().all(|tag| {
		policy
			.rule(&tag.key)
			.is_some_and(|(_, rule)| rule.placement != Placement::Beginning)
	})
}

/// Where the next `Beginning` tag goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadAnchor {
	/// Start of a tag line.
	LineStart(usize),
	/// Before a tag sharing the `/**` line.
	BeforeInline(usize),
	/// After a tag sharing the `/**` line.
	AfterInline(usize),
	/// The block has no tags; use the end anchor.
	End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EditKind {
	Insert(String),
	Delete,
	Replace(String),
}

#[derive(Debug, Clone)]
struct Edit {
	range: Range<usize>,
	/// Orders edits at the same offset: head inserts, other inserts, then
	/// deletes and replacements.
	rank: u8,
	kind: EditKind,
}

const HEAD_RANK: u8 = 0;
const INSERT_RANK: u8 = 1;
const SPAN_RANK: u8 = 2;

/// Per-block state, discarded once the block's text is produced.
struct EngineCursor<'a> {
	block: &'a DocumentationBlock,
	prefix: String,
	head: HeadAnchor,
	end: EndAnchor,
	/// Set once a tag line was inserted into a split closing line.
	split_used: bool,
	edits: Vec<Edit>,
	mutations: usize,
}

impl<'a> EngineCursor<'a> {
	fn new(block: &'a DocumentationBlock) -> Self {
		let head = match block.tags.first() {
			None => HeadAnchor::End,
			Some(first) => {
				let site = block.site(first.span.clone());
				match site.lines {
					Some(lines) => HeadAnchor::LineStart(lines.start),
					None => HeadAnchor::BeforeInline(site.span.start),
				}
			}
		};

		Self {
			block,
			prefix: block.line_prefix(),
			head,
			end: block.end_anchor(),
			split_used: false,
			edits: Vec::new(),
			mutations: 0,
		}
	}

	fn add(&mut self, placement: Placement, tag: &str) {
		let prefix = &self.prefix;
		let (offset, text) = match (placement, self.head) {
			(Placement::Beginning, HeadAnchor::LineStart(offset)) => {
				(offset, format!("{prefix}{tag}\n"))
			}
			(Placement::Beginning, HeadAnchor::BeforeInline(offset)) => {
				(offset, format!("{tag}\n{prefix}"))
			}
			(Placement::Beginning, HeadAnchor::AfterInline(offset)) => {
				(offset, format!("\n{prefix}{tag}"))
			}
			_ => {
				match self.end {
					EndAnchor::BeforeClosingLine(offset) => (offset, format!("{prefix}{tag}\n")),
					EndAnchor::SplitClosingLine { split_at, .. } => {
						self.split_used = true;
						(split_at, format!("\n{prefix}{tag}"))
					}
				}
			}
		};

		let rank = if placement == Placement::Beginning {
			HEAD_RANK
		} else {
			INSERT_RANK
		};
		self.edits.push(Edit {
			range: offset..offset,
			rank,
			kind: EditKind::Insert(text),
		});
	}

	fn delete(&mut self, tag: &ExistingTag) -> DoctagResult<()> {
		let site = self.locate(tag)?;
		self.push_span(site.removal_range(), EditKind::Delete)
	}

	fn replace(&mut self, tag: &ExistingTag, text: String) -> DoctagResult<()> {
		let site = self.locate(tag)?;
		self.push_span(site.span, EditKind::Replace(text))
	}

	fn locate(&self, tag: &ExistingTag) -> DoctagResult<TagSite> {
		self.block.locate(tag).ok_or_else(|| {
			DoctagError::BlockNotFound {
				text: tag.matched_text.clone(),
			}
		})
	}

	fn push_span(&mut self, range: Range<usize>, kind: EditKind) -> DoctagResult<()> {
		let overlaps = self.edits.iter().any(|edit| {
			match edit.kind {
				EditKind::Insert(_) => range.start < edit.range.start && edit.range.start < range.end,
				EditKind::Delete | EditKind::Replace(_) => {
					range.start < edit.range.end && edit.range.start < range.end
				}
			}
		});

		if overlaps {
			return Err(DoctagError::BlockNotFound {
				text: self.block.original_text[range].to_string(),
			});
		}

		self.edits.push(Edit {
			range,
			rank: SPAN_RANK,
			kind,
		});
		Ok(())
	}

	/// Move the head anchor after a leading tag that stays where it is.
	fn advance_head_past(&mut self, tag: &ExistingTag) {
		let Some(site) = self.block.locate(tag) else {
			return;
		};

		self.head = match site.lines {
			Some(lines) => HeadAnchor::LineStart(lines.end),
			None => HeadAnchor::AfterInline(site.span.end),
		};
	}

	fn finish(mut self) -> BlockOutcome {
		let block = self.block;
		let original = &block.original_text;

		if let (true, EndAnchor::SplitClosingLine { split_at, close }) = (self.split_used, self.end) {
			let closing = format!("\n{} ", block.indent);
			if let Err(error) = self.push_span(split_at..close, EditKind::Replace(closing)) {
				warn!(%error, "could not split the closing line");
			}
		}

		if self.edits.is_empty() {
			return BlockOutcome {
				text: original.clone(),
				mutations: self.mutations,
			};
		}

		let mut edits = std::mem::take(&mut self.edits);
		edits.sort_by_key(|edit| (edit.range.start, edit.rank));

		let mut text = String::with_capacity(original.len() + 64);
		let mut offset = 0;
		for edit in edits {
			if edit.range.start < offset {
				continue;
			}
			text.push_str(&original[offset..edit.range.start]);
			offset = edit.range.start;

			match edit.kind {
				EditKind::Insert(insert) => text.push_str(&insert),
				EditKind::Delete => offset = edit.range.end,
				EditKind::Replace(replacement) => {
					text.push_str(&replacement);
					offset = edit.range.end;
				}
			}
		}
		text.push_str(&original[offset..]);

		BlockOutcome {
			text,
			mutations: self.mutations,
		}
	}
}
