use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::CLASSIFIED_ELEMENTS;
use crate::DoctagError;
use crate::DoctagResult;
use crate::ElementKind;
use crate::TYPE_DECLARATIONS;
use crate::template::validate_template;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Source file extensions scanned when the policy does not list any.
pub const DEFAULT_EXTENSIONS: &[&str] = &["java"];

/// Where a newly added (or repositioned) tag goes relative to the existing
/// tags of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placement {
	/// Before the first existing tag. Several `Beginning` rules stack in rule
	/// order.
	Beginning,
	/// After the last line of the block.
	End,
	/// Appended like `End` when added; never moved once present.
	Preserve,
	/// No position configured. Behaves like `Preserve`.
	Unspecified,
}

impl Placement {
	fn parse(tag: &str, value: Option<&str>) -> DoctagResult<Self> {
		let Some(value) = value else {
			return Ok(Self::Unspecified);
		};

		match value.trim().to_ascii_lowercase().as_str() {
			"beginning" | "begin" | "start" => Ok(Self::Beginning),
			"end" => Ok(Self::End),
			"preserve" => Ok(Self::Preserve),
			"none" | "" => Ok(Self::Unspecified),
			_ => {
				Err(DoctagError::UnknownPlacement {
					tag: tag.to_string(),
					value: value.to_string(),
				})
			}
		}
	}
}

/// Whether an existing tag's value and description get replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverwritePolicy {
	Never,
	Always,
	/// Replace the existing tag only when its version is lower than the
	/// configured one.
	IfIncomingVersionLower,
	/// No policy configured. Behaves like `Never`.
	Unspecified,
}

impl OverwritePolicy {
	fn parse(tag: &str, value: Option<&str>) -> DoctagResult<Self> {
		let Some(value) = value else {
			return Ok(Self::Unspecified);
		};

		match value.trim().to_ascii_lowercase().as_str() {
			"never" => Ok(Self::Never),
			"always" => Ok(Self::Always),
			"iflower" | "if-lower" | "if_lower" => Ok(Self::IfIncomingVersionLower),
			"" => Ok(Self::Unspecified),
			_ => {
				Err(DoctagError::UnknownOverwrite {
					tag: tag.to_string(),
					value: value.to_string(),
				})
			}
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocationMode {
	/// Targets are derived from the tag key (see [`auto_targets`]).
	Auto,
	/// Targets are listed explicitly in the policy.
	Manual,
}

/// Which elements a tag belongs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationSpec {
	pub mode: LocationMode,
	/// Explicit targets for [`LocationMode::Manual`]. Ignored in auto mode.
	pub targets: Vec<ElementKind>,
	/// Delete an existing tag when it sits on an element that does not match.
	pub remove_if_misplaced: bool,
}

impl Default for LocationSpec {
	fn default() -> Self {
		Self {
			mode: LocationMode::Auto,
			targets: Vec::new(),
			remove_if_misplaced: false,
		}
	}
}

impl LocationSpec {
	/// Check whether a tag with `tag_key` belongs on an element of `kind`.
	pub fn matches(&self, tag_key: &str, kind: ElementKind) -> bool {
		match self.mode {
			LocationMode::Manual => self.targets.contains(&kind),
			LocationMode::Auto => auto_targets(tag_key).contains(&kind),
		}
	}
}

/// The element kinds a tag key is attached to in auto location mode. These
/// follow where the javadoc tool itself accepts each standard tag.
pub fn auto_targets(tag_key: &str) -> &'static [ElementKind] {
	const CALLABLES: &[ElementKind] = &[ElementKind::Method, ElementKind::Constructor];
	const METHODS: &[ElementKind] = &[ElementKind::Method];
	const SERIAL: &[ElementKind] = &[ElementKind::Field, ElementKind::Method, ElementKind::Class];

	match tag_key {
		"author" | "version" => TYPE_DECLARATIONS,
		"param" | "throws" | "exception" => CALLABLES,
		"return" => METHODS,
		"serial" | "serialField" | "serialData" => SERIAL,
		_ => CLASSIFIED_ELEMENTS,
	}
}

/// A single configured tag. Immutable once loaded and shared by every block
/// and file of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRule {
	/// The tag identifier without the leading `@`.
	pub tag_key: String,
	/// Template for the tag value.
	pub value: String,
	/// Template for the text following the value.
	pub description: String,
	pub placement: Placement,
	pub location: LocationSpec,
	pub overwrite: OverwritePolicy,
}

/// The ordered tag rules of a run plus the scanning settings that travel with
/// them in the policy document.
///
/// ```yaml
/// tag-rules:
///   - tag: author
///     value: "{{ vars.team }}"
///     location:
///       mode: manual
///       targets: [class, interface]
///       removeIfMisplaced: true
///     insertPosition: beginning
///     overwrite: never
///   - tag: since
///     value: "1.0.0"
///     insertPosition: end
///     overwrite: ifLower
/// variables:
///   team: core
/// extensions: [java]
/// exclude: ["generated/"]
/// ```
#[derive(Debug, Clone)]
pub struct TagPolicy {
	pub rules: Vec<TagRule>,
	/// Exposed to templates as `vars`.
	pub variables: BTreeMap<String, serde_json::Value>,
	/// Extensions (without the dot) of the files to rewrite.
	pub extensions: Vec<String>,
	/// Gitignore-style patterns skipped while walking the target.
	pub exclude: Vec<String>,
	pub disable_gitignore: bool,
	pub max_file_size: u64,
}

impl Default for TagPolicy {
	fn default() -> Self {
		Self {
			rules: Vec::new(),
			variables: BTreeMap::new(),
			extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
			exclude: Vec::new(),
			disable_gitignore: false,
			max_file_size: DEFAULT_MAX_FILE_SIZE,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawPolicy {
	#[serde(default)]
	tag_rules: Option<Vec<RawTagRule>>,
	#[serde(default)]
	variables: BTreeMap<String, serde_json::Value>,
	#[serde(default)]
	extensions: Option<Vec<String>>,
	#[serde(default)]
	exclude: Vec<String>,
	#[serde(default)]
	disable_gitignore: bool,
	#[serde(default = "default_max_file_size")]
	max_file_size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawTagRule {
	#[serde(default)]
	tag: Option<String>,
	#[serde(default)]
	value: Option<String>,
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	location: Option<RawLocation>,
	#[serde(default)]
	insert_position: Option<String>,
	#[serde(default)]
	overwrite: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawLocation {
	#[serde(default)]
	mode: Option<String>,
	#[serde(default)]
	targets: Vec<String>,
	#[serde(default)]
	remove_if_misplaced: bool,
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

impl TagPolicy {
	/// Read and validate the policy document at `path`.
	pub fn load(path: &Path) -> DoctagResult<Self> {
		let content = std::fs::read_to_string(path)?;
		Self::from_yaml(&content)
	}

	/// Parse and validate a policy document. Rule order in the document is
	/// the order rules are applied in.
	pub fn from_yaml(content: &str) -> DoctagResult<Self> {
		let raw: RawPolicy =
			serde_yaml_ng::from_str(content).map_err(|e| DoctagError::ConfigParse(e.to_string()))?;

		let Some(raw_rules) = raw.tag_rules else {
			return Err(DoctagError::ConfigParse(
				"missing top-level `tag-rules` list".to_string(),
			));
		};

		let rules = raw_rules
			.into_iter()
			.enumerate()
			.map(|(index, rule)| build_rule(index + 1, rule))
			.collect::<DoctagResult<Vec<_>>>()?;

		let extensions = raw
			.extensions
			.map(|extensions| {
				extensions
					.into_iter()
					.map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
					.filter(|ext| !ext.is_empty())
					.collect::<Vec<_>>()
			})
			.filter(|extensions| !extensions.is_empty())
			.unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect());

		Ok(Self {
			rules,
			variables: raw.variables,
			extensions,
			exclude: raw.exclude,
			disable_gitignore: raw.disable_gitignore,
			max_file_size: raw.max_file_size,
		})
	}

	/// Find the first rule for a tag key.
	pub fn rule(&self, tag_key: &str) -> Option<(usize, &TagRule)> {
		self.rules
			.iter()
			.enumerate()
			.find(|(_, rule)| rule.tag_key == tag_key)
	}
}

fn build_rule(index: usize, raw: RawTagRule) -> DoctagResult<TagRule> {
	let tag = raw
		.tag
		.as_deref()
		.map(str::trim)
		.filter(|tag| !tag.is_empty())
		.ok_or_else(|| {
			DoctagError::MissingField {
				rule: index,
				field: "tag".to_string(),
			}
		})?;
	let tag_key = tag.strip_prefix('@').unwrap_or(tag);

	if !is_tag_key(tag_key) {
		return Err(DoctagError::InvalidTagKey {
			rule: index,
			tag: tag.to_string(),
		});
	}

	let value = raw.value.unwrap_or_default();
	let description = raw.description.unwrap_or_default();
	for template in [&value, &description] {
		validate_template(template).map_err(|reason| {
			DoctagError::InvalidTemplate {
				tag: tag_key.to_string(),
				reason,
			}
		})?;
	}

	Ok(TagRule {
		tag_key: tag_key.to_string(),
		value,
		description,
		placement: Placement::parse(tag_key, raw.insert_position.as_deref())?,
		location: build_location(tag_key, raw.location)?,
		overwrite: OverwritePolicy::parse(tag_key, raw.overwrite.as_deref())?,
	})
}

fn build_location(tag_key: &str, raw: Option<RawLocation>) -> DoctagResult<LocationSpec> {
	let Some(raw) = raw else {
		return Ok(LocationSpec::default());
	};

	let mode = match raw.mode.as_deref().map(|m| m.trim().to_ascii_lowercase()) {
		None => {
			if raw.targets.is_empty() {
				LocationMode::Auto
			} else {
				LocationMode::Manual
			}
		}
		Some(mode) if mode == "auto" => LocationMode::Auto,
		Some(mode) if mode == "manual" => LocationMode::Manual,
		Some(_) => {
			return Err(DoctagError::UnknownLocationMode {
				tag: tag_key.to_string(),
				value: raw.mode.unwrap_or_default(),
			});
		}
	};

	let mut targets = Vec::with_capacity(raw.targets.len());
	for target in &raw.targets {
		let kind = ElementKind::parse(target).ok_or_else(|| {
			DoctagError::UnknownElementKind {
				tag: tag_key.to_string(),
				value: target.clone(),
			}
		})?;
		if !targets.contains(&kind) {
			targets.push(kind);
		}
	}

	if mode == LocationMode::Manual && targets.is_empty() {
		return Err(DoctagError::EmptyTargets {
			tag: tag_key.to_string(),
		});
	}

	Ok(LocationSpec {
		mode,
		targets,
		remove_if_misplaced: raw.remove_if_misplaced,
	})
}

fn is_tag_key(key: &str) -> bool {
	let mut chars = key.chars();
	chars.next().is_some_and(|c| c.is_ascii_alphabetic())
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
