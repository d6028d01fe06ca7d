use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DoctagError {
	#[error(transparent)]
	#[diagnostic(code(doctag::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse tag policy: {0}")]
	#[diagnostic(
		code(doctag::config_parse),
		help("the policy document must be YAML with a top-level `tag-rules` list")
	)]
	ConfigParse(String),

	#[error("tag rule #{rule} is missing required field `{field}`")]
	#[diagnostic(
		code(doctag::missing_field),
		help("every entry in `tag-rules` needs at least a `tag` key")
	)]
	MissingField { rule: usize, field: String },

	#[error("tag rule #{rule} has an invalid tag key: `{tag}`")]
	#[diagnostic(
		code(doctag::invalid_tag_key),
		help("tag keys are identifiers such as `author`, `since` or `serialField`")
	)]
	InvalidTagKey { rule: usize, tag: String },

	#[error("tag rule `{tag}` has unknown insert position `{value}`")]
	#[diagnostic(
		code(doctag::unknown_placement),
		help("expected one of: beginning, end, preserve, none")
	)]
	UnknownPlacement { tag: String, value: String },

	#[error("tag rule `{tag}` has unknown overwrite policy `{value}`")]
	#[diagnostic(
		code(doctag::unknown_overwrite),
		help("expected one of: never, always, ifLower")
	)]
	UnknownOverwrite { tag: String, value: String },

	#[error("tag rule `{tag}` has unknown location mode `{value}`")]
	#[diagnostic(code(doctag::unknown_location_mode), help("expected one of: auto, manual"))]
	UnknownLocationMode { tag: String, value: String },

	#[error("tag rule `{tag}` targets unknown element kind `{value}`")]
	#[diagnostic(
		code(doctag::unknown_element_kind),
		help(
			"available element kinds: package, module, class, interface, enum, record, \
			 annotation, constructor, method, field, enumConstant"
		)
	)]
	UnknownElementKind { tag: String, value: String },

	#[error("tag rule `{tag}` uses manual location mode without any targets")]
	#[diagnostic(
		code(doctag::empty_targets),
		help("list the element kinds under `location.targets` or switch to `mode: auto`")
	)]
	EmptyTargets { tag: String },

	#[error("tag rule `{tag}` has an invalid template: {reason}")]
	#[diagnostic(code(doctag::invalid_template))]
	InvalidTemplate { tag: String, reason: String },

	#[error("invalid exclude pattern `{pattern}`: {reason}")]
	#[diagnostic(code(doctag::invalid_exclude_pattern))]
	InvalidExcludePattern { pattern: String, reason: String },

	#[error("`{value}` is not a comparable version: {reason}")]
	#[diagnostic(code(doctag::version_parse))]
	VersionParse { value: String, reason: String },

	#[error("tag text `{text}` could not be located in the documentation block")]
	#[diagnostic(code(doctag::block_not_found))]
	BlockNotFound { text: String },

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(doctag::template_render))]
	TemplateRender(String),

	#[error("target path does not exist: `{path}`")]
	#[diagnostic(code(doctag::missing_target))]
	MissingTarget { path: String },

	#[error("file too large: `{path}` is {size} bytes (limit: {limit} bytes)")]
	#[diagnostic(
		code(doctag::file_too_large),
		help("increase `max-file-size` in the policy document or exclude this file")
	)]
	FileTooLarge { path: String, size: u64, limit: u64 },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(doctag::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

impl DoctagError {
	/// Returns `true` for errors raised while loading the tag policy. These
	/// abort a run before any file is touched.
	pub fn is_config_error(&self) -> bool {
		matches!(
			self,
			Self::ConfigParse(_)
				| Self::MissingField { .. }
				| Self::InvalidTagKey { .. }
				| Self::UnknownPlacement { .. }
				| Self::UnknownOverwrite { .. }
				| Self::UnknownLocationMode { .. }
				| Self::UnknownElementKind { .. }
				| Self::EmptyTargets { .. }
				| Self::InvalidTemplate { .. }
				| Self::InvalidExcludePattern { .. }
		)
	}
}

pub type DoctagResult<T> = Result<T, DoctagError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
