use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// The kind of source element a documentation block is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
	Package,
	Module,
	Class,
	Interface,
	Enum,
	Record,
	/// An annotation type declaration (`@interface`).
	Annotation,
	Constructor,
	Method,
	Field,
	EnumConstant,
	/// The scanner could not tell what follows the block.
	Unknown,
}

/// Element kinds that declare a type.
pub const TYPE_DECLARATIONS: &[ElementKind] = &[
	ElementKind::Class,
	ElementKind::Interface,
	ElementKind::Enum,
	ElementKind::Record,
	ElementKind::Annotation,
];

/// Every element kind the scanner can classify.
pub const CLASSIFIED_ELEMENTS: &[ElementKind] = &[
	ElementKind::Package,
	ElementKind::Module,
	ElementKind::Class,
	ElementKind::Interface,
	ElementKind::Enum,
	ElementKind::Record,
	ElementKind::Annotation,
	ElementKind::Constructor,
	ElementKind::Method,
	ElementKind::Field,
	ElementKind::EnumConstant,
];

impl ElementKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Package => "package",
			Self::Module => "module",
			Self::Class => "class",
			Self::Interface => "interface",
			Self::Enum => "enum",
			Self::Record => "record",
			Self::Annotation => "annotation",
			Self::Constructor => "constructor",
			Self::Method => "method",
			Self::Field => "field",
			Self::EnumConstant => "enumConstant",
			Self::Unknown => "unknown",
		}
	}

	/// Parse an element kind name as written in a policy document. Matching
	/// ignores case, `-` and `_`, so `enumConstant`, `enum-constant` and
	/// `ENUM_CONSTANT` are all accepted.
	pub fn parse(value: &str) -> Option<Self> {
		let normalized: String = value
			.trim()
			.chars()
			.filter(|c| *c != '-' && *c != '_')
			.map(|c| c.to_ascii_lowercase())
			.collect();

		let kind = match normalized.as_str() {
			"package" => Self::Package,
			"module" => Self::Module,
			"class" => Self::Class,
			"interface" => Self::Interface,
			"enum" => Self::Enum,
			"record" => Self::Record,
			"annotation" | "@interface" | "annotationtype" => Self::Annotation,
			"constructor" => Self::Constructor,
			"method" => Self::Method,
			"field" => Self::Field,
			"enumconstant" => Self::EnumConstant,
			_ => return None,
		};

		Some(kind)
	}

	pub fn is_type_declaration(self) -> bool {
		TYPE_DECLARATIONS.contains(&self)
	}
}

impl fmt::Display for ElementKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
