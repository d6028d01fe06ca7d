use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

use crate::DocumentationBlock;
use crate::ElementKind;
use crate::position::LineTable;

/// Maximum number of tokens inspected after a comment when classifying the
/// element it documents.
const HEADER_TOKEN_LIMIT: usize = 256;

const MODIFIERS: &[&str] = &[
	"public",
	"protected",
	"private",
	"static",
	"final",
	"abstract",
	"native",
	"synchronized",
	"transient",
	"volatile",
	"strictfp",
	"default",
	"sealed",
];

/// One source file split into its documentation blocks.
#[derive(Debug, Clone)]
pub struct CodeUnit {
	/// The file the text was read from, when there is one.
	pub path: Option<PathBuf>,
	pub full_text: String,
	/// Blocks in the order they appear in `full_text`.
	pub blocks: Vec<DocumentationBlock>,
}

impl CodeUnit {
	/// Scan source text for documentation blocks.
	pub fn parse(full_text: impl Into<String>) -> Self {
		let full_text = full_text.into();
		let blocks = scan_documentation_blocks(&full_text);

		Self {
			path: None,
			full_text,
			blocks,
		}
	}

	#[must_use]
	pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.path = Some(path.into());
		self
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
	Ident(&'a str),
	Punct(char),
	Literal,
	DocComment,
}

/// A minimal java tokenizer. Comments, string, char and text block literals
/// are skipped so braces and keywords inside them are never seen.
struct Lexer<'a> {
	src: &'a str,
	pos: usize,
}

impl<'a> Lexer<'a> {
	fn new(src: &'a str, pos: usize) -> Self {
		Self { src, pos }
	}

	fn rest(&self) -> &'a str {
		&self.src[self.pos..]
	}

	fn skip_quoted(&mut self, quote: u8) {
		let bytes = self.src.as_bytes();
		let mut i = self.pos + 1;
		while i < bytes.len() {
			match bytes[i] {
				b'\\' => i += 2,
				b'\n' => break,
				b if b == quote => {
					i += 1;
					break;
				}
				_ => i += 1,
			}
		}
		self.pos = i.min(bytes.len());
	}

	fn skip_text_block(&mut self) {
		let bytes = self.src.as_bytes();
		let mut i = self.pos + 3;
		while i < bytes.len() {
			if bytes[i] == b'\\' {
				i += 2;
			} else if bytes[i..].starts_with(b"\"\"\"") {
				i += 3;
				self.pos = i;
				return;
			} else {
				i += 1;
			}
		}
		self.pos = bytes.len();
	}
}

impl<'a> Iterator for Lexer<'a> {
	type Item = (Token<'a>, Range<usize>);

	fn next(&mut self) -> Option<Self::Item> {
		let bytes = self.src.as_bytes();

		loop {
			while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
				self.pos += 1;
			}
			if self.pos >= bytes.len() {
				return None;
			}

			let start = self.pos;
			let rest = self.rest();

			if rest.starts_with("/**") && !rest.starts_with("/**/") {
				let Some(close) = rest[3..].find("*/") else {
					self.pos = bytes.len();
					return None;
				};
				self.pos = start + 3 + close + 2;
				return Some((Token::DocComment, start..self.pos));
			}

			if rest.starts_with("/*") {
				self.pos = rest[2..]
					.find("*/")
					.map_or(bytes.len(), |close| start + 2 + close + 2);
				continue;
			}

			if rest.starts_with("//") {
				self.pos = rest.find('\n').map_or(bytes.len(), |idx| start + idx);
				continue;
			}

			let byte = bytes[start];
			if rest.starts_with("\"\"\"") {
				self.skip_text_block();
				return Some((Token::Literal, start..self.pos));
			}
			if byte == b'"' || byte == b'\'' {
				self.skip_quoted(byte);
				return Some((Token::Literal, start..self.pos));
			}

			if is_ident_start(byte) {
				let mut end = start + 1;
				while end < bytes.len() && is_ident_continue(bytes[end]) {
					end += 1;
				}
				self.pos = end;
				return Some((Token::Ident(&self.src[start..end]), start..end));
			}

			if byte.is_ascii_digit() {
				let mut end = start + 1;
				while end < bytes.len() && (is_ident_continue(bytes[end]) || bytes[end] == b'.') {
					end += 1;
				}
				self.pos = end;
				return Some((Token::Literal, start..end));
			}

			self.pos = start + 1;
			return Some((Token::Punct(byte as char), start..self.pos));
		}
	}
}

fn is_ident_start(byte: u8) -> bool {
	byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$' || byte >= 0x80
}

fn is_ident_continue(byte: u8) -> bool {
	is_ident_start(byte) || byte.is_ascii_digit()
}

#[derive(Debug, Clone)]
enum Scope {
	Type {
		kind: ElementKind,
		name: Option<String>,
		/// Inside an enum body before the `;` ending the constant list.
		in_constants: bool,
	},
	Other,
}

/// The declaration context a documentation block appears in.
#[derive(Debug, Clone, Default)]
struct ScopeContext {
	enclosing_type: Option<String>,
	in_enum_constants: bool,
}

fn current_context(scopes: &[Scope]) -> ScopeContext {
	match scopes.last() {
		Some(Scope::Type {
			name, in_constants, ..
		}) => {
			ScopeContext {
				enclosing_type: name.clone(),
				in_enum_constants: *in_constants,
			}
		}
		_ => ScopeContext::default(),
	}
}

/// Find every `/** … */` comment in java source and classify the element
/// each one documents.
pub fn scan_documentation_blocks(content: &str) -> Vec<DocumentationBlock> {
	let line_table = LineTable::new(content);
	let mut blocks = Vec::new();
	let mut scopes: Vec<Scope> = Vec::new();
	let mut statement: Vec<Token<'_>> = Vec::new();

	for (token, range) in Lexer::new(content, 0) {
		match token {
			Token::DocComment => {
				let context = current_context(&scopes);
				let (element, element_name) = classify_with_context(content, range.end, &context);
				blocks.push(DocumentationBlock::new(
					&content[range.clone()],
					indent_before(content, range.start),
					element,
					element_name,
					line_table.position(range.start, range.end),
				));
			}
			Token::Punct('{') => {
				scopes.push(scope_for_statement(&statement));
				statement.clear();
			}
			Token::Punct('}') => {
				scopes.pop();
				statement.clear();
			}
			Token::Punct(';') => {
				if let Some(Scope::Type { in_constants, .. }) = scopes.last_mut() {
					*in_constants = false;
				}
				statement.clear();
			}
			other => statement.push(other),
		}
	}

	blocks
}

/// Classify the element declared after `offset` without any knowledge of
/// the enclosing declaration.
pub fn classify_element(content: &str, offset: usize) -> (ElementKind, Option<String>) {
	classify_with_context(content, offset, &ScopeContext::default())
}

fn indent_before(content: &str, offset: usize) -> String {
	let line_start = content[..offset].rfind('\n').map_or(0, |idx| idx + 1);
	let before = &content[line_start..offset];
	if before.chars().all(|c| c == ' ' || c == '\t') {
		before.to_string()
	} else {
		String::new()
	}
}

fn scope_for_statement(statement: &[Token<'_>]) -> Scope {
	match find_type_declaration(statement) {
		Some((kind, name)) => {
			Scope::Type {
				kind,
				name,
				in_constants: kind == ElementKind::Enum,
			}
		}
		None => Scope::Other,
	}
}

/// Look for `class`, `interface`, `enum`, `@interface` or `record` keywords
/// in a declaration header.
fn find_type_declaration(tokens: &[Token<'_>]) -> Option<(ElementKind, Option<String>)> {
	for (index, token) in tokens.iter().enumerate() {
		let Token::Ident(word) = token else {
			continue;
		};
		let previous = index.checked_sub(1).map(|i| tokens[i]);
		if previous == Some(Token::Punct('.')) {
			continue;
		}

		let name_after = |at: usize| {
			match tokens.get(at) {
				Some(Token::Ident(name)) => Some((*name).to_string()),
				_ => None,
			}
		};

		let kind = match *word {
			"class" => ElementKind::Class,
			"interface" if previous == Some(Token::Punct('@')) => ElementKind::Annotation,
			"interface" => ElementKind::Interface,
			"enum" => ElementKind::Enum,
			"record"
				if matches!(tokens.get(index + 1), Some(Token::Ident(_)))
					&& matches!(
						tokens.get(index + 2),
						Some(Token::Punct('(' | '<'))
					) =>
			{
				ElementKind::Record
			}
			_ => continue,
		};

		return Some((kind, name_after(index + 1)));
	}

	None
}

/// Collect the declaration header following a comment: every token up to the
/// first `{`, `;`, `=`, `,` or `}` outside parentheses. Annotations are
/// dropped. Returns the header tokens and the terminator, if any.
fn collect_header(content: &str, offset: usize) -> (Vec<Token<'_>>, Option<char>) {
	let mut raw = Vec::new();
	let mut depth = 0usize;
	let mut terminator = None;

	for (token, _) in Lexer::new(content, offset).take(HEADER_TOKEN_LIMIT) {
		match token {
			Token::DocComment => continue,
			Token::Punct('(') => depth += 1,
			Token::Punct(')') => depth = depth.saturating_sub(1),
			Token::Punct(c @ ('{' | ';' | '=' | ',' | '}')) if depth == 0 => {
				terminator = Some(c);
				break;
			}
			_ => {}
		}
		raw.push(token);
	}

	(strip_annotations(&raw), terminator)
}

fn strip_annotations<'a>(tokens: &[Token<'a>]) -> Vec<Token<'a>> {
	let mut result = Vec::with_capacity(tokens.len());
	let mut index = 0;

	while index < tokens.len() {
		let is_annotation = tokens[index] == Token::Punct('@')
			&& matches!(tokens.get(index + 1), Some(Token::Ident(name)) if *name != "interface");

		if !is_annotation {
			result.push(tokens[index]);
			index += 1;
			continue;
		}

		// `@Name`, `@pkg.Name`, optionally followed by `( … )`.
		index += 2;
		while tokens.get(index) == Some(&Token::Punct('.'))
			&& matches!(tokens.get(index + 1), Some(Token::Ident(_)))
		{
			index += 2;
		}
		if tokens.get(index) == Some(&Token::Punct('(')) {
			let mut depth = 0usize;
			while index < tokens.len() {
				match tokens[index] {
					Token::Punct('(') => depth += 1,
					Token::Punct(')') => {
						depth -= 1;
						if depth == 0 {
							index += 1;
							break;
						}
					}
					_ => {}
				}
				index += 1;
			}
		}
	}

	result
}

fn strip_modifiers<'t, 'a>(mut tokens: &'t [Token<'a>]) -> &'t [Token<'a>] {
	loop {
		match tokens {
			[Token::Ident("non"), Token::Punct('-'), Token::Ident("sealed"), rest @ ..] => {
				tokens = rest;
			}
			[Token::Ident(word), rest @ ..] if MODIFIERS.contains(word) => tokens = rest,
			_ => return tokens,
		}
	}
}

/// Skip a leading `<…>` type parameter list.
fn strip_type_parameters<'t, 'a>(tokens: &'t [Token<'a>]) -> &'t [Token<'a>] {
	if tokens.first() != Some(&Token::Punct('<')) {
		return tokens;
	}

	let mut depth = 0usize;
	for (index, token) in tokens.iter().enumerate() {
		match token {
			Token::Punct('<') => depth += 1,
			Token::Punct('>') => {
				depth = depth.saturating_sub(1);
				if depth == 0 {
					return &tokens[index + 1..];
				}
			}
			_ => {}
		}
	}

	tokens
}

fn dotted_name(tokens: &[Token<'_>]) -> Option<String> {
	let mut name = String::new();
	for token in tokens {
		match token {
			Token::Ident(part) => name.push_str(part),
			Token::Punct('.') => name.push('.'),
			_ => break,
		}
	}

	(!name.is_empty()).then_some(name)
}

fn classify_with_context(
	content: &str,
	offset: usize,
	context: &ScopeContext,
) -> (ElementKind, Option<String>) {
	let (header, terminator) = collect_header(content, offset);
	let tokens = strip_modifiers(&header);

	match tokens {
		[Token::Ident("package"), rest @ ..] => return (ElementKind::Package, dotted_name(rest)),
		[Token::Ident("module"), rest @ ..] | [Token::Ident("open"), Token::Ident("module"), rest @ ..] => {
			return (ElementKind::Module, dotted_name(rest));
		}
		_ => {}
	}

	let paren = tokens.iter().position(|t| *t == Token::Punct('('));
	// `record Name(` needs the parenthesis to be recognized.
	let header_end = paren.map_or(tokens.len(), |p| p + 1);
	if let Some((kind, name)) = find_type_declaration(&tokens[..header_end]) {
		return (kind, name);
	}

	if context.in_enum_constants {
		if let [Token::Ident(name), rest @ ..] = tokens {
			if rest.is_empty() || rest.first() == Some(&Token::Punct('(')) {
				return (ElementKind::EnumConstant, Some((*name).to_string()));
			}
		}
	}

	if let Some(p) = paren {
		let Some(Token::Ident(name)) = p.checked_sub(1).map(|i| tokens[i]) else {
			return (ElementKind::Unknown, None);
		};
		let return_type = strip_type_parameters(&tokens[..p - 1]);
		let kind = match (return_type.is_empty(), terminator) {
			// Constructors always have a body.
			(true, Some('{')) => ElementKind::Constructor,
			(true, _) => return (ElementKind::Unknown, None),
			(false, _) => ElementKind::Method,
		};
		return (kind, Some(name.to_string()));
	}

	if let (Some('{'), [Token::Ident(name)]) = (terminator, tokens) {
		if context.enclosing_type.as_deref() == Some(*name) {
			// Compact canonical constructor of a record.
			return (ElementKind::Constructor, Some((*name).to_string()));
		}
	}

	if matches!(terminator, Some(';' | '=' | ',')) {
		let idents: Vec<&str> = tokens
			.iter()
			.filter_map(|t| {
				match t {
					Token::Ident(name) => Some(*name),
					_ => None,
				}
			})
			.collect();
		if idents.len() >= 2 {
			return (ElementKind::Field, idents.last().map(ToString::to_string));
		}
	}

	(ElementKind::Unknown, None)
}
