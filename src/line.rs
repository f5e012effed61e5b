use {
	crate::{
		diagnostics::{Context, Frame, Severity},
		lex::{Token, TokenKind},
		options::Resync,
	},
	::tracing::{instrument, trace, Level},
};

/// one parsed GEDCOM line, holding its own copies of the tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
	/// the level, a [`TokenKind::Number`]
	pub level: Token,
	/// the cross-reference, a [`TokenKind::Pointer`]
	pub xref: Option<Token>,
	/// the tag
	pub tag: Token,
	/// the value tokens, including the delimiters between them
	pub values: Vec<Token>,
}

impl Line {
	/// the decoded value text
	#[must_use]
	pub fn value_text(&self) -> String {
		self.values.iter().map(|token| token.text.as_str()).collect()
	}
}

/// grammar violations
#[derive(Debug, ::thiserror::Error, ::miette::Diagnostic)]
pub enum LineDiagnostic {
	/// a token in the wrong slot
	#[error("unexpected {found} at line {line}, column {column}, expected {expected}")]
	#[diagnostic(
		code(gedline::line::unexpected_token),
		help("lines look like `LEVEL [@XREF@] TAG [VALUE]`")
	)]
	Unexpected {
		/// what was found
		found: TokenKind,
		/// what the slot accepts
		expected: &'static str,
		/// 1-based line
		line: usize,
		/// 1-based column
		column: usize,
	},
	/// input ended before the tag
	#[error("unexpected end of input at line {line}, column {column}, expected {expected}")]
	#[diagnostic(code(gedline::line::unexpected_eof))]
	UnexpectedEof {
		/// what the slot accepts
		expected: &'static str,
		/// 1-based line
		line: usize,
		/// 1-based column
		column: usize,
	},
	/// the last line has no terminator
	#[error("line {line} is missing its terminator")]
	#[diagnostic(code(gedline::line::missing_terminator), severity(Warning))]
	MissingTerminator {
		/// 1-based line
		line: usize,
	},
}

fn expected(index: usize) -> &'static str {
	match index {
		0 => "NUMBER",
		2 => "POINTER",
		4 => "SEQ_ALNUM or NUMBER",
		1 | 3 | 5 => "DELIM",
		_ => "a value",
	}
}

/// the line under construction
#[derive(Debug, Default)]
struct Partial {
	level: Option<Token>,
	xref: Option<Token>,
	tag: Option<Token>,
	values: Vec<Token>,
}

/// turns a token stream into [`Line`]s
///
/// the grammar slots are indexed: 0 level, 2 xref, 4 tag, 6 onwards values, odd slots being
/// delimiters
#[derive(Debug)]
pub struct LineParser<'ctx> {
	ctx: &'ctx mut Context,
	depth: usize,
	resync: Resync,

	index: usize,
	partial: Partial,
	skipping: bool,
	position: (usize, usize),

	lines: Vec<Line>,
}

impl<'ctx> LineParser<'ctx> {
	/// a parser reporting into `ctx`, with a `parser` frame pushed for its lifetime
	pub fn new(ctx: &'ctx mut Context, resync: Resync) -> Self {
		let depth = ctx.depth();
		ctx.push(Frame::position("parser"));

		Self {
			ctx,
			depth,
			resync,

			index: 0,
			partial: Partial::default(),
			skipping: false,
			position: (1, 1),

			lines: Vec::new(),
		}
	}

	/// the lines completed so far
	#[must_use]
	pub fn lines(&self) -> &[Line] {
		&self.lines
	}

	/// advance the grammar by one token
	pub fn parse_token(&mut self, token: &Token) {
		self.position = (token.line, token.column);
		let _ = self.ctx.update_position(token.line, token.column);

		if self.skipping {
			self.skipping = token.kind != TokenKind::Terminator;
			return;
		}

		// the optional xref slot falls through to the tag slot, at most once per token
		loop {
			match (self.index, token.kind) {
				(0, TokenKind::Whitespace | TokenKind::Delim | TokenKind::Terminator) => {}
				(0, TokenKind::Eof) => {}
				(_, TokenKind::Eof) => self.end_of_input(),
				(5.., TokenKind::Terminator) => self.finish_line(),

				(0, TokenKind::Number) => {
					self.partial.level = Some(token.clone());
					self.index = 1;
				}
				(1 | 3 | 5, TokenKind::Delim) => self.index += 1,
				(2, TokenKind::Pointer) => {
					self.partial.xref = Some(token.clone());
					self.index = 3;
				}
				(2, _) => {
					self.index = 4;
					continue;
				}
				(4, TokenKind::SeqAlnum | TokenKind::Number) => {
					self.partial.tag = Some(token.clone());
					self.index = 5;
				}
				(6.., _) => {
					self.partial.values.push(token.clone());
					self.index += 1;
				}

				(index, found) => self.reject(index, found),
			}

			break;
		}
	}

	fn finish_line(&mut self) {
		let partial = ::core::mem::take(&mut self.partial);
		self.index = 0;

		if let (Some(level), Some(tag)) = (partial.level, partial.tag) {
			trace!(level = %level.text, tag = %tag.text, "line");
			self.lines.push(Line {
				level,
				xref: partial.xref,
				tag,
				values: partial.values,
			});
		}
	}

	fn reject(&mut self, index: usize, found: TokenKind) {
		self.ctx.report(
			Severity::Critical,
			&LineDiagnostic::Unexpected {
				found,
				expected: expected(index),
				line: self.position.0,
				column: self.position.1,
			},
		);

		self.partial = Partial::default();
		self.index = 0;
		self.skipping = self.resync == Resync::NextTerminator && found != TokenKind::Terminator;
	}

	fn end_of_input(&mut self) {
		if self.index >= 5 {
			self.ctx.report(
				Severity::Warning,
				&LineDiagnostic::MissingTerminator {
					line: self.position.0,
				},
			);
			self.finish_line();
		} else {
			self.ctx.report(
				Severity::Critical,
				&LineDiagnostic::UnexpectedEof {
					expected: expected(self.index),
					line: self.position.0,
					column: self.position.1,
				},
			);
			self.partial = Partial::default();
			self.index = 0;
		}
	}

	/// close a line left open without an [`TokenKind::Eof`] token and hand over the lines
	#[must_use]
	pub fn finish(mut self) -> Vec<Line> {
		if self.index > 0 {
			self.end_of_input();
		}

		::core::mem::take(&mut self.lines)
	}
}

impl Drop for LineParser<'_> {
	fn drop(&mut self) {
		self.ctx.unwind(self.depth);
	}
}

/// parse a complete token sequence
#[instrument(skip_all, level = Level::INFO, fields(tokens = tokens.len()))]
pub fn parse(tokens: &[Token], ctx: &mut Context, resync: Resync) -> Vec<Line> {
	let mut parser = LineParser::new(ctx, resync);

	for token in tokens {
		parser.parse_token(token);
	}

	parser.finish()
}
