/// per-type matching rules and the candidate set
pub mod rules;

use {
	crate::{
		diagnostics::{Context, Frame, Severity},
		lex::rules::{is_delimiter, CandidateSet},
	},
	::core::fmt::{self, Display},
	::tracing::{instrument, trace, Level},
};

/// the closed set of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
	/// one or more digits
	Number,
	/// `@ID@` cross-reference
	Pointer,
	/// `CR`, `LF`, `CRLF` or `LFCR`
	Terminator,
	/// one or more alphanumeric bytes
	SeqAlnum,
	/// one or more printable bytes, with `@` written as `@@`
	SeqAnychar,
	/// `@#...@` escape sequence
	Escape,
	/// a single space
	Delim,
	/// a tab
	Whitespace,
	/// end of input
	Eof,
	/// bytes no token type matched
	Invalid,
}

impl TokenKind {
	/// the candidate types, in scan order
	pub const CANDIDATES: [Self; 9] = [
		Self::Number,
		Self::Pointer,
		Self::Terminator,
		Self::SeqAlnum,
		Self::SeqAnychar,
		Self::Escape,
		Self::Delim,
		Self::Whitespace,
		Self::Eof,
	];

	/// the name used in diagnostics
	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Self::Number => "NUMBER",
			Self::Pointer => "POINTER",
			Self::Terminator => "TERMINATOR",
			Self::SeqAlnum => "SEQ_ALNUM",
			Self::SeqAnychar => "SEQ_ANYCHAR",
			Self::Escape => "ESCAPE",
			Self::Delim => "DELIM",
			Self::Whitespace => "WHITESPACE",
			Self::Eof => "EOF",
			Self::Invalid => "INVALID",
		}
	}
}

impl Display for TokenKind {
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt.write_str(self.name())
	}
}

/// a lexed token
///
/// `text` is decoded: pointers lose their enclosing `@`, escapes lose `@#` and the closing `@`,
/// and doubled `@` collapse to one. bytes map one-to-one onto `U+0000..=U+00FF`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	/// the token type
	pub kind: TokenKind,
	/// decoded text
	pub text: String,
	/// 1-based line the token starts on
	pub line: usize,
	/// 1-based column the token starts at
	pub column: usize,
}

impl Token {
	/// construct a token
	#[must_use]
	pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
		Self {
			kind,
			text: text.into(),
			line,
			column,
		}
	}

	/// re-encode the token as it would appear in a file
	#[must_use]
	pub fn source(&self) -> String {
		match self.kind {
			TokenKind::Pointer => format!("@{}@", self.text),
			TokenKind::Escape => format!("@#{}@", self.text.replace('@', "@@")),
			TokenKind::SeqAnychar => self.text.replace('@', "@@"),
			_ => self.text.clone(),
		}
	}

	/// whether this is a delimiter or whitespace token
	#[must_use]
	pub fn is_blank(&self) -> bool {
		matches!(self.kind, TokenKind::Delim | TokenKind::Whitespace)
	}
}

/// one unit of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
	/// a byte of the file
	Byte(u8),
	/// end of input
	Eof,
}

impl Input {
	fn byte(self) -> Option<u8> {
		match self {
			Self::Byte(byte) => Some(byte),
			Self::Eof => None,
		}
	}
}

impl From<u8> for Input {
	fn from(byte: u8) -> Self {
		Self::Byte(byte)
	}
}

impl From<Option<u8>> for Input {
	fn from(byte: Option<u8>) -> Self {
		byte.map_or(Self::Eof, Self::Byte)
	}
}

/// outcome of [`Lexer::feed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
	/// the first byte only filled the lookahead
	NotPrimed,
	/// no token was completed
	NeedMore,
	/// at least one token was completed
	Completed,
}

/// misuse of the [`Lexer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ::thiserror::Error, ::miette::Diagnostic)]
pub enum LexError {
	/// input was fed after end of input
	#[error("input fed after end of input")]
	#[diagnostic(code(gedline::lex::after_eof))]
	AfterEof,
}

/// problems in the input found while lexing
#[derive(Debug, ::thiserror::Error, ::miette::Diagnostic)]
pub enum LexDiagnostic {
	/// no token type matches
	#[error("unexpected {found} at line {line}, column {column}")]
	#[diagnostic(
		code(gedline::lex::unexpected_byte),
		help("a GEDCOM line is made of a level, an optional @XREF@, a tag and an optional value")
	)]
	UnexpectedByte {
		/// description of the byte
		found: String,
		/// 1-based line
		line: usize,
		/// 1-based column
		column: usize,
	},
}

fn describe(byte: Option<u8>) -> String {
	match byte {
		None => "end of input".to_string(),
		Some(byte @ 0x21..=0x7e) => format!("byte 0x{byte:02x} ('{}')", char::from(byte)),
		Some(byte) => format!("byte 0x{byte:02x}"),
	}
}

/// collapse doubled `@` into one, decoding bytes as latin-1
fn decode(bytes: &[u8], collapse_ats: bool) -> String {
	let mut text = String::with_capacity(bytes.len());
	let mut iter = bytes.iter().copied().peekable();

	while let Some(byte) = iter.next() {
		if collapse_ats && byte == b'@' && iter.peek() == Some(&b'@') {
			iter.next();
		}
		text.push(char::from(byte));
	}

	text
}

enum Step {
	Consumed,
	Refeed,
}

/// streaming, maximal-munch tokenizer
///
/// bytes go in one at a time through [`Lexer::feed`]. while the lexer lives, a `lexer` position
/// frame sits on the context stack, it is popped once end of input has been fed or the lexer is
/// dropped
#[derive(Debug)]
pub struct Lexer<'ctx> {
	ctx: &'ctx mut Context,
	depth: usize,

	lookahead: Option<Input>,
	eof: bool,

	pending: Vec<u8>,
	candidates: CandidateSet,
	start: (usize, usize),

	line: usize,
	column: usize,
	line_break: bool,

	tokens: Vec<Token>,
}

impl<'ctx> Lexer<'ctx> {
	/// a lexer reporting into `ctx`
	pub fn new(ctx: &'ctx mut Context) -> Self {
		let depth = ctx.depth();
		ctx.push(Frame::position("lexer"));

		Self {
			ctx,
			depth,

			lookahead: None,
			eof: false,

			pending: Vec::with_capacity(32),
			candidates: CandidateSet::fresh(),
			start: (1, 1),

			line: 1,
			column: 1,
			line_break: false,

			tokens: Vec::new(),
		}
	}

	/// the tokens completed so far
	#[must_use]
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	/// whether end of input has been fed
	#[must_use]
	pub fn at_eof(&self) -> bool {
		self.eof
	}

	/// whether the context is still free of critical diagnostics
	#[must_use]
	pub fn can_continue(&self) -> bool {
		self.ctx.can_continue()
	}

	/// feed one byte, or end of input
	///
	/// the byte becomes the lookahead, and the previous lookahead is lexed. feeding end of input
	/// drains the lookahead and emits the [`TokenKind::Eof`] token
	pub fn feed(&mut self, input: impl Into<Input>) -> Result<Feed, LexError> {
		if self.eof {
			return Err(LexError::AfterEof);
		}

		let input = input.into();
		let before = self.tokens.len();
		let previous = self.lookahead.replace(input);

		if let Some(Input::Byte(byte)) = previous {
			self.process(Some(byte), input.byte());
		}

		if input == Input::Eof {
			self.lookahead = None;
			self.process(None, None);
			self.eof = true;
			self.ctx.unwind(self.depth);
		} else if previous.is_none() {
			return Ok(Feed::NotPrimed);
		}

		Ok(if self.tokens.len() > before {
			Feed::Completed
		} else {
			Feed::NeedMore
		})
	}

	/// feed a run of bytes, returning how many tokens were completed
	pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<usize, LexError> {
		let before = self.tokens.len();

		for byte in bytes {
			self.feed(*byte)?;
		}

		Ok(self.tokens.len() - before)
	}

	/// end the input if that has not happened yet, and hand over the tokens
	#[must_use]
	pub fn finish(mut self) -> Vec<Token> {
		if !self.eof {
			let _ = self.feed(Input::Eof);
		}

		::core::mem::take(&mut self.tokens)
	}

	fn process(&mut self, byte: Option<u8>, next: Option<u8>) {
		let _ = self.ctx.update_position(self.line, self.column);

		while let Step::Refeed = self.advance(byte, next) {}

		// a terminator token counts as one line break, whether it is one byte or a pair
		if ::core::mem::take(&mut self.line_break) {
			self.line += 1;
			self.column = 1;
		} else if byte.is_some() {
			self.column += 1;
		}
	}

	fn advance(&mut self, byte: Option<u8>, next: Option<u8>) -> Step {
		let complete = self.candidates.first_complete();

		// a delimiter ends a run that was waiting for one, in favour of the first completed type
		if is_delimiter(byte) && self.candidates.awaits_delimiter() {
			if let Some(kind) = complete {
				self.finalize(kind);
				return Step::Refeed;
			}
		}

		let verdicts = self.candidates.judge_all(&self.pending, byte, next);

		if let Some(kind) = TokenKind::CANDIDATES
			.iter()
			.zip(verdicts)
			.find(|(_, verdict)| *verdict == rules::Verdict::Done)
			.map(|(kind, _)| *kind)
		{
			self.line_break = kind == TokenKind::Terminator;
			self.accept(byte);
			self.finalize(kind);
			return Step::Consumed;
		}

		if verdicts.iter().any(|verdict| verdict.is_live()) {
			trace!(byte = ?byte.map(char::from), ?verdicts, "candidates");
			self.candidates.apply(verdicts);
			self.accept(byte);
			return Step::Consumed;
		}

		if let Some(kind) = complete {
			self.finalize(kind);
			return Step::Refeed;
		}

		self.ctx.report(
			Severity::Critical,
			&LexDiagnostic::UnexpectedByte {
				found: describe(byte),
				line: self.line,
				column: self.column,
			},
		);

		if self.pending.is_empty() {
			self.accept(byte);
			self.finalize(TokenKind::Invalid);
			Step::Consumed
		} else {
			self.finalize(TokenKind::Invalid);
			Step::Refeed
		}
	}

	fn accept(&mut self, byte: Option<u8>) {
		if self.pending.is_empty() {
			self.start = (self.line, self.column);
		}

		if let Some(byte) = byte {
			self.pending.push(byte);
		}
	}

	fn finalize(&mut self, kind: TokenKind) {
		let pending = &self.pending[..];
		let text = match kind {
			TokenKind::Pointer if pending.len() >= 2 => decode(&pending[1..pending.len() - 1], false),
			TokenKind::Escape if pending.len() >= 3 => decode(&pending[2..pending.len() - 1], true),
			TokenKind::SeqAnychar => decode(pending, true),
			_ => decode(pending, false),
		};

		let token = Token::new(kind, text, self.start.0, self.start.1);
		trace!(kind = %token.kind, text = ?token.text, line = token.line, column = token.column, "token");

		self.tokens.push(token);
		self.pending.clear();
		self.candidates = CandidateSet::fresh();
	}
}

/// lex a complete input
#[instrument(skip_all, level = Level::INFO, fields(len = src.len()))]
pub fn tokenize(src: &[u8], ctx: &mut Context) -> Vec<Token> {
	let mut lexer = Lexer::new(ctx);
	let _ = lexer.feed_bytes(src);
	lexer.finish()
}

impl Drop for Lexer<'_> {
	fn drop(&mut self) {
		self.ctx.unwind(self.depth);
	}
}
