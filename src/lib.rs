#![doc = include_str!("../README.md")]
#![warn(
	clippy::pedantic,
	clippy::allow_attributes_without_reason,
	missing_docs
)]
#![allow(clippy::missing_errors_doc, reason = "capitalization :(")]
#![allow(
	clippy::match_same_arms,
	reason = "more confusing to merge in many cases"
)]
#![allow(clippy::wildcard_imports, reason = "used in tag modules")]
#![allow(
	clippy::module_name_repetitions,
	reason = "diagnostic enums are named after their stage"
)]

use {
	crate::{
		diagnostics::Context,
		ext::{TagDefinition, TagRegistry},
		lex::{Lexer, Token},
		line::Line,
		options::ParseOptions,
		tree::Forest,
	},
	::std::io::{self, BufReader, Read},
	::tracing::{instrument, Level},
};
pub use {::miette, ::thiserror};

/// the diagnostic context threaded through every stage
pub mod diagnostics;
/// the extension system and the bundled tag interpreters
pub mod ext;
/// bytes to tokens
pub mod lex;
/// tokens to lines
pub mod line;
/// parse run configuration
pub mod options;
/// the record forest and its builder
pub mod tree;

#[cfg(test)]
mod tests;

/// the result of a parse run
#[derive(Debug)]
pub struct Document {
	/// whether no critical diagnostic was logged
	///
	/// when `false`, `forest` may be partial or empty and should not be trusted
	pub ok: bool,
	/// the tokens lexed, up to the point lexing stopped
	pub tokens: Vec<Token>,
	/// the lines parsed, empty when the parser was skipped
	pub lines: Vec<Line>,
	/// the records, empty when the builder was skipped
	pub forest: Forest,
	/// the diagnostics, see [`Context::render`]
	pub context: Context,
}

/// gedline's main context
#[derive(Debug, Clone, Default)]
pub struct Gedcom {
	/// the tags registered
	pub tags: TagRegistry,
	/// how documents are parsed
	pub options: ParseOptions,
}

impl Gedcom {
	/// construct an instance with no tags and the default options
	#[must_use]
	pub fn new() -> Self {
		Self {
			tags: TagRegistry::new(),
			options: ParseOptions::default(),
		}
	}

	/// replace the options
	#[must_use]
	pub fn with_options(mut self, options: ParseOptions) -> Self {
		self.options = options;
		self
	}

	/// add a tag
	pub fn add_tag(&mut self, tag: TagDefinition) {
		self.tags.register(tag);
	}

	/// add multiple tags
	pub fn add_tags(&mut self, tags: impl IntoIterator<Item = TagDefinition>) {
		self.tags.add_tags(tags);
	}

	/// parse a complete document held in memory
	#[instrument(skip_all, level = Level::INFO, fields(len = src.len()))]
	pub fn parse_document(&self, src: &[u8]) -> Document {
		let mut ctx = Context::new(self.options.threshold);

		let tokens = match self.lex(
			&mut ctx,
			src.iter().map(|byte| Ok::<_, ::core::convert::Infallible>(*byte)),
		) {
			Ok(tokens) => tokens,
			Err(never) => match never {},
		};

		self.build(ctx, tokens)
	}

	/// parse a document from a reader, lexing it byte by byte as it is read
	///
	/// fails only when reading fails, problems with the document itself end up in the
	/// [`Document`]
	#[instrument(skip_all, level = Level::INFO)]
	pub fn parse_reader(&self, reader: impl Read) -> io::Result<Document> {
		let mut ctx = Context::new(self.options.threshold);
		let tokens = self.lex(&mut ctx, BufReader::new(reader).bytes())?;

		Ok(self.build(ctx, tokens))
	}

	fn lex<E>(
		&self,
		ctx: &mut Context,
		bytes: impl Iterator<Item = Result<u8, E>>,
	) -> Result<Vec<Token>, E> {
		let mut lexer = Lexer::new(ctx);

		for byte in bytes {
			if lexer.feed(byte?).is_err()
				|| !(lexer.can_continue() || self.options.complete_all_stages)
			{
				break;
			}
		}

		Ok(lexer.finish())
	}

	fn build(&self, mut ctx: Context, tokens: Vec<Token>) -> Document {
		let lines = if self.proceed(&mut ctx, "parser") {
			line::parse(&tokens, &mut ctx, self.options.resync)
		} else {
			Vec::new()
		};

		let forest = if self.proceed(&mut ctx, "builder") {
			tree::builder::build(&lines, &mut ctx, &self.tags)
		} else {
			Forest::new()
		};

		Document {
			ok: ctx.can_continue(),
			tokens,
			lines,
			forest,
			context: ctx,
		}
	}

	fn proceed(&self, ctx: &mut Context, stage: &'static str) -> bool {
		if ctx.can_continue() || self.options.complete_all_stages {
			true
		} else {
			ctx.info(format_args!("stage skipped: {stage}"));
			false
		}
	}
}
