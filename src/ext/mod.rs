/// the fallback interpreter
pub mod common;
/// `MONTH`/`MONTH_FREN`/`MONTH_HEBR` tags
pub mod month;

use {
	crate::{diagnostics::Context, lex::Token, tree::TagContent},
	::hashbrown::HashMap,
};

/// the signature tag interpreters use
///
/// receives the tag name and the value tokens of one line, delimiters included. runs inside a tag
/// frame, so anything logged to `ctx` is attributed to the tag
pub type TagInterpreter =
	fn(ctx: &mut Context, tag: &str, values: &[Token]) -> Option<Box<dyn TagContent>>;

/// defines a tag name and how to interpret its value
#[derive(Debug, Clone, Copy)]
pub struct TagDefinition {
	/// the tag key
	pub key: &'static str,

	/// interpret the value tokens
	pub interpret: TagInterpreter,
}

/// the tags known to a builder
#[derive(Debug, Clone)]
pub struct TagRegistry {
	tags: HashMap<&'static str, TagDefinition>,
	fallback: TagInterpreter,
}

impl TagRegistry {
	/// a registry without tags, falling back to [`common::invalid`]
	#[must_use]
	pub fn new() -> Self {
		Self {
			tags: HashMap::new(),
			fallback: common::invalid::interpret,
		}
	}

	/// register a tag, returning the definition it replaced
	pub fn register(&mut self, tag: TagDefinition) -> Option<TagDefinition> {
		self.tags.insert(tag.key, tag)
	}

	/// register several tags
	pub fn add_tags(&mut self, tags: impl IntoIterator<Item = TagDefinition>) {
		for tag in tags {
			self.register(tag);
		}
	}

	/// the definition registered for `key`
	#[must_use]
	pub fn get(&self, key: &str) -> Option<&TagDefinition> {
		self.tags.get(key)
	}

	/// the interpreter for `key`, or the fallback
	#[must_use]
	pub fn lookup(&self, key: &str) -> TagInterpreter {
		self.tags.get(key).map_or(self.fallback, |tag| tag.interpret)
	}

	/// how many tags are registered
	#[must_use]
	pub fn len(&self) -> usize {
		self.tags.len()
	}

	/// whether no tags are registered
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.tags.is_empty()
	}
}

impl Default for TagRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// problems interpreting a tag value
#[derive(Debug, ::thiserror::Error, ::miette::Diagnostic)]
pub enum TagDiagnostic {
	/// wrong number of value tokens
	#[error("tag {tag} takes {expected} value, found {found}")]
	#[diagnostic(code(gedline::tag::value_count))]
	ValueCount {
		/// the tag name
		tag: String,
		/// expected count
		expected: usize,
		/// actual count
		found: usize,
	},
	/// the value is not one the tag accepts
	#[error("invalid value {value:?} for tag {tag}, expected {expected}")]
	#[diagnostic(code(gedline::tag::invalid_value))]
	InvalidValue {
		/// the tag name
		tag: String,
		/// the decoded value
		value: String,
		/// what the tag accepts
		expected: &'static str,
	},
}

/// every tag this crate provides
#[must_use]
pub fn all_tags() -> impl IntoIterator<Item = TagDefinition> {
	month::tags()
}
