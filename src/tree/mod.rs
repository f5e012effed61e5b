/// the level-stack builder
pub mod builder;

use {
	crate::lex::Token,
	::core::fmt::Write,
	::hashbrown::HashMap,
};

/// interpreted tag value, effectively just [`Any`](core::any::Any) with [`Debug`](core::fmt::Debug)
pub trait TagContent: ::downcast_rs::Downcast + ::core::fmt::Debug {}

impl<T: ::downcast_rs::Downcast + ::core::fmt::Debug> TagContent for T {}

::downcast_rs::impl_downcast!(TagContent);

/// handle of a [`Record`] inside a [`Forest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(usize);

/// one GEDCOM record, built from one line
#[derive(Debug)]
pub struct Record {
	/// nesting depth, a root has level 0 and a child its parent's level plus one
	pub level: u8,
	/// the tag name
	pub tag: String,
	/// the cross-reference id this line declared, without the `@`
	pub xref: Option<String>,
	/// the value tokens, delimiters included
	pub values: Vec<Token>,
	/// what the tag interpreter made of the value
	pub content: Option<Box<dyn TagContent>>,
	/// the line the record starts on
	pub line: usize,
	/// children, in encounter order
	pub children: Vec<RecordId>,
}

impl Record {
	/// the decoded value text
	#[must_use]
	pub fn value_text(&self) -> String {
		self.values.iter().map(|token| token.text.as_str()).collect()
	}

	/// the interpreted value, if it is a `T`
	#[must_use]
	pub fn value<T: TagContent>(&self) -> Option<&T> {
		self.content.as_deref()?.downcast_ref::<T>()
	}
}

/// the records of one document, with the cross-reference table
#[derive(Debug, Default)]
pub struct Forest {
	records: Vec<Record>,
	roots: Vec<RecordId>,
	xrefs: HashMap<String, RecordId>,
}

impl Forest {
	/// an empty forest
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// how many records there are, at any depth
	#[must_use]
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// whether there are no records
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// look up a record
	#[must_use]
	pub fn get(&self, id: RecordId) -> Option<&Record> {
		self.records.get(id.0)
	}

	/// look up a record mutably
	#[must_use]
	pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
		self.records.get_mut(id.0)
	}

	/// the level 0 records, in encounter order
	#[must_use]
	pub fn roots(&self) -> &[RecordId] {
		&self.roots
	}

	/// the children of a record
	pub fn children(&self, id: RecordId) -> impl Iterator<Item = (RecordId, &Record)> + '_ {
		self.get(id)
			.map(|record| &record.children[..])
			.unwrap_or_default()
			.iter()
			.filter_map(|child| Some((*child, self.get(*child)?)))
	}

	/// the record declaring cross-reference `id`
	#[must_use]
	pub fn xref(&self, id: &str) -> Option<&Record> {
		self.get(*self.xrefs.get(id)?)
	}

	/// the cross-reference table
	#[must_use]
	pub fn xrefs(&self) -> &HashMap<String, RecordId> {
		&self.xrefs
	}

	/// every record, parents before children, in document order
	pub fn iter_depth_first(&self) -> DepthFirst<'_> {
		DepthFirst {
			forest: self,
			stack: self.roots.iter().rev().copied().collect(),
		}
	}

	/// an indented outline, one record per line
	#[must_use]
	pub fn render_tree(&self) -> String {
		let mut out = String::new();

		for (_, record) in self.iter_depth_first() {
			for _ in 0..record.level {
				out.push_str("  ");
			}

			let _ = write!(out, "{}", record.level);
			if let Some(xref) = &record.xref {
				let _ = write!(out, " @{xref}@");
			}
			let _ = write!(out, " {}", record.tag);

			if !record.values.is_empty() {
				out.push(' ');
				for token in &record.values {
					out.push_str(&token.source());
				}
			}

			if let Some(content) = &record.content {
				let _ = write!(out, " => {content:?}");
			}

			out.push('\n');
		}

		out
	}

	pub(crate) fn insert(&mut self, record: Record) -> RecordId {
		let id = RecordId(self.records.len());
		self.records.push(record);
		id
	}

	pub(crate) fn attach(&mut self, parent: Option<RecordId>, child: RecordId) {
		match parent.and_then(|parent| self.records.get_mut(parent.0)) {
			Some(parent) => parent.children.push(child),
			None => self.roots.push(child),
		}
	}

	/// register `xref`, unless it is already taken, returning the record holding it
	pub(crate) fn define(&mut self, xref: &str, id: RecordId) -> Result<(), RecordId> {
		match self.xrefs.get(xref) {
			Some(existing) => Err(*existing),
			None => {
				self.xrefs.insert(xref.to_string(), id);
				Ok(())
			}
		}
	}
}

/// pre-order iterator over a [`Forest`]
#[derive(Debug, Clone)]
pub struct DepthFirst<'forest> {
	forest: &'forest Forest,
	stack: Vec<RecordId>,
}

impl<'forest> Iterator for DepthFirst<'forest> {
	type Item = (RecordId, &'forest Record);

	fn next(&mut self) -> Option<Self::Item> {
		let id = self.stack.pop()?;
		let record = self.forest.get(id)?;
		self.stack.extend(record.children.iter().rev().copied());
		Some((id, record))
	}
}

#[cfg(test)]
mod tests {
	use {super::*, crate::lex::TokenKind, ::pretty_assertions::assert_eq};

	fn record(level: u8, tag: &str) -> Record {
		Record {
			level,
			tag: tag.to_string(),
			xref: None,
			values: Vec::new(),
			content: None,
			line: 1,
			children: Vec::new(),
		}
	}

	fn sample() -> Forest {
		let mut forest = Forest::new();

		let head = forest.insert(record(0, "HEAD"));
		forest.attach(None, head);
		let sour = forest.insert(record(1, "SOUR"));
		forest.attach(Some(head), sour);
		let vers = forest.insert(record(2, "VERS"));
		forest.attach(Some(sour), vers);
		let charset = forest.insert(record(1, "CHAR"));
		forest.attach(Some(head), charset);

		let mut indi = record(0, "INDI");
		indi.xref = Some("I1".to_string());
		let indi = forest.insert(indi);
		forest.attach(None, indi);
		assert_eq!(forest.define("I1", indi), Ok(()));

		forest
	}

	#[test]
	fn depth_first_is_document_order() {
		let forest = sample();

		let tags = forest
			.iter_depth_first()
			.map(|(_, record)| record.tag.as_str())
			.collect::<Vec<_>>();

		assert_eq!(tags, vec!["HEAD", "SOUR", "VERS", "CHAR", "INDI"]);
		assert_eq!(forest.len(), 5);
		assert_eq!(forest.roots().len(), 2);
	}

	#[test]
	fn children_and_xrefs() {
		let mut forest = sample();
		let head = forest.roots()[0];

		let children = forest
			.children(head)
			.map(|(_, record)| record.tag.as_str())
			.collect::<Vec<_>>();
		assert_eq!(children, vec!["SOUR", "CHAR"]);

		let indi = forest.roots()[1];
		assert_eq!(forest.xref("I1").map(|record| record.tag.as_str()), Some("INDI"));
		assert_eq!(forest.define("I1", head), Err(indi));
		assert_eq!(forest.xrefs().len(), 1);
	}

	#[test]
	fn value_helpers() {
		let mut name = record(1, "NAME");
		name.values = vec![
			Token::new(TokenKind::SeqAlnum, "John", 1, 8),
			Token::new(TokenKind::Delim, " ", 1, 12),
			Token::new(TokenKind::SeqAlnum, "Smith", 1, 13),
		];
		name.content = Some(Box::new(42_u32));

		assert_eq!(name.value_text(), "John Smith");
		assert_eq!(name.value::<u32>(), Some(&42));
		assert_eq!(name.value::<String>(), None);
	}

	#[test]
	fn render_outline() {
		let forest = sample();

		assert_eq!(
			forest.render_tree(),
			"0 HEAD\n  1 SOUR\n    2 VERS\n  1 CHAR\n0 @I1@ INDI\n"
		);
	}
}
