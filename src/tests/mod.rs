use {
	crate::{
		diagnostics::{Context, Severity},
		ext,
		lex::{tokenize, TokenKind},
		options::{ParseOptions, Resync},
		tree::{Forest, RecordId},
		Gedcom,
	},
	::pretty_assertions::assert_eq,
	::proptest::prelude::*,
};

fn gedcom() -> Gedcom {
	let mut gedcom = Gedcom::new();
	gedcom.add_tags(ext::all_tags());
	gedcom
}

fn check_levels(forest: &Forest) {
	fn check(forest: &Forest, id: RecordId, level: u8) {
		let record = forest.get(id).expect("dangling record id");
		assert_eq!(record.level, level, "{} at line {}", record.tag, record.line);

		for child in &record.children {
			check(forest, *child, level + 1);
		}
	}

	for root in forest.roots() {
		check(forest, *root, 0);
	}
}

#[test]
fn individual_with_name() {
	let document = gedcom().parse_document(b"0 @I1@ INDI\n1 NAME John\n");

	assert!(document.ok);
	assert_eq!(document.context.render(), "");

	let forest = &document.forest;
	assert_eq!(forest.roots().len(), 1);

	let indi = forest.xref("I1").expect("xref table maps I1");
	assert_eq!(indi.level, 0);
	assert_eq!(indi.tag, "INDI");
	assert_eq!(indi.xref.as_deref(), Some("I1"));
	assert_eq!(indi.children.len(), 1);

	let name = forest.get(indi.children[0]).expect("child exists");
	assert_eq!(name.level, 1);
	assert_eq!(name.tag, "NAME");
	assert_eq!(name.value_text(), "John");
	assert_eq!(name.values.len(), 1);
}

#[test]
fn level_jump_is_rejected() {
	let document = gedcom().parse_document(b"0 HEAD\n2 BAD\n");

	assert!(!document.ok);
	assert_eq!(document.forest.len(), 1);
	assert_eq!(document.forest.render_tree(), "0 HEAD\n");
	assert_eq!(
		document.context.render(),
		"in <builder (line: 2, column: 1)>\n\t<CRITICAL>: invalid line level 2 at line 2, expected \
		 at most 1\n"
	);
}

#[test]
fn duplicate_xref_reported_once() {
	let document = gedcom().parse_document(b"0 @X1@ INDI\n0 @X1@ INDI\n0 TRLR\n");

	assert!(document.ok);
	assert_eq!(document.forest.xrefs().len(), 1);
	assert_eq!(document.forest.roots().len(), 3);
	assert_eq!(document.context.count(Severity::Error), 1);
	assert!(document.context.entries()[0]
		.message
		.contains("already defined"));
}

#[test]
fn lexical_error_skips_later_stages() {
	let gedcom = gedcom().with_options(ParseOptions::default().with_threshold(Severity::Info));
	let document = gedcom.parse_document(b"0 HEAD\n1 \x01\n0 TRLR\n");

	assert!(!document.ok);
	assert!(document.lines.is_empty());
	assert!(document.forest.is_empty());
	assert_eq!(document.tokens.first().map(|token| token.text.as_str()), Some("0"));

	let messages = document
		.context
		.entries()
		.iter()
		.map(|entry| (entry.severity, entry.message.as_str()))
		.collect::<Vec<_>>();
	assert_eq!(messages, vec![
		(Severity::Critical, "unexpected byte 0x01 at line 2, column 3"),
		(Severity::Info, "stage skipped: parser"),
		(Severity::Info, "stage skipped: builder"),
	]);
}

#[test]
fn complete_all_stages_keeps_going() {
	let gedcom = gedcom().with_options(ParseOptions::default().with_complete_all_stages(true));
	let document = gedcom.parse_document(b"0 HEAD\n1 \x01\n0 TRLR\n");

	assert!(!document.ok);
	assert_eq!(document.forest.render_tree(), "0 HEAD\n0 TRLR\n");
	// the lexer and the parser both object to the stray byte
	assert_eq!(document.context.count(Severity::Critical), 2);
}

#[test]
fn skipped_builder_keeps_lines() {
	let document = gedcom().parse_document(b"0 HEAD\n1 @A@ @B@\n0 TRLR\n");

	assert!(!document.ok);
	assert!(document.forest.is_empty());
	assert_eq!(document.lines.len(), 2);
	assert_eq!(document.lines[0].tag.text, "HEAD");
	assert_eq!(document.lines[1].tag.text, "TRLR");
	assert_eq!(document.tokens.len(), 15);
	assert_eq!(document.tokens.last().map(|token| token.kind), Some(TokenKind::Eof));
	assert_eq!(document.context.count(Severity::Critical), 1);
}

#[test]
fn add_tag_registers_one_interpreter() {
	let mut gedcom = Gedcom::new();
	gedcom.add_tag(ext::month::gregorian::tag());

	let document = gedcom.parse_document(b"0 DATE\n1 MONTH APR\n1 MONTH_FREN VEND\n");
	let interpreted = document
		.forest
		.iter_depth_first()
		.map(|(_, record)| (record.tag.as_str(), record.content.is_some()))
		.collect::<Vec<_>>();

	assert!(document.ok);
	assert_eq!(gedcom.tags.len(), 1);
	assert!(gedcom.tags.get("MONTH").is_some());
	assert_eq!(interpreted, vec![
		("DATE", false),
		("MONTH", true),
		("MONTH_FREN", false),
	]);
}

#[test]
fn grammar_error_drops_one_line() {
	let gedcom = gedcom().with_options(
		ParseOptions::default()
			.with_resync(Resync::NextTerminator)
			.with_complete_all_stages(true),
	);
	let document = gedcom.parse_document(b"0 HEAD\n1 @S1@ @S2@\n1 CHAR ASCII\n");

	assert!(!document.ok);
	assert_eq!(document.forest.render_tree(), "0 HEAD\n  1 CHAR ASCII\n");
	assert_eq!(document.context.entries()[0].trace.len(), 1);
}

#[test]
fn reader_matches_document() {
	let src = b"0 HEAD\n1 DATE\n2 MONTH MAR\n0 TRLR";

	let from_slice = gedcom().parse_document(src);
	let from_reader = gedcom()
		.parse_reader(&src[..])
		.expect("reading a slice cannot fail");

	assert_eq!(from_slice.ok, from_reader.ok);
	assert_eq!(
		from_slice.forest.render_tree(),
		from_reader.forest.render_tree()
	);
	assert_eq!(from_slice.context.render(), from_reader.context.render());
	assert_eq!(from_reader.context.count(Severity::Warning), 1);
}

#[test]
fn silent_threshold_retains_nothing() {
	let gedcom = gedcom().with_options(ParseOptions::default().with_threshold(Severity::Silent));
	let document = gedcom.parse_document(b"0 HEAD\n3 BAD\n");

	assert!(!document.ok);
	assert!(document.context.entries().is_empty());
}

fn gedcom_line() -> impl Strategy<Value = String> {
	"[0-3] (@[A-Z][A-Z0-9]{0,3}@ )?[A-Z_]{3,5}( [A-Za-z0-9.,@#]{1,8}){0,3}(\n|\r\n|\r)"
}

proptest! {
	#[test]
	fn token_sources_reproduce_input(src in "[ -~\t\r\n]{0,64}") {
		let mut ctx = Context::new(Severity::Debug);
		let tokens = tokenize(src.as_bytes(), &mut ctx);

		let rebuilt = tokens.iter().map(|token| token.source()).collect::<String>();
		prop_assert_eq!(rebuilt, src);
		prop_assert_eq!(ctx.depth(), 0);
	}

	#[test]
	fn records_nest_one_level_at_a_time(lines in prop::collection::vec(gedcom_line(), 0..24)) {
		let src = lines.concat();
		let gedcom = gedcom().with_options(ParseOptions::default().with_complete_all_stages(true));
		let document = gedcom.parse_document(src.as_bytes());

		check_levels(&document.forest);
		prop_assert_eq!(document.context.depth(), 0);
	}

	#[test]
	fn dropped_levels_are_counted(levels in prop::collection::vec(0_u8..5, 1..32)) {
		let src = levels
			.iter()
			.map(|level| format!("{level} NOTE\n"))
			.collect::<String>();

		let document = gedcom().parse_document(src.as_bytes());

		check_levels(&document.forest);
		prop_assert_eq!(
			document.forest.len() + document.context.count(Severity::Critical),
			levels.len()
		);
	}

	#[test]
	fn xref_table_holds_distinct_ids(ids in prop::collection::vec(0_u8..6, 0..16)) {
		let src = ids
			.iter()
			.map(|id| format!("0 @X{id}@ INDI\n"))
			.collect::<String>();

		let document = gedcom().parse_document(src.as_bytes());

		let mut distinct = ids.clone();
		distinct.sort_unstable();
		distinct.dedup();

		prop_assert_eq!(document.forest.xrefs().len(), distinct.len());
		prop_assert_eq!(
			document.context.count(Severity::Error),
			ids.len() - distinct.len()
		);
	}
}
