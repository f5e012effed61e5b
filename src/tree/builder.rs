use {
	crate::{
		diagnostics::{Context, Frame, Severity},
		ext::TagRegistry,
		line::Line,
		tree::{Forest, Record, RecordId, TagContent},
	},
	::tracing::{debug, instrument, Level},
};

/// structural and semantic problems found while building records
#[derive(Debug, ::thiserror::Error, ::miette::Diagnostic)]
pub enum BuildDiagnostic {
	/// the level is not a number
	#[error("invalid level {level:?} at line {line}")]
	#[diagnostic(code(gedline::build::invalid_level))]
	NotANumber {
		/// the level text
		level: String,
		/// 1-based line
		line: usize,
	},
	/// the level does not fit
	#[error("level {level} at line {line} is out of range, levels go up to 255")]
	#[diagnostic(code(gedline::build::level_out_of_range))]
	OutOfRange {
		/// the level text
		level: String,
		/// 1-based line
		line: usize,
	},
	/// a multi-digit level starting with `0`
	#[error("level {level} at line {line} has a leading zero")]
	#[diagnostic(code(gedline::build::leading_zero), severity(Warning))]
	LeadingZero {
		/// the level text
		level: String,
		/// 1-based line
		line: usize,
	},
	/// the level skips nesting depths
	#[error("invalid line level {level} at line {line}, expected at most {max}")]
	#[diagnostic(
		code(gedline::build::invalid_line_level),
		help("a record can only be nested one level below the record before it")
	)]
	InvalidNesting {
		/// the level found
		level: u8,
		/// the deepest level allowed here
		max: usize,
		/// 1-based line
		line: usize,
	},
	/// a second record declares the same xref
	#[error("xref @{xref}@ at line {line} already defined at line {first}")]
	#[diagnostic(code(gedline::build::duplicate_xref))]
	DuplicateXref {
		/// the identifier
		xref: String,
		/// 1-based line of the duplicate
		line: usize,
		/// 1-based line of the definition that is kept
		first: usize,
	},
}

/// builds a [`Forest`] out of [`Line`]s, one at a time
///
/// the open ancestors are kept on a stack where the record at index `n` has level `n`
#[derive(Debug)]
pub struct Builder<'ctx, 'reg> {
	ctx: &'ctx mut Context,
	depth: usize,
	registry: &'reg TagRegistry,

	forest: Forest,
	stack: Vec<RecordId>,
}

impl<'ctx, 'reg> Builder<'ctx, 'reg> {
	/// a builder reporting into `ctx`, with a `builder` frame pushed for its lifetime
	pub fn new(ctx: &'ctx mut Context, registry: &'reg TagRegistry) -> Self {
		let depth = ctx.depth();
		ctx.push(Frame::position("builder"));

		Self {
			ctx,
			depth,
			registry,

			forest: Forest::new(),
			stack: Vec::with_capacity(8),
		}
	}

	/// the level of the innermost open record
	#[must_use]
	pub fn current_level(&self) -> Option<u8> {
		self.stack
			.last()
			.and_then(|id| self.forest.get(*id))
			.map(|record| record.level)
	}

	/// turn a line into a record, returning its id unless the line was dropped
	pub fn construct(&mut self, line: &Line) -> Option<RecordId> {
		let _ = self
			.ctx
			.update_position(line.level.line, line.level.column);

		let level = self.level(line)?;

		if usize::from(level) > self.stack.len() {
			self.ctx.report(Severity::Critical, &BuildDiagnostic::InvalidNesting {
				level,
				max: self.stack.len(),
				line: line.level.line,
			});
			return None;
		}

		self.stack.truncate(level.into());
		let parent = self.stack.last().copied();

		let xref = line.xref.as_ref().map(|xref| xref.text.clone());
		let id = self.forest.insert(Record {
			level,
			tag: line.tag.text.clone(),
			xref: xref.clone(),
			values: line.values.clone(),
			content: None,
			line: line.level.line,
			children: Vec::new(),
		});

		if let Some(xref) = xref {
			if let Err(existing) = self.forest.define(&xref, id) {
				let first = self.forest.get(existing).map_or(0, |record| record.line);
				self.ctx.report(Severity::Error, &BuildDiagnostic::DuplicateXref {
					xref,
					line: line.level.line,
					first,
				});
			}
		}

		if !line.values.is_empty() {
			let content = self.interpret(line);
			if let Some(record) = self.forest.get_mut(id) {
				record.content = content;
			}
		}

		self.forest.attach(parent, id);
		self.stack.push(id);

		debug!(level, tag = %line.tag.text, xref = ?line.xref.as_ref().map(|xref| &xref.text), "record");
		Some(id)
	}

	fn level(&mut self, line: &Line) -> Option<u8> {
		let text = &line.level.text;

		let level = match text.parse::<u8>() {
			Ok(level) => level,
			Err(_) if !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit()) => {
				self.ctx.report(Severity::Critical, &BuildDiagnostic::OutOfRange {
					level: text.clone(),
					line: line.level.line,
				});
				return None;
			}
			Err(_) => {
				self.ctx.report(Severity::Critical, &BuildDiagnostic::NotANumber {
					level: text.clone(),
					line: line.level.line,
				});
				return None;
			}
		};

		if text.len() > 1 && text.starts_with('0') {
			self.ctx.report(Severity::Warning, &BuildDiagnostic::LeadingZero {
				level: text.clone(),
				line: line.level.line,
			});
		}

		Some(level)
	}

	fn interpret(&mut self, line: &Line) -> Option<Box<dyn TagContent>> {
		let tag = &line.tag;
		let interpret = self.registry.lookup(&tag.text);

		self.ctx
			.scoped(Frame::tag(&tag.text, tag.line, tag.column), |ctx| {
				interpret(ctx, &tag.text, &line.values)
			})
	}

	/// close the open records and hand over the forest
	#[must_use]
	pub fn finish(mut self) -> Forest {
		self.stack.clear();
		::core::mem::take(&mut self.forest)
	}
}

impl Drop for Builder<'_, '_> {
	fn drop(&mut self) {
		self.ctx.unwind(self.depth);
	}
}

/// build the records of a complete line sequence
#[instrument(skip_all, level = Level::INFO, fields(lines = lines.len()))]
pub fn build(lines: &[Line], ctx: &mut Context, registry: &TagRegistry) -> Forest {
	let mut builder = Builder::new(ctx, registry);

	for line in lines {
		builder.construct(line);
	}

	builder.finish()
}
