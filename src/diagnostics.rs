use {
	::core::fmt::{self, Display, Write},
	::miette::Diagnostic,
	::tracing::{debug, error, info, warn},
};

/// how serious a logged message is
///
/// ordered from least to most severe, [`Severity::Silent`] sits above everything and is only
/// meaningful as a threshold, where it suppresses every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "cli", derive(::clap::ValueEnum))]
pub enum Severity {
	/// tracing noise
	Debug,
	/// informational
	Info,
	/// a deviation from the format that does not change the result
	Warning,
	/// a semantic problem, the pipeline continues
	Error,
	/// an unrecoverable problem, halts the pipeline
	Critical,
	/// suppress-all sentinel
	Silent,
}

impl Severity {
	/// the upper-case label used in rendered transcripts
	#[must_use]
	pub fn label(self) -> &'static str {
		match self {
			Self::Debug => "DEBUG",
			Self::Info => "INFO",
			Self::Warning => "WARNING",
			Self::Error => "ERROR",
			Self::Critical => "CRITICAL",
			Self::Silent => "SILENT",
		}
	}
}

impl Display for Severity {
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt.write_str(self.label())
	}
}

/// an entry of the context stack, describing the phase a message was raised in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
	/// a processing stage and the position it has reached
	Position {
		/// the stage, such as `lexer` or `parser`
		origin: &'static str,
		/// 1-based line
		line: usize,
		/// 1-based column
		column: usize,
	},
	/// a tag being interpreted
	Tag {
		/// the tag name
		name: String,
		/// 1-based line of the tag
		line: usize,
		/// 1-based column of the tag
		column: usize,
	},
}

impl Frame {
	/// a position frame starting before the first byte
	#[must_use]
	pub fn position(origin: &'static str) -> Self {
		Self::Position {
			origin,
			line: 0,
			column: 0,
		}
	}

	/// a tag frame
	#[must_use]
	pub fn tag(name: impl Into<String>, line: usize, column: usize) -> Self {
		Self::Tag {
			name: name.into(),
			line,
			column,
		}
	}
}

impl Display for Frame {
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Position {
				origin,
				line,
				column,
			} => write!(fmt, "{origin} (line: {line}, column: {column})"),
			Self::Tag { name, line, column } => {
				write!(fmt, "tag {name} (line: {line}, column: {column})")
			}
		}
	}
}

/// a retained message, with a snapshot of the frame stack at the time it was logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
	/// severity of the message
	pub severity: Severity,
	/// the formatted message
	pub message: String,
	/// the diagnostic code, when the message came from a typed diagnostic
	pub code: Option<String>,
	/// the frame stack, outermost first
	pub trace: Vec<Frame>,
}

impl Display for LogEntry {
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
		for frame in &self.trace {
			writeln!(fmt, "in <{frame}>")?;
		}

		write!(fmt, "\t<{}>: {}", self.severity, self.message)
	}
}

/// misuse of the [`Context`] stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, ::thiserror::Error, ::miette::Diagnostic)]
pub enum ContextError {
	/// the frame stack was empty
	#[error("context stack is empty")]
	#[diagnostic(code(gedline::context::empty_stack))]
	EmptyStack,
}

/// the diagnostic context shared by every stage of a parse run
///
/// holds a stack of [`Frame`]s and an append-only log. a [`Severity::Critical`] message always
/// halts the pipeline, even when the message itself falls below the threshold and is not retained
#[derive(Debug)]
pub struct Context {
	can_continue: bool,
	threshold: Severity,
	stack: Vec<Frame>,
	log: Vec<LogEntry>,
}

impl Context {
	/// an empty context retaining messages of at least `threshold`
	#[must_use]
	pub fn new(threshold: Severity) -> Self {
		Self {
			can_continue: true,
			threshold,
			stack: Vec::with_capacity(8),
			log: Vec::new(),
		}
	}

	/// the minimum severity that will be retained
	#[must_use]
	pub fn threshold(&self) -> Severity {
		self.threshold
	}

	/// whether no critical message has been logged
	///
	/// stages never stop themselves, the driver checks this between stages
	#[must_use]
	pub fn can_continue(&self) -> bool {
		self.can_continue
	}

	/// enter a phase
	pub fn push(&mut self, frame: Frame) {
		self.stack.push(frame);
	}

	/// leave the innermost phase, returning its frame
	///
	/// popping an empty stack is a bug in the caller, it panics in debug builds
	pub fn pop(&mut self) -> Result<Frame, ContextError> {
		debug_assert!(!self.stack.is_empty(), "pop on an empty context stack");

		self.stack.pop().ok_or_else(|| {
			error!("pop on an empty context stack");
			ContextError::EmptyStack
		})
	}

	/// run `f` inside `frame`, popping it again afterwards
	pub fn scoped<R>(&mut self, frame: Frame, f: impl FnOnce(&mut Self) -> R) -> R {
		let depth = self.stack.len();
		self.push(frame);
		let ret = f(self);
		self.unwind(depth);
		ret
	}

	/// drop every frame above `depth`
	pub(crate) fn unwind(&mut self, depth: usize) {
		self.stack.truncate(depth);
	}

	/// the innermost frame
	#[must_use]
	pub fn frame(&self) -> Option<&Frame> {
		self.stack.last()
	}

	/// how many frames are on the stack
	#[must_use]
	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	/// move the innermost frame to a new position
	///
	/// entries that were already logged keep the position they were logged at
	pub fn update_position(&mut self, new_line: usize, new_column: usize) -> Result<(), ContextError> {
		match self.stack.last_mut() {
			Some(Frame::Position { line, column, .. } | Frame::Tag { line, column, .. }) => {
				*line = new_line;
				*column = new_column;
				Ok(())
			}
			None => {
				debug_assert!(false, "position update on an empty context stack");
				Err(ContextError::EmptyStack)
			}
		}
	}

	/// log a message
	///
	/// returns whether the message was retained
	pub fn log(&mut self, severity: Severity, message: impl Display) -> bool {
		self.push_entry(severity, message.to_string(), None)
	}

	/// log a typed diagnostic, recording its code alongside the message
	pub fn report<D: Diagnostic + ?Sized>(&mut self, severity: Severity, diagnostic: &D) -> bool {
		let code = diagnostic.code().map(|code| code.to_string());
		self.push_entry(severity, diagnostic.to_string(), code)
	}

	fn push_entry(&mut self, severity: Severity, message: String, code: Option<String>) -> bool {
		if severity == Severity::Silent {
			return false;
		}

		if severity == Severity::Critical {
			self.can_continue = false;
		}

		let frame = self.stack.last();
		match severity {
			Severity::Critical | Severity::Error => error!(?frame, %severity, "{message}"),
			Severity::Warning => warn!(?frame, "{message}"),
			Severity::Info => info!(?frame, "{message}"),
			Severity::Debug | Severity::Silent => debug!(?frame, "{message}"),
		}

		if severity < self.threshold {
			return false;
		}

		self.log.push(LogEntry {
			severity,
			message,
			code,
			trace: self.stack.clone(),
		});

		true
	}

	/// log at [`Severity::Debug`]
	pub fn debug(&mut self, message: impl Display) -> bool {
		self.log(Severity::Debug, message)
	}

	/// log at [`Severity::Info`]
	pub fn info(&mut self, message: impl Display) -> bool {
		self.log(Severity::Info, message)
	}

	/// log at [`Severity::Warning`]
	pub fn warn(&mut self, message: impl Display) -> bool {
		self.log(Severity::Warning, message)
	}

	/// log at [`Severity::Error`]
	pub fn error(&mut self, message: impl Display) -> bool {
		self.log(Severity::Error, message)
	}

	/// log at [`Severity::Critical`], halting the pipeline
	pub fn critical(&mut self, message: impl Display) -> bool {
		self.log(Severity::Critical, message)
	}

	/// retained entries, in the order they were logged
	#[must_use]
	pub fn entries(&self) -> &[LogEntry] {
		&self.log
	}

	/// how many retained entries have exactly `severity`
	#[must_use]
	pub fn count(&self, severity: Severity) -> usize {
		self.log
			.iter()
			.filter(|entry| entry.severity == severity)
			.count()
	}

	/// human readable transcript of every retained entry
	#[must_use]
	pub fn render(&self) -> String {
		let mut out = String::with_capacity(self.log.len() * 64);

		for entry in &self.log {
			let _ = writeln!(out, "{entry}");
		}

		out
	}
}

impl Default for Context {
	fn default() -> Self {
		Self::new(Severity::Warning)
	}
}

#[cfg(test)]
mod tests {
	use {super::*, ::pretty_assertions::assert_eq};

	#[derive(Debug, ::thiserror::Error, ::miette::Diagnostic)]
	#[error("something odd with {what}")]
	#[diagnostic(code(gedline::test::odd))]
	struct Odd {
		what: &'static str,
	}

	#[test]
	fn new_context_is_empty() {
		let ctx = Context::new(Severity::Debug);

		assert!(ctx.can_continue());
		assert_eq!(ctx.depth(), 0);
		assert!(ctx.entries().is_empty());
		assert_eq!(ctx.render(), "");
	}

	#[test]
	fn below_threshold_is_discarded() {
		let mut ctx = Context::new(Severity::Error);
		assert_eq!(ctx.threshold(), Severity::Error);

		assert!(!ctx.warn("ignored"));
		assert!(ctx.error("kept"));
		assert_eq!(ctx.entries().len(), 1);
		assert_eq!(ctx.entries()[0].message, "kept");
		assert!(ctx.can_continue());
	}

	#[test]
	fn critical_halts_even_when_suppressed() {
		let mut ctx = Context::new(Severity::Silent);

		assert!(!ctx.critical("boom"));
		assert!(ctx.entries().is_empty());
		assert!(!ctx.can_continue());
	}

	#[test]
	fn critical_is_retained_and_halts() {
		let mut ctx = Context::new(Severity::Debug);

		assert!(ctx.critical("boom"));
		assert_eq!(ctx.count(Severity::Critical), 1);
		assert!(!ctx.can_continue());
	}

	#[test]
	fn entries_snapshot_the_stack() {
		let mut ctx = Context::new(Severity::Debug);
		ctx.push(Frame::position("lexer"));
		ctx.update_position(1, 4).unwrap();
		ctx.info("first");
		ctx.update_position(2, 1).unwrap();
		ctx.push(Frame::tag("NAME", 2, 3));
		ctx.info("second");
		ctx.pop().unwrap();

		assert_eq!(ctx.entries()[0].trace, vec![Frame::Position {
			origin: "lexer",
			line: 1,
			column: 4
		}]);
		assert_eq!(ctx.entries()[1].trace.len(), 2);
		assert_eq!(ctx.depth(), 1);
	}

	#[test]
	fn render_lists_frames_outermost_first() {
		let mut ctx = Context::new(Severity::Debug);
		ctx.push(Frame::Position {
			origin: "builder",
			line: 3,
			column: 1,
		});
		ctx.push(Frame::tag("MONTH", 3, 3));
		ctx.error("bad month");
		ctx.pop().unwrap();
		ctx.pop().unwrap();
		ctx.warn("plain");

		assert_eq!(
			ctx.render(),
			"in <builder (line: 3, column: 1)>\n\
			 in <tag MONTH (line: 3, column: 3)>\n\
			 \t<ERROR>: bad month\n\
			 \t<WARNING>: plain\n"
		);
	}

	#[test]
	fn report_records_code() {
		let mut ctx = Context::new(Severity::Debug);
		ctx.report(Severity::Error, &Odd { what: "dates" });

		let entry = &ctx.entries()[0];
		assert_eq!(entry.message, "something odd with dates");
		assert_eq!(entry.code.as_deref(), Some("gedline::test::odd"));
	}

	#[test]
	fn scoped_restores_depth() {
		let mut ctx = Context::new(Severity::Debug);
		ctx.push(Frame::position("parser"));

		let depth = ctx.scoped(Frame::tag("DATE", 1, 1), |ctx| ctx.depth());

		assert_eq!(depth, 2);
		assert_eq!(ctx.depth(), 1);
	}

	#[test]
	fn frame_is_the_innermost() {
		let mut ctx = Context::new(Severity::Debug);
		assert_eq!(ctx.frame(), None);

		ctx.push(Frame::position("builder"));
		ctx.scoped(Frame::tag("NOTE", 4, 3), |ctx| {
			assert_eq!(ctx.frame(), Some(&Frame::tag("NOTE", 4, 3)));
		});
		ctx.update_position(5, 1).unwrap();

		assert_eq!(ctx.frame(), Some(&Frame::Position {
			origin: "builder",
			line: 5,
			column: 1,
		}));
	}

	#[test]
	fn unwind_drops_inner_frames() {
		let mut ctx = Context::new(Severity::Debug);
		ctx.push(Frame::position("lexer"));
		ctx.push(Frame::position("parser"));
		ctx.push(Frame::tag("DATE", 1, 1));

		ctx.unwind(1);
		ctx.error("later message");

		assert_eq!(ctx.depth(), 1);
		assert_eq!(ctx.render(), "in <lexer (line: 0, column: 0)>\n\t<ERROR>: later message\n");
	}

	#[test]
	fn severities_are_ordered() {
		assert!(Severity::Debug < Severity::Info);
		assert!(Severity::Info < Severity::Warning);
		assert!(Severity::Warning < Severity::Error);
		assert!(Severity::Error < Severity::Critical);
		assert!(Severity::Critical < Severity::Silent);
	}

	#[test]
	#[cfg(debug_assertions)]
	#[should_panic(expected = "pop on an empty context stack")]
	fn pop_empty_panics_in_debug() {
		let mut ctx = Context::default();
		let _ = ctx.pop();
	}

	#[test]
	#[cfg(not(debug_assertions))]
	fn pop_empty_reports_fault() {
		let mut ctx = Context::default();
		assert_eq!(ctx.pop(), Err(ContextError::EmptyStack));
		ctx.push(Frame::position("lexer"));
		assert!(ctx.pop().is_ok());
	}
}
