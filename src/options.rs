use crate::diagnostics::Severity;

/// where the line parser picks up again after a malformed line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(::clap::ValueEnum))]
pub enum Resync {
	/// drop the malformed line, the very next token starts a fresh line
	#[default]
	NextToken,
	/// drop tokens up to and including the next terminator
	NextTerminator,
}

/// knobs for a parse run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
	/// the minimum severity kept in the transcript
	pub threshold: Severity,
	/// line parser recovery
	pub resync: Resync,
	/// keep running later stages after a critical diagnostic
	///
	/// the output of a stage that ran on compromised input is not meaningful
	pub complete_all_stages: bool,
}

impl ParseOptions {
	/// set the retention threshold
	#[must_use]
	pub fn with_threshold(mut self, threshold: Severity) -> Self {
		self.threshold = threshold;
		self
	}

	/// set the recovery policy
	#[must_use]
	pub fn with_resync(mut self, resync: Resync) -> Self {
		self.resync = resync;
		self
	}

	/// set whether every stage runs regardless of critical diagnostics
	#[must_use]
	pub fn with_complete_all_stages(mut self, complete_all_stages: bool) -> Self {
		self.complete_all_stages = complete_all_stages;
		self
	}
}

impl Default for ParseOptions {
	fn default() -> Self {
		Self {
			threshold: Severity::Warning,
			resync: Resync::NextToken,
			complete_all_stages: false,
		}
	}
}
