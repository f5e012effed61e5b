use crate::lex::TokenKind;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// what a candidate thinks of the byte it was just shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
	/// cannot match
	Not,
	/// matches so far, not a complete token yet
	Cont,
	/// complete, including this byte
	Done,
	/// complete, and finalized once a byte fails to extend it
	DoneWhenNot,
	/// complete, and finalized once a delimiter arrives
	DoneWhenDelim,
}

impl Verdict {
	/// whether the candidate is still live afterwards
	#[must_use]
	pub fn is_live(self) -> bool {
		matches!(self, Self::Cont | Self::DoneWhenNot | Self::DoneWhenDelim)
	}

	/// whether the text seen so far already forms a token
	#[must_use]
	pub fn is_complete(self) -> bool {
		matches!(self, Self::DoneWhenNot | Self::DoneWhenDelim)
	}
}

/// `0-9`
#[must_use]
pub fn is_digit(byte: u8) -> bool {
	byte.is_ascii_digit()
}

/// letters and `_`
#[must_use]
pub fn is_alpha(byte: u8) -> bool {
	byte.is_ascii_alphabetic() || byte == b'_'
}

#[must_use]
#[allow(missing_docs, reason = "self-explanatory")]
pub fn is_alnum(byte: u8) -> bool {
	is_alpha(byte) || is_digit(byte)
}

/// printable ascii and the upper 8-bit range, except `@`
#[must_use]
pub fn is_nonat(byte: u8) -> bool {
	matches!(byte, 0x20..=0x7e | 0x80..=0xfe) && byte != b'@'
}

/// bytes that finalize a [`Verdict::DoneWhenDelim`] candidate, `None` being end of input
#[must_use]
pub fn is_delimiter(byte: Option<u8>) -> bool {
	matches!(byte, None | Some(b' ' | CR | LF))
}

/// length of the run of `@` at the end of `text`
fn trailing_ats(text: &[u8]) -> usize {
	text.iter().rev().take_while(|byte| **byte == b'@').count()
}

/// judge an `@` inside a run where doubled `@` stand for one literal
///
/// returns `None` while the run is still going, otherwise whether the run had odd length
fn at_run_parity(before: &[u8], next: Option<u8>) -> Option<bool> {
	if next == Some(b'@') {
		None
	} else {
		Some((trailing_ats(before) + 1) % 2 == 1)
	}
}

/// evaluate `kind` against `byte`, given the bytes already pending for the current token and the
/// byte after it
#[must_use]
pub fn judge(kind: TokenKind, pending: &[u8], byte: Option<u8>, next: Option<u8>) -> Verdict {
	let Some(byte) = byte else {
		return if kind == TokenKind::Eof && pending.is_empty() {
			Verdict::Done
		} else {
			Verdict::Not
		};
	};

	match kind {
		TokenKind::Number if is_digit(byte) => Verdict::DoneWhenNot,
		TokenKind::SeqAlnum if is_alnum(byte) => Verdict::DoneWhenNot,

		TokenKind::Pointer => match (pending.len(), byte) {
			(0, b'@') => Verdict::Cont,
			(1, byte) if is_alnum(byte) => Verdict::Cont,
			(2.., b'@') => Verdict::Done,
			(2.., byte) if is_nonat(byte) => Verdict::Cont,
			_ => Verdict::Not,
		},

		TokenKind::Escape => match (pending.len(), byte) {
			(0, b'@') | (1, b'#') => Verdict::Cont,
			(2.., b'@') => match at_run_parity(&pending[2..], next) {
				None | Some(false) => Verdict::Cont,
				// a lone closing `@` right after `@#` would leave an empty body
				Some(true) if pending.len() == 2 => Verdict::Not,
				Some(true) => Verdict::Done,
			},
			(2.., byte) if is_nonat(byte) => Verdict::Cont,
			_ => Verdict::Not,
		},

		TokenKind::SeqAnychar => match byte {
			b'@' => match at_run_parity(pending, next) {
				None => Verdict::Cont,
				Some(false) => Verdict::DoneWhenDelim,
				Some(true) => Verdict::Not,
			},
			byte if is_nonat(byte) => Verdict::DoneWhenDelim,
			_ => Verdict::Not,
		},

		TokenKind::Terminator => match (pending, byte) {
			([], CR) if next == Some(LF) => Verdict::Cont,
			([], LF) if next == Some(CR) => Verdict::Cont,
			([], CR | LF) | ([CR], LF) | ([LF], CR) => Verdict::Done,
			_ => Verdict::Not,
		},

		TokenKind::Delim if pending.is_empty() && byte == b' ' => Verdict::Done,
		TokenKind::Whitespace if pending.is_empty() && matches!(byte, b' ' | b'\t') => {
			Verdict::Done
		}

		_ => Verdict::Not,
	}
}

/// the token types that have not been ruled out for the pending text, with their status
#[derive(Debug, Clone)]
pub struct CandidateSet {
	status: [Verdict; TokenKind::CANDIDATES.len()],
}

impl CandidateSet {
	/// every candidate live
	#[must_use]
	pub fn fresh() -> Self {
		Self {
			status: [Verdict::Cont; TokenKind::CANDIDATES.len()],
		}
	}

	/// live candidates with their status, in scan order
	pub fn live(&self) -> impl Iterator<Item = (TokenKind, Verdict)> + '_ {
		TokenKind::CANDIDATES
			.iter()
			.zip(self.status.iter())
			.filter(|(_, status)| status.is_live())
			.map(|(kind, status)| (*kind, *status))
	}

	/// the first live candidate that already forms a complete token
	#[must_use]
	pub fn first_complete(&self) -> Option<TokenKind> {
		self.live()
			.find(|(_, status)| status.is_complete())
			.map(|(kind, _)| kind)
	}

	/// whether any live candidate waits for a delimiter
	#[must_use]
	pub fn awaits_delimiter(&self) -> bool {
		self.live()
			.any(|(_, status)| status == Verdict::DoneWhenDelim)
	}

	/// judge every live candidate, without changing the set
	#[must_use]
	pub fn judge_all(
		&self,
		pending: &[u8],
		byte: Option<u8>,
		next: Option<u8>,
	) -> [Verdict; TokenKind::CANDIDATES.len()] {
		let mut verdicts = [Verdict::Not; TokenKind::CANDIDATES.len()];

		for (i, kind) in TokenKind::CANDIDATES.iter().enumerate() {
			if self.status[i].is_live() {
				verdicts[i] = judge(*kind, pending, byte, next);
			}
		}

		verdicts
	}

	/// replace the statuses with a round of verdicts, ruling out the candidates that failed
	pub fn apply(&mut self, verdicts: [Verdict; TokenKind::CANDIDATES.len()]) {
		self.status = verdicts;
	}
}
