use {
	crate::{
		diagnostics::{Context, Severity},
		ext::{TagDefinition, TagDiagnostic},
		lex::Token,
		tree::TagContent,
	},
	::core::fmt::{self, Display},
};

/// calendars with month tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Calendar {
	/// `MONTH`
	Gregorian,
	/// `MONTH_FREN`, the french republican calendar
	French,
	/// `MONTH_HEBR`
	Hebrew,
}

impl Calendar {
	/// month abbreviations, in calendar order
	#[must_use]
	pub fn months(self) -> &'static [&'static str] {
		match self {
			Self::Gregorian => &[
				"JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
			],
			Self::French => &[
				"VEND", "BRUM", "FRIM", "NIVO", "PLUV", "VENT", "GERM", "FLOR", "PRAI", "MESS", "THER",
				"FRUC", "COMP",
			],
			Self::Hebrew => &[
				"TSH", "CSH", "KSL", "TVT", "SHV", "ADR", "ADS", "NSN", "IYR", "SVN", "TMZ", "AAV", "ELL",
			],
		}
	}

	/// the tag key
	#[must_use]
	pub fn key(self) -> &'static str {
		match self {
			Self::Gregorian => "MONTH",
			Self::French => "MONTH_FREN",
			Self::Hebrew => "MONTH_HEBR",
		}
	}

	fn expected(self) -> &'static str {
		match self {
			Self::Gregorian => "a gregorian month (JAN..DEC)",
			Self::French => "a french republican month (VEND..COMP)",
			Self::Hebrew => "a hebrew month (TSH..ELL)",
		}
	}

	/// look up a month by abbreviation
	#[must_use]
	pub fn month(self, name: &str) -> Option<Month> {
		self.months()
			.iter()
			.zip(1..)
			.find(|(month, _)| **month == name)
			.map(|(name, number)| Month {
				calendar: self,
				number,
				name,
			})
	}
}

/// an interpreted month value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
	/// which calendar
	pub calendar: Calendar,
	/// 1-based position in the calendar year
	pub number: u8,
	/// the abbreviation
	pub name: &'static str,
}

impl Display for Month {
	fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt.write_str(self.name)
	}
}

fn interpret(
	calendar: Calendar,
	ctx: &mut Context,
	tag: &str,
	values: &[Token],
) -> Option<Box<dyn TagContent>> {
	let mut words = values.iter().filter(|token| !token.is_blank());

	let (Some(word), None) = (words.next(), words.next()) else {
		ctx.report(Severity::Error, &TagDiagnostic::ValueCount {
			tag: tag.to_string(),
			expected: 1,
			found: values.iter().filter(|token| !token.is_blank()).count(),
		});
		return None;
	};

	match calendar.month(&word.text) {
		Some(month) => Some(Box::new(month)),
		None => {
			ctx.report(Severity::Error, &TagDiagnostic::InvalidValue {
				tag: tag.to_string(),
				value: word.text.clone(),
				expected: calendar.expected(),
			});
			None
		}
	}
}

/// `MONTH` tag
///
/// # value
///
/// one of `JAN`..`DEC`
pub mod gregorian {
	use super::*;

	/// the tag
	#[must_use]
	pub fn tag() -> TagDefinition {
		TagDefinition {
			key: Calendar::Gregorian.key(),
			interpret: |ctx, tag, values| interpret(Calendar::Gregorian, ctx, tag, values),
		}
	}
}

/// `MONTH_FREN` tag
///
/// # value
///
/// one of `VEND`..`COMP`
pub mod french {
	use super::*;

	/// the tag
	#[must_use]
	pub fn tag() -> TagDefinition {
		TagDefinition {
			key: Calendar::French.key(),
			interpret: |ctx, tag, values| interpret(Calendar::French, ctx, tag, values),
		}
	}
}

/// `MONTH_HEBR` tag
///
/// # value
///
/// one of `TSH`..`ELL`
pub mod hebrew {
	use super::*;

	/// the tag
	#[must_use]
	pub fn tag() -> TagDefinition {
		TagDefinition {
			key: Calendar::Hebrew.key(),
			interpret: |ctx, tag, values| interpret(Calendar::Hebrew, ctx, tag, values),
		}
	}
}

/// all of this module's tags
#[must_use]
pub fn tags() -> impl IntoIterator<Item = TagDefinition> {
	[gregorian::tag(), french::tag(), hebrew::tag()]
}
