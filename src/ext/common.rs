/// the interpreter for tags nothing is registered for
///
/// accepts any value, produces nothing, never fails
pub mod invalid {
	use crate::{diagnostics::Context, lex::Token, tree::TagContent};

	/// the interpreter
	pub fn interpret(ctx: &mut Context, tag: &str, values: &[Token]) -> Option<Box<dyn TagContent>> {
		ctx.debug(format_args!(
			"no interpreter for tag {tag}, {} value tokens left uninterpreted",
			values.len()
		));
		None
	}
}
