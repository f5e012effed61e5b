use {
	::clap::{Parser, Subcommand},
	::gedline::{
		diagnostics::Severity,
		ext,
		options::{ParseOptions, Resync},
		Gedcom,
	},
	::miette::IntoDiagnostic,
	::serde_json::json,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Command,
	/// the least severe diagnostics to keep
	#[arg(long, global = true, value_enum, default_value_t = Severity::Warning)]
	threshold: Severity,
	/// where to pick up after a malformed line
	#[arg(long, global = true, value_enum, default_value_t = Resync::NextToken)]
	resync: Resync,
	/// emit machine-readable JSON information to stderr
	///
	/// refer to the json output section of the readme for details
	#[arg(long, global = true)]
	json: bool,
	/// do not emit status updates
	#[arg(long, global = true)]
	no_status: bool,
	/// always complete all stages
	///
	/// not recommended, as the state after a critical diagnostic is not defined
	#[arg(long, global = true)]
	idc: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// check the provided stdin and print any diagnostics
	Check,
	/// print the record tree of the provided stdin to stdout
	Tree,
}

fn status_update(stage: &'static str, status: &'static str, json: bool) {
	if json {
		eprintln!(
			"{}",
			json!({
				"kind": "status-update",
				"stage": stage,
				"status": status,
			})
		);
	} else {
		eprintln!("[{stage}] {status}");
	}
}

fn main() -> ::miette::Result<()> {
	#[cfg(feature = "cli-trace")]
	{
		::tracing_subscriber::fmt()
			.with_env_filter(::tracing_subscriber::EnvFilter::from_default_env())
			.with_writer(::std::io::stderr)
			.init();
	}

	let args = Cli::parse();

	let mut gedcom = Gedcom::new().with_options(
		ParseOptions::default()
			.with_threshold(args.threshold)
			.with_resync(args.resync)
			.with_complete_all_stages(args.idc),
	);
	gedcom.add_tags(ext::all_tags());

	if !args.no_status {
		status_update("parse", "working", args.json);
	}

	let document = gedcom
		.parse_reader(::std::io::stdin().lock())
		.into_diagnostic()?;

	if !args.no_status {
		status_update(
			"parse",
			if document.ok { "success" } else { "failure" },
			args.json,
		);
	}

	if let Command::Tree = args.command {
		if document.ok || args.idc {
			print!("{}", document.forest.render_tree());

			if !args.no_status {
				status_update("tree", "written", args.json);
			}
		}
	}

	if args.json {
		eprintln!(
			"{}",
			json!({
				"kind": "diagnostics",
				"diagnostics": document.context.entries().iter().map(|entry| json!({
					"severity": entry.severity.label().to_lowercase(),
					"message": entry.message,
					"code": entry.code,
					"trace": entry.trace.iter().map(ToString::to_string).collect::<Vec<_>>(),
				})).collect::<Vec<_>>(),
			})
		);
	} else {
		eprint!("{}", document.context.render());
	}

	if !document.ok {
		::std::process::exit(1);
	}

	Ok(())
}
