use std::path::Path;
use std::process;

use clap::Parser;
use doctag_cli::DoctagCli;
use doctag_cli::OutputFormat;
use doctag_core::BatchMode;
use doctag_core::BatchReport;
use doctag_core::TagPolicy;
use doctag_core::run_batch;
use owo_colors::OwoColorize;
use serde::Serialize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,cyan) => {
		if color_enabled() {
			format!("{}", $text.cyan())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = DoctagCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	match run(&args) {
		Ok(code) => process::exit(code),
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<doctag_core::DoctagError>() {
				Ok(doctag_err) => {
					let report: miette::Report = (*doctag_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Log to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init()
		.ok();
}

/// Returns the process exit code.
fn run(args: &DoctagCli) -> Result<i32, Box<dyn std::error::Error>> {
	let policy = TagPolicy::load(&args.definition)?;
	let mode = if args.is_dry_run() {
		BatchMode::DryRun
	} else {
		BatchMode::Write
	};

	let report = run_batch(&args.target, &policy, mode)?;

	match args.format {
		OutputFormat::Text => print_text_report(args, &report),
		OutputFormat::Json => print_json_report(args, &report)?,
	}

	let code = if report.has_failures() || (args.check && report.has_changes()) {
		1
	} else {
		0
	};

	Ok(code)
}

fn print_text_report(args: &DoctagCli, report: &BatchReport) {
	let root = display_root(&args.target);
	let verb = if args.is_dry_run() {
		"Would update"
	} else {
		"Updated"
	};

	for change in &report.changes {
		let noun = if change.substitutions == 1 {
			"substitution"
		} else {
			"substitutions"
		};
		println!(
			"{verb} {} ({} {noun})",
			colored!(make_relative(&change.path, root), cyan),
			change.substitutions
		);

		if args.diff {
			print_diff(&change.original, &change.updated);
		}
	}

	for failure in &report.failures {
		eprintln!(
			"{} {}: {}",
			colored!("error:", red),
			make_relative(&failure.path, root),
			failure.error
		);
	}

	let summary = format!(
		"{} file(s) scanned, {} changed, {} failed, {} substitution(s)",
		report.files_scanned,
		report.changes.len(),
		report.failures.len(),
		report.substitutions
	);
	if report.has_failures() {
		println!("{}", colored!(summary, red));
	} else if args.check && report.has_changes() {
		println!("{}", colored!(summary, bold));
		println!("Run `doctag` without `--check` to apply the changes.");
	} else {
		println!("{}", colored!(summary, green));
	}
}

#[derive(Serialize)]
struct JsonReport<'a> {
	dry_run: bool,
	#[serde(flatten)]
	report: &'a BatchReport,
}

fn print_json_report(
	args: &DoctagCli,
	report: &BatchReport,
) -> Result<(), Box<dyn std::error::Error>> {
	let output = JsonReport {
		dry_run: args.is_dry_run(),
		report,
	};
	println!("{}", serde_json::to_string_pretty(&output)?);

	Ok(())
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for group in diff.grouped_ops(3) {
		let (Some(first), Some(last)) = (group.first(), group.last()) else {
			continue;
		};
		let old = first.old_range().start..last.old_range().end;
		let new = first.new_range().start..last.new_range().end;
		println!(
			"{}",
			colored!(
				format!(
					"@@ -{},{} +{},{} @@",
					old.start + 1,
					old.len(),
					new.start + 1,
					new.len()
				),
				cyan
			)
		);

		for op in &group {
			for change in diff.iter_changes(op) {
				match change.tag() {
					ChangeTag::Delete => print!("{}", colored!(format!("-{change}"), red)),
					ChangeTag::Insert => print!("{}", colored!(format!("+{change}"), green)),
					ChangeTag::Equal => print!(" {change}"),
				}
				if change.missing_newline() {
					println!();
				}
			}
		}
	}
}

/// The directory paths are shown relative to.
fn display_root(target: &Path) -> &Path {
	if target.is_dir() {
		target
	} else {
		target.parent().unwrap_or(target)
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
