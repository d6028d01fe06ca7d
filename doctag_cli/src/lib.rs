use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Keep javadoc tags consistent across your codebase with a declarative tag policy.",
	long_about = "doctag rewrites the javadoc comments of java source files so that every \
	              documented element carries the tags configured in a YAML policy document. \
	              Missing tags are added, misplaced tags are moved or removed, and existing \
	              tags are overwritten according to each rule's overwrite policy.\n\nEvery \
	              other byte of a file is left untouched, and running doctag twice with the \
	              same policy changes nothing the second time.\n\nQuick start:\n  doctag \
	              --dry-run --diff src doctag.yml   Preview the changes\n  doctag src \
	              doctag.yml                       Rewrite the files\n  doctag --check src \
	              doctag.yml               Fail in CI when files are out of date"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct DoctagCli {
	/// File or directory to rewrite. Directories are walked recursively.
	pub target: PathBuf,

	/// Path to the YAML tag policy document.
	pub definition: PathBuf,

	/// Compute and report changes without writing any file.
	#[arg(long, default_value_t = false)]
	pub dry_run: bool,

	/// Like `--dry-run`, but exit with status 1 when any file would change.
	/// Intended for CI pipelines.
	#[arg(long, default_value_t = false)]
	pub check: bool,

	/// Show a unified diff for each changed file.
	#[arg(long, default_value_t = false)]
	pub diff: bool,

	/// Output format for the run report.
	#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Enable verbose output. Logs every block and rule decision.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

impl DoctagCli {
	/// Whether files are left untouched.
	pub fn is_dry_run(&self) -> bool {
		self.dry_run || self.check
	}
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Lists every changed file
	/// with its substitution count and every file that failed.
	Json,
}
