use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::DoctagError;
use crate::DoctagResult;
use crate::FileRewrite;
use crate::TagPolicy;
use crate::config::DEFAULT_EXTENSIONS;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::rewrite_source;

/// Options for controlling which files a batch run visits.
///
/// Use [`ScanOptions::default()`] for sensible defaults or
/// [`ScanOptions::from_policy`] to take them from a loaded [`TagPolicy`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Gitignore-style patterns to exclude from scanning.
	pub exclude_patterns: Vec<String>,
	/// File extensions (without the dot) to rewrite.
	pub extensions: Vec<String>,
	/// Maximum file size to rewrite in bytes.
	pub max_file_size: u64,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
}

impl Default for ScanOptions {
	fn default() -> Self {
		Self {
			exclude_patterns: Vec::new(),
			extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
		}
	}
}

impl ScanOptions {
	pub fn from_policy(policy: &TagPolicy) -> Self {
		Self {
			exclude_patterns: policy.exclude.clone(),
			extensions: policy.extensions.clone(),
			max_file_size: policy.max_file_size,
			disable_gitignore: policy.disable_gitignore,
		}
	}

	fn accepts(&self, path: &Path) -> bool {
		path.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| {
				self.extensions
					.iter()
					.any(|allowed| allowed.eq_ignore_ascii_case(ext))
			})
	}
}

/// Whether a batch run writes its results back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
	Write,
	DryRun,
}

/// A file whose content was (or would be) rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
	pub path: PathBuf,
	#[serde(skip)]
	pub original: String,
	#[serde(skip)]
	pub updated: String,
	pub substitutions: usize,
	pub blocks_changed: usize,
	pub line_count: usize,
}

/// A file that could not be visited, read, rewritten or written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
	pub path: PathBuf,
	pub error: String,
}

impl FileFailure {
	fn new(path: impl Into<PathBuf>, error: &DoctagError) -> Self {
		Self {
			path: path.into(),
			error: error.to_string(),
		}
	}
}

/// The files found under a target plus the paths that could not be walked.
#[derive(Debug, Clone, Default)]
pub struct FileCollection {
	pub files: Vec<PathBuf>,
	pub failures: Vec<FileFailure>,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
	pub files_scanned: usize,
	pub changes: Vec<FileChange>,
	pub failures: Vec<FileFailure>,
	/// Total tag mutations across all files.
	pub substitutions: usize,
}

impl BatchReport {
	pub fn has_failures(&self) -> bool {
		!self.failures.is_empty()
	}

	pub fn has_changes(&self) -> bool {
		!self.changes.is_empty()
	}
}

/// Rewrite every matching file under `target`.
///
/// Failures of individual files are recorded in the report and the run moves
/// on to the next file. Only an invalid exclude pattern or a missing target
/// aborts the run.
pub fn run_batch(target: &Path, policy: &TagPolicy, mode: BatchMode) -> DoctagResult<BatchReport> {
	let options = ScanOptions::from_policy(policy);
	let collection = collect_files(target, &options)?;

	let mut report = BatchReport {
		failures: collection.failures,
		..BatchReport::default()
	};

	for path in collection.files {
		report.files_scanned += 1;

		let (original, rewrite) = match process_file(&path, policy, options.max_file_size) {
			Ok(result) => result,
			Err(error) => {
				warn!(path = %path.display(), %error, "failed to rewrite file");
				report.failures.push(FileFailure::new(&path, &error));
				continue;
			}
		};

		if !rewrite.changed() {
			debug!(path = %path.display(), "unchanged");
			continue;
		}

		if mode == BatchMode::Write {
			if let Err(error) = std::fs::write(&path, &rewrite.content) {
				let error = DoctagError::from(error);
				warn!(path = %path.display(), %error, "failed to write file");
				report.failures.push(FileFailure::new(&path, &error));
				continue;
			}
		}

		debug!(
			path = %path.display(),
			substitutions = rewrite.substitutions,
			"rewrote file"
		);
		report.substitutions += rewrite.substitutions;
		report.changes.push(FileChange {
			path,
			original,
			updated: rewrite.content,
			substitutions: rewrite.substitutions,
			blocks_changed: rewrite.blocks_changed,
			line_count: rewrite.line_count,
		});
	}

	info!(
		files_scanned = report.files_scanned,
		files_changed = report.changes.len(),
		files_failed = report.failures.len(),
		substitutions = report.substitutions,
		dry_run = mode == BatchMode::DryRun,
		"batch complete"
	);

	Ok(report)
}

/// Read and rewrite a single file without writing it back. Returns the
/// original content alongside the rewrite.
pub fn process_file(
	path: &Path,
	policy: &TagPolicy,
	max_file_size: u64,
) -> DoctagResult<(String, FileRewrite)> {
	let size = std::fs::metadata(path)?.len();
	if size > max_file_size {
		return Err(DoctagError::FileTooLarge {
			path: path.display().to_string(),
			size,
			limit: max_file_size,
		});
	}

	let original = std::fs::read_to_string(path)?;
	let rewrite = rewrite_source(&original, Some(path), policy)?;

	Ok((original, rewrite))
}

/// Collect the files a batch run rewrites.
///
/// A file target is returned as-is. Directories are walked recursively.
/// Files matched by the root `.gitignore` (unless disabled) or by the
/// exclude patterns are skipped, as are hidden directories and common build
/// output directories.
pub fn collect_files(root: &Path, options: &ScanOptions) -> DoctagResult<FileCollection> {
	if !root.exists() {
		return Err(DoctagError::MissingTarget {
			path: root.display().to_string(),
		});
	}

	let mut collection = FileCollection::default();
	if root.is_file() {
		collection.files.push(root.to_path_buf());
		return Ok(collection);
	}

	let gitignore = if options.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let custom_exclude = build_exclude_matcher(root, &options.exclude_patterns)?;
	let mut walker = Walker {
		options,
		gitignore: &gitignore,
		custom_exclude: &custom_exclude,
		visited_dirs: HashSet::new(),
		collection: &mut collection,
	};
	walker.walk_dir(root);

	collection.files.sort();
	Ok(collection)
}

/// Build a `Gitignore` matcher from the policy's `exclude` patterns.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> DoctagResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			DoctagError::InvalidExcludePattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}

	builder.build().map_err(|e| {
		DoctagError::InvalidExcludePattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		if let Some(error) = builder.add(&gitignore_path) {
			warn!(path = %gitignore_path.display(), %error, "ignoring unreadable .gitignore");
		}
	}

	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || matches!(name, "node_modules" | "target" | "build")
}

struct Walker<'a> {
	options: &'a ScanOptions,
	gitignore: &'a Gitignore,
	custom_exclude: &'a Gitignore,
	visited_dirs: HashSet<PathBuf>,
	collection: &'a mut FileCollection,
}

impl Walker<'_> {
	fn fail(&mut self, path: &Path, error: &DoctagError) {
		warn!(path = %path.display(), %error, "skipping path");
		self.collection.failures.push(FileFailure::new(path, error));
	}

	fn walk_dir(&mut self, dir: &Path) {
		// Detect symlink cycles by tracking canonical paths.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !self.visited_dirs.insert(canonical) {
			let error = DoctagError::SymlinkCycle {
				path: dir.display().to_string(),
			};
			self.fail(dir, &error);
			return;
		}

		let entries = match std::fs::read_dir(dir) {
			Ok(entries) => entries,
			Err(error) => {
				self.fail(dir, &error.into());
				return;
			}
		};

		for entry in entries {
			let path = match entry {
				Ok(entry) => entry.path(),
				Err(error) => {
					self.fail(dir, &error.into());
					continue;
				}
			};

			let is_dir = path.is_dir();
			if is_dir
				&& path
					.file_name()
					.and_then(|name| name.to_str())
					.is_some_and(is_ignored_directory_name)
			{
				continue;
			}

			if self.gitignore.matched(&path, is_dir).is_ignore()
				|| self.custom_exclude.matched(&path, is_dir).is_ignore()
			{
				debug!(path = %path.display(), "excluded");
				continue;
			}

			if is_dir {
				self.walk_dir(&path);
			} else if self.options.accepts(&path) {
				self.collection.files.push(path);
			}
		}
	}
}
