#![allow(dead_code)]

use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const SINCE_POLICY: &str = "tag-rules:\n  - tag: since\n    value: \"1.0.0\"\n    insertPosition: end\n";

pub const STALE_SOURCE: &str = "/** A greeter. */\npublic class Greeter {}\n";

pub const UPDATED_SOURCE: &str = "/** A greeter.\n * @since 1.0.0\n */\npublic class Greeter {}\n";

pub fn doctag_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("doctag"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

/// Write a policy document next to (not inside) the source tree.
pub fn write_policy(root: &Path, content: &str) -> std::io::Result<PathBuf> {
	let path = root.join("doctag.yml");
	std::fs::write(&path, content)?;
	Ok(path)
}

pub fn write_source(root: &Path, relative: &str, content: &str) -> std::io::Result<PathBuf> {
	let path = root.join("src").join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(&path, content)?;
	Ok(path)
}
