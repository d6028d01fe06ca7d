mod common;

use doctag_core::AnyEmptyResult;
use predicates::prelude::*;

#[test]
fn check_fails_when_files_would_change() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(tmp.path(), common::SINCE_POLICY)?;
	let source = common::write_source(tmp.path(), "Greeter.java", common::STALE_SOURCE)?;

	common::doctag_cmd()
		.arg("--check")
		.arg(tmp.path().join("src"))
		.arg(&policy)
		.assert()
		.code(1)
		.stdout(predicate::str::contains("Would update Greeter.java"))
		.stdout(predicate::str::contains("without `--check`"));

	assert_eq!(std::fs::read_to_string(&source)?, common::STALE_SOURCE);

	Ok(())
}

#[test]
fn check_passes_when_up_to_date() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(tmp.path(), common::SINCE_POLICY)?;
	common::write_source(tmp.path(), "Greeter.java", common::UPDATED_SOURCE)?;

	common::doctag_cmd()
		.arg("--check")
		.arg(tmp.path().join("src"))
		.arg(&policy)
		.assert()
		.success()
		.stdout(predicate::str::contains("0 changed"));

	Ok(())
}

#[test]
fn verbose_logs_block_decisions() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(tmp.path(), common::SINCE_POLICY)?;
	common::write_source(tmp.path(), "Greeter.java", common::STALE_SOURCE)?;

	common::doctag_cmd()
		.args(["--check", "--verbose"])
		.arg(tmp.path().join("src"))
		.arg(&policy)
		.assert()
		.code(1)
		.stderr(predicate::str::contains("adding tag"));

	Ok(())
}
