mod common;

use doctag_core::AnyEmptyResult;
use predicates::prelude::*;

#[test]
fn run_rewrites_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(tmp.path(), common::SINCE_POLICY)?;
	let source = common::write_source(tmp.path(), "Greeter.java", common::STALE_SOURCE)?;

	common::doctag_cmd()
		.arg(tmp.path().join("src"))
		.arg(&policy)
		.assert()
		.success()
		.stdout(predicate::str::contains("Updated Greeter.java (1 substitution)"))
		.stdout(predicate::str::contains(
			"1 file(s) scanned, 1 changed, 0 failed, 1 substitution(s)",
		));

	assert_eq!(std::fs::read_to_string(&source)?, common::UPDATED_SOURCE);

	Ok(())
}

#[test]
fn run_is_idempotent() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(tmp.path(), common::SINCE_POLICY)?;
	let source = common::write_source(tmp.path(), "Greeter.java", common::UPDATED_SOURCE)?;

	common::doctag_cmd()
		.arg(tmp.path().join("src"))
		.arg(&policy)
		.assert()
		.success()
		.stdout(predicate::str::contains("0 changed"));

	assert_eq!(std::fs::read_to_string(&source)?, common::UPDATED_SOURCE);

	Ok(())
}

#[test]
fn single_file_target() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(tmp.path(), common::SINCE_POLICY)?;
	let source = common::write_source(tmp.path(), "Greeter.java", common::STALE_SOURCE)?;

	common::doctag_cmd()
		.arg(&source)
		.arg(&policy)
		.assert()
		.success()
		.stdout(predicate::str::contains("Updated Greeter.java"));

	assert_eq!(std::fs::read_to_string(&source)?, common::UPDATED_SOURCE);

	Ok(())
}

#[test]
fn dry_run_does_not_write() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(tmp.path(), common::SINCE_POLICY)?;
	let source = common::write_source(tmp.path(), "Greeter.java", common::STALE_SOURCE)?;

	common::doctag_cmd()
		.arg("--dry-run")
		.arg("--diff")
		.arg(tmp.path().join("src"))
		.arg(&policy)
		.assert()
		.success()
		.stdout(predicate::str::contains("Would update Greeter.java"))
		.stdout(predicate::str::contains("-/** A greeter. */"))
		.stdout(predicate::str::contains("+ * @since 1.0.0"));

	assert_eq!(std::fs::read_to_string(&source)?, common::STALE_SOURCE);

	Ok(())
}

#[test]
fn json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(tmp.path(), common::SINCE_POLICY)?;
	common::write_source(tmp.path(), "Greeter.java", common::STALE_SOURCE)?;

	let output = common::doctag_cmd()
		.args(["--dry-run", "--format", "json"])
		.arg(tmp.path().join("src"))
		.arg(&policy)
		.output()?;
	assert!(output.status.success());

	let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(report["dry_run"], true);
	assert_eq!(report["files_scanned"], 1);
	assert_eq!(report["substitutions"], 1);
	assert_eq!(report["changes"][0]["substitutions"], 1);
	assert_eq!(report["failures"].as_array().map(Vec::len), Some(0));

	Ok(())
}

#[test]
fn invalid_policy_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(
		tmp.path(),
		"tag-rules:\n  - tag: since\n    insertPosition: middle\n",
	)?;
	let source = common::write_source(tmp.path(), "Greeter.java", common::STALE_SOURCE)?;

	common::doctag_cmd()
		.arg(tmp.path().join("src"))
		.arg(&policy)
		.assert()
		.code(2)
		.stderr(predicate::str::contains("unknown insert position `middle`"));

	assert_eq!(std::fs::read_to_string(&source)?, common::STALE_SOURCE);

	Ok(())
}

#[test]
fn missing_policy_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_source(tmp.path(), "Greeter.java", common::STALE_SOURCE)?;

	common::doctag_cmd()
		.arg(tmp.path().join("src"))
		.arg(tmp.path().join("missing.yml"))
		.assert()
		.code(2);

	Ok(())
}

#[test]
fn missing_target_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(tmp.path(), common::SINCE_POLICY)?;

	common::doctag_cmd()
		.arg(tmp.path().join("nowhere"))
		.arg(&policy)
		.assert()
		.code(2)
		.stderr(predicate::str::contains("target path does not exist"));

	Ok(())
}

#[test]
fn file_failures_exit_with_one() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let policy = common::write_policy(
		tmp.path(),
		&format!("{}max-file-size: 64\n", common::SINCE_POLICY),
	)?;
	let large = format!("{}{}", common::STALE_SOURCE, "// padding\n".repeat(10));
	let large_path = common::write_source(tmp.path(), "Large.java", &large)?;
	let small_path = common::write_source(tmp.path(), "Small.java", common::STALE_SOURCE)?;

	common::doctag_cmd()
		.arg(tmp.path().join("src"))
		.arg(&policy)
		.assert()
		.code(1)
		.stderr(predicate::str::contains("file too large"))
		.stdout(predicate::str::contains("1 changed, 1 failed"));

	assert_eq!(std::fs::read_to_string(&large_path)?, large);
	assert_eq!(std::fs::read_to_string(&small_path)?, common::UPDATED_SOURCE);

	Ok(())
}
