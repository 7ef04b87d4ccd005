#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn release_tool() -> Command {
        let mut cmd = Command::cargo_bin("release_tool").unwrap();
        cmd.env_remove("GITHUB_TOKEN")
            .env_remove("GH_TOKEN")
            .env("RUST_LOG", "info");
        cmd
    }

    fn prep_args(version: &str) -> Vec<String> {
        [
            "prep",
            version,
            "--source-branch",
            "master",
            "--candidate-branch",
            "0.12.0-rc",
            "--release-branch",
            "release",
            "--git-repository-name",
            "UnrealGDK",
            "--github-organization",
            "spatialos",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_help_lists_subcommands() {
        release_tool()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("prep"))
            .stdout(predicate::str::contains("release"));
    }

    #[test]
    fn test_release_help_documents_pull_request_url() {
        release_tool()
            .args(["release", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--pull-request-url"));
    }

    #[test]
    fn test_missing_arguments_exit_one() {
        release_tool()
            .args(["prep", "0.12.0"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("--source-branch"));
    }

    #[test]
    fn test_invalid_version_exits_one() {
        let temp = tempfile::tempdir().unwrap();
        release_tool()
            .args(prep_args("0.12"))
            .arg("--metadata-file")
            .arg(temp.path().join("metadata.json"))
            .arg("--github-token")
            .arg("unused")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid version '0.12'"));
    }

    #[test]
    fn test_missing_token_exits_one() {
        let temp = tempfile::tempdir().unwrap();
        release_tool()
            .args(prep_args("0.12.0"))
            .arg("--metadata-file")
            .arg(temp.path().join("metadata.json"))
            .arg("--work-dir")
            .arg(temp.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("GitHub token not provided"));
    }

    #[test]
    fn test_token_flags_conflict() {
        release_tool()
            .args(prep_args("0.12.0"))
            .args(["--github-token", "a", "--github-token-file", "/tmp/token"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("cannot be used with"));
    }
}
