//! CHANGELOG.md release headings and release notes.

use crate::error::{Result, TransformError};
use chrono::NaiveDate;
use log::info;
use std::path::{Path, PathBuf};

/// Changelog location relative to the repository root
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

const SECTION_PREFIX: &str = "## ";

/// `` ## [`1.2.3`] - 2024-01-01 ``
pub fn release_heading(version: &str, date: NaiveDate) -> String {
    format!("{}[`{}`] - {}", SECTION_PREFIX, version, date.format("%Y-%m-%d"))
}

fn has_release_heading(contents: &str, version: &str) -> bool {
    let prefix = format!("{}[`{}`] - ", SECTION_PREFIX, version);
    contents.lines().any(|line| line.starts_with(&prefix))
}

/// Insert the release heading directly below the first `##` heading (the
/// standing "Unreleased" section). Returns `None` when a heading for
/// `version` is already present.
pub fn insert_release_heading(
    contents: &str,
    version: &str,
    date: NaiveDate,
) -> Result<Option<String>> {
    if has_release_heading(contents, version) {
        return Ok(None);
    }

    let mut lines: Vec<&str> = contents.lines().collect();
    let unreleased = lines
        .iter()
        .position(|line| line.starts_with(SECTION_PREFIX))
        .ok_or_else(|| TransformError::InvalidContent {
            path: PathBuf::from(CHANGELOG_FILE),
            reason: "no `## ` section heading to insert the release under".to_string(),
        })?;

    let heading = release_heading(version, date);
    lines.splice(unreleased + 1..unreleased + 1, ["", heading.as_str()]);

    let line_ending = if contents.contains("\r\n") { "\r\n" } else { "\n" };
    let mut updated = lines.join(line_ending);
    if contents.ends_with('\n') {
        updated.push_str(line_ending);
    }
    Ok(Some(updated))
}

/// Body of the second `##` section, i.e. the most recent release. The first
/// section is always "Unreleased".
pub fn release_notes(contents: &str) -> String {
    let mut notes = String::new();
    let mut section = 0;

    for line in contents.lines() {
        if line.starts_with(SECTION_PREFIX) {
            section += 1;
            if section == 3 {
                break;
            }
            continue;
        }
        if section == 2 {
            notes.push_str(line);
            notes.push('\n');
        }
    }

    notes
}

/// Add the release heading to the changelog under `root`. Returns the file
/// to stage, or `None` if there is no changelog or it already has the heading.
pub fn update_changelog(root: &Path, version: &str, date: NaiveDate) -> Result<Option<PathBuf>> {
    let path = root.join(CHANGELOG_FILE);
    if !path.exists() {
        info!("No {} in {}, skipping", CHANGELOG_FILE, root.display());
        return Ok(None);
    }

    info!("Updating {}...", CHANGELOG_FILE);
    let contents = std::fs::read_to_string(&path)?;
    match insert_release_heading(&contents, version, date)? {
        Some(updated) => {
            std::fs::write(&path, updated)?;
            Ok(Some(path))
        }
        None => {
            info!("Changelog already has release version {}. Skipping..", version);
            Ok(None)
        }
    }
}

/// Release notes from the changelog under `root`
pub fn read_release_notes(root: &Path) -> Result<String> {
    let path = root.join(CHANGELOG_FILE);
    if !path.exists() {
        return Err(TransformError::MissingFile {
            path: PathBuf::from(CHANGELOG_FILE),
        }
        .into());
    }

    info!("Reading {}...", CHANGELOG_FILE);
    Ok(release_notes(&std::fs::read_to_string(&path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG: &str = "# Changelog\n\n## Unreleased\n\n## [`1.2.2`] - 2023-11-02\n\n### Fixes\n- Fixed a crash.\n";

    fn new_year() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn heading_goes_directly_below_unreleased() {
        let updated = insert_release_heading(CHANGELOG, "1.2.3", new_year())
            .unwrap()
            .unwrap();

        let lines: Vec<&str> = updated.lines().collect();
        let unreleased = lines.iter().position(|l| *l == "## Unreleased").unwrap();
        assert_eq!(lines[unreleased + 1], "");
        assert_eq!(lines[unreleased + 2], "## [`1.2.3`] - 2024-01-01");
        assert!(updated.contains("## [`1.2.2`] - 2023-11-02"));
    }

    #[test]
    fn second_insertion_is_a_no_op() {
        let once = insert_release_heading(CHANGELOG, "1.2.3", new_year())
            .unwrap()
            .unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(insert_release_heading(&once, "1.2.3", later).unwrap().is_none());
    }

    #[test]
    fn crlf_line_endings_survive_insertion() {
        let crlf = CHANGELOG.replace('\n', "\r\n");
        let updated = insert_release_heading(&crlf, "1.2.3", new_year())
            .unwrap()
            .unwrap();

        assert_eq!(updated.matches("\r\n").count(), updated.matches('\n').count());
        assert!(updated.contains("## Unreleased\r\n\r\n## [`1.2.3`] - 2024-01-01\r\n"));
        assert!(updated.ends_with("- Fixed a crash.\r\n"));
    }

    #[test]
    fn changelog_without_sections_is_rejected() {
        assert!(insert_release_heading("# Changelog\n", "1.2.3", new_year()).is_err());
    }

    #[test]
    fn release_notes_are_the_second_section() {
        let updated = insert_release_heading(CHANGELOG, "1.2.3", new_year())
            .unwrap()
            .unwrap();
        // The new release section is empty until someone moves notes into it
        assert_eq!(release_notes(&updated), "\n");
        assert_eq!(
            release_notes(CHANGELOG),
            "\n### Fixes\n- Fixed a crash.\n"
        );
    }

    #[test]
    fn update_changelog_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CHANGELOG_FILE), CHANGELOG).unwrap();

        let first = update_changelog(dir.path(), "1.2.3", new_year()).unwrap();
        assert_eq!(first, Some(dir.path().join(CHANGELOG_FILE)));
        assert!(update_changelog(dir.path(), "1.2.3", new_year()).unwrap().is_none());
    }

    #[test]
    fn missing_changelog_is_skipped_for_edits_but_required_for_notes() {
        let dir = tempfile::tempdir().unwrap();
        assert!(update_changelog(dir.path(), "1.2.3", new_year()).unwrap().is_none());
        assert!(read_release_notes(dir.path()).is_err());
    }
}
