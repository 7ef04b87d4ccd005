//! Plain-text version files, overwritten wholesale.

use crate::error::{Result, TransformError};
use log::info;
use std::path::{Path, PathBuf};

/// GDK version pin carried by dependent repositories
pub const GDK_VERSION_FILE: &str = "UnrealGDKVersion.txt";

/// Example project version pin carried by the engine fork
pub const EXAMPLE_PROJECT_VERSION_FILE: &str = "UnrealGDKExampleProjectVersion.txt";

/// Engine branches the GDK builds against, one ref per line
pub const ENGINE_VERSION_FILE: &str = "ci/unreal-engine.version";

/// Replace the contents of an existing version file with `contents`.
/// The file must already exist.
pub fn write_version_file(root: &Path, relative: &str, contents: &str) -> Result<PathBuf> {
    let path = root.join(relative);
    info!(
        "Updating contents of version file '{}' to '{}'...",
        relative, contents
    );

    if !path.is_file() {
        return Err(TransformError::MissingFile {
            path: PathBuf::from(relative),
        }
        .into());
    }

    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Write the engine version file, one entry per line
pub fn write_engine_version_file(root: &Path, entries: &[String]) -> Result<PathBuf> {
    let path = root.join(ENGINE_VERSION_FILE);
    info!("Updating {} with {} entries", ENGINE_VERSION_FILE, entries.len());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut contents = entries.join("\n");
    contents.push('\n');
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Engine candidate refs written at prep time: `HEAD <engine>-<version>-rc`
pub fn engine_candidate_refs(engine_versions: &[String], version: &str) -> Vec<String> {
    engine_versions
        .iter()
        .map(|engine| format!("HEAD {}-{}-rc", engine.trim(), version))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_existing_file_entirely() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(GDK_VERSION_FILE), "0.11.0-rc\nstale").unwrap();

        let staged = write_version_file(dir.path(), GDK_VERSION_FILE, "0.12.0-rc").unwrap();
        assert_eq!(std::fs::read_to_string(staged).unwrap(), "0.12.0-rc");
    }

    #[test]
    fn missing_version_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_version_file(dir.path(), GDK_VERSION_FILE, "0.12.0-rc").unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Transform(TransformError::MissingFile { .. })
        ));
    }

    #[test]
    fn engine_file_lists_candidate_refs() {
        let dir = tempfile::tempdir().unwrap();
        let engines = vec![
            "4.26-SpatialOSUnrealGDK".to_string(),
            "4.25-SpatialOSUnrealGDK".to_string(),
        ];
        let refs = engine_candidate_refs(&engines, "0.12.0");
        let path = write_engine_version_file(dir.path(), &refs).unwrap();

        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "HEAD 4.26-SpatialOSUnrealGDK-0.12.0-rc\nHEAD 4.25-SpatialOSUnrealGDK-0.12.0-rc\n"
        );
    }
}
