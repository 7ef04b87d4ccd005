//! Unreal plugin descriptor (`.uplugin`) version bump.
//!
//! `VersionName` always becomes the release version. The integer `Version`
//! only moves when the major or minor component increases, so patch releases
//! stay binary compatible as far as the engine is concerned.

use crate::error::{Result, TransformError};
use log::info;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Descriptor file name searched for below the repository root
pub const PLUGIN_FILE: &str = "SpatialGDK.uplugin";

const VERSION_KEY: &str = "Version";
const VERSION_NAME_KEY: &str = "VersionName";

/// First file named [`PLUGIN_FILE`] under `root`, skipping `.git`
pub fn find_plugin_file(root: &Path) -> Result<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == PLUGIN_FILE)
        .map(|entry| entry.into_path())
        .ok_or_else(|| {
            TransformError::MissingFile {
                path: PathBuf::from(PLUGIN_FILE),
            }
            .into()
        })
}

/// `(major, minor)` of a dotted version string
fn major_minor(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.split(['.', '-']);
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// Whether moving from `old` to `new` bumps the major or minor component
pub fn should_increment_plugin_version(old: &str, new: &str) -> Option<bool> {
    Some(major_minor(new)? > major_minor(old)?)
}

/// Apply the release version to descriptor JSON, preserving key order
pub fn bump_plugin_descriptor(contents: &str, new_version: &str) -> Result<String> {
    let invalid = |reason: String| TransformError::InvalidContent {
        path: PathBuf::from(PLUGIN_FILE),
        reason,
    };

    let mut descriptor: Value = serde_json::from_str(contents)?;
    let object = descriptor
        .as_object_mut()
        .ok_or_else(|| invalid("descriptor is not a JSON object".to_string()))?;

    let (Some(version), Some(version_name)) = (
        object.get(VERSION_KEY).and_then(Value::as_u64),
        object.get(VERSION_NAME_KEY).and_then(Value::as_str),
    ) else {
        return Err(invalid(format!(
            "at least one of the two expected keys '{}' and '{}' could not be found",
            VERSION_KEY, VERSION_NAME_KEY
        ))
        .into());
    };

    let increment = should_increment_plugin_version(version_name, new_version)
        .ok_or_else(|| invalid(format!("cannot compare '{}' with '{}'", version_name, new_version)))?;

    if increment {
        object.insert(VERSION_KEY.to_string(), Value::from(version + 1));
    }
    object.insert(
        VERSION_NAME_KEY.to_string(),
        Value::String(new_version.to_string()),
    );

    Ok(serde_json::to_string_pretty(&descriptor)?)
}

/// Bump the descriptor found under `root`, returning its path for staging
pub fn update_plugin_file(root: &Path, new_version: &str) -> Result<PathBuf> {
    let path = find_plugin_file(root)?;
    info!("Updating {}...", path.display());

    let contents = std::fs::read_to_string(&path)?;
    std::fs::write(&path, bump_plugin_descriptor(&contents, new_version)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(json: &str) -> (u64, String) {
        let value: Value = serde_json::from_str(json).unwrap();
        (
            value["Version"].as_u64().unwrap(),
            value["VersionName"].as_str().unwrap().to_string(),
        )
    }

    #[test]
    fn minor_bump_increments_version() {
        let bumped = bump_plugin_descriptor(r#"{"Version": 5, "VersionName": "1.2.0"}"#, "1.3.0").unwrap();
        assert_eq!(fields(&bumped), (6, "1.3.0".to_string()));
    }

    #[test]
    fn patch_bump_keeps_version() {
        let bumped = bump_plugin_descriptor(r#"{"Version": 5, "VersionName": "1.2.0"}"#, "1.2.1").unwrap();
        assert_eq!(fields(&bumped), (5, "1.2.1".to_string()));
    }

    #[test]
    fn major_bump_increments_version() {
        let bumped = bump_plugin_descriptor(r#"{"Version": 5, "VersionName": "1.9.4"}"#, "2.0.0").unwrap();
        assert_eq!(fields(&bumped), (6, "2.0.0".to_string()));
    }

    #[test]
    fn rerun_with_same_version_is_stable() {
        let once = bump_plugin_descriptor(r#"{"Version": 5, "VersionName": "1.2.0"}"#, "1.3.0").unwrap();
        let twice = bump_plugin_descriptor(&once, "1.3.0").unwrap();
        assert_eq!(fields(&twice), (6, "1.3.0".to_string()));
    }

    #[test]
    fn other_keys_keep_their_order() {
        let bumped = bump_plugin_descriptor(
            r#"{"FileVersion": 3, "Version": 5, "VersionName": "1.2.0", "FriendlyName": "SpatialOS GDK for Unreal"}"#,
            "1.3.0",
        )
        .unwrap();
        let file_version = bumped.find("FileVersion").unwrap();
        let friendly = bumped.find("FriendlyName").unwrap();
        assert!(file_version < friendly);
    }

    #[test]
    fn missing_keys_are_rejected() {
        assert!(bump_plugin_descriptor(r#"{"Version": 5}"#, "1.3.0").is_err());
    }

    #[test]
    fn finds_nested_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("SpatialGDK");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            nested.join(PLUGIN_FILE),
            r#"{"Version": 1, "VersionName": "0.1.0"}"#,
        )
        .unwrap();

        let path = update_plugin_file(dir.path(), "0.2.0").unwrap();
        assert_eq!(path, nested.join(PLUGIN_FILE));
        assert_eq!(fields(&std::fs::read_to_string(path).unwrap()), (2, "0.2.0".to_string()));
    }
}
