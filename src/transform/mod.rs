//! Repository-specific release edits and templates.
//!
//! Every repository the release pipeline knows about has exactly one entry in
//! [`RepoStrategy::for_repository`]. Orchestrators look the strategy up once
//! per run and never branch on repository names themselves.

mod changelog;
mod plugin;
mod templates;
mod version_file;

pub use changelog::{
    CHANGELOG_FILE, insert_release_heading, read_release_notes, release_heading, release_notes,
    update_changelog,
};
pub use plugin::{PLUGIN_FILE, bump_plugin_descriptor, should_increment_plugin_version, update_plugin_file};
pub use templates::Templates;
pub use version_file::{
    ENGINE_VERSION_FILE, EXAMPLE_PROJECT_VERSION_FILE, GDK_VERSION_FILE, engine_candidate_refs,
    write_engine_version_file, write_version_file,
};

use crate::error::{Result, TransformError, ValidationError};
use crate::github::ReleaseDraft;
use crate::identity::ReleaseIdentity;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Repository whose PR every other repository's PR links back to
pub const GDK_REPOSITORY: &str = "UnrealGDK";

/// One idempotent file edit applied when preparing a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEdit {
    /// Insert the release heading below "Unreleased" in CHANGELOG.md
    ChangelogHeading,
    /// Bump `Version`/`VersionName` in the plugin descriptor
    PluginDescriptor,
    /// Point `ci/unreal-engine.version` at the engine candidate branches
    EngineCandidateRefs,
    /// Pin `ci/unreal-engine.version` to the released engine commits
    EngineReleaseCommits,
    /// Overwrite a version file with `<version>-rc`
    CandidateVersionFile(&'static str),
}

/// Which pull request body a repository uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestBody {
    /// Full release checklist
    Checklist,
    /// Short body linking to the GDK release PR
    LinkedToGdk,
}

/// Other releases a companion release note links to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Companion {
    /// The engine fork's release list
    EngineReleases,
    /// The example project release of the same version
    ExampleProject,
    /// The test gyms release of the same version
    TestGyms,
}

impl Companion {
    fn link(&self, version: &str) -> (String, String) {
        match self {
            Companion::EngineReleases => (
                "UnrealEngine version(s)".to_string(),
                "https://github.com/improbableio/UnrealEngine/releases".to_string(),
            ),
            Companion::ExampleProject => (
                "UnrealGDKExampleProject version".to_string(),
                format!(
                    "https://github.com/spatialos/UnrealGDKExampleProject/releases/tag/{}",
                    version
                ),
            ),
            Companion::TestGyms => (
                "UnrealGDKTestGyms version".to_string(),
                format!(
                    "https://github.com/improbable/UnrealGDKTestGyms/releases/tag/{}",
                    version
                ),
            ),
        }
    }
}

/// How a repository's draft release is tagged, named and described
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStyle {
    /// Tag `<v>`, bilingual notes embedding the changelog
    Gdk,
    /// Tag and name `<source branch>-<v>`
    Engine,
    /// Tag `<v>`, named `<display name> <v>`
    Companion {
        /// Release title prefix
        display_name: &'static str,
        /// Other releases listed in the notes
        companions: &'static [Companion],
    },
}

/// Release edits and templates for one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoStrategy {
    /// Repository name the entry applies to
    pub repository: &'static str,
    /// Edits applied, in order, when cutting a candidate
    pub edits: &'static [FileEdit],
    /// Edits applied to the candidate right before it is merged
    pub release_edits: &'static [FileEdit],
    /// Candidate-into-release PR body
    pub pull_request_body: PullRequestBody,
    /// Draft release layout
    pub release: ReleaseStyle,
}

const STRATEGIES: &[RepoStrategy] = &[
    RepoStrategy {
        repository: GDK_REPOSITORY,
        edits: &[
            FileEdit::ChangelogHeading,
            FileEdit::PluginDescriptor,
            FileEdit::EngineCandidateRefs,
        ],
        release_edits: &[FileEdit::ChangelogHeading, FileEdit::EngineReleaseCommits],
        pull_request_body: PullRequestBody::Checklist,
        release: ReleaseStyle::Gdk,
    },
    RepoStrategy {
        repository: "UnrealEngine",
        edits: &[
            FileEdit::CandidateVersionFile(GDK_VERSION_FILE),
            FileEdit::CandidateVersionFile(EXAMPLE_PROJECT_VERSION_FILE),
        ],
        release_edits: &[],
        pull_request_body: PullRequestBody::LinkedToGdk,
        release: ReleaseStyle::Engine,
    },
    RepoStrategy {
        repository: "UnrealGDKExampleProject",
        edits: &[FileEdit::CandidateVersionFile(GDK_VERSION_FILE)],
        release_edits: &[],
        pull_request_body: PullRequestBody::LinkedToGdk,
        release: ReleaseStyle::Companion {
            display_name: "Unreal GDK Example Project",
            companions: &[Companion::EngineReleases],
        },
    },
    RepoStrategy {
        repository: "UnrealGDKTestGyms",
        edits: &[FileEdit::CandidateVersionFile(GDK_VERSION_FILE)],
        release_edits: &[],
        pull_request_body: PullRequestBody::LinkedToGdk,
        release: ReleaseStyle::Companion {
            display_name: "Unreal GDK Test Gyms",
            companions: &[Companion::ExampleProject, Companion::EngineReleases],
        },
    },
    RepoStrategy {
        repository: "UnrealGDKEngineNetTest",
        edits: &[FileEdit::CandidateVersionFile(GDK_VERSION_FILE)],
        release_edits: &[],
        pull_request_body: PullRequestBody::LinkedToGdk,
        release: ReleaseStyle::Companion {
            display_name: "Unreal GDK EngineNetTest",
            companions: &[
                Companion::TestGyms,
                Companion::ExampleProject,
                Companion::EngineReleases,
            ],
        },
    },
    RepoStrategy {
        repository: "TestGymBuildKite",
        edits: &[FileEdit::CandidateVersionFile(GDK_VERSION_FILE)],
        release_edits: &[],
        pull_request_body: PullRequestBody::LinkedToGdk,
        release: ReleaseStyle::Companion {
            display_name: "Unreal GDK TestGymBuildKite",
            companions: &[
                Companion::TestGyms,
                Companion::ExampleProject,
                Companion::EngineReleases,
            ],
        },
    },
];

fn apply_edits(
    edits: &[FileEdit],
    root: &Path,
    identity: &ReleaseIdentity,
    date: NaiveDate,
    engine_commits: &[String],
) -> Result<Vec<PathBuf>> {
    let mut changed = Vec::new();

    for edit in edits {
        match edit {
            FileEdit::ChangelogHeading => {
                changed.extend(update_changelog(root, &identity.version, date)?);
            }
            FileEdit::PluginDescriptor => {
                changed.push(update_plugin_file(root, &identity.version)?);
            }
            FileEdit::EngineCandidateRefs => {
                let refs = engine_candidate_refs(&identity.engine_versions, &identity.version);
                changed.push(write_engine_version_file(root, &refs)?);
            }
            FileEdit::EngineReleaseCommits => {
                changed.push(write_engine_version_file(root, engine_commits)?);
            }
            FileEdit::CandidateVersionFile(relative) => {
                changed.push(write_version_file(
                    root,
                    relative,
                    &identity.candidate_version(),
                )?);
            }
        }
    }

    Ok(changed)
}

/// Engine file edits rewrite the whole file, so an empty engine list would
/// wipe every pin
fn require_engine_versions(edits: &[FileEdit], identity: &ReleaseIdentity) -> Result<()> {
    let writes_engine_file = edits.iter().any(|edit| {
        matches!(
            edit,
            FileEdit::EngineCandidateRefs | FileEdit::EngineReleaseCommits
        )
    });

    if writes_engine_file && identity.engine_versions.is_empty() {
        return Err(ValidationError::MissingArgument {
            argument: "--engine-versions".to_string(),
        }
        .into());
    }
    Ok(())
}

impl RepoStrategy {
    /// Look up the strategy for `repository`
    pub fn for_repository(repository: &str) -> Result<&'static RepoStrategy> {
        STRATEGIES
            .iter()
            .find(|strategy| strategy.repository == repository)
            .ok_or_else(|| {
                TransformError::UnsupportedRepository {
                    repository: repository.to_string(),
                }
                .into()
            })
    }

    /// Whether the release notes embed the changelog
    pub fn uses_changelog_notes(&self) -> bool {
        matches!(self.release, ReleaseStyle::Gdk)
    }

    /// Whether release edits need the engine commit shas from metadata
    pub fn needs_engine_commits(&self) -> bool {
        self.release_edits.contains(&FileEdit::EngineReleaseCommits)
    }

    /// Check `identity` carries everything the candidate edits need
    pub fn validate_prep(&self, identity: &ReleaseIdentity) -> Result<()> {
        require_engine_versions(self.edits, identity)
    }

    /// Check `identity` carries everything the pre-merge edits need
    pub fn validate_release(&self, identity: &ReleaseIdentity) -> Result<()> {
        require_engine_versions(self.release_edits, identity)
    }

    /// Apply the candidate edits to the working tree at `root`. Returns the
    /// files that changed and need staging.
    pub fn apply_prep_edits(
        &self,
        root: &Path,
        identity: &ReleaseIdentity,
        date: NaiveDate,
    ) -> Result<Vec<PathBuf>> {
        self.validate_prep(identity)?;
        apply_edits(self.edits, root, identity, date, &[])
    }

    /// Apply the pre-merge edits. `engine_commits` holds one released
    /// commit sha per engine version, in `--engine-versions` order.
    pub fn apply_release_edits(
        &self,
        root: &Path,
        identity: &ReleaseIdentity,
        date: NaiveDate,
        engine_commits: &[String],
    ) -> Result<Vec<PathBuf>> {
        self.validate_release(identity)?;
        apply_edits(self.release_edits, root, identity, date, engine_commits)
    }

    /// Draft release for the commit at `target_commit`. `changelog_notes`
    /// is only read when [`uses_changelog_notes`](Self::uses_changelog_notes).
    pub fn release_draft(
        &self,
        templates: &Templates,
        identity: &ReleaseIdentity,
        target_commit: &str,
        changelog_notes: &str,
    ) -> Result<ReleaseDraft> {
        let version = identity.version.as_str();

        let (tag, name, body) = match self.release {
            ReleaseStyle::Gdk => (
                version.to_string(),
                format!("GDK for Unreal Release {}", version),
                templates.gdk_release_notes(version, changelog_notes)?,
            ),
            ReleaseStyle::Engine => {
                let qualified = format!("{}-{}", identity.source_branch.trim(), version);
                let links = [Companion::ExampleProject.link(version)];
                (
                    qualified.clone(),
                    qualified,
                    templates.companion_release_notes(version, "Engine", &links)?,
                )
            }
            ReleaseStyle::Companion {
                display_name,
                companions,
            } => {
                let links: Vec<_> = companions.iter().map(|c| c.link(version)).collect();
                (
                    version.to_string(),
                    format!("{} {}", display_name, version),
                    templates.companion_release_notes(version, self.repository, &links)?,
                )
            }
        };

        Ok(ReleaseDraft {
            tag,
            name,
            body,
            target_commit: target_commit.to_string(),
        })
    }
}
