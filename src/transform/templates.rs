//! Pull request and release note bodies rendered with handlebars.

use crate::error::Result;
use handlebars::{Handlebars, no_escape};
use serde::Serialize;

const CHECKLIST_PR_BODY: &str = "pr-body-checklist";
const LINKED_PR_BODY: &str = "pr-body-linked";
const GDK_RELEASE_NOTES: &str = "release-notes-gdk";
const COMPANION_RELEASE_NOTES: &str = "release-notes-companion";

/// Registered templates, rendered as plain markdown (no HTML escaping)
pub struct Templates {
    registry: Handlebars<'static>,
}

#[derive(Serialize)]
struct PullRequestContext<'a> {
    candidate_branch: &'a str,
    release_branch: &'a str,
    gdk_pull_request_url: &'a str,
}

#[derive(Serialize)]
struct GdkReleaseContext<'a> {
    version: &'a str,
    changelog: &'a str,
}

#[derive(Serialize)]
struct CompanionReleaseContext<'a> {
    version: &'a str,
    subject: &'a str,
    companion_links: String,
}

impl Templates {
    /// Register the bundled templates
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(no_escape);

        registry.register_template_string(
            CHECKLIST_PR_BODY,
            include_str!("../../templates/pr_body_checklist.md.hbs"),
        )?;
        registry.register_template_string(
            LINKED_PR_BODY,
            include_str!("../../templates/pr_body_linked.md.hbs"),
        )?;
        registry.register_template_string(
            GDK_RELEASE_NOTES,
            include_str!("../../templates/release_notes_gdk.md.hbs"),
        )?;
        registry.register_template_string(
            COMPANION_RELEASE_NOTES,
            include_str!("../../templates/release_notes_companion.md.hbs"),
        )?;

        Ok(Self { registry })
    }

    /// PR body with the full release checklist
    pub fn checklist_pr_body(&self, candidate_branch: &str, release_branch: &str) -> Result<String> {
        Ok(self.registry.render(
            CHECKLIST_PR_BODY,
            &PullRequestContext {
                candidate_branch,
                release_branch,
                gdk_pull_request_url: "",
            },
        )?)
    }

    /// PR body pointing readers at the GDK release PR
    pub fn linked_pr_body(
        &self,
        candidate_branch: &str,
        release_branch: &str,
        gdk_pull_request_url: &str,
    ) -> Result<String> {
        Ok(self.registry.render(
            LINKED_PR_BODY,
            &PullRequestContext {
                candidate_branch,
                release_branch,
                gdk_pull_request_url,
            },
        )?)
    }

    /// Bilingual GDK release notes embedding the changelog section
    pub fn gdk_release_notes(&self, version: &str, changelog: &str) -> Result<String> {
        Ok(self
            .registry
            .render(GDK_RELEASE_NOTES, &GdkReleaseContext { version, changelog })?)
    }

    /// Release notes for a repository released alongside the GDK.
    /// `companion_links` are `(label, url)` pairs listed under the GDK link.
    pub fn companion_release_notes(
        &self,
        version: &str,
        subject: &str,
        companion_links: &[(String, String)],
    ) -> Result<String> {
        let companion_links = companion_links
            .iter()
            .map(|(label, url)| format!("* You can find the corresponding {} [here]({}).\n", label, url))
            .collect();

        Ok(self.registry.render(
            COMPANION_RELEASE_NOTES,
            &CompanionReleaseContext {
                version,
                subject,
                companion_links,
            },
        )?)
    }
}
