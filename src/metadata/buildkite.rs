//! Metadata store backed by the `buildkite-agent` CLI.

use crate::error::{MetadataError, Result};
use crate::metadata::{AnnotationLevel, MetadataStore};
use log::debug;
use tokio::process::Command;

/// Talks to the Buildkite agent running the current job
#[derive(Debug, Clone)]
pub struct BuildkiteAgentStore {
    agent_binary: String,
}

impl Default for BuildkiteAgentStore {
    fn default() -> Self {
        Self::new("buildkite-agent")
    }
}

impl BuildkiteAgentStore {
    /// Use a specific agent binary
    pub fn new(agent_binary: impl Into<String>) -> Self {
        Self {
            agent_binary: agent_binary.into(),
        }
    }

    async fn run_agent(&self, args: &[&str], description: &str) -> Result<std::process::Output> {
        debug!("Running {} {}", self.agent_binary, description);

        Command::new(&self.agent_binary)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                MetadataError::AgentFailed {
                    command: description.to_string(),
                    reason: e.to_string(),
                }
                .into()
            })
    }

    fn check(output: &std::process::Output, description: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }
        Err(MetadataError::AgentFailed {
            command: description.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into())
    }
}

impl MetadataStore for BuildkiteAgentStore {
    async fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        let description = format!("meta-data set {}", key);
        let output = self
            .run_agent(&["meta-data", "set", key, value], &description)
            .await?;
        Self::check(&output, &description)
    }

    async fn get_metadata(&self, key: &str) -> Result<String> {
        // `exists` exits non-zero for missing keys, `get` would block or fail
        let exists = self
            .run_agent(&["meta-data", "exists", key], &format!("meta-data exists {}", key))
            .await?;
        if !exists.status.success() {
            return Err(MetadataError::KeyNotFound {
                key: key.to_string(),
            }
            .into());
        }

        let description = format!("meta-data get {}", key);
        let output = self
            .run_agent(&["meta-data", "get", key], &description)
            .await?;
        Self::check(&output, &description)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn annotate(
        &self,
        level: AnnotationLevel,
        context: &str,
        body: &str,
        append: bool,
    ) -> Result<()> {
        let description = format!("annotate --context {}", context);
        let mut args = vec![
            "annotate",
            body,
            "--style",
            level.as_style(),
            "--context",
            context,
        ];
        if append {
            args.push("--append");
        }

        let output = self.run_agent(&args, &description).await?;
        Self::check(&output, &description)
    }
}
