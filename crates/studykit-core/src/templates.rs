//! Command template generation.
//!
//! The orchestrator only depends on [`TemplateGenerator`]. The shipped
//! [`CommandTemplateWriter`] writes one markdown prompt file per research
//! command into the configured template directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::IntegrationConfig;
use crate::obs;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to create template directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write template {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template generation failed: {0}")]
    Generator(String),
}

/// Produces the command templates the agent CLI picks up.
#[async_trait]
pub trait TemplateGenerator: Send + Sync {
    async fn generate_templates(&self, config: &IntegrationConfig) -> Result<(), TemplateError>;
}

/// A research workflow command exposed to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub body: &'static str,
}

impl CommandTemplate {
    pub fn file_name(&self) -> String {
        format!("{}.md", self.name)
    }

    pub fn render(&self) -> String {
        format!(
            "---\ndescription: {}\n---\n\n{}\n",
            self.description, self.body
        )
    }
}

pub const COMMAND_TEMPLATES: &[CommandTemplate] = &[
    CommandTemplate {
        name: "study-new",
        description: "Start a new study from a research question",
        body: "Create a new study for the research question: $ARGUMENTS\n\nRecord the question, scope and initial hypotheses.",
    },
    CommandTemplate {
        name: "study-plan",
        description: "Draft a study plan",
        body: "Draft a study plan for: $ARGUMENTS\n\nList objectives, methods and milestones.",
    },
    CommandTemplate {
        name: "literature-review",
        description: "Summarise prior work on a topic",
        body: "Review the literature on: $ARGUMENTS\n\nGroup sources by theme and note open gaps.",
    },
    CommandTemplate {
        name: "experiment-log",
        description: "Log an experiment run",
        body: "Log the experiment: $ARGUMENTS\n\nCapture setup, parameters, observations and results.",
    },
    CommandTemplate {
        name: "study-summary",
        description: "Summarise the current study",
        body: "Summarise the study so far: $ARGUMENTS\n\nHighlight findings, limitations and next steps.",
    },
];

/// Writes [`COMMAND_TEMPLATES`] under `config.template_path`.
///
/// Existing files are overwritten so regeneration picks up new bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTemplateWriter;

impl CommandTemplateWriter {
    pub fn new() -> Self {
        Self
    }

    /// Paths that a successful run produces under `dir`.
    pub fn planned_paths(dir: &Path) -> Vec<PathBuf> {
        COMMAND_TEMPLATES
            .iter()
            .map(|template| dir.join(template.file_name()))
            .collect()
    }
}

#[async_trait]
impl TemplateGenerator for CommandTemplateWriter {
    async fn generate_templates(&self, config: &IntegrationConfig) -> Result<(), TemplateError> {
        let dir = &config.template_path;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| TemplateError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        for template in COMMAND_TEMPLATES {
            let path = dir.join(template.file_name());
            tokio::fs::write(&path, template.render())
                .await
                .map_err(|source| TemplateError::Write {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "wrote command template");
        }

        obs::emit_templates_generated(dir, COMMAND_TEMPLATES.len());
        Ok(())
    }
}
