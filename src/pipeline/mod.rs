//! Delivery pipeline model: which branch deploys where, how artifacts are
//! labelled, and the stage progression of a single run.
//!
//! A commit on a tracked branch starts a [`PipelineRun`] that moves through
//! `pending → building → pushed → deployed`, or drops into `failed` from any
//! stage. Each track (staging, production) runs independently. Rollback is
//! an operational procedure on the [`ReleaseLog`], not a run state.

use serde::Deserialize;
use thiserror::Error;

mod artifact;
mod deploy;
mod executor;
mod release;
mod run;
mod track;

pub use artifact::{Artifact, CommitId};
pub use deploy::{DeployCommand, DeployTarget};
pub use executor::{execute, StageExecutor, StageFailure};
pub use release::ReleaseLog;
pub use run::{PipelineRun, PushEvent, Stage, StageTransition};
pub use track::Track;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("cannot move a run from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("invalid commit id '{0}', expected 7 to 40 hex characters")]
    InvalidCommit(String),

    #[error("no {track} release is labelled '{label}'")]
    UnknownRelease { track: Track, label: String },

    #[error("run has no artifact yet")]
    MissingArtifact,
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// `[pipeline]` table of the application config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Integration branch; commits here deploy to staging.
    pub staging_branch: String,
    /// Release branch; commits here deploy to production.
    pub production_branch: String,
    pub registry: String,
    pub image: String,
    pub staging: DeployTarget,
    pub production: DeployTarget,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            staging_branch: "develop".to_owned(),
            production_branch: "main".to_owned(),
            registry: "ghcr.io".to_owned(),
            image: "todo-api".to_owned(),
            staging: DeployTarget::new("staging.internal", "deploy"),
            production: DeployTarget::new("production.internal", "deploy"),
        }
    }
}

impl PipelineConfig {
    /// `<registry>/<image>`, without a label.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.registry.trim_end_matches('/'), self.image)
    }

    pub fn target(&self, track: Track) -> &DeployTarget {
        match track {
            Track::Staging => &self.staging,
            Track::Production => &self.production,
        }
    }
}
