use std::fmt;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;

use super::{
    Artifact, CommitId, DeployCommand, PipelineConfig, PipelineError, PipelineResult, Track,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    Building,
    Pushed,
    Deployed,
    Failed,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Building => "building",
            Self::Pushed => "pushed",
            Self::Deployed => "deployed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Deployed | Self::Failed)
    }

    /// Whether a run may move from `self` to `next`.
    ///
    /// `Pushed → Pushed` is allowed: re-uploading after a transient
    /// failure is a no-op for the run.
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Building)
            | (Self::Building, Self::Pushed)
            | (Self::Pushed, Self::Pushed)
            | (Self::Pushed, Self::Deployed) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit landing on a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub branch: String,
    pub commit: String,
}

impl PushEvent {
    pub fn new(branch: impl Into<String>, commit: impl Into<String>) -> Self {
        Self { branch: branch.into(), commit: commit.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageTransition {
    pub from: Stage,
    pub to: Stage,
    pub at: DateTime<Utc>,
}

/// One pipeline execution for one commit on one track.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    track: Track,
    commit: CommitId,
    stage: Stage,
    artifact: Option<Artifact>,
    failure: Option<String>,
    history: Vec<StageTransition>,
}

impl PipelineRun {
    /// Starts a pending run for `event`, or returns `Ok(None)` when the
    /// branch is not tracked.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidCommit`] when the commit id is malformed.
    pub fn trigger(config: &PipelineConfig, event: &PushEvent) -> PipelineResult<Option<Self>> {
        let Some(track) = Track::for_branch(config, &event.branch) else {
            log::debug!("ignoring push to untracked branch {}", event.branch);
            return Ok(None);
        };
        let commit = CommitId::parse(&event.commit)?;
        log::info!("{track} run triggered by {commit} on {}", event.branch);
        Ok(Some(Self {
            track,
            commit,
            stage: Stage::Pending,
            artifact: None,
            failure: None,
            history: Vec::new(),
        }))
    }

    pub fn track(&self) -> Track {
        self.track
    }

    pub fn commit(&self) -> &CommitId {
        &self.commit
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn history(&self) -> &[StageTransition] {
        &self.history
    }

    fn transition(&mut self, to: Stage, clock: &impl Clock) -> PipelineResult<()> {
        let from = self.stage;
        if !from.can_transition_to(to) {
            return Err(PipelineError::InvalidTransition { from, to });
        }
        if from != to {
            self.history.push(StageTransition { from, to, at: clock.utc() });
            self.stage = to;
        }
        Ok(())
    }

    /// `pending → building`. Labels the run's artifact.
    pub fn start_build(
        &mut self,
        config: &PipelineConfig,
        clock: &impl Clock,
    ) -> PipelineResult<&Artifact> {
        self.transition(Stage::Building, clock)?;
        let artifact = Artifact::for_commit(config, self.track, &self.commit);
        Ok(&*self.artifact.insert(artifact))
    }

    /// `building → pushed`, or a no-op when already pushed.
    pub fn mark_pushed(&mut self, clock: &impl Clock) -> PipelineResult<()> {
        self.transition(Stage::Pushed, clock)
    }

    /// `pushed → deployed`. Returns the command that was issued to the
    /// track's host.
    pub fn mark_deployed(
        &mut self,
        config: &PipelineConfig,
        clock: &impl Clock,
    ) -> PipelineResult<DeployCommand> {
        let command = self.deploy_command(config)?;
        self.transition(Stage::Deployed, clock)?;
        Ok(command)
    }

    /// The pull-and-restart command for this run's artifact.
    pub fn deploy_command(&self, config: &PipelineConfig) -> PipelineResult<DeployCommand> {
        let artifact = self.artifact.as_ref().ok_or(PipelineError::MissingArtifact)?;
        Ok(DeployCommand::rollout(config.target(self.track), artifact))
    }

    /// Moves any non-terminal run to `failed`.
    pub fn fail(&mut self, reason: impl Into<String>, clock: &impl Clock) -> PipelineResult<()> {
        self.transition(Stage::Failed, clock)?;
        let reason = reason.into();
        log::warn!("{} run for {} failed: {reason}", self.track, self.commit);
        self.failure = Some(reason);
        Ok(())
    }
}
