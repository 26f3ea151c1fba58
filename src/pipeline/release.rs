use std::collections::HashMap;

use super::{Artifact, DeployCommand, PipelineConfig, PipelineError, PipelineResult, Track};

/// Immutable labels that reached each environment, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ReleaseLog {
    releases: HashMap<Track, Vec<Artifact>>,
}

impl ReleaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, track: Track, artifact: Artifact) {
        log::info!("{track} now runs {}", artifact.immutable_reference());
        self.releases.entry(track).or_default().push(artifact);
    }

    pub fn history(&self, track: Track) -> &[Artifact] {
        self.releases.get(&track).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn current(&self, track: Track) -> Option<&Artifact> {
        self.history(track).last()
    }

    /// The release before the current one, the usual rollback target.
    pub fn previous(&self, track: Track) -> Option<&Artifact> {
        self.history(track).iter().rev().nth(1)
    }

    /// Builds the command that puts `label` back into service on `track`.
    ///
    /// Rolling back is not tracked as a run: the log is left untouched and
    /// the caller decides whether to [`record`](Self::record) the result.
    ///
    /// # Errors
    ///
    /// [`PipelineError::UnknownRelease`] when `label` was never deployed to
    /// `track`.
    pub fn rollback(
        &self,
        config: &PipelineConfig,
        track: Track,
        label: &str,
    ) -> PipelineResult<DeployCommand> {
        let artifact = self
            .history(track)
            .iter()
            .rev()
            .find(|artifact| artifact.immutable_label == label)
            .ok_or_else(|| PipelineError::UnknownRelease { track, label: label.to_owned() })?;
        log::warn!("rolling {track} back to {}", artifact.immutable_reference());
        Ok(DeployCommand::rollback(config.target(track), artifact))
    }
}
