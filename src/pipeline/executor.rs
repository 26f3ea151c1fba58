use mockable::Clock;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::{
    Artifact, DeployCommand, PipelineConfig, PipelineResult, PipelineRun, ReleaseLog, Stage,
};

/// Why a stage did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StageFailure(pub String);

impl StageFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The side-effecting half of a run: image builds, registry uploads and
/// remote execution.
#[cfg_attr(test, automock)]
pub trait StageExecutor {
    /// Builds the image and applies both of the artifact's labels.
    fn build(&self, artifact: &Artifact) -> Result<(), StageFailure>;

    /// Uploads both labels to the registry. Must be safe to repeat.
    fn push(&self, artifact: &Artifact) -> Result<(), StageFailure>;

    /// Issues the pull-and-restart command on the target host.
    fn deploy(&self, command: &DeployCommand) -> Result<(), StageFailure>;
}

/// Drives a pending run to a terminal stage.
///
/// The first failing stage moves the run to [`Stage::Failed`] and stops;
/// nothing is retried and nothing is rolled back. A successful deploy is
/// recorded in `releases`.
///
/// # Errors
///
/// Returns a [`PipelineError`](super::PipelineError) only when the run was
/// not pending to begin with.
pub fn execute(
    config: &PipelineConfig,
    run: &mut PipelineRun,
    executor: &dyn StageExecutor,
    releases: &mut ReleaseLog,
    clock: &impl Clock,
) -> PipelineResult<Stage> {
    let artifact = run.start_build(config, clock)?.clone();

    if let Err(failure) = executor.build(&artifact) {
        run.fail(format!("build: {failure}"), clock)?;
        return Ok(run.stage());
    }

    if let Err(failure) = executor.push(&artifact) {
        run.fail(format!("push: {failure}"), clock)?;
        return Ok(run.stage());
    }
    run.mark_pushed(clock)?;

    let command = run.deploy_command(config)?;
    if let Err(failure) = executor.deploy(&command) {
        run.fail(format!("deploy: {failure}"), clock)?;
        return Ok(run.stage());
    }
    run.mark_deployed(config, clock)?;
    releases.record(run.track(), artifact);

    Ok(run.stage())
}
