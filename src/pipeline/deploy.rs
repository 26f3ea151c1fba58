use serde::{Deserialize, Serialize};

use super::Artifact;

const DEFAULT_RESTART: &str = "docker compose up -d --no-deps api";

/// Remote host that runs one environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeployTarget {
    pub host: String,
    pub user: String,
    /// Shell command that restarts the running instance on the host.
    #[serde(default = "default_restart")]
    pub restart: String,
}

fn default_restart() -> String {
    DEFAULT_RESTART.to_owned()
}

impl DeployTarget {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self { host: host.into(), user: user.into(), restart: default_restart() }
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// A pull-and-restart instruction for a target host.
///
/// Issuing the command is the whole of the deploy stage: nothing here
/// checks whether the restarted instance is healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployCommand {
    pub destination: String,
    pub script: Vec<String>,
}

impl DeployCommand {
    /// Pulls the freshly pushed mutable label and restarts.
    pub fn rollout(target: &DeployTarget, artifact: &Artifact) -> Self {
        Self {
            destination: target.destination(),
            script: vec![
                format!("docker pull {}", artifact.mutable_reference()),
                target.restart.clone(),
            ],
        }
    }

    /// Pulls a previously released immutable label, points the mutable
    /// label back at it, and restarts.
    pub fn rollback(target: &DeployTarget, artifact: &Artifact) -> Self {
        let pinned = artifact.immutable_reference();
        Self {
            destination: target.destination(),
            script: vec![
                format!("docker pull {pinned}"),
                format!("docker tag {pinned} {}", artifact.mutable_reference()),
                target.restart.clone(),
            ],
        }
    }

    /// Arguments for a key-authenticated `ssh` invocation.
    pub fn ssh_args(&self) -> Vec<String> {
        vec!["ssh".to_owned(), self.destination.clone(), self.script.join(" && ")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> Artifact {
        Artifact {
            repository: "ghcr.io/todo-api".to_owned(),
            mutable_label: "latest".to_owned(),
            immutable_label: "sha-abc1234".to_owned(),
        }
    }

    #[test]
    fn rollout_pulls_the_mutable_label() {
        let command = DeployCommand::rollout(&DeployTarget::new("prod.example", "deploy"), &artifact());

        assert_eq!(command.destination, "deploy@prod.example");
        assert_eq!(command.script, ["docker pull ghcr.io/todo-api:latest", DEFAULT_RESTART]);
    }

    #[test]
    fn rollback_retags_the_pinned_label() {
        let command = DeployCommand::rollback(&DeployTarget::new("prod.example", "deploy"), &artifact());

        assert_eq!(
            command.ssh_args(),
            [
                "ssh",
                "deploy@prod.example",
                "docker pull ghcr.io/todo-api:sha-abc1234 && \
                 docker tag ghcr.io/todo-api:sha-abc1234 ghcr.io/todo-api:latest && \
                 docker compose up -d --no-deps api",
            ]
        );
    }
}
