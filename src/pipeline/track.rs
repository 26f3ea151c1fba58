use std::fmt;

use serde::{Deserialize, Serialize};

use super::PipelineConfig;

/// Deployment path, keyed by source branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Staging,
    Production,
}

impl Track {
    /// Resolves the track a branch deploys to. Accepts both `main` and
    /// `refs/heads/main`. Untracked branches yield `None`.
    pub fn for_branch(config: &PipelineConfig, branch: &str) -> Option<Self> {
        let branch = branch.strip_prefix("refs/heads/").unwrap_or(branch);
        if branch == config.production_branch {
            Some(Self::Production)
        } else if branch == config.staging_branch {
            Some(Self::Staging)
        } else {
            None
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Label reassigned on every successful build for this environment.
    pub const fn mutable_label(self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Production => "latest",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("main", Some(Track::Production))]
    #[case("refs/heads/main", Some(Track::Production))]
    #[case("develop", Some(Track::Staging))]
    #[case("refs/heads/develop", Some(Track::Staging))]
    #[case("feature/login", None)]
    #[case("refs/tags/main", None)]
    fn branches_resolve_to_tracks(#[case] branch: &str, #[case] expected: Option<Track>) {
        assert_eq!(Track::for_branch(&PipelineConfig::default(), branch), expected);
    }

    #[test]
    fn branches_come_from_config() {
        let config = PipelineConfig {
            staging_branch: "integration".to_owned(),
            production_branch: "release".to_owned(),
            ..PipelineConfig::default()
        };

        assert_eq!(Track::for_branch(&config, "integration"), Some(Track::Staging));
        assert_eq!(Track::for_branch(&config, "release"), Some(Track::Production));
        assert_eq!(Track::for_branch(&config, "main"), None);
    }
}
