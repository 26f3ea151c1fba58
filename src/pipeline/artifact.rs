use std::fmt;

use serde::Serialize;

use super::{PipelineConfig, PipelineError, PipelineResult, Track};

const SHORT_SHA_LEN: usize = 7;

/// A validated, lowercase git commit id (abbreviated or full).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn parse(raw: &str) -> PipelineResult<Self> {
        let id = raw.trim();
        let well_formed = (SHORT_SHA_LEN..=40).contains(&id.len())
            && id.chars().all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            return Err(PipelineError::InvalidCommit(raw.to_owned()));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The label that identifies this commit's image forever: `sha-<7 hex>`.
    pub fn immutable_label(&self) -> String {
        let short: String = self.0.chars().take(SHORT_SHA_LEN).collect();
        format!("sha-{short}")
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A container image built for one run, carrying both of its labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub repository: String,
    pub mutable_label: String,
    pub immutable_label: String,
}

impl Artifact {
    pub fn for_commit(config: &PipelineConfig, track: Track, commit: &CommitId) -> Self {
        Self {
            repository: config.repository(),
            mutable_label: track.mutable_label().to_owned(),
            immutable_label: commit.immutable_label(),
        }
    }

    /// `<repository>:<label>`.
    pub fn reference(&self, label: &str) -> String {
        format!("{}:{label}", self.repository)
    }

    pub fn mutable_reference(&self) -> String {
        self.reference(&self.mutable_label)
    }

    pub fn immutable_reference(&self) -> String {
        self.reference(&self.immutable_label)
    }

    pub fn references(&self) -> [String; 2] {
        [self.mutable_reference(), self.immutable_reference()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SHA: &str = "3F2a9c1d4e5b6a7980c1d2e3f4a5b6c7d8e9f0a1";

    #[rstest]
    #[case("abc1234")]
    #[case(SHA)]
    fn accepts_hex_commit_ids(#[case] raw: &str) {
        let commit = CommitId::parse(raw).unwrap();
        assert_eq!(commit.as_str(), raw.to_ascii_lowercase());
    }

    #[rstest]
    #[case("")]
    #[case("abc123")]
    #[case("not-a-sha")]
    #[case("3f2a9c1d4e5b6a7980c1d2e3f4a5b6c7d8e9f0a1ff")]
    fn rejects_malformed_commit_ids(#[case] raw: &str) {
        assert_eq!(CommitId::parse(raw), Err(PipelineError::InvalidCommit(raw.to_owned())));
    }

    #[test]
    fn artifact_labels_follow_track_and_commit() {
        let commit = CommitId::parse(SHA).unwrap();
        let config = PipelineConfig::default();

        let staging = Artifact::for_commit(&config, Track::Staging, &commit);
        assert_eq!(staging.mutable_reference(), "ghcr.io/todo-api:staging");
        assert_eq!(staging.immutable_reference(), "ghcr.io/todo-api:sha-3f2a9c1");

        let production = Artifact::for_commit(&config, Track::Production, &commit);
        assert_eq!(production.mutable_label, "latest");
        assert_eq!(production.immutable_label, staging.immutable_label);
    }
}
