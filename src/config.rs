use serde::Deserialize;

use crate::pipeline::PipelineConfig;

/// Which [`TodoStore`](crate::store::TodoStore) backs the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

/// Application settings, extracted from Rocket's figment.
///
/// Layers, lowest to highest priority: built-in defaults, the `[default]`
/// table of `Rocket.toml`, the active profile table (`[debug]` or
/// `[release]`), `ROCKET_*` environment variables, and finally a plain
/// `DATABASE_URL`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Send `Strict-Transport-Security` on every response.
    #[serde(default)]
    pub hsts: bool,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_pool_size() -> u32 {
    10
}

fn default_page_size() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            database_url: None,
            pool_size: default_pool_size(),
            page_size: default_page_size(),
            hsts: false,
            pipeline: PipelineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::figment::{providers::Serialized, Figment};

    #[test]
    fn defaults_apply_when_keys_are_missing() {
        let config: AppConfig = Figment::new().extract().unwrap();

        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.pool_size, 10);
        assert!(!config.hsts);
        assert!(config.database_url.is_none());
        assert_eq!(config.pipeline.production_branch, "main");
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let config: AppConfig = Figment::new()
            .merge(Serialized::default("page_size", 10))
            .merge(Serialized::default("page_size", 25))
            .merge(Serialized::default("storage", "postgres"))
            .merge(Serialized::default("pipeline.staging_branch", "integration"))
            .extract()
            .unwrap();

        assert_eq!(config.page_size, 25);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.pipeline.staging_branch, "integration");
        assert_eq!(config.pipeline.production_branch, "main");
    }
}
