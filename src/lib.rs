#[macro_use]
extern crate rocket;

pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod pipeline;
pub mod routes;
pub mod schema;
pub mod service;
pub mod store;

use std::sync::Arc;

use mockable::DefaultClock;
use rocket::fairing::AdHoc;
use rocket::figment::{providers::Env, Figment};
use rocket::shield::{Hsts, Shield};
use rocket::time::Duration;
use rocket::{Build, Rocket};

use config::{AppConfig, StorageBackend};
use service::TodoService;
use store::{MemoryStore, PostgresStore, TodoStore};

/// Rocket's own configuration sources, plus a plain `DATABASE_URL`.
pub fn figment() -> Figment {
    rocket::Config::figment().merge(Env::raw().only(&["database_url"]))
}

pub fn rocket() -> Rocket<Build> {
    build(figment())
}

/// Assembles the application from an explicit configuration.
pub fn build(figment: Figment) -> Rocket<Build> {
    let hsts = figment.extract_inner::<bool>("hsts").unwrap_or(false);

    let rocket = rocket::custom(figment)
        .attach(AdHoc::config::<AppConfig>())
        .attach(AdHoc::try_on_ignite("Todo Store", init_store))
        .mount("/", routes::health::routes())
        .mount("/", routes::todos::routes())
        .register("/", error::catchers());

    if hsts {
        rocket.attach(Shield::default().enable(Hsts::IncludeSubDomains(Duration::days(365))))
    } else {
        rocket
    }
}

async fn init_store(rocket: Rocket<Build>) -> Result<Rocket<Build>, Rocket<Build>> {
    let Some(config) = rocket.state::<AppConfig>().cloned() else {
        log::error!("application configuration was not loaded");
        return Err(rocket);
    };

    let store: Arc<dyn TodoStore> = match (config.storage, config.database_url.as_deref()) {
        (StorageBackend::Memory, _) => {
            log::warn!("using the in-memory todo store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
        (StorageBackend::Postgres, None) => {
            log::error!("storage = \"postgres\" requires `database_url` or DATABASE_URL");
            return Err(rocket);
        }
        (StorageBackend::Postgres, Some(url)) => {
            match PostgresStore::connect(url, config.pool_size).await {
                Ok(store) => {
                    log::info!("connected to PostgreSQL (pool size {})", config.pool_size);
                    Arc::new(store)
                }
                Err(err) => {
                    log::error!("failed to connect to PostgreSQL: {err}");
                    return Err(rocket);
                }
            }
        }
    };

    let service = TodoService::new(store, Arc::new(DefaultClock), config.page_size);
    Ok(rocket.manage(service))
}
