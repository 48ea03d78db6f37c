use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::activity::{
    recorder::ActivityRecorder,
    repo::{ActivityRepo, PgActivityRepo},
};
use crate::auth::{jwt::JwtKeys, rate_limit::LoginLimiter};
use crate::config::AppConfig;
use crate::jobs::{
    repo::{JobRepo, PgJobRepo},
    services::JobStore,
};
use crate::users::{
    repo::{PgUserRepo, UserRepo},
    services::CredentialStore,
};

/// Everything a handler may touch, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub credentials: CredentialStore,
    pub jobs: JobStore,
    pub activity: ActivityRecorder,
    pub login_limiter: LoginLimiter,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgJobRepo::new(db.clone())),
            Arc::new(PgActivityRepo::new(db)),
        ))
    }

    /// Spawns the activity consumer, so a Tokio runtime must be running.
    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserRepo>,
        jobs: Arc<dyn JobRepo>,
        activity: Arc<dyn ActivityRepo>,
    ) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        let login_limiter = LoginLimiter::new(&config.login_limit);
        let (activity, _consumer) = ActivityRecorder::spawn(activity);
        Self {
            config: Arc::new(config),
            keys,
            credentials: CredentialStore::new(users),
            jobs: JobStore::new(jobs, activity.clone()),
            activity,
            login_limiter,
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        use crate::memory::{MemoryActivityRepo, MemoryJobRepo, MemoryUserRepo};

        let users = Arc::new(MemoryUserRepo::default());
        let activity = Arc::new(MemoryActivityRepo::new(users.clone()));
        Self::from_parts(
            AppConfig::for_tests(),
            users,
            Arc::new(MemoryJobRepo::default()),
            activity,
        )
    }

    #[cfg(test)]
    pub fn in_memory_with_activity(activity: Arc<dyn ActivityRepo>) -> Self {
        use crate::memory::{MemoryJobRepo, MemoryUserRepo};

        Self::from_parts(
            AppConfig::for_tests(),
            Arc::new(MemoryUserRepo::default()),
            Arc::new(MemoryJobRepo::default()),
            activity,
        )
    }
}
