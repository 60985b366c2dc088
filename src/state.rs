// src/state.rs

use std::{sync::Arc, time::Duration};

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{
    config::{AdminAuthMode, Config, QuestionSourceKind},
    error::AppError,
    exam::{
        registry::SessionRegistry,
        source::{DbSource, HttpSource, QuestionSource, StaticSource},
        store::SqliteAttemptStore,
    },
    models::question::Level,
    utils::guard::{AdminAuthenticator, DbAdminAuthenticator, StaticAdminAuthenticator},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub sessions: Arc<SessionRegistry>,
    pub attempts: Arc<SqliteAttemptStore>,
    pub admin_auth: Arc<dyn AdminAuthenticator>,
    pub http: reqwest::Client,
    pub bundled: Arc<StaticSource>,
}

impl AppState {
    /// Wires the shared services from configuration.
    pub fn new(pool: SqlitePool, config: Config) -> Result<Self, AppError> {
        let admin_auth: Arc<dyn AdminAuthenticator> = match config.admin_auth {
            AdminAuthMode::Database => Arc::new(DbAdminAuthenticator::new(pool.clone())),
            AdminAuthMode::Static => {
                let (Some(username), Some(password)) =
                    (&config.admin_username, &config.admin_password)
                else {
                    return Err(AppError::InternalServerError(
                        "ADMIN_AUTH=static requires ADMIN_USERNAME and ADMIN_PASSWORD".to_string(),
                    ));
                };
                Arc::new(StaticAdminAuthenticator::new(username, password)?)
            }
        };

        let bundled = StaticSource::bundled().map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            sessions: Arc::new(SessionRegistry::new(Duration::from_secs(
                config.session_retention_secs,
            ))),
            attempts: Arc::new(SqliteAttemptStore::new(pool.clone())),
            admin_auth,
            http: reqwest::Client::new(),
            bundled: Arc::new(bundled),
            pool,
            config,
        })
    }

    /// The configured question source, narrowed to `level` when given.
    pub fn question_source(&self, level: Option<Level>) -> Box<dyn QuestionSource> {
        match &self.config.question_source {
            QuestionSourceKind::Database => Box::new(DbSource::new(self.pool.clone(), level)),
            QuestionSourceKind::Http(url) => Box::new(HttpSource::new(
                self.http.clone(),
                url,
                level,
                Duration::from_secs(self.config.question_fetch_timeout_secs),
            )),
            QuestionSourceKind::Static => Box::new(self.bundled.for_level(level)),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
