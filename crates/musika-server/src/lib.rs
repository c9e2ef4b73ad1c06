pub mod api;
pub mod chat;
pub mod config;
pub mod domain;
pub mod error;
pub mod mailer;
pub mod telemetry;
pub mod workers;

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::routes;
use crate::chat::ChatHub;
use crate::config::Config;
use crate::mailer::Mailer;
use crate::workers::email_dispatcher::EmailDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub chat: ChatHub,
}

pub struct App {
    state: Arc<AppState>,
    _email_dispatcher: EmailDispatcher,
}

impl App {
    pub fn db(&self) -> &PgPool {
        &self.state.db
    }

    pub async fn new(config: Config) -> Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&db).await?;

        let mailer = Mailer::from_config(&config)?;

        let state = Arc::new(AppState {
            db: db.clone(),
            config: config.clone(),
            chat: ChatHub::new(),
        });

        let mut email_dispatcher = EmailDispatcher::new(db, mailer);
        email_dispatcher.start();

        Ok(Self {
            state,
            _email_dispatcher: email_dispatcher,
        })
    }

    pub fn router(&self) -> Router {
        routes::build(self.state.clone())
    }
}
