use super::tickets::TicketBook;
use crate::api::ApiClient;
use crate::config::Config;
use crate::session::Session;
use rusqlite::Connection;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub session: Session,
    pub client: ApiClient,
    pub tickets: TicketBook,
}

impl AppState {
    pub fn new(config: Config, client: ApiClient) -> Self {
        Self {
            config,
            workspace: None,
            db: None,
            session: Session::anonymous(),
            client,
            tickets: TicketBook::default(),
        }
    }
}
