use std::path::PathBuf;

use serde::Deserialize;

use crate::store::SqliteStore;
use crate::view::InFlight;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The local session gate. Not authentication; it binds record methods to
/// one profile the way the hosted app binds views to the signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<SqliteStore>,
    pub session: Option<Session>,
    /// Duplicate-submission guards, one per mutating control.
    pub add_level_guard: InFlight,
    pub add_semester_guard: InFlight,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            store: None,
            session: None,
            add_level_guard: InFlight::default(),
            add_semester_guard: InFlight::default(),
        }
    }
}
