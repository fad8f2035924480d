//! Storage selection for the CLI: the local database or a remote server.
//!
//! Either way the state moves as one whole tree; every mutation is written
//! back in full.

use anyhow::Result;

use timeline_core::models::AppState;
use timeline_core::Database;

use crate::client::RemoteStore;
use crate::config::StoreArgs;

pub enum Backend {
    Local(Database),
    Remote(RemoteStore),
}

impl Backend {
    pub fn connect(args: &StoreArgs) -> Result<Self> {
        if let Some(url) = &args.remote {
            tracing::debug!("Using remote state at {}", url);
            return Ok(Self::Remote(RemoteStore::new(url)));
        }
        let db = match &args.db {
            Some(path) => Database::open(path)?,
            None => Database::open_default()?,
        };
        db.migrate()?;
        Ok(Self::Local(db))
    }

    pub async fn load(&self) -> Result<AppState> {
        match self {
            Self::Local(db) => db.load_state(),
            Self::Remote(remote) => remote.fetch_state().await,
        }
    }

    pub async fn save(&self, state: &AppState) -> Result<()> {
        match self {
            Self::Local(db) => db.save_state(state),
            Self::Remote(remote) => remote.save_state(state).await,
        }
    }
}
