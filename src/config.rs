//! Command line and environment configuration.

use std::path::PathBuf;

use clap::Args;

use crate::commands::Target;

/// Settings for the HTTP server.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Port for the HTTP API
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// JSON file holding the shared state
    #[arg(long, env = "STATE_FILE", default_value = "data/state.json")]
    pub state_file: PathBuf,

    /// Directory uploaded files are written to
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Directory with the static front-end bundle
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,
}

impl ServeArgs {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the CLI reads and writes state.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Base URL of a running timeline server (uses its /api/state)
    #[arg(long, env = "TIMELINE_REMOTE", conflicts_with = "db")]
    pub remote: Option<String>,

    /// Local database file (defaults to the platform data directory)
    #[arg(long, env = "TIMELINE_DB")]
    pub db: Option<PathBuf>,
}

/// Where a note, file or checklist item goes.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Project id (defaults to the selected project)
    #[arg(long)]
    pub project: Option<String>,

    /// Phase id (defaults to the selected phase)
    #[arg(long, conflicts_with = "project_level")]
    pub phase: Option<String>,

    /// Attach to the project itself instead of a phase
    #[arg(long)]
    pub project_level: bool,
}

impl TargetArgs {
    pub fn target(&self) -> Target<'_> {
        let project = self.project.as_deref();
        if self.project_level {
            Target::Project(project)
        } else {
            Target::Phase {
                project,
                phase: self.phase.as_deref(),
            }
        }
    }
}
