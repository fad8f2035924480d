//! Core library for Timeline.
//!
//! This crate provides the project/phase/task model, the state normalizer,
//! the derived views (progress, deadlines, focus items), the filter engine
//! and the storage backends, independent of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use timeline_core::db::Database;
//! use timeline_core::views;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let state = db.load_state()?;
//! let focus = views::top_focus_items(&state.projects, views::today());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod filter;
pub mod id;
pub mod models;
pub mod normalize;
pub mod store;
pub mod views;

// Re-export commonly used types at crate root
pub use db::Database;
pub use filter::Filters;
pub use models::AppState;
pub use normalize::{normalize, normalize_value, parse_state};
pub use store::StateFile;
