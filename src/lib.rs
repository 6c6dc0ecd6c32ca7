// foesmm-core - Game installation discovery and content tracking for Fallout titles
//
// This is the library crate containing the game model and the services behind it.
// The binary crate (main.rs) provides a command-line detection report.

pub mod config;
pub mod game;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use game::content::{ContentError, ContentLinkModel};
pub use game::{ContentRefresh, GameInstance, GameStatus, NoRefresh};
pub use models::{Archive, Catalog, GameDescriptor, Plugin, ReleaseState, Settings};
pub use state::{GameEvent, GameManager, GameManagerError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
