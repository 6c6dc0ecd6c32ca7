//! Services module - Installation discovery and game folder inspection.
//!
//! The services are framework-agnostic building blocks used by [`crate::game::GameInstance`]:
//!
//! - [`InstallResolver`]: Resolves a game's installation folder. An explicit path wins, then a
//!   previously stored path, then the GOG, Steam and retail channels in that order.
//! - [`InstallLookup`]: The key-value store the channels are read from. [`RegistryLookup`] reads
//!   the Windows registry, [`SnapshotLookup`] serves a fixed table (tests, non-Windows hosts) and
//!   [`ChainLookup`] tries several stores in turn.
//! - [`is_valid_game_folder`]: A folder is valid when it contains the game executable.
//! - [`inspect`]: Classifies an executable image as 32-bit, 32-bit large address aware or 64-bit.
//! - [`VersionProbe`]: Reads the file version of the game executable.
//! - [`DataFolderScanner`]: Populates the plugin and archive lists from the `Data` folder.

pub mod image;
pub mod lookup;
pub mod resolver;
pub mod scanner;
pub mod validator;
pub mod version;

pub use image::{AddressingMode, inspect};
pub use lookup::{ChainLookup, InstallLookup, RegistryLookup, SnapshotLookup};
pub use resolver::{Channel, InstallResolver, InstallSource, Resolution};
pub use scanner::{DataFolderScanner, read_load_order};
pub use validator::is_valid_game_folder;
pub use version::{FixedFileInfoProbe, NoVersion, VersionProbe};
