//! Installation folder validation.
//!
//! A folder is a valid installation of a game when the game's executable exists as a
//! file at `folder/executable`. No version or content checks are performed; this single
//! predicate gates both auto-detection and explicit instantiation.

use camino::Utf8Path;

/// Returns true iff `path` is present and `path/executable` is an existing file.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use foesmm_core::services::is_valid_game_folder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
/// assert!(!is_valid_game_folder(Some(&path), "Fallout3.exe"));
///
/// std::fs::write(path.join("Fallout3.exe"), b"MZ").unwrap();
/// assert!(is_valid_game_folder(Some(&path), "Fallout3.exe"));
/// assert!(!is_valid_game_folder(None, "Fallout3.exe"));
/// ```
pub fn is_valid_game_folder(path: Option<&Utf8Path>, executable: &str) -> bool {
    let Some(path) = path else {
        return false;
    };

    let valid = path.join(executable).is_file();
    tracing::trace!("Validated game folder {} for {}: {}", path, executable, valid);
    valid
}
