use crate::models::{Catalog, GameDescriptor, ReleaseState, Settings};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Prefix of environment variables overriding settings (e.g. `FOESMM_DEBUG_MODE=true`)
pub const ENV_PREFIX: &str = "FOESMM";

/// Configuration manager for the game catalog and user settings.
///
/// Manages two files in the configuration directory:
/// - Catalog (`Games.yaml`): Supported games and their channel lookup keys
/// - Settings (`Settings.yaml`): User preferences and installation overrides
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    catalog_path: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "FOESMM Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            catalog_path: config_dir.join("Games.yaml"),
            settings_path: config_dir.join("Settings.yaml"),
            config_dir,
        })
    }

    /// Load the game catalog.
    ///
    /// # Returns
    /// The loaded Catalog, or the built-in catalog if the file doesn't exist
    pub fn load_catalog(&self) -> Result<Catalog> {
        if !self.catalog_path.exists() {
            tracing::warn!(
                "Catalog file not found at {}, using built-in catalog",
                self.catalog_path
            );
            return Ok(default_catalog());
        }

        let file_contents = fs::read_to_string(&self.catalog_path)
            .with_context(|| format!("Failed to read catalog: {}", self.catalog_path))?;

        let catalog: Catalog = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse catalog: {}", self.catalog_path))?;

        tracing::info!("Loaded {} games from {}", catalog.len(), self.catalog_path);
        Ok(catalog)
    }

    /// Save the game catalog.
    pub fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(catalog).context("Failed to serialize catalog to YAML")?;

        fs::write(&self.catalog_path, yaml_string)
            .with_context(|| format!("Failed to write catalog: {}", self.catalog_path))?;

        tracing::info!("Saved catalog to {}", self.catalog_path);
        Ok(())
    }

    /// Load user settings.
    ///
    /// Values come from `Settings.yaml` (optional) and are overridden by `FOESMM_*`
    /// environment variables. Missing values fall back to [`Settings::default`].
    pub fn load_settings(&self) -> Result<Settings> {
        let settings = config::Config::builder()
            .add_source(
                config::File::new(self.settings_path.as_str(), config::FileFormat::Yaml).required(false),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("Failed to load settings: {}", self.settings_path))?
            .try_deserialize::<Settings>()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save user settings.
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn catalog_path(&self) -> &Utf8Path {
        &self.catalog_path
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

/// Built-in catalog used when no Games.yaml exists.
pub fn default_catalog() -> Catalog {
    Catalog {
        games: vec![
            GameDescriptor::new("fallout3", "Fallout 3", "FO3", 2008, "Fallout3.exe")
                .with_gog_keys(["1454315831", "1248282609"])
                .with_steam_keys(["Steam App 22370", "Steam App 22300"])
                .with_retail_key(r"Bethesda Softworks\Fallout3", "Installed Path")
                .with_cover("fallout3/cover.jpg"),
            GameDescriptor::new("falloutnv", "Fallout: New Vegas", "FNV", 2010, "FalloutNV.exe")
                .with_gog_keys(["1454587428"])
                .with_steam_keys(["Steam App 22380"])
                .with_retail_key(r"Bethesda Softworks\FalloutNV", "Installed Path")
                .with_cover("falloutnv/cover.jpg"),
            GameDescriptor::new("fallout4", "Fallout 4", "FO4", 2015, "Fallout4.exe")
                .with_gog_keys(["1998527297"])
                .with_steam_keys(["Steam App 377160"])
                .with_retail_key(r"Bethesda Softworks\Fallout4", "Installed Path")
                .with_cover("fallout4/cover.jpg"),
            GameDescriptor::new("fallout76", "Fallout 76", "FO76", 2018, "Fallout76.exe")
                .with_steam_keys(["Steam App 1151340"])
                .with_release_state(ReleaseState::EarlyAccess),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().join("FOESMM Data")).unwrap();

        let manager = ConfigManager::new(&config_path).unwrap();
        assert!(manager.config_dir().is_dir());
        assert_eq!(manager.catalog_path(), config_path.join("Games.yaml"));
    }

    #[test]
    fn test_missing_catalog_uses_builtin() {
        let (manager, _temp_dir) = create_test_config_manager();
        let catalog = manager.load_catalog().unwrap();

        let fo3 = catalog.get("fallout3").unwrap();
        assert_eq!(fo3.executable, "Fallout3.exe");
        assert_eq!(fo3.gog_keys[0], "1454315831");
    }

    #[test]
    fn test_save_load_catalog() {
        let (manager, _temp_dir) = create_test_config_manager();

        let catalog = Catalog {
            games: vec![
                GameDescriptor::new("oblivion", "The Elder Scrolls IV: Oblivion", "TES4", 2006, "Oblivion.exe")
                    .with_steam_keys(["Steam App 22330"])
                    .with_retail_key(r"Bethesda Softworks\Oblivion", "Installed Path"),
            ],
        };
        manager.save_catalog(&catalog).unwrap();

        let loaded = manager.load_catalog().unwrap();
        assert_eq!(loaded.games, catalog.games);
    }

    #[test]
    fn test_default_catalog_ids_unique() {
        let catalog = default_catalog();
        let mut ids: Vec<_> = catalog.games.iter().map(|g| g.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }
}
