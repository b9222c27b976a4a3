use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::model::NoteColor;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "NotesWidget";
const APP_NAME: &str = "notes-widget";

pub const CONFIG_ENV: &str = "NOTES_WIDGET_CONFIG";

const MIN_TICK_MS: u64 = 10;
const MIN_NOTIFICATION_TTL_MS: u64 = 500;

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dirs.data_local_dir().join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            state_dir,
            log_dir,
        })
    }

    /// Lays every directory out under `root`.
    pub fn rooted_at(root: &Path) -> Self {
        let config_dir = root.join("config");
        let state_dir = root.join("state");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("notes-widget.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.state_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// How long a notification stays on screen.
    pub notification_ttl_ms: u64,
    pub tick_rate_ms: u64,
    /// Color the form selector starts on and resets to after a note is added.
    pub default_color: NoteColor,
    /// Start with the example note in the list.
    pub seed_example: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notification_ttl_ms: 3_000,
            tick_rate_ms: 250,
            default_color: NoteColor::Yellow,
            seed_example: true,
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        if self.tick_rate_ms < MIN_TICK_MS {
            tracing::warn!(
                tick_rate_ms = self.tick_rate_ms,
                "tick rate too small in config, clamping"
            );
            self.tick_rate_ms = MIN_TICK_MS;
        }
        if self.notification_ttl_ms < MIN_NOTIFICATION_TTL_MS {
            tracing::warn!(
                notification_ttl_ms = self.notification_ttl_ms,
                "notification ttl too small in config, clamping"
            );
            self.notification_ttl_ms = MIN_NOTIFICATION_TTL_MS;
        }
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_or_init_writes_defaults_once() -> Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::with_paths(ConfigPaths::rooted_at(temp.path()));

        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert_eq!(cfg.notification_ttl_ms, 3_000);
        assert_eq!(cfg.default_color, NoteColor::Yellow);
        assert!(cfg.seed_example);

        let reloaded = loader.load()?;
        assert_eq!(reloaded.tick_rate_ms, cfg.tick_rate_ms);
        Ok(())
    }

    #[test]
    fn partial_config_keeps_other_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            "default_color = \"purple\"\ntick_rate_ms = 0\n",
        )?;

        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.default_color, NoteColor::Purple);
        assert_eq!(cfg.tick_rate_ms, MIN_TICK_MS);
        assert_eq!(cfg.notification_ttl(), Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn zero_notification_ttl_is_clamped() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "notification_ttl_ms = 0\n")?;

        let cfg = ConfigLoader::with_paths(paths).load()?;
        assert_eq!(cfg.notification_ttl_ms, MIN_NOTIFICATION_TTL_MS);
        assert_eq!(cfg.tick_rate_ms, 250);
        Ok(())
    }

    #[test]
    fn unknown_color_is_a_parse_error() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        paths.ensure_directories()?;
        fs::write(&paths.config_file, "default_color = \"orange\"\n")?;

        let err = ConfigLoader::with_paths(paths)
            .load()
            .expect_err("orange is not in the palette");
        assert!(format!("{err:#}").contains("parsing config toml"));
        Ok(())
    }
}
