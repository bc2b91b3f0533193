//! Configuration discovery and cache opening shared by all commands.

use std::path::{Path, PathBuf};

use snip_cache::SnippetCache;
use snip_config::{SnipConfig, CONFIG_FILE};
use tracing::{debug, info};

use crate::GlobalArgs;

/// Effective settings for one invocation.
pub struct Settings {
    /// The parsed configuration.
    pub config: SnipConfig,
    /// Cache directory with relative paths resolved.
    pub cache_dir: PathBuf,
}

/// Loads the configuration named by `--config`, or `./snip.toml` if present.
///
/// Relative cache directories are resolved against the directory holding the
/// configuration file. Without any file the defaults apply and the cache
/// directory is relative to the working directory.
pub fn load_settings(global: &GlobalArgs) -> Result<Settings, Box<dyn std::error::Error>> {
    let path = match &global.config {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("configuration file not found: {}", path.display()).into());
            }
            Some(path.clone())
        }
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            local.is_file().then_some(local)
        }
    };

    match path {
        Some(path) => {
            let config = snip_config::load_config(&path)?;
            let base = path.parent().unwrap_or(Path::new(""));
            let cache_dir = base.join(&config.cache.dir);
            debug!(config = %path.display(), cache = %cache_dir.display(), "loaded configuration");
            Ok(Settings { config, cache_dir })
        }
        None => {
            info!("no {CONFIG_FILE} found, using defaults");
            let config = SnipConfig::default();
            let cache_dir = config.cache.dir.clone();
            Ok(Settings { config, cache_dir })
        }
    }
}

/// Opens the configured cache with the configured index layout.
pub fn open_cache(settings: &Settings) -> Result<SnippetCache, Box<dyn std::error::Error>> {
    let cache = SnippetCache::open(&settings.cache_dir)?.with_layout(settings.config.layout());
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(config: Option<PathBuf>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config,
        }
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(&global(Some(dir.path().join("absent.toml"))))
            .err()
            .unwrap();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn cache_dir_is_relative_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[cache]\ndir = \"store\"\n").unwrap();

        let settings = load_settings(&global(Some(path))).unwrap();
        assert_eq!(settings.cache_dir, dir.path().join("store"));
    }

    #[test]
    fn absolute_cache_dir_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("elsewhere");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, format!("[cache]\ndir = {:?}\n", cache.display().to_string())).unwrap();

        let settings = load_settings(&global(Some(path))).unwrap();
        assert_eq!(settings.cache_dir, cache);
    }

    #[test]
    fn open_cache_on_fresh_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            config: SnipConfig::default(),
            cache_dir: dir.path().join("cache"),
        };
        let cache = open_cache(&settings).unwrap();
        assert!(cache.is_empty());
    }
}
