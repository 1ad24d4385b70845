use std::path::{Path, PathBuf};

use {
    socialite_common::{SocialError, SocialResult},
    tracing::{debug, info},
};

use crate::schema::SocialiteConfig;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "SOCIALITE_CONFIG";

/// File names probed during discovery, in priority order.
const CONFIG_FILENAMES: &[&str] = &[
    "socialite.toml",
    "socialite.yaml",
    "socialite.yml",
    "socialite.json",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Pick a format from a file extension; unknown extensions are rejected.
    pub fn from_path(path: &Path) -> SocialResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(SocialError::config(format!(
                "unsupported config file extension: {}",
                path.display()
            ))),
        }
    }
}

/// Parse and validate config text.
pub fn parse_config(raw: &str, format: ConfigFormat) -> SocialResult<SocialiteConfig> {
    let config: SocialiteConfig = match format {
        ConfigFormat::Toml => toml::from_str(raw).map_err(|e| SocialError::config(e.to_string()))?,
        ConfigFormat::Yaml => {
            serde_yaml::from_str(raw).map_err(|e| SocialError::config(e.to_string()))?
        },
        ConfigFormat::Json => {
            serde_json::from_str(raw).map_err(|e| SocialError::config(e.to_string()))?
        },
    };
    config.validate()?;
    Ok(config)
}

/// Load a config file, choosing the parser from its extension.
pub fn load_config(path: &Path) -> SocialResult<SocialiteConfig> {
    let format = ConfigFormat::from_path(path)?;
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SocialError::config(format!("failed to read {}: {e}", path.display())))?;
    let config = parse_config(&raw, format)?;
    info!(
        path = %path.display(),
        providers = ?config.configured_providers(),
        "loaded socialite config"
    );
    Ok(config)
}

/// Locate a config file: `$SOCIALITE_CONFIG`, then `cwd`, then the user config dir.
pub fn find_config_file(cwd: &Path) -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV)
        && !explicit.is_empty()
    {
        return Some(PathBuf::from(explicit));
    }

    let mut dirs = vec![cwd.to_path_buf()];
    if let Some(project) = directories::ProjectDirs::from("", "", "socialite") {
        dirs.push(project.config_dir().to_path_buf());
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

/// Find and load the config. No file at all yields an empty config.
pub fn discover_and_load(cwd: &Path) -> SocialResult<SocialiteConfig> {
    match find_config_file(cwd) {
        Some(path) => load_config(&path),
        None => {
            debug!(cwd = %cwd.display(), "no socialite config found, using defaults");
            Ok(SocialiteConfig::default())
        },
    }
}
