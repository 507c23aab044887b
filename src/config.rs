use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::routing::rules::RouteTable;
use crate::routing::structure::PostStructure;

const DEFAULT_BASE: &str = "shows";
const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub content_path: Option<PathBuf>,
    pub home_url: Option<String>,
    pub base: Option<String>,
    pub trailing_slash: Option<bool>,
    pub blog_structure: Option<String>,
    pub listen: Option<String>,
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub content_path: PathBuf,
    /// Prefix for generated permalinks, without a trailing slash. Empty means bare paths.
    pub home_url: String,
    /// First path segment of every show URL.
    pub base: String,
    pub trailing_slash: bool,
    pub blog_structure: PostStructure,
    pub listen: SocketAddr,
}

impl Settings {
    /// Reads the config file (explicit path or the default location), then applies
    /// environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                read_config_file(path)?
            }
            None => {
                let path = get_config_path();
                if path.exists() {
                    read_config_file(&path)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        Self::build(apply_env(file))
    }

    pub fn build(file: ConfigFile) -> Result<Self> {
        let base = file
            .base
            .as_deref()
            .unwrap_or(DEFAULT_BASE)
            .trim_matches('/')
            .to_string();
        if base.is_empty() || base.contains('/') {
            bail!("base must be a single path segment, got {base:?}");
        }

        let blog_structure = match file.blog_structure {
            Some(structure) => PostStructure::parse(&structure)?,
            None => PostStructure::parse(&format!(
                "{base}/%show%/blog/%year%/%monthnum%/%postname%"
            ))?,
        };

        let listen = file.listen.as_deref().unwrap_or(DEFAULT_LISTEN);
        let listen: SocketAddr = listen
            .parse()
            .with_context(|| format!("Invalid listen address {listen:?}"))?;

        Ok(Self {
            content_path: file
                .content_path
                .unwrap_or_else(|| get_config_dir_path().join("content.json")),
            home_url: file
                .home_url
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            base,
            trailing_slash: file.trailing_slash.unwrap_or(true),
            blog_structure,
            listen,
        })
    }

    pub fn route_table(&self) -> Result<RouteTable> {
        RouteTable::new(&self.base, &self.blog_structure)
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

fn apply_env(mut file: ConfigFile) -> ConfigFile {
    if let Ok(path) = env::var("SHOW_PERMALINKS_CONTENT") {
        file.content_path = Some(PathBuf::from(path));
    }
    if let Ok(url) = env::var("SHOW_PERMALINKS_HOME_URL") {
        file.home_url = Some(url);
    }
    file
}

fn get_config_dir_path() -> PathBuf {
    xdir::config()
        .map(|path| path.join("show-permalinks"))
        // If the standard path could not be found (e.g.`$HOME` is not set),
        // default to the current directory.
        .unwrap_or_default()
}

fn get_config_path() -> PathBuf {
    get_config_dir_path().join("config.toml")
}
