use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::commands::OutputFormat;
use crate::error::{Result, ScrubError};

const APP_DIR: &str = "curlscrub";
const CONFIG_FILE: &str = "curlscrub.toml";
const RC_FILE: &str = ".curlscrubrc";
const DATABASE_FILE: &str = "curlscrub.db";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: Option<StoreConfig>,
    #[serde(default)]
    pub clean: Option<CleanConfig>,
    #[serde(default)]
    pub history: Option<HistoryConfig>,
    #[serde(default)]
    pub log: Option<LogConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StoreConfig {
    pub database: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CleanConfig {
    pub record_history: Option<bool>,
    pub multiline: Option<bool>,
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HistoryConfig {
    pub limit: Option<usize>,
    pub max_entries: Option<usize>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LogConfig {
    pub level: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ResolvedConfig {
    pub store: ResolvedStoreConfig,
    pub clean: ResolvedCleanConfig,
    pub history: ResolvedHistoryConfig,
    pub log: ResolvedLogConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResolvedStoreConfig {
    pub database: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResolvedCleanConfig {
    pub record_history: bool,
    pub multiline: bool,
    pub format: OutputFormat,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResolvedHistoryConfig {
    pub limit: usize,
    pub max_entries: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResolvedLogConfig {
    pub level: String,
}

impl Default for ResolvedStoreConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
        }
    }
}

impl Default for ResolvedCleanConfig {
    fn default() -> Self {
        Self {
            record_history: true,
            multiline: false,
            format: OutputFormat::Text,
        }
    }
}

impl Default for ResolvedHistoryConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            max_entries: 500,
        }
    }
}

impl Default for ResolvedLogConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::DEFAULT_LEVEL.to_string(),
        }
    }
}

impl ResolvedConfig {
    pub fn from_config(config: &Config) -> Self {
        let mut resolved = Self::default();
        if let Some(cfg) = &config.store {
            resolved.store.apply(cfg);
        }
        if let Some(cfg) = &config.clean {
            resolved.clean.apply(cfg);
        }
        if let Some(cfg) = &config.history {
            resolved.history.apply(cfg);
        }
        if let Some(cfg) = &config.log {
            resolved.log.apply(cfg);
        }
        resolved
    }

    /// Database path, with `--db` taking precedence over the config file.
    pub fn database(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| self.store.database.clone()).ok_or_else(|| {
            ScrubError::InvalidArgs(
                "No database path; pass --db or set [store] database in the config"
                    .to_string(),
            )
        })
    }
}

impl ResolvedStoreConfig {
    fn apply(&mut self, cfg: &StoreConfig) {
        if let Some(value) = cfg.database.clone() {
            self.database = Some(value);
        }
    }
}

impl ResolvedCleanConfig {
    fn apply(&mut self, cfg: &CleanConfig) {
        if let Some(value) = cfg.record_history {
            self.record_history = value;
        }
        if let Some(value) = cfg.multiline {
            self.multiline = value;
        }
        if let Some(value) = cfg.format {
            self.format = value;
        }
    }
}

impl ResolvedHistoryConfig {
    fn apply(&mut self, cfg: &HistoryConfig) {
        if let Some(value) = cfg.limit {
            self.limit = value;
        }
        if let Some(value) = cfg.max_entries {
            self.max_entries = value;
        }
    }
}

impl ResolvedLogConfig {
    fn apply(&mut self, cfg: &LogConfig) {
        if let Some(value) = cfg.level.clone() {
            self.level = value;
        }
    }
}

pub fn load_config() -> Result<Config> {
    let mut config = Config::default();
    let paths = config_search_paths()?;
    for path in paths {
        if !path.exists() {
            continue;
        }
        let contents = fs::read_to_string(&path)?;
        let parsed = parse_config(&contents, &path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        merge_config(&mut config, parsed);
    }
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    toml::from_str(contents).map_err(|err| {
        ScrubError::InvalidArgs(format!(
            "Failed to parse config {}: {}",
            path.display(),
            err
        ))
    })
}

fn merge_config(base: &mut Config, other: Config) {
    merge_section(&mut base.store, other.store, StoreConfig::merge);
    merge_section(&mut base.clean, other.clean, CleanConfig::merge);
    merge_section(&mut base.history, other.history, HistoryConfig::merge);
    merge_section(&mut base.log, other.log, LogConfig::merge);
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
    if let Some(other_section) = other {
        match base {
            Some(existing) => merge(existing, other_section),
            None => *base = Some(other_section),
        }
    }
}

impl StoreConfig {
    fn merge(&mut self, other: StoreConfig) {
        merge_opt(&mut self.database, other.database);
    }
}

impl CleanConfig {
    fn merge(&mut self, other: CleanConfig) {
        merge_opt(&mut self.record_history, other.record_history);
        merge_opt(&mut self.multiline, other.multiline);
        merge_opt(&mut self.format, other.format);
    }
}

impl HistoryConfig {
    fn merge(&mut self, other: HistoryConfig) {
        merge_opt(&mut self.limit, other.limit);
        merge_opt(&mut self.max_entries, other.max_entries);
    }
}

impl LogConfig {
    fn merge(&mut self, other: LogConfig) {
        merge_opt(&mut self.level, other.level);
    }
}

fn merge_opt<T>(base: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *base = other;
    }
}

fn config_search_paths() -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    if let Some(home) = home_dir() {
        if let Some(config_home) = config_home_dir(&home) {
            paths.push(config_home.join(APP_DIR).join(CONFIG_FILE));
        }
        if let Some(appdata) = env::var_os("APPDATA") {
            paths.push(PathBuf::from(appdata).join(APP_DIR).join(CONFIG_FILE));
        }
        paths.push(home.join(RC_FILE));
    }

    if let Ok(cwd) = env::current_dir() {
        let mut dirs = Vec::new();
        let mut current: Option<&Path> = Some(cwd.as_path());
        while let Some(dir) = current {
            dirs.push(dir.to_path_buf());
            current = dir.parent();
        }
        dirs.reverse();
        for dir in dirs {
            paths.push(dir.join(RC_FILE));
            paths.push(dir.join(CONFIG_FILE));
        }
    }

    Ok(paths)
}

fn config_home_dir(home: &Path) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg));
    }
    Some(home.join(".config"))
}

fn data_home_dir(home: &Path) -> PathBuf {
    match env::var_os("XDG_DATA_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => home.join(".local").join("share"),
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
}

/// `$XDG_DATA_HOME/curlscrub/curlscrub.db`, falling back to
/// `~/.local/share/curlscrub/curlscrub.db`.
pub fn default_database_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(data_home_dir(&home).join(APP_DIR).join(DATABASE_FILE))
}

pub fn render_config(config: &ResolvedConfig) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|err| ScrubError::InvalidArgs(format!("Failed to render config: {}", err)))
}
