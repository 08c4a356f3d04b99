//! The `herald.config.ron` configuration file

use std::path::{Path, PathBuf};

use ahash::AHashSet;
use herald_common::{ChatId, ForwardMode, audit::AuditConfig};
use herald_delivery::DeliveryConfig;
use herald_rules::{RuleConfig, RuleError, RuleSet, normalize_chat_id};
use herald_spool::SpoolConfig;
use ron::{Options, extensions::Extensions};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_ENV: &str = "HERALD_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleError),

    #[error("HERALD_CONFIG points to non-existent file: {}", .0.display())]
    MissingEnvPath(PathBuf),

    #[error("No configuration file found. Tried:\n{0}")]
    NotFound(String),
}

/// A chat whose messages are matched against the rules
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitoredChat {
    pub id: ChatId,
    #[serde(default)]
    pub name: String,
}

/// Top level configuration
///
/// ```ron
/// Herald (
///     spool: File(path: "/var/spool/herald"),
///     delivery: (idle_poll_secs: 5, retry: (max_retries: 5)),
///     forward_mode: copy,
///     monitored_chats: [(id: -100123, name: "news")],
///     rules: [
///         (name: "urgent", keywords: ["urgent"], target_chat_ids: [-100111]),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Herald {
    #[serde(default)]
    pub spool: SpoolConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub forward_mode: ForwardMode,
    #[serde(default)]
    pub monitored_chats: Vec<MonitoredChat>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// The parts of the configuration that can be swapped at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    pub rules: RuleSet,
    pub monitored: AHashSet<ChatId>,
}

impl Herald {
    /// Parse a configuration document.
    ///
    /// # Errors
    /// If the document is not valid RON for this configuration.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        Ok(Options::default()
            .with_default_extension(Extensions::UNWRAP_VARIANT_NEWTYPES | Extensions::IMPLICIT_SOME)
            .from_str(source)?)
    }

    /// Read and parse the configuration file at `path`.
    ///
    /// # Errors
    /// If the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&source)
    }

    /// Validate the rules and work out which chats to monitor.
    ///
    /// Chat ids are normalized to their marked form. A monitored chat that
    /// is also a rule target is dropped, since forwarding into it would
    /// feed the relay its own output.
    ///
    /// # Errors
    /// Returns the first invalid rule.
    pub fn routing(&self) -> Result<Routing, ConfigError> {
        let rules = RuleSet::from_configs(self.rules.iter().cloned())?;
        let targets = rules.all_targets();

        let monitored = self
            .monitored_chats
            .iter()
            .filter_map(|chat| {
                let id = normalize_chat_id(chat.id);
                if targets.contains(&id) {
                    tracing::warn!(
                        chat_id = id,
                        name = %chat.name,
                        "Monitored chat is also a rule target, ignoring it"
                    );
                    None
                } else {
                    Some(id)
                }
            })
            .collect();

        Ok(Routing { rules, monitored })
    }
}

/// Find the configuration file using the following precedence:
/// 1. `explicit`, usually the `--config` argument
/// 2. `HERALD_CONFIG` environment variable
/// 3. ./herald.config.ron (current working directory)
/// 4. /etc/herald/herald.config.ron (system-wide config)
///
/// # Errors
/// If an explicitly named file does not exist, or no candidate exists.
pub fn find_config_file(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(path)
        } else {
            Err(ConfigError::Read {
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
                path,
            })
        };
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::MissingEnvPath(path));
    }

    let default_paths = [
        PathBuf::from("./herald.config.ron"),
        PathBuf::from("/etc/herald/herald.config.ron"),
    ];

    if let Some(path) = default_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::NotFound(format!(
        "  - --config argument\n  - {CONFIG_ENV} environment variable\n{paths_tried}"
    )))
}
