//! Bot configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `DND_ROLLER_*` environment variables (nested keys split on `__`, e.g.
//! `DND_ROLLER_LIMITS__MAX_ATTACKERS=50`).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::AttackMode;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "DND_ROLLER_";

/// Default location of the TOML config file
pub const DEFAULT_CONFIG_PATH: &str = "config/dnd-roller.toml";

/// Default location of the dotenv file holding the token
pub const DEFAULT_DOTENV_PATH: &str = "config/.env";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error(
        "bot token is not set. Set the DND_ROLLER_TOKEN environment variable \
         or add it to config/.env"
    )]
    MissingToken,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// JSON creature table
    pub creatures_path: PathBuf,
    /// Token clients must present to connect
    pub token: Option<String>,
    pub commands: CommandNames,
    pub attacks: AttackKeywords,
    pub limits: Limits,
}

/// Command prefix and verbs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandNames {
    pub prefix: String,
    pub attack: String,
    pub roll: String,
    pub creatures: String,
    pub help: String,
}

impl Default for CommandNames {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            attack: "attack".to_string(),
            roll: "roll".to_string(),
            creatures: "creatures".to_string(),
            help: "help".to_string(),
        }
    }
}

/// Words accepted for each attack mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackKeywords {
    pub standard: String,
    pub advantage: String,
    pub disadvantage: String,
}

impl AttackKeywords {
    /// Match a keyword, ignoring case
    pub fn parse(&self, word: &str) -> Option<AttackMode> {
        if word.eq_ignore_ascii_case(&self.standard) {
            Some(AttackMode::Standard)
        } else if word.eq_ignore_ascii_case(&self.advantage) {
            Some(AttackMode::Advantage)
        } else if word.eq_ignore_ascii_case(&self.disadvantage) {
            Some(AttackMode::Disadvantage)
        } else {
            None
        }
    }

    pub fn keyword(&self, mode: AttackMode) -> &str {
        match mode {
            AttackMode::Standard => &self.standard,
            AttackMode::Advantage => &self.advantage,
            AttackMode::Disadvantage => &self.disadvantage,
        }
    }
}

impl Default for AttackKeywords {
    fn default() -> Self {
        Self {
            standard: "standard".to_string(),
            advantage: "advantage".to_string(),
            disadvantage: "disadvantage".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest attacker count a single command may request
    pub max_attackers: u32,
    /// Per-attacker rows shown before the report is truncated
    pub display_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_attackers: 100,
            display_limit: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            creatures_path: PathBuf::from("config/creatures.json"),
            token: None,
            commands: CommandNames::default(),
            attacks: AttackKeywords::default(),
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Defaults, then `file` (if it exists), then the environment
    pub fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration, reading `config/.env` into the environment first
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::from_path(DEFAULT_DOTENV_PATH);
        let file = file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        Self::extract(Self::figment(file))
    }

    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::Figment(Box::new(e)))
    }

    /// The client token; the server refuses to start without one
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ConfigError::MissingToken),
        }
    }
}
