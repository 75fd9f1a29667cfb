use multiverse_core::{Address, Operation};
use multiverse_server::{RoleTable, WorldSpec};
use multiverse_world::DEFAULT_WORLD_SIZE;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/multiverse.toml";

/// Host settings read at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MultiverseConfig {
    /// Edge length of square worlds that don't set their own.
    pub square_world_size: u64,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Retain at most this many events between drains; unbounded when absent.
    pub event_journal_capacity: Option<usize>,
    /// Identity holding every role; also bootstraps the worlds.
    pub admin: Address,
    /// Extra role grants.
    pub roles: Vec<RoleGrant>,
    /// Worlds created at startup, in order.
    pub worlds: Vec<WorldSpec>,
}

/// Operations granted to one caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoleGrant {
    pub caller: Address,
    pub operations: Vec<Operation>,
}

impl Default for MultiverseConfig {
    fn default() -> Self {
        Self {
            square_world_size: DEFAULT_WORLD_SIZE,
            log_filter: "warn".to_string(),
            event_journal_capacity: None,
            admin: Address(1),
            roles: Vec::new(),
            worlds: Vec::new(),
        }
    }
}

impl MultiverseConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|err| {
                warn!("Failed to parse {}: {err}. Using defaults", path.display());
                Self::default()
            }),
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!(
                        "Multiverse config not found at {}. Using defaults",
                        path.display()
                    );
                }
                Self::default()
            }
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Role table: the admin holds everything, then the listed grants.
    pub fn role_table(&self) -> RoleTable {
        let mut roles = RoleTable::with_admin(self.admin);
        for grant in &self.roles {
            for operation in &grant.operations {
                roles.grant(*operation, grant.caller);
            }
        }
        roles
    }
}
