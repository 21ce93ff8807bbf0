use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Built-in pepper used when no secret is configured. Fine for local
/// development, useless for production; `main` warns when it is active.
pub const DEV_PEPPER: &str = "dev-pepper";

#[derive(Parser, Debug)]
#[command(name = "untold", about = "An anonymous story board backend")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub privacy: PrivacyConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Secret mixed into the IP fingerprint. Overridden by IP_HASH_PEPPER.
    pub pepper: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        // Environment overrides
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.trim().parse() {
                config.server.port = port;
            }
        }
        if let Ok(pepper) = std::env::var("IP_HASH_PEPPER") {
            if !pepper.trim().is_empty() {
                config.privacy.pepper = Some(pepper);
            }
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("untold.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .expect("Could not determine home directory")
                .join(".untold")
        })
    }

    pub fn db_path(&self) -> &PathBuf {
        self.database.path.as_ref().unwrap()
    }

    /// The pepper fed into the IP fingerprint.
    pub fn ip_hash_pepper(&self) -> &str {
        match &self.privacy.pepper {
            Some(pepper) if !pepper.trim().is_empty() => pepper,
            _ => DEV_PEPPER,
        }
    }

    /// True when no real secret is configured and the built-in
    /// development pepper is in effect.
    pub fn uses_dev_pepper(&self) -> bool {
        self.ip_hash_pepper() == DEV_PEPPER
    }
}
