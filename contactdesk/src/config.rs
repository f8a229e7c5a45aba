use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Default, Parser)]
#[command(
    name = "contactdesk",
    version,
    about = "Contact-form and user account backend over MongoDB"
)]
pub struct Cli {
    /// Full listen address; overrides --port.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    #[arg(long, env = "PORT", value_name = "PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "MONGODB_URI", value_name = "URI", hide_env_values = true)]
    pub mongodb_uri: Option<String>,

    /// Database name; defaults to the one in the connection string.
    #[arg(long, env = "MONGODB_DATABASE", value_name = "NAME")]
    pub database: Option<String>,

    #[arg(long, env = "JWT_SECRET", value_name = "SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Keep records in process memory instead of MongoDB.
    #[arg(long)]
    pub in_memory: bool,

    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub mongodb_uri: Option<String>,
    pub database: Option<String>,
    pub jwt_secret: Option<String>,
    pub in_memory: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind", &self.bind)
            .field("mongodb_uri", &self.mongodb_uri.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("in_memory", &self.in_memory)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    bind: Option<SocketAddr>,
    port: Option<u16>,
    #[serde(alias = "mongodb_url")]
    mongodb_uri: Option<String>,
    database: Option<String>,
    jwt_secret: Option<String>,
    in_memory: Option<bool>,
}

impl AppConfig {
    /// Flags and environment (merged by clap) win over the config file, which
    /// wins over defaults.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let from_file = read_file_config(cli.config.as_deref())?;

        let port = cli.port.or(from_file.port).unwrap_or(DEFAULT_PORT);
        let bind = cli
            .bind
            .or(from_file.bind)
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], port)));

        Ok(Self {
            bind,
            mongodb_uri: non_empty(cli.mongodb_uri.or(from_file.mongodb_uri)),
            database: non_empty(cli.database.or(from_file.database)),
            jwt_secret: non_empty(cli.jwt_secret.or(from_file.jwt_secret)),
            in_memory: cli.in_memory || from_file.in_memory.unwrap_or(false),
        })
    }
}

/// Load `KEY=value` lines into the process environment before the command line
/// is parsed. With no path, `.env` is searched for from the working directory
/// upwards. Variables already set are left alone; a missing file is not an error.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::net::SocketAddr;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{load_env_file, AppConfig, Cli, ConfigError};

    #[test]
    fn defaults_listen_on_port_5000() -> Result<()> {
        let config = AppConfig::from_cli(Cli::default())?;

        assert_eq!(config.bind, SocketAddr::from(([0, 0, 0, 0], 5000)));
        assert!(config.mongodb_uri.is_none());
        assert!(config.jwt_secret.is_none());
        assert!(!config.in_memory);
        Ok(())
    }

    #[test]
    fn port_applies_when_bind_is_absent() -> Result<()> {
        let config = AppConfig::from_cli(Cli {
            port: Some(8080),
            ..Cli::default()
        })?;

        assert_eq!(config.bind.port(), 8080);
        Ok(())
    }

    #[test]
    fn flags_override_config_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("contactdesk.toml");
        std::fs::write(
            &path,
            "port = 7000\nmongodb_uri = \"mongodb://file:27017/app\"\njwt_secret = \"from-file\"\n",
        )?;

        let config = AppConfig::from_cli(Cli {
            jwt_secret: Some(String::from("from-flag")),
            config: Some(path),
            ..Cli::default()
        })?;

        assert_eq!(config.bind.port(), 7000);
        assert_eq!(config.mongodb_uri.as_deref(), Some("mongodb://file:27017/app"));
        assert_eq!(config.jwt_secret.as_deref(), Some("from-flag"));
        Ok(())
    }

    #[test]
    fn blank_secret_counts_as_missing() -> Result<()> {
        let config = AppConfig::from_cli(Cli {
            jwt_secret: Some(String::from("  ")),
            ..Cli::default()
        })?;

        assert!(config.jwt_secret.is_none());
        Ok(())
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contactdesk.toml");
        std::fs::write(&path, "prot = 1\n").unwrap();

        let result = AppConfig::from_cli(Cli {
            config: Some(path),
            ..Cli::default()
        });

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn debug_output_redacts_secrets() -> Result<()> {
        let config = AppConfig::from_cli(Cli {
            jwt_secret: Some(String::from("very-secret")),
            mongodb_uri: Some(String::from("mongodb://user:pw@host/db")),
            ..Cli::default()
        })?;

        let rendered = format!("{config:?}");

        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("pw@host"));
        Ok(())
    }

    #[test]
    fn env_file_values_reach_the_environment() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "CONTACTDESK_TEST_ENV_FILE_VALUE=from-file\nCONTACTDESK_TEST_ENV_FILE_KEPT=from-file\n",
        )?;
        std::env::set_var("CONTACTDESK_TEST_ENV_FILE_KEPT", "from-process");

        let loaded = load_env_file(Some(&path))?;

        assert_eq!(loaded.as_deref(), Some(path.as_path()));
        assert_eq!(std::env::var("CONTACTDESK_TEST_ENV_FILE_VALUE")?, "from-file");
        assert_eq!(std::env::var("CONTACTDESK_TEST_ENV_FILE_KEPT")?, "from-process");
        Ok(())
    }

    #[test]
    fn missing_env_file_is_skipped() -> Result<()> {
        let dir = tempdir()?;

        let loaded = load_env_file(Some(&dir.path().join(".env")))?;

        assert!(loaded.is_none());
        Ok(())
    }
}
