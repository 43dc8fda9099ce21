//! Application configuration.
//!
//! Everything is read from the environment once at startup (after an
//! optional `.env` file is loaded) and stays fixed for the process lifetime.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use checkin_core::Credentials;

/// Default storage directory when `DATA_DIR` is unset
const DEFAULT_DATA_DIR: &str = "./data";

/// Default listen port when `PORT` is unset
const DEFAULT_PORT: u16 = 8080;

pub struct Config {
    pub username: String,
    pub password: String,
    pub data_dir: PathBuf,
    pub reset: bool,
    pub port: u16,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let username = non_empty("USERNAME").ok_or_else(|| anyhow!("USERNAME is not set"))?;
        let password = non_empty("PASSWORD").ok_or_else(|| anyhow!("PASSWORD is not set"))?;

        let data_dir = non_empty("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let reset = non_empty("RESET")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", raw))?,
            None => DEFAULT_PORT,
        };

        let log_dir = non_empty("LOG_DIR").map(PathBuf::from);

        Ok(Self {
            username,
            password,
            data_dir,
            reset,
            port,
            log_dir,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("USERNAME", "sam"), ("PASSWORD", "pw")]).unwrap();
        assert_eq!(config.username, "sam");
        assert_eq!(config.password, "pw");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(!config.reset);
        assert_eq!(config.port, 8080);
        assert!(config.log_dir.is_none());
        assert_eq!(config.bind_address().to_string(), "0.0.0.0:8080");
        assert!(config.credentials().matches("sam", "pw"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("USERNAME", "sam"),
            ("PASSWORD", "pw"),
            ("DATA_DIR", "/var/lib/checkin"),
            ("RESET", "TRUE"),
            ("PORT", "9000"),
            ("LOG_DIR", "/var/log/checkin"),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/checkin"));
        assert!(config.reset);
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/checkin")));
    }

    #[test]
    fn test_reset_only_on_true() {
        let config = load(&[("USERNAME", "a"), ("PASSWORD", "b"), ("RESET", "yes")]).unwrap();
        assert!(!config.reset);
    }

    #[test]
    fn test_missing_credentials_fail() {
        assert!(load(&[("PASSWORD", "pw")]).is_err());
        assert!(load(&[("USERNAME", "sam")]).is_err());
        assert!(load(&[("USERNAME", ""), ("PASSWORD", "pw")]).is_err());
    }

    #[test]
    fn test_bad_port_fails() {
        let err = load(&[("USERNAME", "a"), ("PASSWORD", "b"), ("PORT", "http")])
            .err()
            .unwrap();
        assert!(err.to_string().contains("PORT"));
    }
}
