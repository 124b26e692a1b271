use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use tracing::{info, warn};

/// Secret used when `RALLY_SESSION_SECRET` is unset. Fine for local runs only.
pub const DEV_SESSION_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub cookie_secure: bool,
    pub session_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_secret = lookup("RALLY_SESSION_SECRET")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                warn!("RALLY_SESSION_SECRET not set, using the development secret");
                DEV_SESSION_SECRET.to_string()
            });

        Ok(Self {
            host: lookup("RALLY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_var(&lookup, "RALLY_PORT", 5000)?,
            session_secret,
            cookie_secure: parse_flag(&lookup, "RALLY_COOKIE_SECURE", false)?,
            session_sweep_secs: parse_var(&lookup, "RALLY_SESSION_SWEEP_SECS", 3600)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(anyhow!("Invalid {key} value: {v:?}")),
        },
    }
}
