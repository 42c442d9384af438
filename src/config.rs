use std::env;

use bookreview_domain::SmtpSettings;
use bookreview_server::DEFAULT_PORT;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://bookreview.db";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Mail is only delivered when this is present
    pub smtp: Option<SmtpSettings>,
}

/// Loads a `.env` file if there is one. Variables that are already set take precedence.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let port = parse_port(&lookup, "BOOKREVIEW_PORT", DEFAULT_PORT)?;
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let smtp = match lookup("SMTP_SERVER") {
            Some(server) => Some(SmtpSettings {
                server,
                port: parse_port(&lookup, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                username: required(&lookup, "SMTP_USERNAME")?,
                password: required(&lookup, "SMTP_PASSWORD")?,
            }),
            None => None,
        };

        Ok(Self {
            port,
            database_url,
            smtp,
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    lookup(name).ok_or(ConfigError::Missing { name })
}

fn parse_port<F>(lookup: &F, name: &'static str, default: u16) -> Result<u16, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::{Config, ConfigError};

    fn config(vars: &[(&'static str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<_, _> = vars
            .iter()
            .map(|(name, value)| (*name, value.to_string()))
            .collect();

        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.port, 9050);
        assert_eq!(config.database_url, "sqlite://bookreview.db");
        assert!(config.smtp.is_none());
    }

    #[test]
    fn smtp_needs_credentials() {
        let result = config(&[("SMTP_SERVER", "smtp.example.com")]);
        assert!(matches!(
            result,
            Err(ConfigError::Missing {
                name: "SMTP_USERNAME"
            })
        ));

        let smtp = config(&[
            ("SMTP_SERVER", "smtp.example.com"),
            ("SMTP_USERNAME", "support@example.com"),
            ("SMTP_PASSWORD", "hunter2"),
        ])
        .unwrap()
        .smtp
        .unwrap();

        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.username, "support@example.com");
    }

    #[test]
    fn ports_must_be_numbers() {
        let result = config(&[("BOOKREVIEW_PORT", "eighty")]);

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "BOOKREVIEW_PORT",
                ..
            })
        ));
    }
}
