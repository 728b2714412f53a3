use clap::{Parser, Subcommand};
use familyledger_core::ClientConfig;
use std::time::Duration;

/// Talk to a FamilyLedger backend from the command line
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Config {
    /// Backend origin, without the `/api/v1` prefix
    #[clap(long, env = "FAMILYLEDGER_BASE_URL", default_value = "http://127.0.0.1:3000")]
    pub base_url: String,

    /// Bearer token from a previous `login`
    #[clap(long, env = "FAMILYLEDGER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout, in seconds
    #[clap(long, env = "FAMILYLEDGER_TIMEOUT", default_value = "30", value_parser = duration_parser)]
    pub timeout: Duration,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and print the session token
    Login {
        #[clap(long)]
        email: String,

        #[clap(long, env = "FAMILYLEDGER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the signed-in user
    Me,

    /// List savings goals
    Goals,

    /// List tasks
    Tasks {
        /// Only show completed (`true`) or open (`false`) tasks
        #[clap(long)]
        completed: Option<bool>,
    },

    /// List pets
    Pets,

    /// List shopping lists with their items
    Shopping,

    /// List legal documents
    Documents,
}

impl Config {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout,
        }
    }
}

/// Whole seconds, at least one. A zero timeout would fail every request.
fn duration_parser(s: &str) -> Result<Duration, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("timeout must be at least 1 second".to_string()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "familyledger",
            "--base-url",
            "https://ledger.example",
            "--timeout",
            "7",
            "tasks",
            "--completed",
            "true",
        ])
        .unwrap();

        assert_eq!(config.base_url, "https://ledger.example");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert!(matches!(config.command, Command::Tasks { completed: Some(true) }));

        let client = config.client_config();
        assert_eq!(client.base_url, "https://ledger.example");
        assert_eq!(client.timeout, Duration::from_secs(7));
    }

    #[test]
    fn timeout_must_be_whole_seconds() {
        let err = Config::try_parse_from(["familyledger", "--timeout", "1.5", "me"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Config::try_parse_from(["familyledger", "--timeout", "0", "me"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("at least 1 second"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Config::try_parse_from(["familyledger"]).is_err());
    }
}
