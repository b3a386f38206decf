//! Configuration management.
//!
//! Configuration is read from `~/.config/redwatch/config.toml` at startup;
//! a commented default file is created if none exists. Reddit credentials
//! may live in the file or come from `REDDIT_*` environment variables,
//! with the environment taking precedence (the historical `.env`
//! contract).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::app::{Result, WatchError};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channel (subreddit) names to watch, without the `r/` prefix.
    pub channels: Vec<String>,
    /// Foreground poll cadence for draining the event channel.
    pub tick_rate_ms: u64,
    pub reddit: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            tick_rate_ms: 100,
            reddit: Credentials::default(),
        }
    }
}

impl Config {
    /// Load configuration from the given path, or the default path.
    ///
    /// A missing file at the default path gets created with commented
    /// defaults; a missing file at an explicit path is an error. After
    /// parsing, credential fields are overridden from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let p = Self::default_config_path()?;
                if !p.exists() {
                    Self::create_default_config(&p)?;
                    let mut config = Self::default();
                    config.reddit.apply_env();
                    return Ok(config);
                }
                p
            }
        };

        let content = fs::read_to_string(&config_path)?;
        let mut config: Config = toml::from_str(&content).map_err(|e| {
            WatchError::Config(format!("{}: {e}", config_path.display()))
        })?;
        config.reddit.apply_env();
        Ok(config)
    }

    /// `~/.config/redwatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| WatchError::Config("Could not determine config directory".into()))?;
        Ok(config_dir.join("redwatch").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(Self::default_config_content().as_bytes())?;
        Ok(())
    }

    fn default_config_content() -> String {
        r#"# redwatch configuration
#
# Channels are subreddit names without the "r/" prefix.
channels = ["smallbusiness", "learnpython"]

# How often the UI drains new events, in milliseconds.
tick_rate_ms = 100

# Reddit script-app credentials. Every field here can also be supplied
# via the environment (REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET,
# REDDIT_USER_AGENT, REDDIT_USERNAME, REDDIT_PASSWORD); the environment
# wins over this file.
[reddit]
client_id = ""
client_secret = ""
user_agent = "redwatch/0.1.0"
username = ""
password = ""
"#
        .to_string()
    }
}

/// Reddit script-app credentials. Empty fields count as missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Overrides file values with any set `REDDIT_*` environment variable.
    pub fn apply_env(&mut self) {
        self.apply_from(|var| std::env::var(var).ok());
    }

    /// The lookup is injectable so the precedence rules can be tested
    /// without mutating process-wide environment state.
    fn apply_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        let mut set = |target: &mut String, var: &str| {
            if let Some(value) = get(var) {
                if !value.is_empty() {
                    *target = value;
                }
            }
        };
        set(&mut self.client_id, "REDDIT_CLIENT_ID");
        set(&mut self.client_secret, "REDDIT_CLIENT_SECRET");
        set(&mut self.user_agent, "REDDIT_USER_AGENT");
        set(&mut self.username, "REDDIT_USERNAME");
        set(&mut self.password, "REDDIT_PASSWORD");
    }

    /// Fails with the name of the first missing field, before any
    /// network activity can happen.
    pub fn validate(&self) -> Result<()> {
        let fields: [(&'static str, &str); 5] = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("user_agent", &self.user_agent),
            ("username", &self.username),
            ("password", &self.password),
        ];
        for (name, value) in fields {
            if value.is_empty() {
                return Err(WatchError::MissingField(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn full_credentials() -> Credentials {
        Credentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
            user_agent: "ua".into(),
            username: "user".into(),
            password: "pass".into(),
        }
    }

    #[test]
    fn test_default_config_content_parses() {
        let config: Config = toml::from_str(&Config::default_config_content()).unwrap();
        assert_eq!(config.channels, vec!["smallbusiness", "learnpython"]);
        assert_eq!(config.tick_rate_ms, 100);
        assert_eq!(config.reddit.user_agent, "redwatch/0.1.0");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(r#"channels = ["rust"]"#).unwrap();
        assert_eq!(config.channels, vec!["rust"]);
        assert_eq!(config.tick_rate_ms, 100);
        assert!(config.reddit.client_id.is_empty());
    }

    #[test]
    fn test_validate_names_first_missing_field() {
        let mut creds = full_credentials();
        creds.client_secret.clear();
        let err = creds.validate().unwrap_err();
        assert!(matches!(err, WatchError::MissingField("client_secret")));
    }

    #[test]
    fn test_validate_accepts_complete_credentials() {
        assert!(full_credentials().validate().is_ok());
    }

    #[test]
    fn test_environment_wins_over_file_values() {
        let mut creds = full_credentials();
        creds.apply_from(|var| match var {
            "REDDIT_CLIENT_ID" => Some("env-id".to_string()),
            _ => None,
        });
        assert_eq!(creds.client_id, "env-id");
        // Unset variables leave the file values alone.
        assert_eq!(creds.client_secret, "secret");
        assert_eq!(creds.password, "pass");
    }

    #[test]
    fn test_empty_environment_value_does_not_override() {
        let mut creds = full_credentials();
        creds.apply_from(|_| Some(String::new()));
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.password, "pass");
    }

    #[test]
    fn test_apply_env_reads_the_process_environment() {
        // REDDIT_PASSWORD is not touched by any other test here, so this
        // stays safe under the parallel test runner.
        std::env::set_var("REDDIT_PASSWORD", "from-env");
        let mut creds = full_credentials();
        creds.apply_env();
        std::env::remove_var("REDDIT_PASSWORD");
        assert_eq!(creds.password, "from-env");
        assert_eq!(creds.client_id, "id");
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "channels = [\"rust\"]\ntick_rate_ms = 250\n[reddit]\nclient_id = \"abc\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.channels, vec!["rust"]);
        assert_eq!(config.tick_rate_ms, 250);
        assert_eq!(config.reddit.client_id, "abc");
    }

    #[test]
    fn test_load_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "channels = not-a-list").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, WatchError::Config(_)));
    }
}
