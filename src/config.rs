//! Configuration file structures for Skywatch.
//!
//! The configuration is read from a YAML file and can be overridden with
//! environment variables prefixed by `SKYWATCH_`, `__` separating sections.
//! Every field has a default, so the file itself is optional.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Dashboard backend providing the readings
//! backend:
//!   url: "http://localhost:5000"
//!   # Request timeout in seconds
//!   timeout: 10
//!
//! # Push gateway delivering notifications
//! push:
//!   url: "http://localhost:5000/api/push/deliver"
//!   # Bound of one delivery in seconds
//!   timeout: 10
//!   # Deliveries running at the same time
//!   max_concurrent: 8
//!
//! polling:
//!   # Delay between two poll cycles in seconds
//!   interval: 300
//!   # Delay after a failed cycle in seconds
//!   retry_delay: 60
//! ```
//!
//! ```bash
//! export SKYWATCH_POLLING__INTERVAL=120
//! export SKYWATCH_PUSH__URL="https://dashboard.example/api/push/deliver"
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Dashboard backend configuration
    pub backend: Backend,
    /// Push gateway configuration
    pub push: Push,
    /// Poll loop configuration
    pub polling: Polling,
}

/// Dashboard backend serving the readings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Backend {
    /// Base URL of the backend, without trailing slash.
    ///
    /// # Examples
    ///
    /// - `http://localhost:5000`
    /// - `https://weather.example.com`
    pub url: String,

    /// Request timeout in seconds.
    pub timeout: u64,
}

/// Push gateway delivering notifications.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Push {
    /// URL notifications are posted to.
    pub url: String,

    /// Bound of one delivery in seconds.
    ///
    /// A hung delivery is abandoned after this delay so it does not hold
    /// back other subscribers.
    pub timeout: u64,

    /// Maximum number of subscribers processed concurrently.
    pub max_concurrent: usize,
}

/// Poll loop timing.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Polling {
    /// Delay in seconds between the end of a cycle and the start of the next.
    pub interval: u64,

    /// Delay in seconds after a failed cycle.
    pub retry_delay: u64,
}

impl Default for Backend {
    fn default() -> Self {
        Backend {
            url: "http://localhost:5000".to_owned(),
            timeout: 10,
        }
    }
}

impl Default for Push {
    fn default() -> Self {
        Push {
            url: "http://localhost:5000/api/push/deliver".to_owned(),
            timeout: 10,
            max_concurrent: 8,
        }
    }
}

impl Default for Polling {
    fn default() -> Self {
        Polling {
            interval: 300,
            retry_delay: 60,
        }
    }
}

impl Config {
    /// Loads the configuration from `path` and the `SKYWATCH_` environment.
    ///
    /// A missing file leaves the defaults in place.
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SKYWATCH_").split("__"))
            .extract()?;

        trim_trailing_slashes(&mut config.backend.url);
        trim_trailing_slashes(&mut config.push.url);
        config.push.max_concurrent = config.push.max_concurrent.max(1);

        Ok(config)
    }
}

fn trim_trailing_slashes(url: &mut String) {
    while url.ends_with('/') {
        url.pop();
    }
}
