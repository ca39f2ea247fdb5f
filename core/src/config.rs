//! Configuration loading for hosts that build an `LbsClient` from the
//! environment.
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file,
//! then `BAIDU_*` environment variables (`BAIDU_API_TOKEN`,
//! `BAIDU_BASE_URL`).

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::client::{LbsClient, DEFAULT_BASE_URL};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LbsConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for LbsConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            base_url: default_base_url(),
        }
    }
}

impl LbsConfig {
    /// Load from `BAIDU_*` environment variables only.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::figment(None).extract()?)
    }

    /// Load from a TOML file, overridden by `BAIDU_*` environment variables.
    /// A missing file is not an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        Ok(Self::figment(Some(path.as_ref())).extract()?)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(LbsConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("BAIDU_"))
    }

    /// Build a validated client. Fails with `MissingToken` when no token was
    /// configured.
    pub fn client(&self) -> Result<LbsClient, ApiError> {
        LbsClient::with_base_url(&self.base_url, &self.api_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn token_and_base_url_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("BAIDU_API_TOKEN", "env-token");
            jail.set_env("BAIDU_BASE_URL", "http://127.0.0.1:3000");
            let config = LbsConfig::from_env().unwrap();
            assert_eq!(config.api_token, "env-token");
            let client = config.client().unwrap();
            assert_eq!(client.token(), "env-token");
            assert_eq!(client.base_url(), "http://127.0.0.1:3000");
            Ok(())
        });
    }

    #[test]
    fn missing_token_fails_at_client_construction() {
        Jail::expect_with(|_jail| {
            let config = LbsConfig::from_env().unwrap();
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert!(matches!(config.client(), Err(ApiError::MissingToken)));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "lbs.toml",
                r#"
                    api_token = "file-token"
                    base_url = "http://file.example"
                "#,
            )?;
            jail.set_env("BAIDU_API_TOKEN", "env-token");
            let config = LbsConfig::load("lbs.toml").unwrap();
            assert_eq!(config.api_token, "env-token");
            assert_eq!(config.base_url, "http://file.example");
            Ok(())
        });
    }
}
