//! Harvest configuration.
//!
//! Loaded once at startup from an optional TOML file, then overridden by
//! environment variables, then validated. Nothing reads the environment
//! after [`HarvestConfig::load`] returns.
//!
//! ```toml
//! marketplace = "ES"
//!
//! [credentials]
//! refresh_token = "Atzr|..."
//! client_id = "amzn1.application-oa2-client...."
//! client_secret = "..."
//!
//! [pacing]
//! every = 15
//! modulus = 25
//! ```

use crate::marketplace::{lookup_marketplace, Credentials, Marketplace};
use crate::throttle::PacingSchedule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_REFRESH_TOKEN: &str = "SP_API_REFRESH_TOKEN";
pub const ENV_CLIENT_ID: &str = "LWA_APP_ID";
pub const ENV_CLIENT_SECRET: &str = "LWA_CLIENT_SECRET";
/// Comma-separated country codes; the first one selects the marketplace.
pub const ENV_STORES: &str = "SP_API_STORES";
pub const ENV_ENDPOINT: &str = "SP_API_ENDPOINT";

pub const DEFAULT_MARKETPLACE: &str = "ES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting '{field}' (config file or ${env})")]
    MissingField {
        field: &'static str,
        env: &'static str,
    },

    #[error("unknown marketplace '{0}'")]
    UnknownMarketplace(String),

    #[error("invalid pacing schedule: every and modulus must be non-zero")]
    InvalidPacing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub credentials: Credentials,
    /// Country code of the single marketplace to query.
    pub marketplace: String,
    /// Overrides the marketplace's regional endpoint.
    pub endpoint: Option<String>,
    pub pacing: PacingSchedule,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            marketplace: DEFAULT_MARKETPLACE.to_string(),
            endpoint: None,
            pacing: PacingSchedule::default(),
        }
    }
}

impl HarvestConfig {
    /// File (if any) → process environment → validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides through `lookup`. Empty values are ignored.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_REFRESH_TOKEN) {
            self.credentials.refresh_token = v;
        }
        if let Some(v) = get(ENV_CLIENT_ID) {
            self.credentials.client_id = v;
        }
        if let Some(v) = get(ENV_CLIENT_SECRET) {
            self.credentials.client_secret = v;
        }
        if let Some(stores) = get(ENV_STORES) {
            if let Some(first) = stores.split(',').map(str::trim).find(|s| !s.is_empty()) {
                self.marketplace = first.to_string();
            }
        }
        if let Some(v) = get(ENV_ENDPOINT) {
            self.endpoint = Some(v);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("credentials.refresh_token", ENV_REFRESH_TOKEN, &self.credentials.refresh_token),
            ("credentials.client_id", ENV_CLIENT_ID, &self.credentials.client_id),
            ("credentials.client_secret", ENV_CLIENT_SECRET, &self.credentials.client_secret),
        ];
        for (field, env, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField { field, env });
            }
        }

        self.marketplace()?;

        if self.pacing.every == 0 || self.pacing.modulus == 0 {
            return Err(ConfigError::InvalidPacing);
        }
        Ok(())
    }

    pub fn marketplace(&self) -> Result<&'static Marketplace, ConfigError> {
        lookup_marketplace(&self.marketplace)
            .ok_or_else(|| ConfigError::UnknownMarketplace(self.marketplace.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete() -> HarvestConfig {
        HarvestConfig::default().with_env(env(&[
            (ENV_REFRESH_TOKEN, "Atzr|token"),
            (ENV_CLIENT_ID, "client"),
            (ENV_CLIENT_SECRET, "secret"),
        ]))
    }

    #[test]
    fn defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.marketplace, "ES");
        assert_eq!(config.pacing, PacingSchedule::default());
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn env_fills_credentials_and_validates() {
        let config = complete();
        assert_eq!(config.credentials.refresh_token, "Atzr|token");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_credential_fails_fast() {
        let config = HarvestConfig::default().with_env(env(&[
            (ENV_REFRESH_TOKEN, "Atzr|token"),
            (ENV_CLIENT_ID, "client"),
            (ENV_CLIENT_SECRET, "   "),
        ]));
        match config.validate() {
            Err(ConfigError::MissingField { field, env }) => {
                assert_eq!(field, "credentials.client_secret");
                assert_eq!(env, ENV_CLIENT_SECRET);
            }
            other => panic!("expected MissingField, got: {other:?}"),
        }
    }

    #[test]
    fn stores_selects_first_marketplace() {
        let config = complete().with_env(env(&[(ENV_STORES, " UK , DE")]));
        assert_eq!(config.marketplace, "UK");
        assert_eq!(config.marketplace().unwrap().country, "GB");
    }

    #[test]
    fn unknown_marketplace_is_rejected() {
        let mut config = complete();
        config.marketplace = "XX".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownMarketplace(code)) if code == "XX"
        ));
    }

    #[test]
    fn zero_pacing_is_rejected() {
        let mut config = complete();
        config.pacing.every = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPacing)));
    }

    #[test]
    fn loads_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
marketplace = "DE"
endpoint = "https://sandbox.sellingpartnerapi-eu.amazon.com"

[credentials]
refresh_token = "Atzr|from-file"

[pacing]
every = 10
"#
        )
        .unwrap();

        let config = HarvestConfig::from_file(file.path()).unwrap();
        assert_eq!(config.marketplace, "DE");
        assert_eq!(config.credentials.refresh_token, "Atzr|from-file");
        assert_eq!(config.credentials.client_id, "");
        assert_eq!(config.pacing, PacingSchedule { every: 10, modulus: 25 });
        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://sandbox.sellingpartnerapi-eu.amazon.com")
        );
    }

    #[test]
    fn env_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[credentials]\nrefresh_token = \"from-file\"").unwrap();

        let config = HarvestConfig::from_file(file.path())
            .unwrap()
            .with_env(env(&[(ENV_REFRESH_TOKEN, "from-env")]));
        assert_eq!(config.credentials.refresh_token, "from-env");
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "marketplace = [").unwrap();
        match HarvestConfig::from_file(file.path()) {
            Err(ConfigError::Parse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected Parse error, got: {other:?}"),
        }
    }
}
