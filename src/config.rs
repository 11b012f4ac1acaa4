//! Runtime settings read from the environment (after `dotenvy` has loaded `.env`).
//!
//! Each field maps to the upper-case variable of the same name, e.g. `jwt_secret`
//! to `JWT_SECRET`.

use ::config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;
use std::net::SocketAddr;

/// Which store backs the logic layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    #[serde(alias = "pg")]
    Postgres,
    #[serde(alias = "mem")]
    Memory,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_database_url() -> String {
    "postgres://localhost/storyboard".into()
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

impl Settings {
    /// Read settings from the process environment. `JWT_SECRET` is the only required variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Config::builder().add_source(Environment::default()))
    }

    fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        if settings.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt_secret is empty".into()));
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value)?;
        }
        Settings::load(builder)
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let s = with(&[("jwt_secret", "s3cret")]).unwrap();
        assert_eq!(s.bind_addr.port(), 3000);
        assert_eq!(s.store, StoreKind::Postgres);
        assert_eq!(s.token_ttl_secs, 86400);
        assert_eq!(s.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(s.db_max_connections, 5);
    }

    #[test]
    fn secret_is_required() {
        let err = with(&[]).unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
        assert!(with(&[("jwt_secret", "  ")]).is_err());
    }

    #[test]
    fn string_values_are_parsed() {
        let s = with(&[
            ("jwt_secret", "x"),
            ("bind_addr", "127.0.0.1:8080"),
            ("token_ttl_secs", "60"),
        ])
        .unwrap();
        assert_eq!(s.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(s.token_ttl_secs, 60);
    }

    #[test]
    fn rejects_bad_numbers_and_stores() {
        assert!(with(&[("jwt_secret", "x"), ("token_ttl_secs", "soon")]).is_err());
        assert!(with(&[("jwt_secret", "x"), ("store", "mongo")]).is_err());
    }

    #[test]
    fn memory_store_is_selectable() {
        let s = with(&[("jwt_secret", "x"), ("store", "memory")]).unwrap();
        assert_eq!(s.store, StoreKind::Memory);
        let s = with(&[("jwt_secret", "x"), ("store", "pg")]).unwrap();
        assert_eq!(s.store, StoreKind::Postgres);
    }
}
