use std::path::PathBuf;

use anyhow::Context;

use crate::models::Target;

/// Runtime settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Prefix for share links; derived from the request `Host` when unset.
    pub base_url: Option<String>,
    pub data_file: PathBuf,
    pub database_url: Option<String>,
    pub target: Target,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => 5000,
        };

        let target = match non_empty("TARGET_PERCENT") {
            Some(raw) => {
                let percent: i64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("TARGET_PERCENT must be an integer, got {raw:?}"))?;
                Target::new(percent).context("invalid TARGET_PERCENT")?
            }
            None => Target::default(),
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "127.0.0.1".into()),
            port,
            base_url: non_empty("BASE_URL"),
            data_file: non_empty("DATA_FILE")
                .unwrap_or_else(|| "attendance_data.json".into())
                .into(),
            database_url: non_empty("DATABASE_URL"),
            target,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.base_url, None);
        assert_eq!(config.data_file, PathBuf::from("attendance_data.json"));
        assert_eq!(config.database_url, None);
        assert_eq!(config.target, Target::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("BASE_URL", "https://attendance.example.com/"),
            ("DATA_FILE", "/var/lib/attendance/last.json"),
            ("TARGET_PERCENT", "75"),
        ])
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.base_url.as_deref(),
            Some("https://attendance.example.com/")
        );
        assert_eq!(config.target.value(), 75);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[("DATABASE_URL", "  "), ("PORT", "")]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("TARGET_PERCENT", "100")]).is_err());
        assert!(config_from(&[("TARGET_PERCENT", "eighty")]).is_err());
    }
}
