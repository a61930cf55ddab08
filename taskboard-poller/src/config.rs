/// Poller configuration
///
/// # Environment Variables
///
/// - `POLLER_API_URL`: Base URL of the API server (default: http://127.0.0.1:8080)
/// - `POLLER_USER_ID`: Identity id whose project and event lists are watched (required)
/// - `POLLER_PROJECT_IDS`: Comma-separated project ids whose boards are watched
/// - `POLLER_TOKEN`: Bearer token sent with every request
/// - `POLL_INTERVAL_SECS`: Seconds between polls of a scope (default: 5)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use taskboard_shared::sync::DEFAULT_POLL_INTERVAL;
use uuid::Uuid;

/// Poller configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// API base URL, without trailing slash
    pub api_url: String,

    /// Watched user
    pub user_id: String,

    /// Watched boards
    pub project_ids: Vec<Uuid>,

    /// Session token
    pub token: Option<String>,

    /// Poll interval for every scope
    pub poll_interval: Duration,

    /// Emit JSON logs
    pub json_logs: bool,
}

impl std::fmt::Debug for PollerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollerConfig")
            .field("api_url", &self.api_url)
            .field("user_id", &self.user_id)
            .field("project_ids", &self.project_ids)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("poll_interval", &self.poll_interval)
            .field("json_logs", &self.json_logs)
            .finish()
    }
}

impl PollerConfig {
    /// Loads configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("POLLER_API_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let user_id = lookup("POLLER_USER_ID")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("POLLER_USER_ID environment variable is required"))?;

        let project_ids = lookup("POLLER_PROJECT_IDS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<Uuid>()
                    .map_err(|e| anyhow::anyhow!("invalid project id '{}' in POLLER_PROJECT_IDS: {}", id, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let token = lookup("POLLER_TOKEN").filter(|t| !t.trim().is_empty());

        let poll_interval = match lookup("POLL_INTERVAL_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>()?;
                if secs == 0 {
                    anyhow::bail!("POLL_INTERVAL_SECS must be at least 1");
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        let json_logs = lookup("LOG_FORMAT")
            .map(|format| format.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            api_url,
            user_id,
            project_ids,
            token,
            poll_interval,
            json_logs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PollerConfig::from_lookup(lookup(&[("POLLER_USER_ID", "idp|alice")])).unwrap();

        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert!(config.project_ids.is_empty());
        assert!(config.token.is_none());
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_user_required() {
        assert!(PollerConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_project_ids_parsed() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ids = format!("{}, {},", a, b);
        let config = PollerConfig::from_lookup(lookup(&[
            ("POLLER_USER_ID", "idp|alice"),
            ("POLLER_PROJECT_IDS", &ids),
            ("POLLER_API_URL", "https://board.example/"),
            ("POLL_INTERVAL_SECS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.project_ids, vec![a, b]);
        assert_eq!(config.api_url, "https://board.example");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_bad_project_id_rejected() {
        let err = PollerConfig::from_lookup(lookup(&[
            ("POLLER_USER_ID", "idp|alice"),
            ("POLLER_PROJECT_IDS", "not-a-uuid"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("not-a-uuid"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(PollerConfig::from_lookup(lookup(&[
            ("POLLER_USER_ID", "idp|alice"),
            ("POLL_INTERVAL_SECS", "0"),
        ]))
        .is_err());
    }
}
