use serde::{Deserialize, Serialize};

/// Configuration for the users_info module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersInfoConfig {
    /// Base URL of the read-only directory used by `POST /users/seed`.
    #[serde(default = "default_seed_source_url")]
    pub seed_source_url: String,
    #[serde(default = "default_seed_timeout_secs")]
    pub seed_timeout_secs: u64,
    /// Add the internal cause chain to 5xx response bodies. Development only.
    #[serde(default)]
    pub expose_internal_errors: bool,
}

impl Default for UsersInfoConfig {
    fn default() -> Self {
        Self {
            seed_source_url: default_seed_source_url(),
            seed_timeout_secs: default_seed_timeout_secs(),
            expose_internal_errors: false,
        }
    }
}

fn default_seed_source_url() -> String {
    "https://jsonplaceholder.typicode.com".to_string()
}

fn default_seed_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: UsersInfoConfig =
            serde_json::from_value(serde_json::json!({ "seed_timeout_secs": 2 })).unwrap();
        assert_eq!(cfg.seed_timeout_secs, 2);
        assert_eq!(cfg.seed_source_url, "https://jsonplaceholder.typicode.com");
        assert!(!cfg.expose_internal_errors);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<UsersInfoConfig, _> =
            serde_json::from_value(serde_json::json!({ "page_size": 10 }));
        assert!(res.is_err());
    }
}
