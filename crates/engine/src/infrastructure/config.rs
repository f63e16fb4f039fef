//! Process configuration read from the environment.
//!
//! Every setting has a default. Values that fail to parse are logged and
//! replaced by the default so a typo never stops the server.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use townsquare_domain::{FeedKind, PageSize, PresenceTtl, UserId};

use crate::infrastructure::resilient_writes::RetryConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FEATURED_LIMIT: usize = 5;
const MAX_FEATURED_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub page_sizes: BTreeMap<FeedKind, PageSize>,
    pub featured_limit: usize,
    pub presence_ttl: PresenceTtl,
    pub write_retry: RetryConfig,
    pub admin_user_ids: HashSet<UserId>,
    /// Raw `CORS_ALLOWED_ORIGINS`; `None` disables the CORS layer.
    pub cors_allowed_origins: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_HOST.to_string(),
            server_port: DEFAULT_PORT,
            page_sizes: FeedKind::ALL
                .iter()
                .map(|kind| (*kind, kind.default_page_size()))
                .collect(),
            featured_limit: DEFAULT_FEATURED_LIMIT,
            presence_ttl: PresenceTtl::default(),
            write_retry: RetryConfig::default(),
            admin_user_ids: HashSet::new(),
            cors_allowed_origins: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server_host = get("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = parse_or(
            "SERVER_PORT",
            get("SERVER_PORT").or_else(|| get("PORT")),
            DEFAULT_PORT,
        );

        let page_sizes = FeedKind::ALL
            .iter()
            .map(|kind| {
                let key = format!("FEED_PAGE_SIZE_{}", kind.env_key());
                let size = parse_or(&key, get(&key), kind.default_page_size().value());
                (*kind, PageSize::clamped(size))
            })
            .collect();

        let featured_limit = parse_or("FEATURED_LIMIT", get("FEATURED_LIMIT"), DEFAULT_FEATURED_LIMIT)
            .clamp(1, MAX_FEATURED_LIMIT);

        let presence_ttl = PresenceTtl::clamped(parse_or(
            "PRESENCE_TTL_SECS",
            get("PRESENCE_TTL_SECS"),
            PresenceTtl::DEFAULT,
        ));

        let retry_defaults = defaults.write_retry;
        let write_retry = RetryConfig {
            max_retries: parse_or(
                "WRITE_MAX_RETRIES",
                get("WRITE_MAX_RETRIES"),
                retry_defaults.max_retries,
            ),
            base_delay_ms: parse_or(
                "WRITE_BASE_DELAY_MS",
                get("WRITE_BASE_DELAY_MS"),
                retry_defaults.base_delay_ms,
            ),
            max_delay_ms: parse_or(
                "WRITE_MAX_DELAY_MS",
                get("WRITE_MAX_DELAY_MS"),
                retry_defaults.max_delay_ms,
            ),
            jitter_factor: retry_defaults.jitter_factor,
        };

        let admin_user_ids = get("ADMIN_USER_IDS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .filter_map(|s| match UserId::new(s) {
                        Ok(id) => Some(id),
                        Err(e) => {
                            tracing::warn!(value = s, error = %e, "Ignoring invalid admin user id");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            server_host,
            server_port,
            page_sizes,
            featured_limit,
            presence_ttl,
            write_retry,
            admin_user_ids,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
        }
    }

    pub fn page_size(&self, kind: FeedKind) -> PageSize {
        self.page_sizes
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_page_size())
    }

    pub fn is_admin(&self, user_id: &UserId) -> bool {
        self.admin_user_ids.contains(user_id)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(
                key,
                value = %raw,
                default = %default,
                "Invalid configuration value, using default"
            );
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = config(&[]);
        assert_eq!(cfg.server_port, 3000);
        assert_eq!(cfg.page_size(FeedKind::Stories).value(), 12);
        assert_eq!(cfg.page_size(FeedKind::Marketplace).value(), 24);
        assert_eq!(cfg.presence_ttl.seconds(), PresenceTtl::DEFAULT);
        assert!(cfg.cors_allowed_origins.is_none());
    }

    #[test]
    fn port_falls_back_to_port_variable() {
        assert_eq!(config(&[("PORT", "8080")]).server_port, 8080);
        assert_eq!(
            config(&[("PORT", "8080"), ("SERVER_PORT", "9000")]).server_port,
            9000
        );
    }

    #[test]
    fn invalid_values_use_defaults() {
        let cfg = config(&[
            ("SERVER_PORT", "http"),
            ("FEED_PAGE_SIZE_FORUM", "lots"),
            ("WRITE_MAX_RETRIES", "-1"),
        ]);
        assert_eq!(cfg.server_port, 3000);
        assert_eq!(cfg.page_size(FeedKind::Forum).value(), 20);
        assert_eq!(cfg.write_retry.max_retries, 3);
    }

    #[test]
    fn page_sizes_and_ttl_are_clamped() {
        let cfg = config(&[
            ("FEED_PAGE_SIZE_SHOUTBOX", "5000"),
            ("PRESENCE_TTL_SECS", "1"),
            ("FEATURED_LIMIT", "0"),
        ]);
        assert_eq!(cfg.page_size(FeedKind::Shoutbox).value(), PageSize::MAX);
        assert_eq!(cfg.presence_ttl.seconds(), PresenceTtl::MIN);
        assert_eq!(cfg.featured_limit, 1);
    }

    #[test]
    fn admin_ids_are_comma_separated() {
        let cfg = config(&[("ADMIN_USER_IDS", " mod1, ,mod2 ,bad/id")]);
        assert!(cfg.is_admin(&UserId::new("mod1").unwrap()));
        assert!(cfg.is_admin(&UserId::new("mod2").unwrap()));
        assert_eq!(cfg.admin_user_ids.len(), 2);
    }
}
