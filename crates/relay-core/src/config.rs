use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Backend endpoint paths (relative to `api_url`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub start: String,
    pub user_sync: String,
    pub menu: String,
    pub action: String,
    pub partner: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            start: "/api/bot/start".to_string(),
            user_sync: "/api/bot/user/sync".to_string(),
            menu: "/api/bot/menu".to_string(),
            action: "/api/bot/action".to_string(),
            partner: "/api/bot/partner".to_string(),
        }
    }
}

/// Typed configuration.
///
/// Every value can be overridden by an environment variable of the same
/// (upper-case) name, or by a `.env` file in the working directory.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub bot_token: String,
    pub api_url: String,
    pub api_token: String,

    // Shared store
    pub redis_url: String,
    pub redis_prefix: String,

    // Logging / rendering
    pub log_level: String,
    pub log_json: bool,
    pub parse_mode: Option<String>,

    // Backend client
    pub request_timeout: Duration,
    pub retry_count: u32,
    pub retry_backoff: Duration,
    pub endpoints: Endpoints,

    // Admission control
    pub rate_limit_window: Duration,

    // Caches
    pub user_sync_ttl: Duration,
    pub user_sync_max_entries: usize,
    pub partner_id: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (process env, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let bot_token = required(&get, "BOT_TOKEN")?;
        let api_url = required(&get, "API_URL")?;
        let api_token = required(&get, "API_TOKEN")?;

        let redis_url = get("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379/0".to_string());
        let redis_prefix = get("REDIS_PREFIX").unwrap_or_else(|| "bot".to_string());

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string());
        let log_json = get("LOG_FORMAT")
            .map(|s| s.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let parse_mode = get("PARSE_MODE");

        let request_timeout = secs(parse_f64(&get, "REQUEST_TIMEOUT")?.unwrap_or(10.0));
        let retry_count = parse_u32(&get, "RETRY_COUNT")?.unwrap_or(3);
        let retry_backoff = secs(parse_f64(&get, "RETRY_BACKOFF")?.unwrap_or(0.5));

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            start: get("START_ENDPOINT").unwrap_or(defaults.start),
            user_sync: get("USER_SYNC_ENDPOINT").unwrap_or(defaults.user_sync),
            menu: get("MENU_ENDPOINT").unwrap_or(defaults.menu),
            action: get("ACTION_ENDPOINT").unwrap_or(defaults.action),
            partner: get("PARTNER_ENDPOINT").unwrap_or(defaults.partner),
        };

        // A window of zero disables rate limiting.
        let rate_limit_window = secs(parse_f64(&get, "RATE_LIMIT_SECONDS")?.unwrap_or(0.5));

        let user_sync_ttl = secs(parse_f64(&get, "USER_SYNC_TTL")?.unwrap_or(3600.0));
        let user_sync_max_entries = parse_usize(&get, "USER_SYNC_MAX_ENTRIES")?.unwrap_or(100_000);
        let partner_id = get("PARTNER_ID");

        Ok(Self {
            bot_token,
            api_url,
            api_token,
            redis_url,
            redis_prefix,
            log_level,
            log_json,
            parse_mode,
            request_timeout,
            retry_count,
            retry_backoff,
            endpoints,
            rate_limit_window,
            user_sync_ttl,
            user_sync_max_entries,
            partner_id,
        })
    }
}

fn required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn parse_f64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<f64>> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    let v = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Config(format!("{key} must be a number, got {raw:?}")))?;
    if !v.is_finite() {
        return Err(Error::Config(format!("{key} must be finite")));
    }
    Ok(Some(v))
}

fn parse_u32(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u32>> {
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| Error::Config(format!("{key} must be an integer, got {raw:?}")))
        })
        .transpose()
}

fn parse_usize(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<usize>> {
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .map_err(|_| Error::Config(format!("{key} must be an integer, got {raw:?}")))
        })
        .transpose()
}

/// Negative values clamp to zero.
fn secs(v: f64) -> Duration {
    Duration::try_from_secs_f64(v.max(0.0)).unwrap_or(Duration::MAX)
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("BOT_TOKEN", "123:abc"),
        ("API_URL", "https://backend.test"),
        ("API_TOKEN", "secret"),
    ];

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.retry_count, 3);
        assert_eq!(cfg.retry_backoff, Duration::from_millis(500));
        assert_eq!(cfg.rate_limit_window, Duration::from_millis(500));
        assert_eq!(cfg.user_sync_ttl, Duration::from_secs(3600));
        assert_eq!(cfg.redis_prefix, "bot");
        assert_eq!(cfg.endpoints, Endpoints::default());
        assert!(cfg.partner_id.is_none());
        assert!(!cfg.log_json);
    }

    #[test]
    fn overrides_are_applied() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("RETRY_COUNT", "5"),
            ("RETRY_BACKOFF", "0.25"),
            ("RATE_LIMIT_SECONDS", "0"),
            ("PARTNER_ID", "p-7"),
            ("MENU_ENDPOINT", "/v2/menu"),
            ("LOG_FORMAT", "JSON"),
        ]);
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(cfg.retry_count, 5);
        assert_eq!(cfg.retry_backoff, Duration::from_millis(250));
        assert_eq!(cfg.rate_limit_window, Duration::ZERO);
        assert_eq!(cfg.partner_id.as_deref(), Some("p-7"));
        assert_eq!(cfg.endpoints.menu, "/v2/menu");
        assert!(cfg.log_json);
    }

    #[test]
    fn blank_partner_id_is_treated_as_unset() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PARTNER_ID", "   "));
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert!(cfg.partner_id.is_none());
    }

    #[test]
    fn missing_required_value_is_a_config_error() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("API_TOKEN")));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("REQUEST_TIMEOUT", "soon"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(Error::Config(_))
        ));
    }
}
