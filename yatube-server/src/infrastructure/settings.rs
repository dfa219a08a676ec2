use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub session_secret: String,
    pub session_ttl_seconds: i64,
    pub session_cookie_secure: bool,
    pub http_addr: String,
    pub log_level: String,
    pub posts_per_page: u32,
    pub http_request_body_limit_bytes: usize,
    pub http_concurrency_limit: usize,
    pub http_request_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url =
            get_required(&lookup, "DATABASE_URL").context("DATABASE_URL is required")?;
        let session_secret =
            get_required(&lookup, "SESSION_SECRET").context("SESSION_SECRET is required")?;
        if session_secret.chars().count() < 32 {
            return Err(anyhow!("SESSION_SECRET must be at least 32 characters"));
        }

        let session_ttl_seconds: i64 = parse_positive(&lookup, "SESSION_TTL_SECONDS", 86400)?;
        let session_cookie_secure = parse_bool(&lookup, "SESSION_COOKIE_SECURE", false)?;

        let http_addr = lookup("HTTP_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        let database_max_connections = parse_positive(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        let posts_per_page = parse_positive(&lookup, "POSTS_PER_PAGE", 10)?;
        let http_request_body_limit_bytes =
            parse_positive(&lookup, "HTTP_REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let http_concurrency_limit = parse_positive(&lookup, "HTTP_CONCURRENCY_LIMIT", 256)?;
        let http_request_timeout_secs = parse_positive(&lookup, "HTTP_REQUEST_TIMEOUT_SECS", 10)?;

        Ok(Self {
            database_url,
            database_max_connections,
            session_secret,
            session_ttl_seconds,
            session_cookie_secure,
            http_addr,
            log_level,
            posts_per_page,
            http_request_body_limit_bytes,
            http_concurrency_limit,
            http_request_timeout_secs,
        })
    }
}

fn get_required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    let value = lookup(key).ok_or_else(|| anyhow!("{key} is not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + ToString + PartialOrd + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<T>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value <= T::default() {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("{key} must be a boolean, got '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::Settings;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn settings_from(pairs: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_are_applied() {
        let settings = settings_from(&[
            ("DATABASE_URL", "postgres://localhost/yatube"),
            ("SESSION_SECRET", SECRET),
        ])
        .expect("settings must load");

        assert_eq!(settings.http_addr, "0.0.0.0:8080");
        assert_eq!(settings.posts_per_page, 10);
        assert_eq!(settings.session_ttl_seconds, 86400);
        assert_eq!(settings.database_max_connections, 5);
        assert_eq!(settings.http_request_timeout_secs, 10);
        assert!(!settings.session_cookie_secure);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = settings_from(&[
            ("DATABASE_URL", "postgres://localhost/yatube"),
            ("SESSION_SECRET", "too-short"),
        ])
        .expect_err("short secret must fail");
        assert!(err.to_string().contains("SESSION_SECRET"));
    }

    #[test]
    fn missing_database_url_is_rejected() {
        assert!(settings_from(&[("SESSION_SECRET", SECRET)]).is_err());
        assert!(
            settings_from(&[("DATABASE_URL", "  "), ("SESSION_SECRET", SECRET)]).is_err()
        );
    }

    #[test]
    fn numeric_overrides_must_be_positive() {
        let settings = settings_from(&[
            ("DATABASE_URL", "postgres://localhost/yatube"),
            ("SESSION_SECRET", SECRET),
            ("POSTS_PER_PAGE", "25"),
            ("SESSION_COOKIE_SECURE", "true"),
        ])
        .expect("settings must load");
        assert_eq!(settings.posts_per_page, 25);
        assert!(settings.session_cookie_secure);

        assert!(
            settings_from(&[
                ("DATABASE_URL", "postgres://localhost/yatube"),
                ("SESSION_SECRET", SECRET),
                ("POSTS_PER_PAGE", "0"),
            ])
            .is_err()
        );
        assert!(
            settings_from(&[
                ("DATABASE_URL", "postgres://localhost/yatube"),
                ("SESSION_SECRET", SECRET),
                ("HTTP_CONCURRENCY_LIMIT", "lots"),
            ])
            .is_err()
        );
    }

    #[test]
    fn session_ttl_must_be_positive() {
        for ttl in ["0", "-60"] {
            let err = settings_from(&[
                ("DATABASE_URL", "postgres://localhost/yatube"),
                ("SESSION_SECRET", SECRET),
                ("SESSION_TTL_SECONDS", ttl),
            ])
            .expect_err("non-positive ttl must fail");
            assert!(err.to_string().contains("SESSION_TTL_SECONDS"), "{ttl}");
        }

        let settings = settings_from(&[
            ("DATABASE_URL", "postgres://localhost/yatube"),
            ("SESSION_SECRET", SECRET),
            ("SESSION_TTL_SECONDS", "600"),
        ])
        .expect("settings must load");
        assert_eq!(settings.session_ttl_seconds, 600);
    }
}
