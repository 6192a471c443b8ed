use std::{fmt, str::FromStr};

use anyhow::{bail, Context};
use jsonwebtoken::Algorithm;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
// One year.
const MAX_TTL_MINUTES: i64 = 525_600;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

/// Credentials for the admin account created at start-up, if configured.
#[derive(Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cors_origins: Vec<String>,
    pub admin: Option<AdminSeed>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let algorithm = parse_algorithm(&get("JWT_ALGORITHM").unwrap_or_else(|| "HS256".into()))?;

        let ttl_minutes = match get("JWT_TTL_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("JWT_TTL_MINUTES is not an integer: {raw}"))?,
            None => 30,
        };
        if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
            bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}");
        }

        let port = match get("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a valid port: {raw}"))?,
            None => 8080,
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed {
                    name: get("ADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
                    email,
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            app_name: get("APP_NAME").unwrap_or_else(|| "Primetrade API".into()),
            database_url,
            jwt: JwtConfig {
                secret,
                algorithm,
                ttl_minutes,
            },
            cors_origins,
            admin,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }
}

// Tokens are signed with a shared secret, so only the HMAC family makes sense.
fn parse_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let algorithm = Algorithm::from_str(raw.trim())
        .map_err(|_| anyhow::anyhow!("unknown JWT_ALGORITHM: {raw}"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => bail!("JWT_ALGORITHM {other:?} is not an HMAC algorithm"),
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

    const BASE: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/primetrade"),
        ("JWT_SECRET", "s3cret"),
    ];

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_lookup(lookup(BASE)).expect("config");
        assert_eq!(cfg.jwt.algorithm, Algorithm::HS256);
        assert_eq!(cfg.jwt.ttl_minutes, 30);
        assert_eq!(cfg.app_name, "Primetrade API");
        assert_eq!(
            cfg.cors_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
        assert!(cfg.admin.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn rejects_asymmetric_algorithm() {
        let mut pairs = BASE.to_vec();
        pairs.push(("JWT_ALGORITHM", "RS256"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let mut pairs = BASE.to_vec();
        pairs.push(("JWT_TTL_MINUTES", "0"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn ttl_above_one_year_is_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("JWT_TTL_MINUTES", "525600"));
        let cfg = AppConfig::from_lookup(lookup(&pairs)).expect("one year is allowed");
        assert_eq!(cfg.jwt.ttl_minutes, 525_600);

        for raw in ["525601", "100000000000", "9223372036854775807"] {
            let mut pairs = BASE.to_vec();
            pairs.push(("JWT_TTL_MINUTES", raw));
            let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "{raw}: {err}");
        }
    }

    #[test]
    fn bind_address_comes_from_env() {
        let cfg = AppConfig::from_lookup(lookup(BASE)).expect("config");
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);

        let mut pairs = BASE.to_vec();
        pairs.push(("APP_HOST", "127.0.0.1"));
        pairs.push(("APP_PORT", "9000"));
        let cfg = AppConfig::from_lookup(lookup(&pairs)).expect("config");
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9000);

        let mut pairs = BASE.to_vec();
        pairs.push(("APP_PORT", "70000"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn admin_seed_needs_email_and_password() {
        let mut pairs = BASE.to_vec();
        pairs.push(("ADMIN_EMAIL", "root@example.com"));
        let cfg = AppConfig::from_lookup(lookup(&pairs)).expect("config");
        assert!(cfg.admin.is_none());

        pairs.push(("ADMIN_PASSWORD", "hunter2hunter2"));
        let cfg = AppConfig::from_lookup(lookup(&pairs)).expect("config");
        let admin = cfg.admin.expect("admin seed");
        assert_eq!(admin.email, "root@example.com");
        assert_eq!(admin.name, "Administrator");
    }

    #[test]
    fn debug_output_hides_secret() {
        let cfg = AppConfig::from_lookup(lookup(BASE)).expect("config");
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("s3cret"));
    }
}
