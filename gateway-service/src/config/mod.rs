use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store_backend: StoreBackend,
    /// Preload the demo facilities into the in-memory store.
    pub seed_demo_facilities: bool,
    pub database: DatabaseConfig,
    pub google: GoogleOAuthConfig,
    pub session: SessionConfig,
    pub access: AccessConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

/// Where directory, session, facility and audit data live.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

/// Outcome for page paths that match no route group.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DefaultPolicy {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Longest accepted session lifetime, one year.
pub const MAX_SESSION_MAX_AGE_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub max_age_hours: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    pub trusted_domain: String,
    pub route_default_policy: DefaultPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub signin_attempts: u32,
    pub signin_window_seconds: u64,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let store_backend: StoreBackend =
            get_parsed("STORE_BACKEND", Some(if is_prod { "postgres" } else { "memory" }), false)?;
        let needs_db = store_backend == StoreBackend::Postgres;

        let config = GatewayConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("gateway-service"), false)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.trim().is_empty()),
            store_backend,
            seed_demo_facilities: get_parsed("SEED_DEMO_FACILITIES", Some("false"), false)?,
            database: DatabaseConfig {
                url: get_env(
                    "DATABASE_URL",
                    (!needs_db).then_some(""),
                    is_prod && needs_db,
                )?,
                max_connections: get_parsed("DATABASE_MAX_CONNECTIONS", Some("10"), false)?,
                min_connections: get_parsed("DATABASE_MIN_CONNECTIONS", Some("1"), false)?,
            },
            google: GoogleOAuthConfig {
                client_id: get_env("GOOGLE_CLIENT_ID", Some(""), is_prod)?,
                client_secret: get_env("GOOGLE_CLIENT_SECRET", Some(""), is_prod)?,
                redirect_uri: get_env(
                    "GOOGLE_REDIRECT_URI",
                    Some("http://localhost:8080/auth/google/callback"),
                    is_prod,
                )?,
            },
            session: SessionConfig {
                max_age_hours: get_parsed("SESSION_MAX_AGE_HOURS", Some("24"), false)?,
                cookie_secure: get_parsed(
                    "SESSION_COOKIE_SECURE",
                    Some(if is_prod { "true" } else { "false" }),
                    false,
                )?,
            },
            access: AccessConfig {
                trusted_domain: get_env("TRUSTED_DOMAIN", Some("hylur.net"), false)?
                    .trim()
                    .to_lowercase(),
                route_default_policy: get_parsed("ROUTE_DEFAULT_POLICY", Some("allow"), false)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            rate_limit: RateLimitConfig {
                signin_attempts: get_parsed("RATE_LIMIT_SIGNIN_ATTEMPTS", Some("10"), false)?,
                signin_window_seconds: get_parsed(
                    "RATE_LIMIT_SIGNIN_WINDOW_SECONDS",
                    Some("60"),
                    false,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        validate_session_max_age(self.session.max_age_hours)?;

        if self.access.trusted_domain.is_empty() || self.access.trusted_domain.contains('@') {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TRUSTED_DOMAIN must be a bare domain name"
            )));
        }

        if self.store_backend == StoreBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_URL is required when STORE_BACKEND=postgres"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.store_backend == StoreBackend::Memory {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "STORE_BACKEND=memory is not allowed in production"
                )));
            }

            if !self.session.cookie_secure {
                tracing::warn!("SESSION_COOKIE_SECURE is off in production");
            }
        }

        if self.seed_demo_facilities && self.store_backend == StoreBackend::Postgres {
            tracing::warn!("SEED_DEMO_FACILITIES only applies to STORE_BACKEND=memory; ignoring");
        }

        if self.access.route_default_policy == DefaultPolicy::Allow {
            tracing::info!("Unmatched page routes are allowed for any active session");
        }

        Ok(())
    }

    /// Session lifetime in whole hours, clamped to the accepted range so an
    /// unvalidated config cannot overflow date arithmetic.
    pub fn session_hours(&self) -> i64 {
        self.session.max_age_hours.clamp(0, MAX_SESSION_MAX_AGE_HOURS)
    }

    pub fn session_max_age(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.session_hours()).unwrap_or_else(chrono::Duration::zero)
    }
}

fn validate_session_max_age(hours: i64) -> Result<(), AppError> {
    if hours <= 0 {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "SESSION_MAX_AGE_HOURS must be positive"
        )));
    }
    if hours > MAX_SESSION_MAX_AGE_HOURS {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "SESSION_MAX_AGE_HOURS must be at most {}",
            MAX_SESSION_MAX_AGE_HOURS
        )));
    }
    Ok(())
}

fn get_env(key: &str, default: Option<&str>, required: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if required {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_parsed<T>(key: &str, default: Option<&str>, required: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default, required)?
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", key, e)))
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" => Ok(StoreBackend::Postgres),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

impl FromStr for DefaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(DefaultPolicy::Allow),
            "deny" => Ok(DefaultPolicy::Deny),
            _ => Err(format!("Invalid route default policy: {}", s)),
        }
    }
}
