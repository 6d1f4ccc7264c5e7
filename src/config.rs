use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub tenancy: TenancyConfig,
}

/// Which paths require a resolved tenant.
#[derive(Debug, Clone)]
pub struct TenancyConfig {
    /// Every path under this prefix needs a tenant unless exempted.
    pub api_prefix: String,
    /// Paths under these prefixes bypass the tenant gate.
    pub exempt_prefixes: Vec<String>,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api/".to_string(),
            exempt_prefixes: vec![
                "/admin/".to_string(),
                "/graphql/".to_string(),
                "/api/organizations/".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("WORKTRACK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid WORKTRACK_HOST: {e}"))?;

        let port: u16 = env_or("WORKTRACK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid WORKTRACK_PORT: {e}"))?;

        let max_body_size: usize = env_or("WORKTRACK_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid WORKTRACK_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("WORKTRACK_LOG_LEVEL", "info");

        let db_max_connections: u32 = env_or("WORKTRACK_DB_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|e| format!("Invalid WORKTRACK_DB_MAX_CONNECTIONS: {e}"))?;

        let db_acquire_timeout_secs: u64 = env_or("WORKTRACK_DB_ACQUIRE_TIMEOUT", "5")
            .parse()
            .map_err(|e| format!("Invalid WORKTRACK_DB_ACQUIRE_TIMEOUT: {e}"))?;

        let defaults = TenancyConfig::default();
        let api_prefix = env_or("WORKTRACK_API_PREFIX", &defaults.api_prefix);
        if !api_prefix.starts_with('/') {
            return Err(format!(
                "Invalid WORKTRACK_API_PREFIX '{api_prefix}': must start with '/'"
            ));
        }

        let exempt_prefixes = match std::env::var("WORKTRACK_EXEMPT_PATHS") {
            Ok(raw) => raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    let s = s.trim();
                    if s.starts_with('/') {
                        Ok(s.to_string())
                    } else {
                        Err(format!(
                            "Invalid WORKTRACK_EXEMPT_PATHS entry '{s}': must start with '/'"
                        ))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => defaults.exempt_prefixes,
        };

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            log_level,
            db_max_connections,
            db_acquire_timeout_secs,
            tenancy: TenancyConfig {
                api_prefix,
                exempt_prefixes,
            },
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
