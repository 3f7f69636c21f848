//! Process configuration for the API binary.
//!
//! Read once at start-up from the environment; no hot reload.

use std::net::SocketAddr;

use thiserror::Error;

use storekeep_auth::{AuthConfig, ConfigError};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SEED_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_SEED_ADMIN_PASSWORD: &str = "admin123";

/// A deployable service hosted by this binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Identity,
    Inventory,
    Orders,
    Expenses,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Identity,
        ServiceKind::Inventory,
        ServiceKind::Orders,
        ServiceKind::Expenses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Inventory => "inventory",
            Self::Orders => "orders",
            Self::Expenses => "expenses",
        }
    }

    /// Parse a comma list such as `identity,orders`, or `all`.
    pub fn parse_list(raw: &str) -> Result<Vec<ServiceKind>, AppConfigError> {
        let mut out = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kinds: &[ServiceKind] = match name {
                "all" => &Self::ALL,
                "identity" => &[Self::Identity],
                "inventory" => &[Self::Inventory],
                "orders" => &[Self::Orders],
                "expenses" => &[Self::Expenses],
                other => return Err(AppConfigError::UnknownService(other.to_string())),
            };
            for kind in kinds {
                if !out.contains(kind) {
                    out.push(*kind);
                }
            }
        }
        if out.is_empty() {
            return Err(AppConfigError::NoServices);
        }
        Ok(out)
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error(transparent)]
    Auth(#[from] ConfigError),

    #[error("unknown service '{0}' in STOREKEEP_SERVICES")]
    UnknownService(String),

    #[error("STOREKEEP_SERVICES selects no service")]
    NoServices,

    #[error("invalid BIND_ADDR: {0}")]
    BindAddr(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub services: Vec<ServiceKind>,
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub seed_admin_password: String,
}

impl AppConfig {
    /// Every service, default bind address, in-memory identity store.
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth,
            services: ServiceKind::ALL.to_vec(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            seed_admin_password: DEFAULT_SEED_ADMIN_PASSWORD.to_string(),
        }
    }

    pub fn with_services(mut self, services: Vec<ServiceKind>) -> Self {
        self.services = services;
        self
    }

    pub fn hosts(&self, kind: ServiceKind) -> bool {
        self.services.contains(&kind)
    }

    pub fn from_env() -> Result<Self, AppConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppConfigError> {
        let auth = AuthConfig::from_lookup(&lookup)?;
        let services = match lookup("STOREKEEP_SERVICES") {
            Some(raw) => ServiceKind::parse_list(&raw)?,
            None => ServiceKind::ALL.to_vec(),
        };
        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| AppConfigError::BindAddr(format!("{bind_raw}: {e}")))?;

        Ok(Self {
            auth,
            services,
            bind_addr,
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            seed_admin_password: lookup("SEED_ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_SEED_ADMIN_PASSWORD.to_string()),
        })
    }
}
