//! Gateway configuration with validation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Main gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Port for the REST surface and the WebSocket feed.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            cors: CorsConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), GatewayConfigError> {
        if self.port == 0 {
            return Err(GatewayConfigError::InvalidPort);
        }
        if self.cors.allowed_origins.is_empty() {
            return Err(GatewayConfigError::NoOrigins);
        }
        Ok(())
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// CORS configuration.
///
/// The feed endpoint is consumed by browser frontends served from other
/// origins, so the default policy is allow-any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS handling.
    pub enabled: bool,
    /// Allowed origins ("*" for all).
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayConfigError {
    /// Port 0 cannot be served.
    #[error("port cannot be 0")]
    InvalidPort,
    /// CORS enabled with no allowed origins.
    #[error("at least one allowed origin is required")]
    NoOrigins,
}
