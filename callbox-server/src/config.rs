//! Server configuration.
//!
//! Built by the binary from flags and environment variables; everything has
//! a default so `ServerConfig::default()` is a working local setup.

use axum::http::{HeaderValue, Method};
use callbox_core::IceServerConfig;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default capacity of the coordinator's command channel.
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

/// Public STUN servers handed to clients when none are configured.
pub const DEFAULT_STUN_SERVERS: [&str; 5] = [
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
    "stun:stun2.l.google.com:19302",
    "stun:stun3.l.google.com:19302",
    "stun:stun4.l.google.com:19302",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigin {
    Any,
    Exact(String),
}

impl FromStr for CorsOrigin {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "*" => CorsOrigin::Any,
            origin => CorsOrigin::Exact(origin.to_owned()),
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Command buffer must be greater than zero")]
    ZeroCommandBuffer,

    #[error("Invalid CORS origin: {0:?}")]
    InvalidCorsOrigin(String),

    #[error("ICE server entry has no urls")]
    EmptyIceServerUrls,

    #[error("TURN server {0} needs both a username and a credential")]
    IncompleteTurnCredentials(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to (default: 0.0.0.0:5000).
    pub bind_address: SocketAddr,

    /// Origin allowed by CORS (default: any).
    pub cors_origin: CorsOrigin,

    /// STUN/TURN servers advertised in the `welcome` event.
    pub ice_servers: Vec<IceServerConfig>,

    /// Capacity of the coordinator's command channel. Connection handlers
    /// wait when it is full.
    pub command_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            cors_origin: CorsOrigin::Any,
            ice_servers: DEFAULT_STUN_SERVERS
                .iter()
                .map(|url| IceServerConfig::stun(*url))
                .collect(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_buffer == 0 {
            return Err(ConfigError::ZeroCommandBuffer);
        }

        for server in &self.ice_servers {
            if server.urls.is_empty() {
                return Err(ConfigError::EmptyIceServerUrls);
            }
            let is_turn = server
                .urls
                .iter()
                .any(|url| url.starts_with("turn:") || url.starts_with("turns:"));
            if is_turn && (server.username.is_none() || server.credential.is_none()) {
                return Err(ConfigError::IncompleteTurnCredentials(server.urls.join(",")));
            }
        }

        self.cors_layer().map(|_| ())
    }

    pub fn cors_layer(&self) -> Result<CorsLayer, ConfigError> {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any);

        match &self.cors_origin {
            CorsOrigin::Any => Ok(layer.allow_origin(Any)),
            CorsOrigin::Exact(origin) => {
                if origin.is_empty() {
                    return Err(ConfigError::InvalidCorsOrigin(origin.clone()));
                }
                let value = HeaderValue::from_str(origin)
                    .map_err(|_| ConfigError::InvalidCorsOrigin(origin.clone()))?;
                Ok(layer.allow_origin(value))
            }
        }
    }
}
