use anyhow::Result;
use callbox_core::IceServerConfig;
use callbox_server::{
    CorsOrigin, DEFAULT_COMMAND_BUFFER, DEFAULT_PORT, DEFAULT_STUN_SERVERS, ServerConfig,
};
use clap::Parser;
use colored::*;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "callbox=info";

#[derive(Parser, Debug)]
#[command(name = "callbox", version, about = "Two-party WebRTC signaling server")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "CALLBOX_BIND", default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
    bind: SocketAddr,

    /// Allowed CORS origin, or `*` for any.
    #[arg(long, env = "CALLBOX_CORS_ORIGIN", default_value = "*")]
    cors_origin: CorsOrigin,

    /// STUN server url advertised to clients. Repeatable; defaults to public Google servers.
    #[arg(long = "stun", env = "CALLBOX_STUN", value_delimiter = ',')]
    stun: Vec<String>,

    #[arg(long, env = "CALLBOX_TURN_URL")]
    turn_url: Option<String>,

    #[arg(long, env = "CALLBOX_TURN_USERNAME")]
    turn_username: Option<String>,

    #[arg(long, env = "CALLBOX_TURN_CREDENTIAL", hide_env_values = true)]
    turn_credential: Option<String>,

    /// Capacity of the coordinator's command queue.
    #[arg(long, env = "CALLBOX_COMMAND_BUFFER", default_value_t = DEFAULT_COMMAND_BUFFER)]
    command_buffer: usize,

    /// tracing filter directive.
    #[arg(long, env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER)]
    log: String,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let mut ice_servers: Vec<IceServerConfig> = if self.stun.is_empty() {
            DEFAULT_STUN_SERVERS
                .iter()
                .map(|url| IceServerConfig::stun(*url))
                .collect()
        } else {
            self.stun.into_iter().map(IceServerConfig::stun).collect()
        };

        if let Some(url) = self.turn_url {
            ice_servers.push(IceServerConfig {
                urls: vec![url],
                username: self.turn_username,
                credential: self.turn_credential,
            });
        }

        ServerConfig {
            bind_address: self.bind,
            cors_origin: self.cors_origin,
            ice_servers,
            command_buffer: self.command_buffer,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.into_config();

    println!("{}", "📞 Starting callbox signaling server...".green().bold());
    info!(
        bind_address = %config.bind_address,
        cors_origin = ?config.cors_origin,
        ice_servers = config.ice_servers.len(),
        "Configuration loaded"
    );

    callbox_server::serve(config, shutdown_signal()).await
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down"),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
