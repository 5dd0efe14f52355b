use anyhow::{Result, bail};
use clap::Parser;
use colored::*;
use huddle_core::IceServerConfig;
use huddle_server::{DEFAULT_BIND_ADDR, ServerConfig};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(about = "WebRTC signaling relay for small group calls")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "HUDDLE_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// STUN URLs handed to clients in `welcome`.
    #[arg(long, env = "HUDDLE_STUN", value_delimiter = ',')]
    stun: Vec<String>,

    #[arg(long, env = "HUDDLE_TURN", value_delimiter = ',')]
    turn: Vec<String>,

    #[arg(long, env = "HUDDLE_TURN_USERNAME")]
    turn_username: Option<String>,

    #[arg(long, env = "HUDDLE_TURN_CREDENTIAL")]
    turn_credential: Option<String>,
}

impl Cli {
    fn server_config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::new(self.bind);

        if !self.stun.is_empty() {
            config = config.with_ice_server(IceServerConfig {
                urls: self.stun.clone(),
                username: None,
                credential: None,
            });
        }

        if !self.turn.is_empty() {
            if self.turn_username.is_none() || self.turn_credential.is_none() {
                bail!("TURN servers need both --turn-username and --turn-credential");
            }
            config = config.with_ice_server(IceServerConfig {
                urls: self.turn.clone(),
                username: self.turn_username.clone(),
                credential: self.turn_credential.clone(),
            });
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.server_config()?;

    println!("{}", "📡 Starting Huddle signaling relay...".green().bold());
    println!("   🔌 Listening: ws://{}/ws", config.bind);
    if config.ice_servers.is_empty() {
        println!("   🧊 ICE:       client defaults");
    } else {
        for server in &config.ice_servers {
            println!("   🧊 ICE:       {}", server.urls.join(", ").cyan());
        }
    }

    huddle_server::run(config).await
}
