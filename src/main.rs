//! ztalk command-line interface

use clap::{Parser, Subcommand};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use ztalk::{ChatConfig, ChatNode};

#[derive(Parser)]
#[command(name = "ztalk", version, about = "Minimal UDP chat for LANs and overlay networks")]
struct Cli {
    /// Path to a JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Username (prompted for when omitted)
    #[arg(long, short)]
    username: Option<String>,

    /// Override the multicast group address
    #[arg(long)]
    group: Option<Ipv4Addr>,

    /// Override the chat port for the selected mode
    #[arg(long, short)]
    port: Option<u16>,

    /// Add a unicast peer (repeatable)
    #[arg(long = "peer", value_name = "IP")]
    peers: Vec<IpAddr>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Group chat over multicast (default)
    Multicast,
    /// Send to a fixed peer list, one datagram each
    UnicastSend,
    /// Print whatever arrives on the unicast port
    UnicastRecv,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> ztalk::Result<()> {
    let cli = Cli::parse();
    let mode = cli.mode.unwrap_or(Mode::Multicast);

    let mut config = match &cli.config {
        Some(path) => ChatConfig::load(path)?,
        None => ChatConfig::default(),
    };
    if let Some(group) = cli.group {
        config.group = group;
    }
    if let Some(port) = cli.port {
        match mode {
            Mode::Multicast => config.multicast_port = port,
            Mode::UnicastSend | Mode::UnicastRecv => config.unicast_port = port,
        }
    }
    config.peers.extend(cli.peers);

    let mut node = ChatNode::new(config);
    if let Some(username) = cli.username {
        node = node.with_username(username);
    }

    match mode {
        Mode::Multicast => node.run_multicast().await,
        Mode::UnicastSend => node.run_unicast_sender().await,
        Mode::UnicastRecv => node.run_unicast_receiver().await,
    }
}
