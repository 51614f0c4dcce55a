use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dns_relay::server::DnsServer;

/// Address the reference test harness expects the server on.
const BIND_ADDR: &str = "127.0.0.1:2053";

#[derive(Parser, Debug)]
#[command(name = "dns-relay")]
struct Args {
    /// Upstream DNS resolver as host[:port], e.g. 8.8.8.8:53; when absent
    /// every question gets a placeholder answer
    #[arg(long)]
    resolver: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut server = DnsServer::new(BIND_ADDR, args.resolver.as_deref())?;
    info!(addr = BIND_ADDR, "listening");
    server.run();

    Ok(())
}
