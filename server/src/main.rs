use clap::Parser;
use log::info;
use server::network::{Server, ServerConfig};
use shared::TcpTransport;

/// Authoritative grid server.
/// Accepts clients over TCP and advances the board at a fixed tick rate.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value = "30")]
    tick_rate: u32,
    /// Board width in tiles
    #[clap(long, default_value = "10", value_parser = clap::value_parser!(i32).range(1..=shared::MAX_DIMENSION as i64))]
    width: i32,
    /// Board height in tiles
    #[clap(long, default_value = "10", value_parser = clap::value_parser!(i32).range(1..=shared::MAX_DIMENSION as i64))]
    height: i32,
    /// Maximum concurrent clients
    #[clap(short, long, default_value = "255")]
    max_clients: usize,
    /// Seed for spawn positions and colors
    #[clap(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        tick_rate: args.tick_rate,
        width: args.width,
        height: args.height,
        max_clients: args.max_clients,
        seed: args.seed,
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut transport = TcpTransport::listen(&address).await?;
    info!("Server listening on {}", transport.local_addr());

    let mut server = Server::new(config);
    tokio::select! {
        result = server.run(&mut transport) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
