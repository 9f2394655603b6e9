use std::time::Duration;

use clap::Parser;
use pairplay::logging::setup_logger;
use pairplay::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "pairplay-server", about = "Two-player matchmaking server")]
struct Args {
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Seconds a room record lives after its last write.
    #[arg(long, default_value = "600")]
    room_ttl_secs: u64,

    /// Upper bound on a single storage call, in milliseconds.
    #[arg(long, default_value = "2000")]
    store_timeout_ms: u64,

    /// Seconds a connection may stay silent before it is dropped.
    #[arg(long, default_value = "60")]
    idle_timeout_secs: u64,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), PairplayError> {
    let args = Args::parse();
    setup_logger(&args.log_level);

    let addr = format!("{}:{}", args.host, args.port);
    let server = PairplayServer::builder()
        .bind(&addr)
        .idle_timeout(Duration::from_secs(args.idle_timeout_secs))
        .store_timeout(Duration::from_millis(args.store_timeout_ms))
        .room_config(RoomConfig::default().with_room_ttl(Duration::from_secs(args.room_ttl_secs)))
        .build()
        .await?;

    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await
}
