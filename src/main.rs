use clap::Parser;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pcbook::server::{LaptopServer, ServerConfig};
use pcbook::{InMemoryLaptopStore, LaptopService, RequestContext};

#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = "Laptop catalog server", long_about = None)]
struct Args {
    #[clap(long, default_value = "0.0.0.0")]
    host: String,

    /// The server port (0 lets the OS pick one)
    #[clap(long, default_value = "8080")]
    port: u16,

    /// Runtime worker threads (defaults to the number of logical cores)
    #[clap(long)]
    workers: Option<usize>,

    /// Per-search deadline in milliseconds; 0 disables it
    #[clap(long, default_value = "5000")]
    search_timeout_ms: u64,

    /// Results buffered between the store and a slow client
    #[clap(long, default_value = "16")]
    search_buffer: usize,
}

impl From<&Args> for ServerConfig {
    fn from(args: &Args) -> Self {
        Self {
            addr: format!("{}:{}", args.host, args.port),
            search_timeout: (args.search_timeout_ms > 0)
            .then(|| Duration::from_millis(args.search_timeout_ms)),
            search_buffer: args.search_buffer,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let workers = args
    .workers
    .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

    tokio::runtime::Builder::new_multi_thread()
    .worker_threads(workers)
    .enable_all()
    .build()?
    .block_on(async_main(args, workers))
}

async fn async_main(args: Args, workers: usize) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
    .with_target(false)
    .with_level(true)
    .with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,pcbook=info")),
    )
    .init();

    let config = ServerConfig::from(&args);
    info!(workers, addr = %config.addr, "starting laptop server");

    let store = Arc::new(InMemoryLaptopStore::new());
    let server = LaptopServer::new(LaptopService::new(store), config);

    let shutdown = RequestContext::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c");
            signal.cancel();
        }
    });

    server.run(shutdown).await?;
    info!("shut down");
    Ok(())
}
