use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rebody::{
    http::multipart::{
        DEFAULT_SIZE_MAX, DEFAULT_SIZE_THRESHOLD, MultipartConfig, MultipartDispatcher,
        UploadRepository,
    },
    server::BodyServer,
};

#[derive(Parser, Debug)]
#[command(name = "rebody-server")]
struct Opt {
    #[arg(long, default_value = "0.0.0.0")]
    ip: String,

    #[arg(long, default_value_t = 9000)]
    port: u16,

    /// Directory for multipart parts spilled to disk
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Parts above this many bytes are spilled to disk
    #[arg(long, default_value_t = DEFAULT_SIZE_THRESHOLD)]
    size_threshold: usize,

    /// Largest multipart body accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_SIZE_MAX)]
    size_max: u64,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opt = Opt::parse();
    let addr: SocketAddr = format!("{}:{}", opt.ip, opt.port).parse()?;

    let dir = opt.temp_dir.unwrap_or_else(UploadRepository::default_dir);
    let repository = UploadRepository::init(&dir)
        .with_context(|| format!("Failed to create temp directory {}", dir.display()))?;

    let config = MultipartConfig::new(repository)
        .with_size_threshold(opt.size_threshold)
        .with_size_max(opt.size_max);

    BodyServer::new(addr, MultipartDispatcher::new(config))
        .start()
        .await?;
    Ok(())
}
