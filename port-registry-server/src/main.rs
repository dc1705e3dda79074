use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use port_registry_server::{Args, build_registry, register_self, serve};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    let local = listener.local_addr()?;

    let registry = Arc::new(build_registry(&args, local.port()));
    register_self(&registry).context("failed to register own name")?;
    registry.go_public();
    info!(%local, name = %args.name, "port registry listening");

    tokio::select! {
        result = serve(listener, registry) => result,
        _ = signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}
