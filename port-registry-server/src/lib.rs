//! TCP daemon for the port registry.
//!
//! Clients send one command per line and receive one reply line: legacy
//! text, or a JSON array when the command asked for structured output.
//!
//! ```text
//! > register /cam tcp 192.168.1.5 10002
//! < old (registration name /cam ip 192.168.1.5 port 10002 type tcp)
//! > bot query /cam
//! < ["port",["name","/cam"],["ip","192.168.1.5"],["port_number",10002],["carrier","tcp"]]
//! ```
//!
//! A store failure stops the daemon; everything else is answered in-band.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use port_registry::{
    Activity, AttributeStore, ChangeSubscriber, Command, LEGACY_TAG, MemoryStore, PortAllocator,
    Registration, Registry, RegistryError,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub use config::Args;

/// Subscriber that records registration activity in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActivityLog;

impl ChangeSubscriber for ActivityLog {
    fn welcome(&self, name: &str, activity: Activity) {
        debug!(%name, %activity, "port activity");
    }
}

/// Builds an in-memory registry for a daemon listening on `port`.
#[must_use]
pub fn build_registry(args: &Args, port: u16) -> Registry<MemoryStore> {
    Registry::new(
        MemoryStore::new(),
        Arc::new(PortAllocator::new(args.allocator_config())),
        args.registry_config(port),
    )
    .with_subscriber(Arc::new(ActivityLog))
}

/// Registers the daemon's own name at its advertised contact.
///
/// # Errors
///
/// Returns `RegistryError` if the store fails or the lock is poisoned.
pub fn register_self<S: AttributeStore>(registry: &Registry<S>) -> Result<(), RegistryError> {
    let own = registry.config().server_contact.clone();
    let registration = Registration::new(own.name())
        .with_carrier(own.carrier())
        .with_host(own.host())
        .with_port(own.port());
    registry.register(registration, None)?;
    info!(contact = %own, "registered own name");
    Ok(())
}

/// Accepts connections until a registry failure occurs.
///
/// # Errors
///
/// Returns an error if accepting fails or any connection hits a store
/// failure.
pub async fn serve<S>(listener: TcpListener, registry: Arc<Registry<S>>) -> anyhow::Result<()>
where
    S: AttributeStore + 'static,
{
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<RegistryError>(1);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted.context("accept failed")?;
                debug!(%peer, "connection opened");
                let registry = Arc::clone(&registry);
                let fatal_tx = fatal_tx.clone();
                tokio::spawn(async move {
                    match handle_connection(stream, peer, &registry).await {
                        Ok(()) => debug!(%peer, "connection closed"),
                        Err(e) => match e.downcast::<RegistryError>() {
                            Ok(fatal) => {
                                error!(%peer, error = %fatal, "registry failure");
                                let _ = fatal_tx.send(fatal).await;
                            }
                            Err(e) => warn!(%peer, error = %e, "connection dropped"),
                        },
                    }
                });
            }
            Some(fatal) = fatal_rx.recv() => {
                return Err(fatal).context("registry store failed");
            }
        }
    }
}

async fn handle_connection<S>(
    stream: TcpStream,
    peer: SocketAddr,
    registry: &Registry<S>,
) -> anyhow::Result<()>
where
    S: AttributeStore,
{
    let remote = peer.ip().to_string();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = respond(registry, line, &remote)?;
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}

/// Applies one protocol line and returns the reply line.
fn respond<S: AttributeStore>(
    registry: &Registry<S>,
    line: &str,
    remote: &str,
) -> Result<String, RegistryError> {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => {
            warn!(%remote, error = %e, "unreadable command");
            return Ok(LEGACY_TAG.to_string());
        }
    };
    let response = registry.apply(&command, Some(remote))?;
    for event in response.events() {
        info!(%event, "registry change");
    }
    Ok(response.to_line())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn registry() -> Registry<MemoryStore> {
        let args = Args::parse_from(["port-registry-server", "--silent"]);
        build_registry(&args, 10000)
    }

    #[test]
    fn respond_renders_both_modes() {
        let registry = registry();
        assert_eq!(
            respond(&registry, "register /cam tcp 10.0.0.2 10002", "10.0.0.9").unwrap(),
            "old (registration name /cam ip 10.0.0.2 port 10002 type tcp)"
        );
        assert_eq!(
            respond(&registry, "bot query /cam", "10.0.0.9").unwrap(),
            r#"["port",["name","/cam"],["ip","10.0.0.2"],["port_number",10002],["carrier","tcp"]]"#
        );
    }

    #[test]
    fn own_name_resolves_after_registration() {
        let registry = registry();
        register_self(&registry).unwrap();
        assert_eq!(
            respond(&registry, "query /root", "10.0.0.9").unwrap(),
            "old (registration name /root ip localhost port 10000 type tcp)"
        );
    }

    #[test]
    fn unreadable_lines_get_minimal_reply() {
        let registry = registry();
        assert_eq!(respond(&registry, "query \"open", "10.0.0.9").unwrap(), "old");
    }

    #[test]
    fn store_failure_is_reported() {
        let registry = registry();
        registry.access_store(MemoryStore::close).unwrap();
        let err = respond(&registry, "query /cam", "10.0.0.9").unwrap_err();
        assert!(err.is_store_unavailable());
    }
}
