//! Transport tests against a live listener.

use std::sync::Arc;

use clap::Parser;
use port_registry::{MemoryStore, Registry};
use port_registry_server::{Args, build_registry, register_self, serve};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

async fn start() -> (
    std::net::SocketAddr,
    Arc<Registry<MemoryStore>>,
    JoinHandle<anyhow::Result<()>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let args = Args::parse_from(["port-registry-server", "--silent"]);
    let registry = Arc::new(build_registry(&args, addr.port()));
    register_self(&registry).unwrap();
    let server = tokio::spawn(serve(listener, Arc::clone(&registry)));
    (addr, registry, server)
}

struct Client {
    lines: tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let (reader, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) -> Option<String> {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.lines.next_line().await.unwrap()
    }
}

#[tokio::test]
async fn one_reply_line_per_command() {
    let (addr, _registry, _server) = start().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(
        client.send("register /cam tcp 10.0.0.2 10002").await.unwrap(),
        "old (registration name /cam ip 10.0.0.2 port 10002 type tcp)"
    );
    assert_eq!(
        client.send("query /cam format=json").await.unwrap(),
        r#"["port",["name","/cam"],["ip","10.0.0.2"],["port_number",10002],["carrier","tcp"]]"#
    );
    assert_eq!(client.send("frobnicate").await.unwrap(), "old");
}

#[tokio::test]
async fn daemon_answers_for_its_own_name() {
    let (addr, _registry, _server) = start().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(
        client.send("query /root").await.unwrap(),
        format!(
            "old (registration name /root ip localhost port {} type tcp)",
            addr.port()
        )
    );
}

#[tokio::test]
async fn peer_address_is_the_default_host() {
    let (addr, registry, _server) = start().await;
    let mut client = Client::connect(addr).await;

    client.send("register /mine").await.unwrap();
    let contact = registry.query("/mine").unwrap().unwrap();
    assert_eq!(contact.host(), "127.0.0.1");
}

#[tokio::test]
async fn registrations_are_shared_between_connections() {
    let (addr, _registry, _server) = start().await;
    let mut first = Client::connect(addr).await;
    let mut second = Client::connect(addr).await;

    first.send("register /shared tcp 10.0.0.5 10010").await.unwrap();
    assert_eq!(
        second.send("query /shared").await.unwrap(),
        "old (registration name /shared ip 10.0.0.5 port 10010 type tcp)"
    );
}

#[tokio::test]
async fn store_failure_stops_the_server() {
    let (addr, registry, server) = start().await;
    let mut client = Client::connect(addr).await;
    registry.access_store(MemoryStore::close).unwrap();

    assert!(client.send("query /cam").await.is_none());
    let result = server.await.unwrap();
    assert!(result.is_err());
}
