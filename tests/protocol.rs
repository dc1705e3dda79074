//! End-to-end command sessions through the text protocol.

use std::sync::Arc;

use port_registry::{
    Command, EventKind, MemoryStore, NameLookup, PortAllocator, Registry, RegistryConfig,
    Response,
};

fn registry() -> Registry<MemoryStore> {
    Registry::new(
        MemoryStore::new(),
        Arc::new(PortAllocator::with_defaults()),
        RegistryConfig::new().with_silent(true),
    )
}

fn send(registry: &Registry<MemoryStore>, line: &str) -> Response {
    registry
        .apply(&Command::parse(line).unwrap(), Some("192.168.1.20"))
        .unwrap()
}

#[test]
fn camera_session() {
    let registry = registry();

    let response = send(&registry, "register /cam tcp 192.168.1.5 10002");
    assert_eq!(
        response.to_line(),
        "old (registration name /cam ip 192.168.1.5 port 10002 type tcp)"
    );
    assert_eq!(response.events()[0].kind(), EventKind::Add);

    assert_eq!(
        send(&registry, "NAME_SERVER query /cam").to_line(),
        "old (registration name /cam ip 192.168.1.5 port 10002 type tcp)"
    );

    send(&registry, "set /cam yarprun true");
    assert_eq!(
        send(&registry, "check /cam yarprun true").to_line(),
        "old (port /cam property yarprun value true present true)"
    );
    assert_eq!(
        send(&registry, "runners").to_line(),
        "old (registration name /cam ip 192.168.1.5 port 10002 type tcp)"
    );

    let response = send(&registry, "unregister /cam");
    assert_eq!(response.events()[0].kind(), EventKind::Del);
    assert_eq!(send(&registry, "query /cam").to_line(), "old ()");
}

#[test]
fn structured_session_speaks_json() {
    let registry = registry();
    send(&registry, "register /a/b");
    send(&registry, "register /a/c");
    send(&registry, "register /x/y");

    let response = send(&registry, "bot list /a");
    let json = response.reply().to_json();
    assert_eq!(json[0], "ports");
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(json[1][1][1], "/a/b");
    assert_eq!(json[1][2][1], "192.168.1.20");
    assert_eq!(json[2][1][1], "/a/c");

    let line = send(&registry, "query /nobody format=json").to_line();
    assert_eq!(line, r#"["port",["error",-2,"port not known"]]"#);
}

#[test]
fn malformed_lines_do_not_disturb_state() {
    let registry = registry();
    send(&registry, "register /cam tcp 10.0.0.2 10002");

    assert!(Command::parse("register (/cam").is_err());
    for line in ["", "register", "set /cam", "check /cam k", "route /a", "bogus 1 2"] {
        let response = send(&registry, line);
        assert!(!response.succeeded(), "{line:?}");
        assert!(response.events().is_empty());
    }
    assert_eq!(registry.list(None).unwrap().len(), 1);
}

#[test]
fn chained_registries() {
    let upstream = Arc::new(registry());
    send(&upstream, "register /remote tcp 10.9.9.9 12000");

    let local = registry().with_delegate(upstream);
    send(&local, "register /local tcp 10.0.0.1 12001");

    assert_eq!(local.lookup("/remote").unwrap().host(), "10.9.9.9");
    assert_eq!(
        send(&local, "query /remote").to_line(),
        "old (registration name /remote ip 10.9.9.9 port 12000 type tcp)"
    );
    assert_eq!(
        local.resolve("udp://10.0.0.7:9000").unwrap().unwrap().carrier(),
        "udp"
    );
}
