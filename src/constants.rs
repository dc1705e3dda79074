//! Protocol constants shared by the registry, allocator, and renderers.

/// Field value meaning "choose automatically".
pub const AUTO: &str = "...";

/// Wildcard attribute value.
pub const WILDCARD: &str = "*";

/// Carrier used when none is given.
pub const DEFAULT_CARRIER: &str = "tcp";

/// Broadcast carrier. Registrations on it need no host and emit no events.
pub const MCAST_CARRIER: &str = "mcast";

/// Topic-relay carrier. Registrations on it live at the daemon's own address.
pub const TOPIC_CARRIER: &str = "topic";

/// Host reported when nothing better is known.
pub const DEFAULT_HOST: &str = "localhost";

/// Socket port reported for records that never stored one.
pub const DEFAULT_SOCKET: u16 = 10000;

/// Tag that opens every legacy reply.
pub const LEGACY_TAG: &str = "old";

/// Error code carried by structured replies for unknown names.
pub const ERROR_NOT_KNOWN: i64 = -2;

/// Error code carried by structured replies for allocation failures.
pub const ERROR_ALLOCATION: i64 = -3;

/// Attribute keys with a fixed meaning.
pub mod keys {
    /// Record identity: the registered name.
    pub const PORT: &str = "port";
    /// Host the port listens on.
    pub const HOST: &str = "host";
    /// Socket port number.
    pub const SOCKET: &str = "socket";
    /// Transport scheme.
    pub const CARRIER: &str = "carrier";
    /// Payload type annotation.
    pub const TYPE: &str = "type";
    /// Child names unregistered together with this record.
    pub const OWNS: &str = "owns";
    /// Alternative addresses selectable by network prefix.
    pub const IPS: &str = "ips";
    /// Marks records that belong to live managed processes.
    pub const RUNNER: &str = "yarprun";
}
