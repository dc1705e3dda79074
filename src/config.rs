//! Configuration for the registry and the bundled allocator.

use std::ops::RangeInclusive;

use crate::Contact;

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryConfig {
    /// The daemon's own advertised contact.
    ///
    /// Registrations on the topic carrier resolve here.
    /// Default: `tcp://localhost:10000`, named `/root`
    pub server_contact: Contact,

    /// Suppresses the per-command log line.
    ///
    /// Default: false
    pub silent: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            server_contact: Contact::new("/root", "tcp", "localhost", 10000),
            silent: false,
        }
    }
}

impl RegistryConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the daemon's advertised contact.
    #[must_use]
    pub fn with_server_contact(mut self, contact: Contact) -> Self {
        self.server_contact = contact;
        self
    }

    /// Enables or disables per-command logging.
    #[must_use]
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

/// Configuration for the bundled [`PortAllocator`](crate::PortAllocator).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocatorConfig {
    /// Socket ports handed out to registrations without one.
    ///
    /// Default: 10002..=19999
    pub port_range: RangeInclusive<u16>,

    /// Port used for multicast groups.
    ///
    /// Default: 11000
    pub mcast_port: u16,

    /// First two octets of generated multicast groups.
    ///
    /// Default: `[224, 1]`
    pub mcast_prefix: [u8; 2],

    /// Prefix of generated port names.
    ///
    /// Default: `/tmp/port/`
    pub name_prefix: String,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            port_range: 10002..=19999,
            mcast_port: 11000,
            mcast_prefix: [224, 1],
            name_prefix: "/tmp/port/".to_string(),
        }
    }
}

impl AllocatorConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the range of socket ports to hand out.
    #[must_use]
    pub fn with_port_range(mut self, range: RangeInclusive<u16>) -> Self {
        self.port_range = range;
        self
    }

    /// Sets the multicast port.
    #[must_use]
    pub fn with_mcast_port(mut self, port: u16) -> Self {
        self.mcast_port = port;
        self
    }

    /// Sets the generated-name prefix.
    #[must_use]
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.server_contact.port(), 10000);
        assert_eq!(config.server_contact.host(), "localhost");
        assert!(!config.silent);
    }

    #[test]
    fn registry_builder_pattern() {
        let config = RegistryConfig::new()
            .with_server_contact(Contact::new("/root", "tcp", "10.0.0.1", 10500))
            .with_silent(true);
        assert_eq!(config.server_contact.host(), "10.0.0.1");
        assert!(config.silent);
    }

    #[test]
    fn default_allocator_config() {
        let config = AllocatorConfig::default();
        assert_eq!(config.port_range, 10002..=19999);
        assert_eq!(config.mcast_port, 11000);
        assert_eq!(config.name_prefix, "/tmp/port/");
    }

    #[test]
    fn allocator_builder_pattern() {
        let config = AllocatorConfig::new()
            .with_port_range(20000..=20010)
            .with_mcast_port(12000)
            .with_name_prefix("/auto/");
        assert_eq!(config.port_range, 20000..=20010);
        assert_eq!(config.mcast_port, 12000);
        assert_eq!(config.name_prefix, "/auto/");
    }
}
