//! Command-line configuration.

use std::net::SocketAddr;

use clap::Parser;
use port_registry::{AllocatorConfig, Contact, RegistryConfig};

/// Port registry daemon.
#[derive(Debug, Clone, Parser)]
#[command(name = "port-registry-server")]
#[command(about = "Name registry for named communication ports", long_about = None)]
#[command(version)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "PORT_REGISTRY_LISTEN", default_value = "0.0.0.0:10000")]
    pub listen: SocketAddr,

    /// Host advertised for the daemon itself (topic registrations resolve here)
    #[arg(long, env = "PORT_REGISTRY_HOST", default_value = "localhost")]
    pub advertise_host: String,

    /// Name the daemon registers under
    #[arg(long, env = "PORT_REGISTRY_NAME", default_value = "/root")]
    pub name: String,

    /// First socket port handed out automatically
    #[arg(long, default_value_t = 10002)]
    pub port_min: u16,

    /// Last socket port handed out automatically
    #[arg(long, default_value_t = 19999)]
    pub port_max: u16,

    /// Port used for multicast groups
    #[arg(long, default_value_t = 11000)]
    pub mcast_port: u16,

    /// Prefix of generated port names
    #[arg(long, default_value = "/tmp/port/")]
    pub name_prefix: String,

    /// Do not log every command
    #[arg(long, short, env = "PORT_REGISTRY_SILENT")]
    pub silent: bool,
}

impl Args {
    /// Builds the registry configuration for a daemon bound to `port`.
    #[must_use]
    pub fn registry_config(&self, port: u16) -> RegistryConfig {
        RegistryConfig::new()
            .with_server_contact(Contact::new(
                self.name.as_str(),
                "tcp",
                self.advertise_host.as_str(),
                port,
            ))
            .with_silent(self.silent)
    }

    /// Builds the allocator configuration.
    #[must_use]
    pub fn allocator_config(&self) -> AllocatorConfig {
        AllocatorConfig::new()
            .with_port_range(self.port_min..=self.port_max)
            .with_mcast_port(self.mcast_port)
            .with_name_prefix(self.name_prefix.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol() {
        let args = Args::parse_from(["port-registry-server"]);
        assert_eq!(args.listen.port(), 10000);
        assert!(!args.silent);

        let config = args.registry_config(10000);
        assert_eq!(config.server_contact.to_address(), "tcp://localhost:10000");
        assert_eq!(args.allocator_config(), AllocatorConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "port-registry-server",
            "--listen",
            "127.0.0.1:12000",
            "--port-min",
            "30000",
            "--port-max",
            "30010",
            "--silent",
        ]);
        assert_eq!(args.listen.port(), 12000);
        assert_eq!(args.allocator_config().port_range, 30000..=30010);
        assert!(args.registry_config(12000).silent);
    }
}
