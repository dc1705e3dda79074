//! Resolved contacts and partially specified registration requests.

use std::fmt;

use crate::constants::{AUTO, DEFAULT_CARRIER};

/// Resolved network contact for a registered name.
///
/// Produced by query resolution; never stored directly.
///
/// # Examples
///
/// ```
/// use port_registry::Contact;
///
/// let contact = Contact::new("/cam", "tcp", "10.0.0.2", 10002);
/// assert_eq!(contact.to_address(), "tcp://10.0.0.2:10002");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contact {
    name: String,
    carrier: String,
    host: String,
    port: u16,
    type_name: Option<String>,
}

impl Contact {
    /// Creates a contact without a payload type.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        carrier: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            carrier: carrier.into(),
            host: host.into(),
            port,
            type_name: None,
        }
    }

    /// Sets the payload type annotation.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Parses a concrete address of the form `carrier://host:port[/name]`.
    ///
    /// Returns `None` for anything that is not a complete address, such as
    /// a plain port name.
    #[must_use]
    pub fn parse_address(text: &str) -> Option<Self> {
        let (carrier, rest) = text.split_once("://")?;
        if carrier.is_empty() {
            return None;
        }
        let (authority, name) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        let (host, port) = authority.rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        let port = port.parse().ok()?;
        Some(Self::new(name, carrier, host, port))
    }

    /// Returns the registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the carrier.
    #[must_use]
    pub fn carrier(&self) -> &str {
        &self.carrier
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the socket port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the payload type, if any.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Returns the `carrier://host:port` address.
    #[must_use]
    pub fn to_address(&self) -> String {
        format!("{}://{}:{}", self.carrier, self.host, self.port)
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.name, self.to_address())
    }
}

/// A registration request whose fields may still need allocation.
///
/// `None` host or port means "choose automatically".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRequest {
    name: String,
    carrier: String,
    host: Option<String>,
    port: Option<u16>,
}

impl ContactRequest {
    /// Creates a request on the default carrier with everything automatic.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            carrier: DEFAULT_CARRIER.to_string(),
            host: None,
            port: None,
        }
    }

    /// Replaces the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the carrier.
    #[must_use]
    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }

    /// Sets the host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets or clears the host.
    #[must_use]
    pub fn with_optional_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    /// Sets the port; zero means automatic.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = if port == 0 { None } else { Some(port) };
        self
    }

    /// Returns the requested name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the carrier.
    #[must_use]
    pub fn carrier(&self) -> &str {
        &self.carrier
    }

    /// Returns the host, if fixed.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the port, if fixed.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns true if the name should be generated.
    ///
    /// Covers both `...` and the suffix form starting with `=`.
    #[must_use]
    pub fn wants_generated_name(&self) -> bool {
        self.name == AUTO || self.name.starts_with('=')
    }
}
