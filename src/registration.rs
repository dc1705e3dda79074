//! Arguments of a `register` command.

use crate::constants::{AUTO, WILDCARD};

/// A registration as requested by a caller, before defaults and allocation.
///
/// `None` fields mean "choose automatically", which is also what the
/// protocol's `...` placeholder produces.
///
/// # Examples
///
/// ```
/// use port_registry::Registration;
///
/// let registration = Registration::new("/cam")
///     .with_carrier("tcp")
///     .with_host("10.0.0.2")
///     .with_port(10002);
/// assert_eq!(registration.port(), Some(10002));
/// assert!(registration.type_name().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    name: String,
    carrier: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    type_name: Option<String>,
}

impl Registration {
    /// Creates a registration with everything but the name automatic.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            carrier: None,
            host: None,
            port: None,
            type_name: None,
        }
    }

    /// Builds a registration from protocol fields, where `...` means
    /// automatic and a `*` type means none.
    #[must_use]
    pub fn from_fields(
        name: &str,
        carrier: Option<&str>,
        host: Option<&str>,
        port: Option<u16>,
        type_name: Option<&str>,
    ) -> Self {
        let fixed = |field: Option<&str>| field.filter(|f| *f != AUTO).map(str::to_string);
        Self {
            name: name.to_string(),
            carrier: fixed(carrier),
            host: fixed(host),
            port: port.filter(|p| *p != 0),
            type_name: type_name.filter(|t| *t != WILDCARD).map(str::to_string),
        }
    }

    /// Sets the carrier.
    #[must_use]
    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = Some(carrier.into());
        self
    }

    /// Sets the host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the socket port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the payload type annotation.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Returns the requested name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the carrier, if fixed.
    #[must_use]
    pub fn carrier(&self) -> Option<&str> {
        self.carrier.as_deref()
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

    /// Returns the payload type, if any.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }
}
