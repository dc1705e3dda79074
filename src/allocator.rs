//! Network-resource allocation for registrations.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::constants::{DEFAULT_HOST, MCAST_CARRIER};
use crate::{AllocationError, AllocatorConfig, Contact, ContactRequest};

/// Hands out names, hosts, and socket ports for registrations.
///
/// The registry calls the allocator while holding its lock, so
/// implementations must not call back into the registry and should not
/// block on the network.
pub trait ContactAllocator: Send + Sync {
    /// Replaces the requested name with a generated, unique base name.
    ///
    /// The registry appends the `=suffix` form itself.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError::NameExhausted` if no unique name is left.
    fn complete_name(&self, request: &ContactRequest) -> Result<ContactRequest, AllocationError>;

    /// Fills in host and port where the request leaves them automatic.
    ///
    /// # Errors
    ///
    /// Returns `AllocationError` if no port or multicast group is free.
    fn complete_socket(&self, request: &ContactRequest) -> Result<Contact, AllocationError>;

    /// Releases everything reserved for `contact`.
    ///
    /// Reservations held under another name are left alone.
    fn free_resources(&self, contact: &Contact);
}

/// Reserved resources, each mapped to the name holding it.
#[derive(Debug, Default)]
struct Reservations {
    sockets: HashMap<(String, u16), String>,
    groups: HashMap<String, String>,
    names: HashSet<String>,
    next_name: u64,
}

/// In-process allocator over a configurable port range.
///
/// Ports are reserved per host, so two hosts may use the same number.
/// A reservation belongs to the first name that takes it; an explicit port
/// already held elsewhere is granted without changing its holder.
/// Multicast registrations receive a group address from
/// `<prefix>.x.y` and the configured multicast port.
///
/// # Examples
///
/// ```
/// use port_registry::{AllocatorConfig, ContactAllocator, ContactRequest, PortAllocator};
///
/// let allocator = PortAllocator::new(AllocatorConfig::new().with_port_range(20000..=20001));
/// let request = ContactRequest::new("/cam").with_host("10.0.0.2");
///
/// let first = allocator.complete_socket(&request).unwrap();
/// let second = allocator.complete_socket(&request).unwrap();
/// assert_eq!(first.port(), 20000);
/// assert_eq!(second.port(), 20001);
/// assert!(allocator.complete_socket(&request).is_err());
/// ```
#[derive(Debug, Default)]
pub struct PortAllocator {
    config: AllocatorConfig,
    reservations: Mutex<Reservations>,
}

impl PortAllocator {
    /// Creates an allocator with the given configuration.
    #[must_use]
    pub fn new(config: AllocatorConfig) -> Self {
        Self {
            config,
            reservations: Mutex::new(Reservations::default()),
        }
    }

    /// Creates an allocator with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(AllocatorConfig::default())
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Returns the number of reserved socket ports.
    #[must_use]
    pub fn reserved_sockets(&self) -> usize {
        self.reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sockets
            .len()
    }

    fn allocate_group(
        &self,
        reservations: &mut Reservations,
        owner: &str,
    ) -> Result<String, AllocationError> {
        let [a, b] = self.config.mcast_prefix;
        for c in 1..=u8::MAX {
            for d in 1..=u8::MAX {
                let group = format!("{a}.{b}.{c}.{d}");
                if let Entry::Vacant(slot) = reservations.groups.entry(group.clone()) {
                    slot.insert(owner.to_string());
                    return Ok(group);
                }
            }
        }
        Err(AllocationError::GroupsExhausted)
    }

    fn allocate_port(
        &self,
        reservations: &mut Reservations,
        host: &str,
    ) -> Result<u16, AllocationError> {
        self.config
            .port_range
            .clone()
            .find(|port| !reservations.sockets.contains_key(&(host.to_string(), *port)))
            .ok_or_else(|| AllocationError::PortsExhausted {
                host: host.to_string(),
            })
    }
}

impl ContactAllocator for PortAllocator {
    fn complete_name(&self, request: &ContactRequest) -> Result<ContactRequest, AllocationError> {
        let mut reservations = self
            .reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            reservations.next_name = reservations
                .next_name
                .checked_add(1)
                .ok_or(AllocationError::NameExhausted)?;
            let name = format!("{}{}", self.config.name_prefix, reservations.next_name);
            if reservations.names.insert(name.clone()) {
                debug!(%name, "generated port name");
                return Ok(ContactRequest::new(name)
                    .with_carrier(request.carrier())
                    .with_optional_host(request.host().map(str::to_string))
                    .with_port(request.port().unwrap_or(0)));
            }
        }
    }

    fn complete_socket(&self, request: &ContactRequest) -> Result<Contact, AllocationError> {
        let mut reservations = self
            .reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if request.carrier() == MCAST_CARRIER {
            let host = match request.host() {
                Some(host) => {
                    reserve(&mut reservations.groups, host.to_string(), request.name());
                    host.to_string()
                }
                None => self.allocate_group(&mut reservations, request.name())?,
            };
            let port = request.port().unwrap_or(self.config.mcast_port);
            return Ok(Contact::new(request.name(), request.carrier(), host, port));
        }

        let host = request.host().unwrap_or(DEFAULT_HOST).to_string();
        let port = match request.port() {
            Some(port) => port,
            None => self.allocate_port(&mut reservations, &host)?,
        };
        reserve(&mut reservations.sockets, (host.clone(), port), request.name());
        Ok(Contact::new(request.name(), request.carrier(), host, port))
    }

    fn free_resources(&self, contact: &Contact) {
        let mut reservations = self
            .reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if contact.carrier() == MCAST_CARRIER {
            release(&mut reservations.groups, &contact.host().to_string(), contact.name());
        } else {
            release(
                &mut reservations.sockets,
                &(contact.host().to_string(), contact.port()),
                contact.name(),
            );
        }
        reservations.names.remove(contact.name());
    }
}

fn reserve<K>(held: &mut HashMap<K, String>, resource: K, owner: &str)
where
    K: std::hash::Hash + Eq + std::fmt::Debug,
{
    match held.entry(resource) {
        Entry::Vacant(slot) => {
            debug!(resource = ?slot.key(), %owner, "reserved");
            slot.insert(owner.to_string());
        }
        Entry::Occupied(slot) if slot.get() != owner => {
            debug!(resource = ?slot.key(), holder = %slot.get(), %owner, "already reserved");
        }
        Entry::Occupied(_) => {}
    }
}

fn release<K>(held: &mut HashMap<K, String>, resource: &K, owner: &str)
where
    K: std::hash::Hash + Eq,
{
    if held.get(resource).is_some_and(|holder| holder == owner) {
        held.remove(resource);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> PortAllocator {
        PortAllocator::new(AllocatorConfig::new().with_port_range(30000..=30002))
    }

    #[test]
    fn explicit_port_is_kept_and_reserved() {
        let allocator = small();
        let request = ContactRequest::new("/cam").with_host("h").with_port(30000);
        let contact = allocator.complete_socket(&request).unwrap();
        assert_eq!(contact.port(), 30000);

        let auto = allocator
            .complete_socket(&ContactRequest::new("/mic").with_host("h"))
            .unwrap();
        assert_eq!(auto.port(), 30001);
    }

    #[test]
    fn ports_are_per_host() {
        let allocator = small();
        let a = allocator
            .complete_socket(&ContactRequest::new("/a").with_host("h1"))
            .unwrap();
        let b = allocator
            .complete_socket(&ContactRequest::new("/b").with_host("h2"))
            .unwrap();
        assert_eq!(a.port(), b.port());
    }

    #[test]
    fn freeing_makes_port_reusable() {
        let allocator = small();
        let request = ContactRequest::new("/a").with_host("h");
        let contact = allocator.complete_socket(&request).unwrap();
        assert_eq!(allocator.reserved_sockets(), 1);
        allocator.free_resources(&contact);
        assert_eq!(allocator.reserved_sockets(), 0);
        assert_eq!(allocator.complete_socket(&request).unwrap().port(), contact.port());
    }

    #[test]
    fn shared_explicit_port_stays_with_first_holder() {
        let allocator = small();
        let first = allocator
            .complete_socket(&ContactRequest::new("/a").with_host("h"))
            .unwrap();
        let second = allocator
            .complete_socket(&ContactRequest::new("/x").with_host("h").with_port(first.port()))
            .unwrap();
        assert_eq!(second.port(), first.port());

        allocator.free_resources(&second);
        assert_eq!(allocator.reserved_sockets(), 1);
        let next = allocator
            .complete_socket(&ContactRequest::new("/c").with_host("h"))
            .unwrap();
        assert_ne!(next.port(), first.port());

        allocator.free_resources(&first);
        assert_eq!(allocator.reserved_sockets(), 1);
    }

    #[test]
    fn exhausted_range_fails() {
        let allocator = small();
        let request = ContactRequest::new("/a").with_host("h");
        for _ in 0..3 {
            allocator.complete_socket(&request).unwrap();
        }
        let err = allocator.complete_socket(&request).unwrap_err();
        assert!(matches!(err, AllocationError::PortsExhausted { .. }));
    }

    #[test]
    fn mcast_gets_group_address() {
        let allocator = small();
        let request = ContactRequest::new("/bcast").with_carrier("mcast");
        let first = allocator.complete_socket(&request).unwrap();
        let second = allocator.complete_socket(&request).unwrap();
        assert_eq!(first.host(), "224.1.1.1");
        assert_eq!(second.host(), "224.1.1.2");
        assert_eq!(first.port(), 11000);

        allocator.free_resources(&first);
        assert_eq!(allocator.complete_socket(&request).unwrap().host(), "224.1.1.1");
    }

    #[test]
    fn generated_names_are_unique() {
        let allocator = small();
        let request = ContactRequest::new("...");
        let a = allocator.complete_name(&request).unwrap();
        let b = allocator.complete_name(&request).unwrap();
        assert_ne!(a.name(), b.name());
        assert!(a.name().starts_with("/tmp/port/"));
    }
}
