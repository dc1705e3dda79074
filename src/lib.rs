//! Name registry for a distributed port-based messaging system.
//!
//! Processes register symbolic port names (such as `/camera/left`) together
//! with a network contact. Peers resolve names to contacts, enumerate
//! registrations by path prefix, and attach arbitrary multi-valued
//! properties to registrations.
//!
//! # Overview
//!
//! A [`Registry`] interprets text commands over an [`AttributeStore`]:
//!
//! ```text
//! register /cam tcp 192.168.1.5 10002
//! query /cam
//! set /cam yarprun true
//! list /cam
//! ```
//!
//! Each registration is one record in the store: an unscoped `port=<name>`
//! identity attribute plus scoped attributes (`host`, `socket`, `carrier`,
//! `type`, and anything added with `set`). Unspecified hosts and ports are
//! filled in by a [`ContactAllocator`].
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use port_registry::{Command, MemoryStore, PortAllocator, Registry, RegistryConfig};
//!
//! let registry = Registry::new(
//!     MemoryStore::new(),
//!     Arc::new(PortAllocator::with_defaults()),
//!     RegistryConfig::new(),
//! );
//!
//! let register = Command::parse("register /cam tcp 192.168.1.5 10002").unwrap();
//! registry.apply(&register, Some("192.168.1.5")).unwrap();
//!
//! let contact = registry.query("/cam").unwrap().unwrap();
//! assert_eq!(contact.to_address(), "tcp://192.168.1.5:10002");
//!
//! // Structured replies are selected per command.
//! let query = Command::parse("bot query /cam").unwrap();
//! let response = registry.apply(&query, None).unwrap();
//! assert_eq!(
//!     response.reply().to_string(),
//!     "port (name /cam) (ip 192.168.1.5) (port_number 10002) (carrier tcp)"
//! );
//! ```
//!
//! # Reply Modes
//!
//! | Mode | Selected by | Example |
//! |------|-------------|---------|
//! | Legacy | default | `old (registration name /cam ip H port P type tcp)` |
//! | Structured | `bot` prefix, `format=json` | `port (name /cam) (ip H) ...` |
//!
//! Unknown names, malformed commands, and allocation failures are reported
//! inside the reply. Only store failures surface as [`RegistryError`].

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod allocator;
mod attribute;
mod command;
mod config;
mod constants;
mod contact;
mod error;
mod event;
mod memory;
mod port_name;
pub mod prelude;
mod registration;
mod registry;
mod reply;
mod store;
mod subscriber;
mod value;

pub use allocator::{ContactAllocator, PortAllocator};
pub use attribute::{Attribute, Context, Rid};
pub use command::{Command, Invocation, RenderMode, Verb};
pub use config::{AllocatorConfig, RegistryConfig};
pub use constants::{
    AUTO, DEFAULT_CARRIER, DEFAULT_HOST, DEFAULT_SOCKET, ERROR_ALLOCATION, ERROR_NOT_KNOWN,
    LEGACY_TAG, MCAST_CARRIER, TOPIC_CARRIER, WILDCARD, keys,
};
pub use contact::{Contact, ContactRequest};
pub use error::{AllocationError, RegistryError, StoreError, ValueError};
pub use event::{Event, EventKind};
pub use memory::MemoryStore;
pub use port_name::PortName;
pub use registration::Registration;
pub use registry::Registry;
pub use reply::{NOT_KNOWN_MESSAGE, Reply, Response};
pub use store::AttributeStore;
pub use subscriber::{Activity, ChangeSubscriber, NameLookup};
pub use value::Value;
