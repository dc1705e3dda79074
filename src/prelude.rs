//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use port_registry::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Registry::new(
//!     MemoryStore::new(),
//!     Arc::new(PortAllocator::with_defaults()),
//!     RegistryConfig::new(),
//! );
//! assert!(registry.query("/cam").unwrap().is_none());
//! ```
//!
//! Store internals (`Attribute`, `Context`, `Rid`) are left out; import them
//! directly when implementing an [`AttributeStore`].

pub use crate::{
    // Core types
    Command, Contact, Event, EventKind, PortName, Registration, Registry, RenderMode, Reply,
    Response, Value, Verb,
    // Seams
    Activity, AttributeStore, ChangeSubscriber, ContactAllocator, NameLookup,
    // Bundled implementations
    MemoryStore, PortAllocator,
    // Configuration
    AllocatorConfig, RegistryConfig,
    // Errors
    AllocationError, RegistryError, StoreError, ValueError,
};
