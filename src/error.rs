//! Error types for store, allocator, and registry operations.

use std::fmt;

/// Errors reported by an [`AttributeStore`](crate::AttributeStore) backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend cannot be reached or has been shut down.
    Unavailable {
        /// Description of the failure
        reason: String,
    },
    /// A transaction boundary was crossed in the wrong order.
    Transaction {
        /// Description of the failure
        reason: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "attribute store unavailable: {reason}"),
            Self::Transaction { reason } => write!(f, "attribute store transaction error: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    /// Creates an `Unavailable` error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a `Transaction` error.
    #[must_use]
    pub fn transaction(reason: impl Into<String>) -> Self {
        Self::Transaction {
            reason: reason.into(),
        }
    }
}

/// Errors reported by a [`ContactAllocator`](crate::ContactAllocator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Every port in the configured range is reserved for this host.
    PortsExhausted {
        /// Host whose range is exhausted
        host: String,
    },
    /// No multicast group is left to hand out.
    GroupsExhausted,
    /// No unique name could be generated.
    NameExhausted,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortsExhausted { host } => {
                write!(f, "no free socket port left for host '{host}'")
            }
            Self::GroupsExhausted => write!(f, "no free multicast group left"),
            Self::NameExhausted => write!(f, "could not generate a unique port name"),
        }
    }
}

impl std::error::Error for AllocationError {}

/// Hard failures of the registry itself.
///
/// Verb-level failures (unknown names, malformed commands, allocation
/// problems) are reported in-band in the reply and never show up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The attribute store failed.
    Store(StoreError),
    /// A thread panicked while holding the registry lock.
    LockPoisoned,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "registry store failure: {e}"),
            Self::LockPoisoned => {
                write!(f, "registry lock poisoned; a previous command panicked mid-transaction")
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::LockPoisoned => None,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl RegistryError {
    /// Returns true if the underlying store is unavailable.
    #[must_use]
    pub const fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Store(StoreError::Unavailable { .. }))
    }
}

/// Errors for parsing command text into values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A quoted string was not closed.
    UnterminatedString {
        /// Byte offset of the opening quote
        position: usize,
    },
    /// A `)` had no matching `(`.
    UnbalancedClose {
        /// Byte offset of the stray parenthesis
        position: usize,
    },
    /// A `(` was never closed.
    UnclosedList,
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString { position } => {
                write!(f, "unterminated string starting at position {position}")
            }
            Self::UnbalancedClose { position } => {
                write!(f, "unexpected ')' at position {position}")
            }
            Self::UnclosedList => write!(f, "list opened with '(' is never closed"),
        }
    }
}

impl std::error::Error for ValueError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_unavailable_display() {
        let err = StoreError::unavailable("disk gone");
        assert!(err.to_string().contains("disk gone"));
        assert!(RegistryError::from(err).is_store_unavailable());
    }

    #[test]
    fn poisoned_is_not_store_failure() {
        assert!(!RegistryError::LockPoisoned.is_store_unavailable());
        assert!(RegistryError::LockPoisoned.to_string().contains("poisoned"));
    }

    #[test]
    fn ports_exhausted_names_host() {
        let err = AllocationError::PortsExhausted {
            host: "10.0.0.2".to_string(),
        };
        assert!(err.to_string().contains("10.0.0.2"));
    }

    #[test]
    fn registry_error_exposes_source() {
        use std::error::Error;
        let err = RegistryError::from(StoreError::transaction("nested begin"));
        assert!(err.source().is_some());
    }
}
