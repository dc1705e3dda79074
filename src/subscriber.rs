//! Seams for change subscribers and fallback resolvers.

use std::fmt;

use crate::Contact;

/// Direction of a registration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Activity {
    /// A name was registered.
    Added,
    /// A name is about to be unregistered.
    Removed,
}

impl Activity {
    /// Returns the signed activity count used on the wire (`+1` / `-1`).
    #[must_use]
    pub const fn delta(self) -> i32 {
        match self {
            Self::Added => 1,
            Self::Removed => -1,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.delta())
    }
}

/// Downstream consumer of registration activity.
///
/// Called while the registry lock is held, so implementations must return
/// quickly and must not call back into the registry.
pub trait ChangeSubscriber: Send + Sync {
    /// Reports activity on `name`.
    fn welcome(&self, name: &str, activity: Activity);
}

/// Fallback resolver consulted when a top-level query misses.
///
/// Every [`Registry`](crate::Registry) implements this, so registries can
/// be chained. A registry must never be its own delegate.
pub trait NameLookup: Send + Sync {
    /// Resolves `name`, returning `None` when it is unknown.
    fn lookup(&self, name: &str) -> Option<Contact>;
}
