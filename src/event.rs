//! Change events produced by registry commands.

use std::fmt;

use crate::Value;

/// Kind of registration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// A registration was created.
    Add,
    /// A registration was destroyed.
    Del,
}

impl EventKind {
    /// Returns the wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Del => "del",
        }
    }
}

/// A registration change, handed to downstream subscribers after a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    kind: EventKind,
    name: String,
}

impl Event {
    /// Creates an `add` event.
    #[must_use]
    pub fn add(name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Add,
            name: name.into(),
        }
    }

    /// Creates a `del` event.
    #[must_use]
    pub fn del(name: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Del,
            name: name.into(),
        }
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the affected name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the `(add name)` / `(del name)` wire form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::List(vec![Value::from(self.kind.as_str()), Value::from(self.name.as_str())])
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.name)
    }
}
