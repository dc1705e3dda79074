//! Command outcomes and their two reply renderings.

use std::fmt;

use crate::command::RenderMode;
use crate::constants::{ERROR_ALLOCATION, ERROR_NOT_KNOWN, LEGACY_TAG};
use crate::value::write_items;
use crate::{Contact, Event, Value};

/// Message carried by structured replies for unknown names.
pub const NOT_KNOWN_MESSAGE: &str = "port not known";

const HELP_HEADER: &str = "Here are some ways to use the name server:";

const HELP_LINES: &[&str] = &[
    "+ help",
    "+ list [$prefix]",
    "+ register $portname",
    "+ register $portname $carrier $ipAddress $portNumber",
    "  (if you want a field set automatically, write '...')",
    "+ unregister $portname",
    "+ query $portname",
    "+ set $portname $property $value",
    "+ get $portname $property",
    "+ check $portname $property",
    "+ route $port1 $port2",
    "+ runners",
    "  (to get a list of the yarprun ports)",
];

/// What a command produced, independent of rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Resolution of one name; `None` when unknown.
    Resolved(Option<Contact>),
    /// A listing of resolved names.
    Listing(Vec<Contact>),
    /// The values of one property.
    Property {
        name: String,
        key: String,
        values: Vec<String>,
    },
    /// Whether a property holds a value.
    Presence {
        name: String,
        key: String,
        value: String,
        present: bool,
    },
    /// A suggested address.
    Route {
        from: String,
        to: String,
        address: String,
    },
    Collected,
    Help,
    /// A verb needed a record that does not exist.
    NotKnown,
    /// The allocator could not satisfy a registration.
    AllocationFailed { reason: String },
    /// Malformed or unknown command.
    Unrecognized,
}

impl Outcome {
    /// Returns false for in-band failures.
    pub(crate) const fn succeeded(&self) -> bool {
        !matches!(
            self,
            Self::NotKnown | Self::AllocationFailed { .. } | Self::Unrecognized
        )
    }

    /// Renders the outcome in the requested mode.
    pub(crate) fn render(&self, mode: RenderMode) -> Reply {
        match mode {
            RenderMode::Legacy => self.render_legacy(),
            RenderMode::Structured => self.render_structured(),
        }
    }

    fn render_legacy(&self) -> Reply {
        let mut reply = vec![Value::from(LEGACY_TAG)];
        match self {
            Self::Resolved(contact) => {
                reply.push(Value::List(contact.as_ref().map(legacy_contact).unwrap_or_default()));
            }
            Self::Listing(contacts) => {
                reply.extend(contacts.iter().map(|c| Value::List(legacy_contact(c))));
            }
            Self::Property { name, key, values } => {
                let mut entry = vec![
                    Value::from("port"),
                    Value::from(name.as_str()),
                    Value::from("property"),
                    Value::from(key.as_str()),
                    Value::from("="),
                ];
                entry.extend(values.iter().map(|v| Value::from(v.as_str())));
                reply.push(Value::List(entry));
            }
            Self::Presence { .. } | Self::Route { .. } => reply.push(self.plain_entry()),
            Self::Collected => reply.push(self.plain_entry()),
            Self::Help => {
                reply.push(Value::from(HELP_HEADER));
                reply.extend(HELP_LINES.iter().map(|line| Value::from(*line)));
            }
            Self::NotKnown | Self::AllocationFailed { .. } | Self::Unrecognized => {}
        }
        Reply::new(reply)
    }

    fn render_structured(&self) -> Reply {
        match self {
            Self::Resolved(Some(contact)) => Reply::new(structured_contact(contact)),
            Self::Resolved(None) | Self::NotKnown => {
                Reply::new(structured_error(ERROR_NOT_KNOWN, NOT_KNOWN_MESSAGE))
            }
            Self::AllocationFailed { reason } => {
                Reply::new(structured_error(ERROR_ALLOCATION, reason))
            }
            Self::Listing(contacts) => {
                let mut reply = vec![Value::from("ports")];
                reply.extend(contacts.iter().map(|c| Value::List(structured_contact(c))));
                Reply::new(reply)
            }
            Self::Property { values, .. } => {
                Reply::new(values.iter().map(|v| Value::atom(v)).collect())
            }
            Self::Presence { .. } | Self::Route { .. } | Self::Collected => {
                Reply::new(vec![self.plain_entry()])
            }
            Self::Help => Reply::new(HELP_LINES.iter().map(|line| Value::from(*line)).collect()),
            Self::Unrecognized => Reply::new(vec![Value::from(LEGACY_TAG)]),
        }
    }

    /// The list entry shared by both renderings of presence, route, and gc.
    fn plain_entry(&self) -> Value {
        let words: Vec<Value> = match self {
            Self::Presence {
                name,
                key,
                value,
                present,
            } => vec![
                "port".into(),
                name.as_str().into(),
                "property".into(),
                key.as_str().into(),
                "value".into(),
                value.as_str().into(),
                "present".into(),
                Value::from(if *present { "true" } else { "false" }),
            ],
            Self::Route { from, to, address } => vec![
                "port".into(),
                from.as_str().into(),
                "route".into(),
                to.as_str().into(),
                "=".into(),
                address.as_str().into(),
            ],
            Self::Collected => vec!["garbage collection done.".into()],
            _ => Vec::new(),
        };
        Value::List(words)
    }
}

fn legacy_contact(contact: &Contact) -> Vec<Value> {
    vec![
        "registration".into(),
        "name".into(),
        contact.name().into(),
        "ip".into(),
        contact.host().into(),
        "port".into(),
        contact.port().into(),
        "type".into(),
        contact.carrier().into(),
    ]
}

fn structured_contact(contact: &Contact) -> Vec<Value> {
    vec![
        "port".into(),
        Value::List(vec!["name".into(), contact.name().into()]),
        Value::List(vec!["ip".into(), contact.host().into()]),
        Value::List(vec!["port_number".into(), contact.port().into()]),
        Value::List(vec!["carrier".into(), contact.carrier().into()]),
    ]
}

fn structured_error(code: i64, message: &str) -> Vec<Value> {
    vec![
        "port".into(),
        Value::List(vec!["error".into(), code.into(), message.into()]),
    ]
}

/// A rendered reply: the fields sent back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    values: Vec<Value>,
}

impl Reply {
    /// Wraps rendered fields.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns the fields.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns true if the reply has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the reply as a JSON array.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.values.iter().map(Value::to_json).collect())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(f, &self.values)
    }
}

/// Everything a command hands back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    reply: Reply,
    events: Vec<Event>,
    mode: RenderMode,
    succeeded: bool,
}

impl Response {
    pub(crate) fn new(reply: Reply, events: Vec<Event>, mode: RenderMode, succeeded: bool) -> Self {
        Self {
            reply,
            events,
            mode,
            succeeded,
        }
    }

    /// Returns the rendered reply.
    #[must_use]
    pub const fn reply(&self) -> &Reply {
        &self.reply
    }

    /// Returns the change events, in the order they happened.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns the mode the reply was rendered in.
    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Returns false if the command failed in-band (unknown name,
    /// allocation failure, unrecognized command).
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Returns the reply as one line: text for legacy, JSON for structured.
    #[must_use]
    pub fn to_line(&self) -> String {
        match self.mode {
            RenderMode::Legacy => self.reply.to_string(),
            RenderMode::Structured => self.reply.to_json().to_string(),
        }
    }

    /// Splits into reply and events.
    #[must_use]
    pub fn into_parts(self) -> (Reply, Vec<Event>) {
        (self.reply, self.events)
    }
}
