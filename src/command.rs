//! Registry commands: wire form and interpretation.

use std::fmt;

use crate::value::write_items;
use crate::{Registration, Value, ValueError};

/// How a reply is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Positional fields after an `old` tag.
    #[default]
    Legacy,
    /// Tagged nested entries; serialized as JSON by the server.
    Structured,
}

/// A command as received: an ordered list of fields, verb first.
///
/// # Examples
///
/// ```
/// use port_registry::{Command, RenderMode, Verb};
///
/// let command = Command::parse("bot query /cam").unwrap();
/// let invocation = command.interpret();
/// assert_eq!(invocation.mode(), RenderMode::Structured);
/// assert_eq!(invocation.verb(), &Verb::Query { name: "/cam".to_string() });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    fields: Vec<Value>,
}

impl Command {
    /// Wraps already-decoded fields.
    #[must_use]
    pub fn new(fields: Vec<Value>) -> Self {
        Self { fields }
    }

    /// Decodes a command line.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if the text is not well formed.
    pub fn parse(text: &str) -> Result<Self, ValueError> {
        Value::parse_fields(text).map(Self::new)
    }

    /// Builds a command from plain words, each read as an atom.
    #[must_use]
    pub fn from_words(words: &[&str]) -> Self {
        Self::new(words.iter().map(|w| Value::atom(w)).collect())
    }

    /// Returns the fields.
    #[must_use]
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Returns the first field as text.
    #[must_use]
    pub fn verb(&self) -> Option<String> {
        self.fields.first().map(Value::to_text)
    }

    /// Resolves wrappers and the render mode, then decodes the verb.
    ///
    /// A leading `NAME_SERVER` marker is dropped. A `bot` marker, a
    /// `(format json)` list anywhere, or a `format=json` field select
    /// structured rendering and are dropped as well. The values of a `set`
    /// are taken literally, so `format=json` there is stored as a value.
    #[must_use]
    pub fn interpret(&self) -> Invocation {
        let mut mode = RenderMode::Legacy;
        let mut fields: Vec<&Value> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if is_format_list(field) {
                mode = RenderMode::Structured;
            } else {
                fields.push(field);
            }
        }

        if fields.first().is_some_and(|f| f.as_str() == Some("NAME_SERVER")) {
            fields.remove(0);
        }
        if fields.first().is_some_and(|f| f.as_str() == Some("bot")) {
            mode = RenderMode::Structured;
            fields.remove(0);
        }

        let is_set = fields.first().is_some_and(|f| f.as_str() == Some("set"));
        let mut kept: Vec<&Value> = Vec::with_capacity(fields.len());
        for field in fields {
            if is_format_atom(field) && !(is_set && kept.len() >= 3) {
                mode = RenderMode::Structured;
            } else {
                kept.push(field);
            }
        }

        Invocation {
            verb: Verb::decode(&kept),
            mode,
        }
    }
}

fn is_format_atom(field: &Value) -> bool {
    field.as_str() == Some("format=json")
}

fn is_format_list(field: &Value) -> bool {
    match field {
        Value::List(items) => {
            items.len() == 2
                && items[0].as_str() == Some("format")
                && items[1].as_str() == Some("json")
        }
        Value::Str(_) | Value::Int(_) => false,
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(f, &self.fields)
    }
}

/// A decoded command verb with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Register a name.
    Register(Registration),
    /// Remove a name and everything it owns.
    Unregister {
        /// Name to remove
        name: String,
    },
    /// Resolve a name.
    Query {
        /// Name to resolve, possibly decorated
        name: String,
    },
    /// Enumerate registrations.
    List {
        /// Optional path prefix
        prefix: Option<String>,
    },
    /// Enumerate registrations marked as live managed processes.
    Runners,
    /// Replace a property's values.
    Set {
        /// Registered name
        name: String,
        /// Property key
        key: String,
        /// New values, in order
        values: Vec<String>,
    },
    /// Read a property's values.
    Get {
        /// Registered name
        name: String,
        /// Property key
        key: String,
    },
    /// Test a property for one value.
    Check {
        /// Registered name
        name: String,
        /// Property key
        key: String,
        /// Value to look for
        value: String,
    },
    /// Suggest an address for `to` as seen from `from`.
    Route {
        /// Source name
        from: String,
        /// Target name
        to: String,
    },
    /// Request garbage collection (informational).
    Gc,
    /// List supported commands.
    Help,
    /// A known verb missing required fields.
    Malformed {
        /// The verb
        verb: String,
        /// What was missing
        reason: &'static str,
    },
    /// Anything else.
    Unrecognized {
        /// The verb as received (empty for an empty command)
        verb: String,
    },
}

impl Verb {
    fn decode(fields: &[&Value]) -> Self {
        let text = |i: usize| fields.get(i).map(|v| v.to_text());
        let Some(verb) = text(0) else {
            return Self::Unrecognized {
                verb: String::new(),
            };
        };
        let malformed = |reason| Self::Malformed {
            verb: verb.clone(),
            reason,
        };

        match verb.as_str() {
            "register" => {
                let Some(name) = text(1) else {
                    return malformed("register needs a port name");
                };
                let carrier = text(2);
                let host = text(3);
                let port = fields.get(4).and_then(|v| port_number(v));
                let type_name = text(5);
                Self::Register(Registration::from_fields(
                    &name,
                    carrier.as_deref(),
                    host.as_deref(),
                    port,
                    type_name.as_deref(),
                ))
            }
            "unregister" => match text(1) {
                Some(name) => Self::Unregister { name },
                None => malformed("unregister needs a port name"),
            },
            "query" => match text(1) {
                Some(name) => Self::Query { name },
                None => malformed("query needs a port name"),
            },
            "list" => Self::List { prefix: text(1) },
            "runners" => Self::Runners,
            "set" => match (text(1), text(2)) {
                (Some(name), Some(key)) => Self::Set {
                    name,
                    key,
                    values: fields[3..].iter().map(|v| v.to_text()).collect(),
                },
                _ => malformed("set needs a port name and a property"),
            },
            "get" => match (text(1), text(2)) {
                (Some(name), Some(key)) => Self::Get { name, key },
                _ => malformed("get needs a port name and a property"),
            },
            "check" => match (text(1), text(2), text(3)) {
                (Some(name), Some(key), Some(value)) => Self::Check { name, key, value },
                _ => malformed("check needs a port name, a property, and a value"),
            },
            "route" => match (text(1), text(2)) {
                (Some(from), Some(to)) => Self::Route { from, to },
                _ => malformed("route needs two port names"),
            },
            "gc" => Self::Gc,
            "help" => Self::Help,
            _ => Self::Unrecognized { verb },
        }
    }
}

fn port_number(value: &Value) -> Option<u16> {
    match value {
        Value::Int(i) => u16::try_from(*i).ok(),
        Value::Str(s) => s.parse().ok(),
        Value::List(_) => None,
    }
}

/// An interpreted command: the verb and the render mode it asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    verb: Verb,
    mode: RenderMode,
}

impl Invocation {
    /// Creates an invocation directly.
    #[must_use]
    pub const fn new(verb: Verb, mode: RenderMode) -> Self {
        Self { verb, mode }
    }

    /// Returns the verb.
    #[must_use]
    pub const fn verb(&self) -> &Verb {
        &self.verb
    }

    /// Returns the render mode.
    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Splits into verb and mode.
    #[must_use]
    pub fn into_parts(self) -> (Verb, RenderMode) {
        (self.verb, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verb_of(text: &str) -> Verb {
        Command::parse(text).unwrap().interpret().into_parts().0
    }

    #[test]
    fn register_with_all_fields() {
        let Verb::Register(registration) = verb_of("register /cam tcp 192.168.1.5 10002") else {
            panic!("expected register");
        };
        assert_eq!(registration.name(), "/cam");
        assert_eq!(registration.carrier(), Some("tcp"));
        assert_eq!(registration.host(), Some("192.168.1.5"));
        assert_eq!(registration.port(), Some(10002));
    }

    #[test]
    fn register_with_placeholders() {
        let Verb::Register(registration) = verb_of("register /s tcp ... ...") else {
            panic!("expected register");
        };
        assert!(registration.host().is_none());
        assert!(registration.port().is_none());
    }

    #[test]
    fn name_server_prefix_is_dropped() {
        assert_eq!(
            verb_of("NAME_SERVER query /cam"),
            Verb::Query {
                name: "/cam".to_string()
            }
        );
    }

    #[test]
    fn format_json_anywhere_selects_structured() {
        let invocation = Command::parse("list /a format=json").unwrap().interpret();
        assert_eq!(invocation.mode(), RenderMode::Structured);
        assert_eq!(
            invocation.verb(),
            &Verb::List {
                prefix: Some("/a".to_string())
            }
        );

        let invocation = Command::parse("(format json) get /cam k").unwrap().interpret();
        assert_eq!(invocation.mode(), RenderMode::Structured);
    }

    #[test]
    fn set_values_keep_format_text() {
        let invocation = Command::parse("set /cam k format=json").unwrap().interpret();
        assert_eq!(invocation.mode(), RenderMode::Legacy);
        assert_eq!(
            invocation.verb(),
            &Verb::Set {
                name: "/cam".to_string(),
                key: "k".to_string(),
                values: vec!["format=json".to_string()],
            }
        );

        let invocation = Command::parse("set /cam k v (format json)").unwrap().interpret();
        assert_eq!(invocation.mode(), RenderMode::Structured);
        assert_eq!(
            invocation.verb(),
            &Verb::Set {
                name: "/cam".to_string(),
                key: "k".to_string(),
                values: vec!["v".to_string()],
            }
        );
    }

    #[test]
    fn legacy_is_default() {
        let invocation = Command::parse("query /cam").unwrap().interpret();
        assert_eq!(invocation.mode(), RenderMode::Legacy);
    }

    #[test]
    fn set_collects_all_values() {
        assert_eq!(
            verb_of("set /cam k v1 v2 3"),
            Verb::Set {
                name: "/cam".to_string(),
                key: "k".to_string(),
                values: vec!["v1".to_string(), "v2".to_string(), "3".to_string()],
            }
        );
    }

    #[test]
    fn missing_fields_are_malformed() {
        assert!(matches!(verb_of("query"), Verb::Malformed { .. }));
        assert!(matches!(verb_of("check /cam k"), Verb::Malformed { .. }));
    }

    #[test]
    fn unknown_and_empty_commands() {
        assert_eq!(
            verb_of("frobnicate"),
            Verb::Unrecognized {
                verb: "frobnicate".to_string()
            }
        );
        assert_eq!(verb_of(""), Verb::Unrecognized { verb: String::new() });
    }

    #[test]
    fn command_display_round_trips_words() {
        let command = Command::from_words(&["register", "/cam", "tcp", "...", "10002"]);
        assert_eq!(command.to_string(), "register /cam tcp ... 10002");
    }
}
