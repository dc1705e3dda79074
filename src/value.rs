//! Text codec for command and reply values.

use std::fmt;

use crate::ValueError;

/// One field of a command or reply.
///
/// The text form is whitespace-separated atoms, double-quoted strings with
/// `\"` and `\\` escapes, and parenthesized nested lists:
///
/// ```text
/// register /cam tcp 10.0.0.2 10002
/// port (name /cam) (ip 10.0.0.2) (port_number 10002) (carrier tcp)
/// ```
///
/// # Examples
///
/// ```
/// use port_registry::Value;
///
/// let fields = Value::parse_fields("check /cam yarprun \"true\"").unwrap();
/// assert_eq!(fields.len(), 4);
/// assert_eq!(fields[3].as_str(), Some("true"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Integer atom.
    Int(i64),
    /// String atom.
    Str(String),
    /// Nested list.
    List(Vec<Value>),
}

impl Value {
    /// Interprets an unquoted atom, preferring an integer reading.
    #[must_use]
    pub fn atom(text: &str) -> Self {
        text.parse::<i64>()
            .map_or_else(|_| Self::Str(text.to_string()), Self::Int)
    }

    /// Parses a whole line into its top-level fields.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` on unbalanced parentheses or an unterminated
    /// string.
    pub fn parse_fields(text: &str) -> Result<Vec<Self>, ValueError> {
        let mut stack: Vec<Vec<Self>> = vec![Vec::new()];
        let mut chars = text.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                c if c.is_whitespace() => {}
                '(' => stack.push(Vec::new()),
                ')' => {
                    if stack.len() < 2 {
                        return Err(ValueError::UnbalancedClose { position });
                    }
                    let list = stack.pop().unwrap_or_default();
                    push(&mut stack, Self::List(list));
                }
                '"' => {
                    let mut s = String::new();
                    let mut closed = false;
                    while let Some((_, c)) = chars.next() {
                        match c {
                            '"' => {
                                closed = true;
                                break;
                            }
                            '\\' => {
                                if let Some((_, escaped)) = chars.next() {
                                    s.push(match escaped {
                                        'n' => '\n',
                                        't' => '\t',
                                        other => other,
                                    });
                                }
                            }
                            other => s.push(other),
                        }
                    }
                    if !closed {
                        return Err(ValueError::UnterminatedString { position });
                    }
                    push(&mut stack, Self::Str(s));
                }
                first => {
                    let mut atom = String::from(first);
                    while let Some(&(_, next)) = chars.peek() {
                        if next.is_whitespace() || next == '(' || next == ')' || next == '"' {
                            break;
                        }
                        atom.push(next);
                        chars.next();
                    }
                    push(&mut stack, Self::atom(&atom));
                }
            }
        }

        if stack.len() != 1 {
            return Err(ValueError::UnclosedList);
        }
        Ok(stack.pop().unwrap_or_default())
    }

    /// Returns the string contents of a string atom.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer contents of an integer atom.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the items of a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the field as plain text: strings unquoted, everything else
    /// in its text form.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Converts to a JSON value: strings, numbers, and arrays.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Str(s) => serde_json::Value::from(s.as_str()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }
}

fn push(stack: &mut [Vec<Value>], value: Value) {
    if let Some(top) = stack.last_mut() {
        top.push(value);
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.parse::<i64>().is_ok()
        || s.chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '(' | ')' | '\\'))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) if needs_quotes(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("\"")
            }
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                f.write_str(")")
            }
        }
    }
}

/// Writes values separated by single spaces.
pub(crate) fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}
