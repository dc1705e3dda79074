//! Decorated port-name parsing.

/// A port name with its optional carrier and network-choice decorations.
///
/// Accepts `[carrier:]/name` and `/net=<prefix>/name` (also `/NET=`). The
/// network choice selects among a record's `ips` attribute values at query
/// time.
///
/// # Examples
///
/// ```
/// use port_registry::PortName;
///
/// let parsed = PortName::parse("/net=192.168/cam");
/// assert_eq!(parsed.name(), "/cam");
/// assert_eq!(parsed.network_choice(), Some("192.168"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortName {
    name: String,
    carrier: Option<String>,
    network_choice: Option<String>,
}

impl PortName {
    /// Splits the decorations off a port name.
    ///
    /// Never fails; text without decorations comes back as the bare name.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut work = text;
        let mut carrier = None;
        if let Some(idx) = work.find(":/")
            && idx > 0
        {
            carrier = Some(work[..idx].to_string());
            work = &work[idx + 1..];
        }

        let mut network_choice = None;
        if work.starts_with("/net=") || work.starts_with("/NET=") {
            let rest = &work[5..];
            if let Some(end) = rest.find('/') {
                network_choice = Some(rest[..end].to_string()).filter(|n| !n.is_empty());
                work = &rest[end..];
            }
        }

        Self {
            name: work.to_string(),
            carrier,
            network_choice,
        }
    }

    /// Returns the bare port name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the carrier prefix, if one was given.
    #[must_use]
    pub fn carrier(&self) -> Option<&str> {
        self.carrier.as_deref()
    }

    /// Returns the network prefix used to pick among `ips` values.
    #[must_use]
    pub fn network_choice(&self) -> Option<&str> {
        self.network_choice.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_passes_through() {
        let parsed = PortName::parse("/cam/left");
        assert_eq!(parsed.name(), "/cam/left");
        assert!(parsed.carrier().is_none());
        assert!(parsed.network_choice().is_none());
    }

    #[test]
    fn carrier_prefix_is_stripped() {
        let parsed = PortName::parse("udp:/cam");
        assert_eq!(parsed.name(), "/cam");
        assert_eq!(parsed.carrier(), Some("udp"));
    }

    #[test]
    fn uppercase_net_marker() {
        let parsed = PortName::parse("/NET=10.0/cam");
        assert_eq!(parsed.name(), "/cam");
        assert_eq!(parsed.network_choice(), Some("10.0"));
    }

    #[test]
    fn carrier_and_network_together() {
        let parsed = PortName::parse("tcp:/net=10.0/cam");
        assert_eq!(parsed.carrier(), Some("tcp"));
        assert_eq!(parsed.network_choice(), Some("10.0"));
        assert_eq!(parsed.name(), "/cam");
    }

    #[test]
    fn net_marker_without_name_is_left_alone() {
        let parsed = PortName::parse("/net=10.0");
        assert_eq!(parsed.name(), "/net=10.0");
        assert!(parsed.network_choice().is_none());
    }
}
