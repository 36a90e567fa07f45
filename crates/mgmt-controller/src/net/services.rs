//! Runtime values installed for network resources

use mgmt_service::Service;
use serde::Serialize;

/// Resolved network interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkInterfaceBinding {
    /// Interface name
    pub name: String,
    /// Resolved address
    pub inet_address: String,
}

impl Service for NetworkInterfaceBinding {
    fn value_type(&self) -> &'static str {
        "NetworkInterfaceBinding"
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Registry of the process's socket bindings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SocketBindingManager;

impl Service for SocketBindingManager {
    fn value_type(&self) -> &'static str {
        "SocketBindingManager"
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({})
    }
}

/// Inbound socket binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SocketBinding {
    /// Binding name
    pub name: String,
    /// Interface the socket binds to
    pub interface: String,
    /// Port, before any offset
    pub port: i64,
    /// Whether port offsets are ignored
    pub fixed_port: bool,
    /// Multicast group, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast_address: Option<String>,
    /// Multicast port, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast_port: Option<i64>,
}

impl Service for SocketBinding {
    fn value_type(&self) -> &'static str {
        "SocketBinding"
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Where an outbound socket connects to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case", tag = "kind")]
pub enum Destination {
    /// Remote host and port
    Remote {
        /// Host name or address
        host: String,
        /// Destination port
        port: i64,
    },
    /// Local socket binding
    Local {
        /// Referenced socket binding
        socket_binding: String,
    },
}

/// Outbound socket binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutboundSocketBinding {
    /// Binding name
    pub name: String,
    /// Destination
    pub destination: Destination,
    /// Interface the source side binds to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_interface: Option<String>,
    /// Source port, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port: Option<i64>,
    /// Whether the source port ignores port offsets
    pub fixed_source_port: bool,
}

impl Service for OutboundSocketBinding {
    fn value_type(&self) -> &'static str {
        "OutboundSocketBinding"
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
