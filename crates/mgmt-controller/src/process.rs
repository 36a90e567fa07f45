//! Process identity

use serde::{Deserialize, Serialize};

/// Kind of process hosting the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessType {
    /// Standalone or managed server
    #[default]
    Server,
    /// Host controller managing servers of a domain
    HostController,
}

impl ProcessType {
    /// Check if this is a server process
    #[inline]
    #[must_use]
    pub fn is_server(self) -> bool {
        matches!(self, Self::Server)
    }
}

/// Whether the runtime is being updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunningMode {
    /// Model and runtime both updated
    #[default]
    Normal,
    /// Only the model is updated
    AdminOnly,
}
