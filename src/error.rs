//! Unified error types for Bridgewire

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Kernel control-plane request that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddBridge,
    DeleteBridge,
    AddInterface,
    RemoveInterface,
    ListBridges,
    ListInterfaces,
    GetLinkFlags,
    SetLinkFlags,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::AddBridge => "add bridge",
            Operation::DeleteBridge => "delete bridge",
            Operation::AddInterface => "add interface",
            Operation::RemoveInterface => "remove interface",
            Operation::ListBridges => "list bridges",
            Operation::ListInterfaces => "list interfaces",
            Operation::GetLinkFlags => "get link flags",
            Operation::SetLinkFlags => "set link flags",
        };
        f.write_str(s)
    }
}

impl Operation {
    /// Word joining a port to its bridge in messages
    fn preposition(self) -> &'static str {
        match self {
            Operation::AddInterface => "into",
            _ => "from",
        }
    }
}

/// Main error type for Bridgewire operations
#[derive(Error, Debug)]
pub enum Error {
    // Config errors
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation failed: {0}")]
    ConfigValidation(String),

    // Name errors
    #[error("Invalid interface name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    // Kernel control-plane errors
    #[error("Failed to open control socket: {0}")]
    HandleAcquisition(#[source] io::Error),

    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("Could not {op} '{name}': {source}")]
    KernelOperation {
        op: Operation,
        name: String,
        source: io::Error,
    },

    #[error(
        "Could not {op} '{iface}' {} bridge '{bridge}': {source}",
        .op.preposition()
    )]
    PortOperation {
        op: Operation,
        iface: String,
        bridge: String,
        source: io::Error,
    },

    #[error(
        "Bridge '{name}' has {} member(s) attached: {}. Use --force to destroy anyway.",
        .members.len(),
        .members.join(", ")
    )]
    BridgeBusy { name: String, members: Vec<String> },

    // Output errors
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Underlying errno, when the failure came from the operating system
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::HandleAcquisition(e) => e.raw_os_error(),
            Error::ConfigRead { source, .. }
            | Error::KernelOperation { source, .. }
            | Error::PortOperation { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

/// Result type alias for Bridgewire operations
pub type Result<T> = std::result::Result<T, Error>;
