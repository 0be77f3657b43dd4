//! Bridgewire - Linux bridge control
//!
//! Creates and destroys bridge devices, attaches and detaches member
//! interfaces, and enumerates bridges through the kernel's legacy bridge
//! ioctl interface.

pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod topology;

pub use error::{Error, Operation, Result};
pub use network::{BridgeInfo, BridgeManager, IfName, NamePolicy};
