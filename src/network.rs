//! Linux bridge control plane
//!
//! Provides:
//! - Bounded interface names (`IfName`)
//! - The control-plane seam (`ControlPlane`/`ControlHandle`)
//! - The ioctl backend for the running kernel
//! - `BridgeManager`, the entry point for bridge lifecycle and membership

pub mod bridge;
pub mod control;
pub mod ifname;
pub mod ioctl;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{BridgeInfo, BridgeManager};
pub use control::{ControlHandle, ControlPlane, ENUM_SLOTS, IfFlags, IfIndex};
pub use ifname::{IfName, NamePolicy};
pub use ioctl::{ControlSocket, IoctlControl};
