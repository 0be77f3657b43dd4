//! Kernel bridging control plane
//!
//! `ControlPlane` hands out transient handles and resolves names and indices.
//! `ControlHandle` issues one kernel request per method. Dropping a handle
//! releases it, so release happens on every exit path.

use crate::network::ifname::IfName;
use bitflags::bitflags;
use std::io;
use std::num::NonZeroU32;

/// Kernel interface index; zero never names a live interface
pub type IfIndex = NonZeroU32;

/// Capacity of the index arrays handed to the kernel for enumeration
pub const ENUM_SLOTS: usize = 1024;

bitflags! {
    /// Interface flags as carried by SIOCGIFFLAGS/SIOCSIFFLAGS
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IfFlags: libc::c_short {
        const UP = libc::IFF_UP as libc::c_short;
        const BROADCAST = libc::IFF_BROADCAST as libc::c_short;
        const LOOPBACK = libc::IFF_LOOPBACK as libc::c_short;
        const RUNNING = libc::IFF_RUNNING as libc::c_short;
        const PROMISC = libc::IFF_PROMISC as libc::c_short;
        const MULTICAST = libc::IFF_MULTICAST as libc::c_short;
    }
}

/// Source of control handles plus name/index resolution
pub trait ControlPlane {
    type Handle: ControlHandle;

    /// Acquire a fresh handle scoped to one operation
    fn acquire(&self) -> io::Result<Self::Handle>;

    /// Resolve a name to the index of a live interface
    fn name_to_index(&self, name: &IfName) -> Option<IfIndex>;

    /// Resolve an index back to the interface name, if it still exists
    fn index_to_name(&self, index: IfIndex) -> Option<String>;
}

/// A transient handle on the bridging control plane
pub trait ControlHandle {
    fn add_bridge(&self, name: &IfName) -> io::Result<()>;

    fn del_bridge(&self, name: &IfName) -> io::Result<()>;

    fn add_port(&self, bridge: &IfName, port: IfIndex) -> io::Result<()>;

    fn del_port(&self, bridge: &IfName, port: IfIndex) -> io::Result<()>;

    /// Fill `slots` with bridge indices, returning the count the kernel reported
    fn bridge_indices(&self, slots: &mut [libc::c_int]) -> io::Result<usize>;

    /// Fill `slots` with member indices, indexed by port number
    fn port_indices(&self, bridge: &IfName, slots: &mut [libc::c_int]) -> io::Result<()>;

    fn link_flags(&self, name: &IfName) -> io::Result<IfFlags>;

    fn set_link_flags(&self, name: &IfName, flags: IfFlags) -> io::Result<()>;
}
