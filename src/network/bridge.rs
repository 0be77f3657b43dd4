//! Bridge interface management
//!
//! Provides:
//! - Creation and destruction of bridge devices
//! - Attaching/detaching member interfaces
//! - Enumeration of bridges and their members
//!
//! Every operation acquires its own control handle, issues its kernel
//! requests and drops the handle before returning. No state is kept between
//! calls; the kernel owns the bridge table.

use crate::error::{Error, Operation, Result};
use crate::network::control::{ControlHandle, ControlPlane, ENUM_SLOTS, IfFlags, IfIndex};
use crate::network::ifname::{IfName, NamePolicy};
use crate::network::ioctl::IoctlControl;
use serde::Serialize;
use std::io;
use tracing::{debug, error, info};

/// Snapshot of one bridge and its member interfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeInfo {
    pub name: String,
    pub interfaces: Vec<String>,
}

/// Stateless adapter between bridge intents and the kernel control plane
#[derive(Debug, Clone, Default)]
pub struct BridgeManager<C = IoctlControl> {
    control: C,
    policy: NamePolicy,
}

impl BridgeManager<IoctlControl> {
    /// Manager for the running kernel
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: ControlPlane> BridgeManager<C> {
    /// Manager over an arbitrary control plane
    pub fn with_control(control: C) -> Self {
        Self {
            control,
            policy: NamePolicy::default(),
        }
    }

    /// Set how over-long names are handled
    pub fn name_policy(mut self, policy: NamePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Normalise `name` under this manager's name policy
    pub fn ifname(&self, name: &str) -> Result<IfName> {
        self.name(name)
    }

    /// Create a bridge device
    ///
    /// The new bridge has no members and is administratively down.
    pub fn create_bridge(&self, name: &str) -> Result<()> {
        let br = self.name(name)?;
        let handle = self.acquire(Operation::AddBridge, &br)?;

        handle
            .add_bridge(&br)
            .map_err(|e| kernel_failure(Operation::AddBridge, &br, e))?;

        info!(bridge = %br, "bridge created");
        Ok(())
    }

    /// Delete a bridge device; the kernel detaches any remaining members
    pub fn delete_bridge(&self, name: &str) -> Result<()> {
        let br = self.name(name)?;
        let handle = self.acquire(Operation::DeleteBridge, &br)?;

        handle
            .del_bridge(&br)
            .map_err(|e| kernel_failure(Operation::DeleteBridge, &br, e))?;

        info!(bridge = %br, "bridge deleted");
        Ok(())
    }

    /// Attach `iface` to `bridge` as a member port
    ///
    /// Fails with `Error::InterfaceNotFound` before touching the kernel when
    /// `iface` does not resolve to a live interface.
    pub fn add_interface(&self, bridge: &str, iface: &str) -> Result<()> {
        let br = self.name(bridge)?;
        let (ifname, index) = self.resolve(iface)?;
        let handle = self.acquire(Operation::AddInterface, &br)?;

        handle.add_port(&br, index).map_err(|e| {
            error!(
                iface = %ifname,
                bridge = %br,
                error = %e,
                "could not add interface into bridge"
            );
            Error::PortOperation {
                op: Operation::AddInterface,
                iface: ifname.to_string(),
                bridge: br.to_string(),
                source: e,
            }
        })?;

        info!(iface = %ifname, bridge = %br, "interface added to bridge");
        Ok(())
    }

    /// Detach `iface` from `bridge`
    pub fn remove_interface(&self, bridge: &str, iface: &str) -> Result<()> {
        let br = self.name(bridge)?;
        let (ifname, index) = self.resolve(iface)?;
        let handle = self.acquire(Operation::RemoveInterface, &br)?;

        handle.del_port(&br, index).map_err(|e| {
            error!(
                iface = %ifname,
                bridge = %br,
                error = %e,
                "could not remove interface from bridge"
            );
            Error::PortOperation {
                op: Operation::RemoveInterface,
                iface: ifname.to_string(),
                bridge: br.to_string(),
                source: e,
            }
        })?;

        info!(iface = %ifname, bridge = %br, "interface removed from bridge");
        Ok(())
    }

    /// List bridge names in kernel order
    ///
    /// At most `ENUM_SLOTS` bridges are observed; any beyond that are not
    /// reported and the call still succeeds. Bridges that disappear between
    /// enumeration and name lookup are skipped.
    pub fn list_bridges(&self) -> Result<Vec<String>> {
        let handle = self.control.acquire().map_err(|e| {
            error!(error = %e, "failed to open socket to get bridge interfaces");
            Error::HandleAcquisition(e)
        })?;

        let mut slots = vec![0 as libc::c_int; ENUM_SLOTS];
        let reported = handle.bridge_indices(&mut slots).map_err(|e| {
            error!(error = %e, "failed to enumerate bridges");
            Error::KernelOperation {
                op: Operation::ListBridges,
                name: "*".to_string(),
                source: e,
            }
        })?;

        let reported = reported.min(ENUM_SLOTS);
        if reported == ENUM_SLOTS {
            debug!(
                capacity = ENUM_SLOTS,
                "bridge enumeration filled every slot, further bridges are not reported"
            );
        }

        Ok(self.names_of(&slots[..reported]))
    }

    /// List member interface names of `bridge`
    ///
    /// Same capacity and skip-on-vanish behaviour as `list_bridges`.
    pub fn list_interfaces(&self, bridge: &str) -> Result<Vec<String>> {
        let br = self.name(bridge)?;
        let handle = self.acquire(Operation::ListInterfaces, &br)?;

        let mut slots = vec![0 as libc::c_int; ENUM_SLOTS];
        handle
            .port_indices(&br, &mut slots)
            .map_err(|e| kernel_failure(Operation::ListInterfaces, &br, e))?;

        Ok(self.names_of(&slots))
    }

    /// Check whether `name` is a bridge known to the kernel
    pub fn bridge_exists(&self, name: &str) -> Result<bool> {
        let br = self.name(name)?;
        Ok(self.list_bridges()?.iter().any(|b| b == br.as_str()))
    }

    /// Check whether `name` resolves to a live interface
    pub fn interface_exists(&self, name: &str) -> Result<bool> {
        let ifname = self.name(name)?;
        Ok(self.control.name_to_index(&ifname).is_some())
    }

    /// Read the interface flags of `name`
    pub fn link_flags(&self, name: &str) -> Result<IfFlags> {
        let ifname = self.name(name)?;
        let handle = self.acquire(Operation::GetLinkFlags, &ifname)?;

        handle
            .link_flags(&ifname)
            .map_err(|e| kernel_failure(Operation::GetLinkFlags, &ifname, e))
    }

    /// Bring an interface administratively up or down
    pub fn set_link_up(&self, name: &str, up: bool) -> Result<()> {
        let ifname = self.name(name)?;
        let handle = self.acquire(Operation::SetLinkFlags, &ifname)?;

        let mut flags = handle
            .link_flags(&ifname)
            .map_err(|e| kernel_failure(Operation::GetLinkFlags, &ifname, e))?;
        if flags.contains(IfFlags::UP) == up {
            debug!(iface = %ifname, up, "link already in requested state");
            return Ok(());
        }
        flags.set(IfFlags::UP, up);

        handle
            .set_link_flags(&ifname, flags)
            .map_err(|e| kernel_failure(Operation::SetLinkFlags, &ifname, e))?;

        info!(iface = %ifname, up, "link state changed");
        Ok(())
    }

    /// Destroy a bridge
    ///
    /// If `force` is false and the bridge has members attached, returns an
    /// error without changing anything. If `force` is true, the bridge is
    /// brought down and deleted along with its memberships.
    pub fn destroy_bridge(&self, name: &str, force: bool) -> Result<()> {
        let members = self.list_interfaces(name)?;
        if !members.is_empty() && !force {
            return Err(Error::BridgeBusy {
                name: name.to_string(),
                members,
            });
        }

        if force {
            // The kernel refuses to delete a bridge that is up
            self.set_link_up(name, false)?;
        }
        self.delete_bridge(name)
    }

    /// Snapshot a single bridge
    pub fn show(&self, name: &str) -> Result<BridgeInfo> {
        let br = self.name(name)?;
        Ok(BridgeInfo {
            interfaces: self.list_interfaces(br.as_str())?,
            name: br.to_string(),
        })
    }

    /// Snapshot every bridge
    pub fn show_all(&self) -> Result<Vec<BridgeInfo>> {
        self.list_bridges()?
            .iter()
            .map(|name| self.show(name))
            .collect()
    }

    fn name(&self, name: &str) -> Result<IfName> {
        IfName::with_policy(name, self.policy).inspect_err(|e| {
            error!(requested = name, error = %e, "rejected interface name");
        })
    }

    fn resolve(&self, iface: &str) -> Result<(IfName, IfIndex)> {
        let ifname = self.name(iface)?;
        match self.control.name_to_index(&ifname) {
            Some(index) => {
                debug!(iface = %ifname, index = index.get(), "resolved interface");
                Ok((ifname, index))
            }
            None => {
                error!(iface = %ifname, "interface does not exist");
                Err(Error::InterfaceNotFound(ifname.to_string()))
            }
        }
    }

    fn acquire(&self, op: Operation, name: &IfName) -> Result<C::Handle> {
        self.control.acquire().map_err(|e| {
            error!(op = %op, dev = %name, error = %e, "failed to open control socket");
            Error::HandleAcquisition(e)
        })
    }

    fn names_of(&self, slots: &[libc::c_int]) -> Vec<String> {
        slots
            .iter()
            .filter_map(|&raw| u32::try_from(raw).ok().and_then(IfIndex::new))
            .filter_map(|index| {
                let name = self.control.index_to_name(index);
                if name.is_none() {
                    debug!(index = index.get(), "interface vanished during enumeration");
                }
                name
            })
            .collect()
    }
}

fn kernel_failure(op: Operation, name: &IfName, source: io::Error) -> Error {
    error!(op = %op, dev = %name, error = %source, "kernel rejected bridge request");
    Error::KernelOperation {
        op,
        name: name.to_string(),
        source,
    }
}
