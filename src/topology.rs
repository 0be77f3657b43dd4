//! Declared bridge topology
//!
//! Diffs declared bridges against the live kernel state and produces an
//! ordered list of actions. Execution stops at the first failure; nothing is
//! rolled back and nothing is persisted.

use crate::config::BridgeDef;
use crate::error::Result;
use crate::network::{BridgeManager, ControlPlane, IfFlags};
use std::fmt;
use tracing::info;

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateBridge(String),
    AddMember { bridge: String, iface: String },
    LinkUp(String),
    RemoveMember { bridge: String, iface: String },
    LinkDown(String),
    DeleteBridge(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CreateBridge(br) => write!(f, "create bridge {}", br),
            Action::AddMember { bridge, iface } => write!(f, "add {} to {}", iface, bridge),
            Action::LinkUp(name) => write!(f, "set {} up", name),
            Action::RemoveMember { bridge, iface } => {
                write!(f, "remove {} from {}", iface, bridge)
            }
            Action::LinkDown(name) => write!(f, "set {} down", name),
            Action::DeleteBridge(br) => write!(f, "delete bridge {}", br),
        }
    }
}

/// Plan the steps that bring the kernel in line with `bridges`
///
/// Only missing pieces are planned: existing bridges are not recreated,
/// existing members are not re-added and a bridge already up is left alone.
/// Declared names are compared under the manager's name policy.
pub fn plan_up<C: ControlPlane>(
    manager: &BridgeManager<C>,
    bridges: &[BridgeDef],
) -> Result<Vec<Action>> {
    let mut actions = Vec::new();

    for def in bridges {
        let br = manager.ifname(&def.name)?;
        let exists = manager.bridge_exists(br.as_str())?;
        let members = if exists {
            manager.list_interfaces(br.as_str())?
        } else {
            actions.push(Action::CreateBridge(br.to_string()));
            Vec::new()
        };

        for iface in &def.members {
            let iface = manager.ifname(iface)?;
            if !members.iter().any(|m| m == iface.as_str()) {
                actions.push(Action::AddMember {
                    bridge: br.to_string(),
                    iface: iface.to_string(),
                });
            }
        }

        if def.up && !(exists && manager.link_flags(br.as_str())?.contains(IfFlags::UP)) {
            actions.push(Action::LinkUp(br.to_string()));
        }
    }

    Ok(actions)
}

/// Plan the steps that tear down `bridges`, in reverse declaration order
pub fn plan_down<C: ControlPlane>(
    manager: &BridgeManager<C>,
    bridges: &[BridgeDef],
) -> Result<Vec<Action>> {
    let mut actions = Vec::new();

    for def in bridges.iter().rev() {
        let br = manager.ifname(&def.name)?;
        if !manager.bridge_exists(br.as_str())? {
            continue;
        }

        let members = manager.list_interfaces(br.as_str())?;
        for iface in &def.members {
            let iface = manager.ifname(iface)?;
            if members.iter().any(|m| m == iface.as_str()) {
                actions.push(Action::RemoveMember {
                    bridge: br.to_string(),
                    iface: iface.to_string(),
                });
            }
        }

        if manager.link_flags(br.as_str())?.contains(IfFlags::UP) {
            actions.push(Action::LinkDown(br.to_string()));
        }
        actions.push(Action::DeleteBridge(br.to_string()));
    }

    Ok(actions)
}

/// Execute a plan in order, stopping at the first failure
pub fn execute<C: ControlPlane>(manager: &BridgeManager<C>, actions: &[Action]) -> Result<()> {
    for action in actions {
        info!(%action, "applying");
        match action {
            Action::CreateBridge(br) => manager.create_bridge(br)?,
            Action::AddMember { bridge, iface } => manager.add_interface(bridge, iface)?,
            Action::LinkUp(name) => manager.set_link_up(name, true)?,
            Action::RemoveMember { bridge, iface } => manager.remove_interface(bridge, iface)?,
            Action::LinkDown(name) => manager.set_link_up(name, false)?,
            Action::DeleteBridge(br) => manager.delete_bridge(br)?,
        }
    }
    Ok(())
}
