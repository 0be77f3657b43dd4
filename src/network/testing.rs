//! In-memory model of the kernel bridge table for unit tests

use crate::network::control::{ControlHandle, ControlPlane, IfFlags, IfIndex};
use crate::network::ifname::IfName;
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct Link {
    name: String,
    is_bridge: bool,
    master: Option<u32>,
    port_no: usize,
    flags: IfFlags,
}

#[derive(Debug, Default)]
struct State {
    next_index: u32,
    links: BTreeMap<u32, Link>,
    open_handles: usize,
    acquired: usize,
    mutations: usize,
    refuse_handles: bool,
    vanish_on_list: Vec<String>,
}

impl State {
    fn find(&self, name: &str) -> Option<u32> {
        self.links
            .iter()
            .find(|(_, link)| link.name == name)
            .map(|(&index, _)| index)
    }

    fn insert(&mut self, name: &str, is_bridge: bool) -> u32 {
        self.next_index += 1;
        let index = self.next_index;
        self.links.insert(
            index,
            Link {
                name: name.to_string(),
                is_bridge,
                master: None,
                port_no: 0,
                flags: IfFlags::BROADCAST | IfFlags::MULTICAST,
            },
        );
        index
    }

    fn bridge(&self, name: &str) -> io::Result<u32> {
        let index = self.find(name).ok_or_else(|| errno(libc::ENODEV))?;
        if !self.links[&index].is_bridge {
            return Err(errno(libc::EOPNOTSUPP));
        }
        Ok(index)
    }

    fn vanish(&mut self) {
        for name in std::mem::take(&mut self.vanish_on_list) {
            if let Some(index) = self.find(&name) {
                self.links.remove(&index);
            }
        }
    }
}

fn errno(code: i32) -> io::Error {
    io::Error::from_raw_os_error(code)
}

/// Fake kernel that behaves like the Linux bridge ioctls
#[derive(Debug, Clone)]
pub struct FakeKernel {
    state: Arc<Mutex<State>>,
}

impl FakeKernel {
    /// A kernel with only a loopback interface
    pub fn new() -> Self {
        let kernel = Self {
            state: Arc::new(Mutex::new(State::default())),
        };
        let lo = kernel.add_link("lo");
        kernel.lock().links.get_mut(&lo).unwrap().flags = IfFlags::UP | IfFlags::LOOPBACK;
        kernel
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Add a plain interface, returning its index
    pub fn add_link(&self, name: &str) -> u32 {
        self.lock().insert(name, false)
    }

    /// Remove an interface as if it had been unplugged
    pub fn remove_link(&self, name: &str) {
        let mut state = self.lock();
        if let Some(index) = state.find(name) {
            state.links.remove(&index);
        }
    }

    /// Make the next enumeration race with the removal of `name`
    pub fn vanish_during_listing(&self, name: &str) {
        self.lock().vanish_on_list.push(name.to_string());
    }

    /// Refuse every handle acquisition
    pub fn refuse_handles(&self, refuse: bool) {
        self.lock().refuse_handles = refuse;
    }

    /// Handles currently held by callers
    pub fn open_handles(&self) -> usize {
        self.lock().open_handles
    }

    /// Handles handed out so far
    pub fn acquired(&self) -> usize {
        self.lock().acquired
    }

    /// Mutating requests that reached the kernel, successful or not
    pub fn mutations(&self) -> usize {
        self.lock().mutations
    }

    pub fn is_up(&self, name: &str) -> bool {
        let state = self.lock();
        state
            .find(name)
            .map(|index| state.links[&index].flags.contains(IfFlags::UP))
            .unwrap_or(false)
    }
}

impl ControlPlane for FakeKernel {
    type Handle = FakeHandle;

    fn acquire(&self) -> io::Result<FakeHandle> {
        let mut state = self.lock();
        if state.refuse_handles {
            return Err(errno(libc::EMFILE));
        }
        state.open_handles += 1;
        state.acquired += 1;
        Ok(FakeHandle {
            state: Arc::clone(&self.state),
        })
    }

    fn name_to_index(&self, name: &IfName) -> Option<IfIndex> {
        self.lock().find(name.as_str()).and_then(IfIndex::new)
    }

    fn index_to_name(&self, index: IfIndex) -> Option<String> {
        self.lock().links.get(&index.get()).map(|l| l.name.clone())
    }
}

/// Handle issued by `FakeKernel`; tracks its own release
#[derive(Debug)]
pub struct FakeHandle {
    state: Arc<Mutex<State>>,
}

impl FakeHandle {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn mutate(&self) -> MutexGuard<'_, State> {
        let mut state = self.lock();
        state.mutations += 1;
        state
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.lock().open_handles -= 1;
    }
}

impl ControlHandle for FakeHandle {
    fn add_bridge(&self, name: &IfName) -> io::Result<()> {
        let mut state = self.mutate();
        if state.find(name.as_str()).is_some() {
            return Err(errno(libc::EEXIST));
        }
        state.insert(name.as_str(), true);
        Ok(())
    }

    fn del_bridge(&self, name: &IfName) -> io::Result<()> {
        let mut state = self.mutate();
        let index = state.find(name.as_str()).ok_or_else(|| errno(libc::ENXIO))?;
        let link = &state.links[&index];
        if !link.is_bridge {
            return Err(errno(libc::EPERM));
        }
        if link.flags.contains(IfFlags::UP) {
            return Err(errno(libc::EBUSY));
        }
        state.links.remove(&index);
        for link in state.links.values_mut() {
            if link.master == Some(index) {
                link.master = None;
                link.port_no = 0;
            }
        }
        Ok(())
    }

    fn add_port(&self, bridge: &IfName, port: IfIndex) -> io::Result<()> {
        let mut state = self.mutate();
        let br = state.bridge(bridge.as_str())?;
        if br == port.get() {
            return Err(errno(libc::ELOOP));
        }
        let taken: Vec<usize> = state
            .links
            .values()
            .filter(|l| l.master == Some(br))
            .map(|l| l.port_no)
            .collect();
        let link = state
            .links
            .get_mut(&port.get())
            .ok_or_else(|| errno(libc::EINVAL))?;
        if link.master.is_some() {
            return Err(errno(libc::EBUSY));
        }
        // Port numbers start at 1, as in the kernel
        let port_no = (1..).find(|n| !taken.contains(n)).unwrap();
        link.master = Some(br);
        link.port_no = port_no;
        Ok(())
    }

    fn del_port(&self, bridge: &IfName, port: IfIndex) -> io::Result<()> {
        let mut state = self.mutate();
        let br = state.bridge(bridge.as_str())?;
        match state.links.get_mut(&port.get()) {
            Some(link) if link.master == Some(br) => {
                link.master = None;
                link.port_no = 0;
                Ok(())
            }
            _ => Err(errno(libc::EINVAL)),
        }
    }

    fn bridge_indices(&self, slots: &mut [libc::c_int]) -> io::Result<usize> {
        let mut state = self.lock();
        let bridges: Vec<u32> = state
            .links
            .iter()
            .filter(|(_, l)| l.is_bridge)
            .map(|(&i, _)| i)
            .collect();
        for (slot, index) in slots.iter_mut().zip(&bridges) {
            *slot = *index as libc::c_int;
        }
        state.vanish();
        Ok(bridges.len().min(slots.len()))
    }

    fn port_indices(&self, bridge: &IfName, slots: &mut [libc::c_int]) -> io::Result<()> {
        let mut state = self.lock();
        let br = state.bridge(bridge.as_str())?;
        for (&index, link) in &state.links {
            if link.master == Some(br) && link.port_no < slots.len() {
                slots[link.port_no] = index as libc::c_int;
            }
        }
        state.vanish();
        Ok(())
    }

    fn link_flags(&self, name: &IfName) -> io::Result<IfFlags> {
        let state = self.lock();
        let index = state.find(name.as_str()).ok_or_else(|| errno(libc::ENODEV))?;
        Ok(state.links[&index].flags)
    }

    fn set_link_flags(&self, name: &IfName, flags: IfFlags) -> io::Result<()> {
        let mut state = self.mutate();
        let index = state.find(name.as_str()).ok_or_else(|| errno(libc::ENODEV))?;
        if let Some(link) = state.links.get_mut(&index) {
            link.flags = flags;
        }
        Ok(())
    }
}
